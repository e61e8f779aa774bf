use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

/// 按 team_id 分片的互斥锁表
///
/// 同一个团的变更操作（参团/退团/失败转移）必须串行执行，不同团之间
/// 完全并行。锁在外部调用（扣款/建单）期间持续持有，换取人数与状态
/// 转移的原子性。
#[derive(Clone, Default)]
pub struct TeamLockRegistry {
    locks: Arc<StdMutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl TeamLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取到某个团的锁句柄，调用方随后 `.lock().await`
    pub fn lock_for(&self, team_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("team lock registry poisoned");
        locks.entry(team_id).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_team_same_lock() {
        let registry = TeamLockRegistry::new();
        let a = registry.lock_for(1);
        let b = registry.lock_for(1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_different_teams_different_locks() {
        let registry = TeamLockRegistry::new();
        let a = registry.lock_for(1);
        let b = registry.lock_for(2);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_lock_serializes_critical_section() {
        let registry = TeamLockRegistry::new();
        let lock = registry.lock_for(1);

        let guard = lock.lock().await;
        assert!(registry.lock_for(1).try_lock().is_err());
        drop(guard);
        assert!(registry.lock_for(1).try_lock().is_ok());
    }
}
