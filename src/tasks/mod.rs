//! Background scheduled tasks for the application.
//!
//! This module centralizes the recurring jobs (expired-team sweeping and
//! activity window rolling). Call `spawn_all` once during startup to launch
//! them.

use crate::services::{ActivityService, TeamService};

/// Spawn all background tasks.
///
/// Notes
/// - Each task is idempotent as implemented in its service and runs on its
///   own schedule; a failing round is logged and the loop continues.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(
    team_service: TeamService,
    activity_service: ActivityService,
    sweep_interval_secs: u64,
) {
    // 过期团扫描：joining 且已过期的团转失败并退款
    {
        let svc = team_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.sweep_expired_teams().await {
                    Ok((processed, errors)) if processed > 0 || errors > 0 => {
                        log::info!("Expired team sweep: {processed} processed, {errors} errors");
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Expired team sweep failed: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(sweep_interval_secs)).await;
            }
        });
    }

    // 活动窗口滚动（每小时）：到点开始/结束活动
    {
        let svc = activity_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.roll_activity_windows().await {
                    Ok((started, ended)) if started > 0 || ended > 0 => {
                        log::info!("Activity windows rolled: {started} started, {ended} ended");
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to roll activity windows: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
        });
    }
}
