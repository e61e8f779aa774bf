use crate::entities::team_entity as teams;
use crate::error::AppResult;
use chrono::Utc;
use rand::Rng;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// 生成一个候选团号（格式：T + yyyyMMdd + 6位数字）
fn random_team_no() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: u32 = {
        let mut rng = rand::thread_rng();
        rng.gen_range(0..1_000_000)
    };
    format!("T{date}{suffix:06}")
}

/// 生成全局唯一团号，撞号则重新生成
pub async fn generate_unique_team_no(pool: &DatabaseConnection) -> AppResult<String> {
    loop {
        let team_no = random_team_no();

        let exists = teams::Entity::find()
            .filter(teams::Column::TeamNo.eq(team_no.clone()))
            .count(pool)
            .await?;

        if exists == 0 {
            return Ok(team_no);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_no_format() {
        let no = random_team_no();
        assert_eq!(no.len(), 15);
        assert!(no.starts_with('T'));
        assert!(no[1..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_team_no_embeds_today() {
        let no = random_team_no();
        let today = Utc::now().format("%Y%m%d").to_string();
        assert_eq!(&no[1..9], today.as_str());
    }
}
