use crate::entities::{ActivityStatus, activity_entity as activities};
use crate::error::{AppError, AppResult};
use crate::models::{
    ActivityQuery, ActivityResponse, CreateActivityRequest, PaginatedResponse, PaginationParams,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct ActivityService {
    pool: DatabaseConnection,
}

impl ActivityService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 创建拼团活动
    ///
    /// group_price_cents 创建后不可变更；required_num 至少 2 人；
    /// max_num 若设置必须不小于 required_num。
    pub async fn create_activity(&self, request: CreateActivityRequest) -> AppResult<ActivityResponse> {
        if request.group_price_cents <= 0 {
            return Err(AppError::ValidationError(
                "Group price must be positive".to_string(),
            ));
        }
        if request.group_price_cents >= request.original_price_cents {
            return Err(AppError::ValidationError(
                "Group price must be below the original price".to_string(),
            ));
        }
        if request.required_num < 2 {
            return Err(AppError::ValidationError(
                "Required number of members must be at least 2".to_string(),
            ));
        }
        if let Some(max_num) = request.max_num
            && max_num < request.required_num
        {
            return Err(AppError::ValidationError(
                "Max number of members must not be below the required number".to_string(),
            ));
        }
        if request.end_time <= request.start_time {
            return Err(AppError::ValidationError(
                "Activity end time must be after start time".to_string(),
            ));
        }

        let now = Utc::now();
        if request.end_time <= now {
            return Err(AppError::ValidationError(
                "Activity end time must be in the future".to_string(),
            ));
        }

        let status = if now < request.start_time {
            ActivityStatus::NotStarted
        } else {
            ActivityStatus::Ongoing
        };

        let activity = activities::ActiveModel {
            product_id: Set(request.product_id),
            product_name: Set(request.product_name),
            group_price_cents: Set(request.group_price_cents),
            original_price_cents: Set(request.original_price_cents),
            required_num: Set(request.required_num),
            max_num: Set(request.max_num),
            start_time: Set(request.start_time),
            end_time: Set(request.end_time),
            status: Set(status),
            create_time: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Activity {} created, product={}, required_num={}",
            activity.activity_id,
            activity.product_id,
            activity.required_num
        );

        Ok(activity.into())
    }

    pub async fn get_activity(&self, activity_id: i64) -> AppResult<ActivityResponse> {
        let activity = activities::Entity::find_by_id(activity_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::ActivityNotFound)?;
        Ok(activity.into())
    }

    pub async fn list_activities(
        &self,
        query: &ActivityQuery,
    ) -> AppResult<PaginatedResponse<ActivityResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut finder = activities::Entity::find();
        if let Some(status) = query.status {
            finder = finder.filter(activities::Column::Status.eq(status));
        }

        let total = finder.clone().count(&self.pool).await? as i64;

        let items: Vec<ActivityResponse> = finder
            .order_by(activities::Column::CreateTime, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.get_page(),
            params.get_per_page(),
            total,
        ))
    }

    /// 未开始 → 进行中（到达 start_time）、进行中 → 已结束（过了 end_time）
    ///
    /// 定时任务调用，返回（开始数, 结束数）。
    pub async fn roll_activity_windows(&self) -> AppResult<(u64, u64)> {
        let now = Utc::now();

        let started = activities::Entity::update_many()
            .col_expr(
                activities::Column::Status,
                Expr::value(ActivityStatus::Ongoing),
            )
            .filter(activities::Column::Status.eq(ActivityStatus::NotStarted))
            .filter(activities::Column::StartTime.lte(now))
            .filter(activities::Column::EndTime.gt(now))
            .exec(&self.pool)
            .await?
            .rows_affected;

        let ended = activities::Entity::update_many()
            .col_expr(
                activities::Column::Status,
                Expr::value(ActivityStatus::Ended),
            )
            .filter(activities::Column::Status.is_in([
                ActivityStatus::NotStarted,
                ActivityStatus::Ongoing,
            ]))
            .filter(activities::Column::EndTime.lte(now))
            .exec(&self.pool)
            .await?
            .rows_affected;

        Ok((started, ended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn setup() -> ActivityService {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).sqlx_logging(false);
        let pool = Database::connect(options).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();
        ActivityService::new(pool)
    }

    fn valid_request() -> CreateActivityRequest {
        CreateActivityRequest {
            product_id: 1,
            product_name: "Apple Gift Box".to_string(),
            group_price_cents: 500,
            original_price_cents: 900,
            required_num: 3,
            max_num: None,
            start_time: Utc::now() - Duration::hours(1),
            end_time: Utc::now() + Duration::hours(24),
        }
    }

    #[tokio::test]
    async fn test_create_activity_within_window_is_ongoing() {
        let service = setup().await;
        let activity = service.create_activity(valid_request()).await.unwrap();
        assert_eq!(activity.status, ActivityStatus::Ongoing);
        assert_eq!(activity.required_num, 3);
    }

    #[tokio::test]
    async fn test_create_activity_rejects_bad_price() {
        let service = setup().await;

        let mut request = valid_request();
        request.group_price_cents = 900;
        assert!(matches!(
            service.create_activity(request).await,
            Err(AppError::ValidationError(_))
        ));

        let mut request = valid_request();
        request.required_num = 1;
        assert!(matches!(
            service.create_activity(request).await,
            Err(AppError::ValidationError(_))
        ));

        let mut request = valid_request();
        request.max_num = Some(2);
        assert!(matches!(
            service.create_activity(request).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_roll_activity_windows_closes_ended() {
        let service = setup().await;
        let activity = service.create_activity(valid_request()).await.unwrap();

        // 手动把结束时间拨到过去
        let model = activities::Entity::find_by_id(activity.activity_id)
            .one(&service.pool)
            .await
            .unwrap()
            .unwrap();
        let mut am: activities::ActiveModel = sea_orm::IntoActiveModel::into_active_model(model);
        am.end_time = Set(Utc::now() - Duration::hours(1));
        am.update(&service.pool).await.unwrap();

        let (_, ended) = service.roll_activity_windows().await.unwrap();
        assert_eq!(ended, 1);

        let closed = service.get_activity(activity.activity_id).await.unwrap();
        assert_eq!(closed.status, ActivityStatus::Ended);

        // 再跑一次没有可关的活动
        let (_, ended) = service.roll_activity_windows().await.unwrap();
        assert_eq!(ended, 0);
    }
}
