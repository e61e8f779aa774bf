use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    #[sea_orm(string_value = "joining")]
    Joining,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamStatus::Joining => write!(f, "joining"),
            TeamStatus::Success => write!(f, "success"),
            TeamStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 团实例（核心实体）
///
/// 状态机：joining → success（人数首次达到 required_num 的参团内原子发生）
/// 或 joining → failed（过期/团长取消），两个终态都不可再变更。
/// current_num 恒等于该团 paid|success 状态成员数；required_num 创建时从
/// 活动复制，之后活动变更不影响已有团。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub team_id: i64,
    pub team_no: String,
    pub activity_id: i64,
    pub launcher_id: i64,
    pub leader_id: i64,
    pub community_id: Option<i64>,
    pub required_num: i32,
    pub current_num: i32,
    pub team_status: TeamStatus,
    pub success_time: Option<DateTime<Utc>>,
    pub expire_time: DateTime<Utc>,
    pub create_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
