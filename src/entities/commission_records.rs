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
pub enum SettlementStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "settled")]
    Settled,
}

/// 佣金记录（追加式）
///
/// 成团时每个 success 成员生成一条，member_id 全局唯一；结算批处理
/// 由外部任务执行，本服务只负责生成 pending 记录与查询。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "commission_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub commission_id: i64,
    pub leader_id: i64,
    pub team_id: i64,
    pub member_id: i64,
    pub order_id: Option<i64>,
    pub order_amount_cents: i64,
    pub commission_rate_bp: i32,
    pub commission_amount_cents: i64,
    pub status: SettlementStatus,
    pub settled_at: Option<DateTime<Utc>>,
    pub create_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
