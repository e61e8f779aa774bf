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
pub enum MemberStatus {
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberStatus::Unpaid => write!(f, "unpaid"),
            MemberStatus::Paid => write!(f, "paid"),
            MemberStatus::Success => write!(f, "success"),
            MemberStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// 参团记录
///
/// 同步扣款设计下记录创建即为 paid；记录永不删除，退出/失败只改为
/// cancelled。同一 (team_id, user_id) 最多一条非 cancelled 记录，由引擎
/// 在团锁内保证。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "team_members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub member_id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub is_launcher: bool,
    pub quantity: i32,
    pub pay_amount_cents: i64,
    pub join_time: DateTime<Utc>,
    pub status: MemberStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
