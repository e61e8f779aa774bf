use crate::entities::{SettlementStatus, commission_record_entity as records};
use crate::models::PaginationInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CommissionQuery {
    pub status: Option<SettlementStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommissionResponse {
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

impl From<records::Model> for CommissionResponse {
    fn from(r: records::Model) -> Self {
        Self {
            commission_id: r.commission_id,
            leader_id: r.leader_id,
            team_id: r.team_id,
            member_id: r.member_id,
            order_id: r.order_id,
            order_amount_cents: r.order_amount_cents,
            commission_rate_bp: r.commission_rate_bp,
            commission_amount_cents: r.commission_amount_cents,
            status: r.status,
            settled_at: r.settled_at,
            create_time: r.create_time,
        }
    }
}

/// 佣金分页结果，附带待结算/已结算总额
#[derive(Debug, Serialize, ToSchema)]
pub struct CommissionPageResponse {
    pub items: Vec<CommissionResponse>,
    pub pagination: PaginationInfo,
    pub pending_amount_cents: i64,
    pub settled_amount_cents: i64,
}
