use crate::entities::{MemberStatus, TeamStatus, team_member_entity as members, team_entity as teams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// 发起拼团请求
///
/// leader_id 缺省表示团长为自己开团；duration_hours 缺省使用配置默认值。
#[derive(Debug, Deserialize, ToSchema)]
pub struct LaunchTeamRequest {
    pub activity_id: i64,
    pub leader_id: Option<i64>,
    #[serde(default)]
    pub join_immediately: bool,
    pub quantity: Option<i32>,
    pub address_id: Option<i64>,
    pub duration_hours: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinTeamRequest {
    pub address_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelTeamRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveMemberRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityTeamsQuery {
    /// 查看者社区ID，同社区的团排在前面
    pub community_id: Option<i64>,
    pub status: Option<TeamStatus>,
    pub include_expired: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaderTeamsQuery {
    pub status: Option<TeamStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberInfoResponse {
    pub member_id: i64,
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub is_launcher: bool,
    pub quantity: i32,
    pub pay_amount_cents: i64,
    pub join_time: DateTime<Utc>,
    pub status: MemberStatus,
}

impl From<members::Model> for MemberInfoResponse {
    fn from(m: members::Model) -> Self {
        Self {
            member_id: m.member_id,
            user_id: m.user_id,
            order_id: m.order_id,
            is_launcher: m.is_launcher,
            quantity: m.quantity,
            pay_amount_cents: m.pay_amount_cents,
            join_time: m.join_time,
            status: m.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamDetailResponse {
    pub team_id: i64,
    pub team_no: String,
    pub activity_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub group_price_cents: i64,
    pub launcher_id: i64,
    pub leader_id: i64,
    pub community_id: Option<i64>,
    pub required_num: i32,
    pub current_num: i32,
    pub remain_num: i32,
    pub team_status: TeamStatus,
    pub success_time: Option<DateTime<Utc>>,
    pub expire_time: DateTime<Utc>,
    pub create_time: DateTime<Utc>,
    /// 距离过期的剩余秒数，已过期或已终态为 0
    pub remaining_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberInfoResponse>>,
}

/// 参团结果（返回给刚完成支付的参与者）
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinTeamResponse {
    pub member_id: i64,
    pub order_id: Option<i64>,
    pub team_id: i64,
    pub team_no: String,
    pub current_num: i32,
    pub required_num: i32,
    pub remain_num: i32,
    pub pay_amount_cents: i64,
    pub team_status: TeamStatus,
    pub expire_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LaunchTeamResponse {
    pub team: TeamDetailResponse,
    /// join_immediately 成功时的参团结果
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<JoinTeamResponse>,
    /// join_immediately 失败时的原因；团仍保留为 0 人拼团中
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_error: Option<String>,
}

/// 我参与的拼团（参团记录 + 团 + 活动拍平）
#[derive(Debug, Serialize, ToSchema)]
pub struct MyTeamResponse {
    pub member_id: i64,
    pub member_status: MemberStatus,
    pub is_launcher: bool,
    pub quantity: i32,
    pub pay_amount_cents: i64,
    pub join_time: DateTime<Utc>,
    pub order_id: Option<i64>,
    pub team_id: i64,
    pub team_no: String,
    pub activity_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub group_price_cents: i64,
    pub leader_id: i64,
    pub community_id: Option<i64>,
    pub required_num: i32,
    pub current_num: i32,
    pub team_status: TeamStatus,
    pub success_time: Option<DateTime<Utc>>,
    pub expire_time: DateTime<Utc>,
    pub create_time: DateTime<Utc>,
}

pub fn remaining_secs(team: &teams::Model, now: DateTime<Utc>) -> i64 {
    if team.team_status != TeamStatus::Joining {
        return 0;
    }
    (team.expire_time - now).num_seconds().max(0)
}
