use crate::entities::{
    SettlementStatus, commission_record_entity as records, leader_entity as leaders,
    team_entity as teams, team_member_entity as members,
};
use crate::error::AppResult;
use crate::models::{CommissionPageResponse, CommissionQuery, CommissionResponse, PaginationInfo, PaginationParams};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct CommissionService {
    pool: DatabaseConnection,
}

impl CommissionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 佣金金额 = 订单金额(分) × 比例(bp) / 10000，向下取整
    pub fn commission_amount_cents(order_amount_cents: i64, rate_bp: i32) -> i64 {
        order_amount_cents * rate_bp as i64 / 10_000
    }

    /// 成团时为每个成员生成一条 pending 佣金记录
    ///
    /// 只能在成团事务内调用。按 member_id 幂等：已有记录的成员跳过，
    /// 唯一索引兜底。
    pub async fn record_team_commissions(
        &self,
        txn: &DatabaseTransaction,
        team: &teams::Model,
        leader: &leaders::Model,
        members: &[members::Model],
    ) -> AppResult<usize> {
        let mut created = 0usize;

        for member in members {
            let exists = records::Entity::find()
                .filter(records::Column::MemberId.eq(member.member_id))
                .count(txn)
                .await?;
            if exists > 0 {
                log::warn!(
                    "Commission record already exists for member {}, skipping",
                    member.member_id
                );
                continue;
            }

            records::ActiveModel {
                leader_id: Set(team.leader_id),
                team_id: Set(team.team_id),
                member_id: Set(member.member_id),
                order_id: Set(member.order_id),
                order_amount_cents: Set(member.pay_amount_cents),
                commission_rate_bp: Set(leader.commission_rate_bp),
                commission_amount_cents: Set(Self::commission_amount_cents(
                    member.pay_amount_cents,
                    leader.commission_rate_bp,
                )),
                status: Set(SettlementStatus::Pending),
                settled_at: Set(None),
                create_time: Set(Utc::now()),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            created += 1;
        }

        Ok(created)
    }

    /// 团长佣金明细（分页），附带待结算/已结算总额
    pub async fn get_leader_commissions(
        &self,
        leader_id: i64,
        query: &CommissionQuery,
    ) -> AppResult<CommissionPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut finder = records::Entity::find().filter(records::Column::LeaderId.eq(leader_id));
        if let Some(status) = query.status {
            finder = finder.filter(records::Column::Status.eq(status));
        }

        let total = finder.clone().count(&self.pool).await? as i64;

        let items: Vec<CommissionResponse> = finder
            .order_by(records::Column::CreateTime, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        // 总额在应用侧聚合，避免各数据库 SUM 返回类型不一致
        let all = records::Entity::find()
            .filter(records::Column::LeaderId.eq(leader_id))
            .all(&self.pool)
            .await?;
        let pending_amount_cents = all
            .iter()
            .filter(|r| r.status == SettlementStatus::Pending)
            .map(|r| r.commission_amount_cents)
            .sum();
        let settled_amount_cents = all
            .iter()
            .filter(|r| r.status == SettlementStatus::Settled)
            .map(|r| r.commission_amount_cents)
            .sum();

        Ok(CommissionPageResponse {
            items,
            pagination: PaginationInfo::new(params.get_page(), params.get_per_page(), total),
            pending_amount_cents,
            settled_amount_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_amount_math() {
        // 10% of 5.00
        assert_eq!(CommissionService::commission_amount_cents(500, 1000), 50);
        // 整数除法向下取整
        assert_eq!(CommissionService::commission_amount_cents(999, 1000), 99);
        assert_eq!(CommissionService::commission_amount_cents(0, 1000), 0);
        // 100%
        assert_eq!(CommissionService::commission_amount_cents(500, 10_000), 500);
    }
}
