use crate::config::GroupBuyConfig;
use crate::entities::{
    ActivityStatus, LeaderStatus, MemberStatus, TeamStatus, activity_entity as activities,
    leader_entity as leaders, team_entity as teams, team_member_entity as team_members,
};
use crate::error::{AppError, AppResult};
use crate::external::{AccountLedger, NewOrder, OrderFactory};
use crate::models::{
    ActivityTeamsQuery, JoinTeamRequest, JoinTeamResponse, LaunchTeamRequest, LaunchTeamResponse,
    LeaderTeamsQuery, MemberInfoResponse, MyTeamResponse, PaginatedResponse, PaginationParams,
    TeamDetailResponse, remaining_secs,
};
use crate::services::{CommissionService, TeamLockRegistry};
use crate::utils::generate_unique_team_no;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::future::Future;
use std::sync::Arc;

/// 团生命周期引擎（核心 Service）
///
/// teams / team_members 的唯一写入方。同一个团的所有变更操作通过
/// `TeamLockRegistry` 串行化；扣款、建单在锁内同步调用并带超时保护，
/// 下游失败时在返回前完成余额补偿。
#[derive(Clone)]
pub struct TeamService {
    pool: DatabaseConnection,
    ledger: Arc<dyn AccountLedger>,
    orders: Arc<dyn OrderFactory>,
    commission_service: CommissionService,
    locks: TeamLockRegistry,
    config: GroupBuyConfig,
}

/// 在独立任务中执行变更操作
///
/// 请求 future 被取消（调用方断开/超时）不会中止锁内已经开始的状态
/// 转移，操作总是跑到完成；取消的调用方应重新查询状态而不是假定失败。
async fn run_detached<T, F>(fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(result) => result,
        Err(e) => Err(AppError::InternalError(format!(
            "detached operation failed: {e}"
        ))),
    }
}

impl TeamService {
    pub fn new(
        pool: DatabaseConnection,
        ledger: Arc<dyn AccountLedger>,
        orders: Arc<dyn OrderFactory>,
        commission_service: CommissionService,
        config: GroupBuyConfig,
    ) -> Self {
        Self {
            pool,
            ledger,
            orders,
            commission_service,
            locks: TeamLockRegistry::new(),
            config,
        }
    }

    /// 发起拼团
    ///
    /// 流程:
    /// 1. 校验活动（存在、进行中、在活动时间窗口内）
    /// 2. 校验团长档案（leader_id 缺省为发起人自己）
    /// 3. 创建团实例（团号撞号重试，required_num 从活动复制）
    /// 4. join_immediately=true 时走常规参团流程补上发起人
    ///
    /// 发起人参团失败不回滚建团：团保留为 0 人拼团中，失败原因放进
    /// join_error 返回，只开团不参团本身是合法用法。
    pub async fn launch_team(
        &self,
        launcher_id: i64,
        request: LaunchTeamRequest,
    ) -> AppResult<LaunchTeamResponse> {
        let now = Utc::now();

        let activity = activities::Entity::find_by_id(request.activity_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::ActivityNotFound)?;

        if activity.status != ActivityStatus::Ongoing {
            return Err(AppError::ActivityNotOngoing);
        }
        if now < activity.start_time || now > activity.end_time {
            return Err(AppError::ActivityNotOngoing);
        }

        let leader_id = request.leader_id.unwrap_or(launcher_id);
        let leader = leaders::Entity::find_by_id(leader_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::ValidationError("Leader is not registered".to_string()))?;
        if leader.status != LeaderStatus::Active {
            return Err(AppError::Forbidden);
        }

        let duration_hours = request
            .duration_hours
            .unwrap_or(self.config.team_expire_hours);
        if duration_hours < 1 || duration_hours > self.config.max_team_duration_hours {
            return Err(AppError::ValidationError(format!(
                "Team duration must be between 1 and {} hours",
                self.config.max_team_duration_hours
            )));
        }

        let quantity = request.quantity.unwrap_or(1);
        if request.join_immediately {
            if request.address_id.is_none() {
                return Err(AppError::ValidationError(
                    "An address is required when joining immediately".to_string(),
                ));
            }
            if quantity < 1 {
                return Err(AppError::ValidationError(
                    "Quantity must be at least 1".to_string(),
                ));
            }
        }

        let team_no = generate_unique_team_no(&self.pool).await?;

        let team = teams::ActiveModel {
            team_no: Set(team_no),
            activity_id: Set(activity.activity_id),
            launcher_id: Set(launcher_id),
            leader_id: Set(leader.leader_id),
            community_id: Set(Some(leader.community_id)),
            required_num: Set(activity.required_num),
            current_num: Set(0),
            team_status: Set(TeamStatus::Joining),
            success_time: Set(None),
            expire_time: Set(now + Duration::hours(duration_hours)),
            create_time: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Team {} launched, team_no={}, activity={}, leader={}",
            team.team_id,
            team.team_no,
            team.activity_id,
            team.leader_id
        );

        let mut member = None;
        let mut join_error = None;

        if request.join_immediately {
            let join_request = JoinTeamRequest {
                address_id: request.address_id.unwrap_or_default(),
                quantity,
            };
            match self.join_team(team.team_id, launcher_id, join_request).await {
                Ok(joined) => member = Some(joined),
                Err(e) => {
                    log::warn!(
                        "Launcher {} failed to join freshly launched team {}: {e}",
                        launcher_id,
                        team.team_id
                    );
                    join_error = Some(e.to_string());
                }
            }
        }

        // 发起人参团会改变人数/状态，重新读取
        let team = self.find_team(team.team_id).await?;
        let members = self.find_team_members(team.team_id).await?;

        Ok(LaunchTeamResponse {
            team: self.build_team_detail(&team, &activity, Some(members)),
            member,
            join_error,
        })
    }

    /// 用户参团（并发关键路径）
    ///
    /// 流程（团锁内执行，对同团的参团/退团/失败转移互斥）:
    /// 1. 校验团状态与过期时间，过期顺手触发失败转移
    /// 2. 防重复参团（同团至多一条非 cancelled 记录）
    /// 3. 按活动团购价扣款（余额不足直接失败，无任何状态变更）
    /// 4. 创建订单，失败则返还已扣金额
    /// 5. 单事务落库：成员(paid) + 人数 +（人满时）成团转移 + 佣金
    ///
    /// 人数首次达到 required_num 的那一次参团在同一事务里完成
    /// joining → success 翻转，外部观察不到 current_num == required_num
    /// 而状态还是 joining 的中间态。
    pub async fn join_team(
        &self,
        team_id: i64,
        user_id: i64,
        request: JoinTeamRequest,
    ) -> AppResult<JoinTeamResponse> {
        // 与请求生命周期解耦：调用方超时/断开不会中止已开始的转移，
        // 结果只是无人接收，调用方需要重新查询团/成员状态
        let service = self.clone();
        run_detached(async move { service.join_team_inner(team_id, user_id, request).await }).await
    }

    async fn join_team_inner(
        &self,
        team_id: i64,
        user_id: i64,
        request: JoinTeamRequest,
    ) -> AppResult<JoinTeamResponse> {
        if request.quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let lock = self.locks.lock_for(team_id);
        let _guard = lock.lock().await;

        let now = Utc::now();
        let team = self.find_team(team_id).await?;

        match team.team_status {
            TeamStatus::Joining => {}
            TeamStatus::Success => {
                return Err(AppError::TeamNotJoinable(
                    "team already succeeded".to_string(),
                ));
            }
            TeamStatus::Failed => {
                return Err(AppError::TeamNotJoinable("team already failed".to_string()));
            }
        }

        if now > team.expire_time {
            // 过期团顺手转失败，避免状态滞留到下一次扫描
            if let Err(e) = self.fail_team_locked(&team, false).await {
                log::error!("Opportunistic expiry transition failed for team {team_id}: {e}");
            }
            return Err(AppError::TeamExpired);
        }

        // 成团瞬间状态已翻转，这里只是防御
        if team.current_num >= team.required_num {
            return Err(AppError::TeamFull);
        }

        let already_joined = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team_id))
            .filter(team_members::Column::UserId.eq(user_id))
            .filter(team_members::Column::Status.ne(MemberStatus::Cancelled))
            .count(&self.pool)
            .await?;
        if already_joined > 0 {
            return Err(AppError::AlreadyJoined);
        }

        let activity = activities::Entity::find_by_id(team.activity_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::ActivityNotFound)?;

        let pay_amount_cents = activity.group_price_cents * request.quantity as i64;

        // 余额扣款
        self.with_timeout("account debit", self.ledger.debit(user_id, pay_amount_cents))
            .await?;

        // 创建订单，失败则返还已扣金额
        let new_order = NewOrder {
            user_id,
            leader_id: team.leader_id,
            address_id: request.address_id,
            activity_id: activity.activity_id,
            team_id: team.team_id,
            product_id: activity.product_id,
            product_name: activity.product_name.clone(),
            quantity: request.quantity,
            unit_price_cents: activity.group_price_cents,
            total_amount_cents: pay_amount_cents,
        };
        let order_id = match self
            .with_timeout("order creation", self.orders.create_order(new_order))
            .await
        {
            Ok(order_id) => order_id,
            Err(e) => {
                self.compensate_debit(user_id, pay_amount_cents, "order creation failed")
                    .await?;
                return Err(e);
            }
        };

        match self
            .persist_join(&team, user_id, order_id, request.quantity, pay_amount_cents, now)
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                // 订单成为孤儿，由订单侧超时取消；这里只负责把钱退回去
                self.compensate_debit(user_id, pay_amount_cents, "join persistence failed")
                    .await?;
                Err(e)
            }
        }
    }

    /// 成员 + 人数 +（可能的）成团转移，单事务提交
    async fn persist_join(
        &self,
        team: &teams::Model,
        user_id: i64,
        order_id: i64,
        quantity: i32,
        pay_amount_cents: i64,
        now: DateTime<Utc>,
    ) -> AppResult<JoinTeamResponse> {
        let txn = self.pool.begin().await?;

        let member = team_members::ActiveModel {
            team_id: Set(team.team_id),
            user_id: Set(user_id),
            order_id: Set(Some(order_id)),
            is_launcher: Set(user_id == team.launcher_id),
            quantity: Set(quantity),
            pay_amount_cents: Set(pay_amount_cents),
            join_time: Set(now),
            status: Set(MemberStatus::Paid),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let new_num = team.current_num + 1;
        let filled = new_num >= team.required_num;

        let mut team_am = team.clone().into_active_model();
        team_am.current_num = Set(new_num);
        if filled {
            team_am.team_status = Set(TeamStatus::Success);
            team_am.success_time = Set(Some(now));
        }
        let team = team_am.update(&txn).await?;

        if filled {
            let paid_members = team_members::Entity::find()
                .filter(team_members::Column::TeamId.eq(team.team_id))
                .filter(team_members::Column::Status.eq(MemberStatus::Paid))
                .order_by(team_members::Column::JoinTime, Order::Asc)
                .all(&txn)
                .await?;

            team_members::Entity::update_many()
                .col_expr(
                    team_members::Column::Status,
                    Expr::value(MemberStatus::Success),
                )
                .filter(team_members::Column::TeamId.eq(team.team_id))
                .filter(team_members::Column::Status.eq(MemberStatus::Paid))
                .exec(&txn)
                .await?;

            let leader = leaders::Entity::find_by_id(team.leader_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(format!(
                        "Leader {} missing for team {}",
                        team.leader_id, team.team_id
                    ))
                })?;

            let created = self
                .commission_service
                .record_team_commissions(&txn, &team, &leader, &paid_members)
                .await?;

            log::info!(
                "Team {} filled with {} members, {} commission records created",
                team.team_id,
                paid_members.len(),
                created
            );
        }

        txn.commit().await?;

        log::info!(
            "User {} joined team {}, members {}/{}",
            user_id,
            team.team_id,
            team.current_num,
            team.required_num
        );

        Ok(JoinTeamResponse {
            member_id: member.member_id,
            order_id: member.order_id,
            team_id: team.team_id,
            team_no: team.team_no.clone(),
            current_num: team.current_num,
            required_num: team.required_num,
            remain_num: (team.required_num - team.current_num).max(0),
            pay_amount_cents,
            team_status: team.team_status,
            expire_time: team.expire_time,
        })
    }

    /// 用户主动退出拼团（仅拼团中可退）
    pub async fn quit_team(&self, team_id: i64, user_id: i64) -> AppResult<()> {
        let service = self.clone();
        run_detached(async move { service.quit_team_inner(team_id, user_id).await }).await
    }

    async fn quit_team_inner(&self, team_id: i64, user_id: i64) -> AppResult<()> {
        let lock = self.locks.lock_for(team_id);
        let _guard = lock.lock().await;

        let team = self.find_team(team_id).await?;
        match team.team_status {
            TeamStatus::Joining => {}
            TeamStatus::Success => {
                return Err(AppError::TeamNotJoinable(
                    "team already succeeded".to_string(),
                ));
            }
            TeamStatus::Failed => return Err(AppError::TeamAlreadyFailed),
        }

        let member = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team_id))
            .filter(team_members::Column::UserId.eq(user_id))
            .filter(team_members::Column::Status.eq(MemberStatus::Paid))
            .one(&self.pool)
            .await?
            .ok_or(AppError::NotAMember)?;

        // 先退款再落库；落库失败把退款扣回，保持状态像没退过一样
        self.with_timeout(
            "refund credit",
            self.ledger.credit(user_id, member.pay_amount_cents),
        )
        .await?;

        match self.persist_membership_cancel(&team, &member).await {
            Ok(()) => {
                log::info!("User {} quit team {}, refunded {} cents", user_id, team_id, member.pay_amount_cents);
                Ok(())
            }
            Err(e) => {
                match self
                    .with_timeout(
                        "refund rollback",
                        self.ledger.debit(user_id, member.pay_amount_cents),
                    )
                    .await
                {
                    Ok(()) => Err(e),
                    Err(rollback_err) => {
                        log::error!(
                            "ALERT refund rollback failed for user {user_id} on team {team_id}: {rollback_err}"
                        );
                        Err(AppError::CompensationFailed(format!(
                            "debit {} cents back from user {user_id} after quit persistence failed: {rollback_err}",
                            member.pay_amount_cents
                        )))
                    }
                }
            }
        }
    }

    /// 团长移除成员（拼团中、非发起人）
    pub async fn remove_member(
        &self,
        team_id: i64,
        member_id: i64,
        caller_id: i64,
        reason: Option<String>,
    ) -> AppResult<()> {
        let service = self.clone();
        run_detached(async move {
            service
                .remove_member_inner(team_id, member_id, caller_id, reason)
                .await
        })
        .await
    }

    async fn remove_member_inner(
        &self,
        team_id: i64,
        member_id: i64,
        caller_id: i64,
        reason: Option<String>,
    ) -> AppResult<()> {
        let lock = self.locks.lock_for(team_id);
        let _guard = lock.lock().await;

        let team = self.find_team(team_id).await?;
        if team.leader_id != caller_id {
            return Err(AppError::Forbidden);
        }
        match team.team_status {
            TeamStatus::Joining => {}
            TeamStatus::Success => {
                return Err(AppError::TeamNotJoinable(
                    "team already succeeded".to_string(),
                ));
            }
            TeamStatus::Failed => return Err(AppError::TeamAlreadyFailed),
        }

        let member = team_members::Entity::find_by_id(member_id)
            .one(&self.pool)
            .await?
            .filter(|m| m.team_id == team_id)
            .ok_or(AppError::NotAMember)?;

        if member.is_launcher {
            return Err(AppError::ValidationError(
                "The launcher cannot be removed from their own team".to_string(),
            ));
        }
        if member.status != MemberStatus::Paid {
            return Err(AppError::NotAMember);
        }

        log::info!(
            "Leader {} removes member {} from team {}: {}",
            caller_id,
            member_id,
            team_id,
            reason.unwrap_or_default()
        );

        self.with_timeout(
            "refund credit",
            self.ledger.credit(member.user_id, member.pay_amount_cents),
        )
        .await?;

        match self.persist_membership_cancel(&team, &member).await {
            Ok(()) => Ok(()),
            Err(e) => {
                match self
                    .with_timeout(
                        "refund rollback",
                        self.ledger.debit(member.user_id, member.pay_amount_cents),
                    )
                    .await
                {
                    Ok(()) => Err(e),
                    Err(rollback_err) => {
                        log::error!(
                            "ALERT refund rollback failed for member {member_id} on team {team_id}: {rollback_err}"
                        );
                        Err(AppError::CompensationFailed(format!(
                            "debit {} cents back from user {} after removal persistence failed: {rollback_err}",
                            member.pay_amount_cents, member.user_id
                        )))
                    }
                }
            }
        }
    }

    /// 团长取消自己的团（拼团中），全员退款
    pub async fn cancel_team(
        &self,
        team_id: i64,
        caller_id: i64,
        reason: Option<String>,
    ) -> AppResult<()> {
        let service = self.clone();
        run_detached(async move { service.cancel_team_inner(team_id, caller_id, reason).await })
            .await
    }

    async fn cancel_team_inner(
        &self,
        team_id: i64,
        caller_id: i64,
        reason: Option<String>,
    ) -> AppResult<()> {
        let lock = self.locks.lock_for(team_id);
        let _guard = lock.lock().await;

        let team = self.find_team(team_id).await?;
        if team.leader_id != caller_id {
            return Err(AppError::Forbidden);
        }
        match team.team_status {
            TeamStatus::Joining => {}
            TeamStatus::Success => {
                return Err(AppError::TeamNotJoinable(
                    "team already succeeded".to_string(),
                ));
            }
            TeamStatus::Failed => return Err(AppError::TeamAlreadyFailed),
        }

        log::info!(
            "Leader {} cancels team {}: {}",
            caller_id,
            team_id,
            reason.unwrap_or_default()
        );

        self.fail_team_locked(&team, true).await
    }

    /// 过期失败转移（定时扫描或参团时顺手触发）
    ///
    /// 幂等：已终态或未过期的团直接返回 Ok。
    pub async fn fail_team(&self, team_id: i64) -> AppResult<()> {
        let lock = self.locks.lock_for(team_id);
        let _guard = lock.lock().await;

        let team = self.find_team(team_id).await?;
        self.fail_team_locked(&team, false).await
    }

    /// joining → failed 转移与退款，调用方必须已持有团锁
    ///
    /// force=true 跳过过期检查（团长取消）。退款逐个成员执行并隔离
    /// 错误：退款失败的成员保持 paid，留给人工对账，不影响其他成员。
    async fn fail_team_locked(&self, team: &teams::Model, force: bool) -> AppResult<()> {
        if team.team_status != TeamStatus::Joining {
            log::debug!(
                "Team {} already terminal ({}), skipping failure transition",
                team.team_id,
                team.team_status
            );
            return Ok(());
        }
        if !force && Utc::now() <= team.expire_time {
            return Ok(());
        }

        let txn = self.pool.begin().await?;

        let mut team_am = team.clone().into_active_model();
        team_am.team_status = Set(TeamStatus::Failed);
        let team = team_am.update(&txn).await?;

        let paid_members = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team.team_id))
            .filter(team_members::Column::Status.eq(MemberStatus::Paid))
            .all(&txn)
            .await?;

        txn.commit().await?;

        log::info!(
            "Team {} marked failed, {} paid members to refund",
            team.team_id,
            paid_members.len()
        );

        let mut refunded = 0usize;
        let mut errors = 0usize;

        for member in &paid_members {
            match self
                .with_timeout(
                    "refund credit",
                    self.ledger.credit(member.user_id, member.pay_amount_cents),
                )
                .await
            {
                Ok(()) => {
                    let mut member_am = member.clone().into_active_model();
                    member_am.status = Set(MemberStatus::Cancelled);
                    match member_am.update(&self.pool).await {
                        Ok(_) => refunded += 1,
                        Err(e) => {
                            errors += 1;
                            log::error!(
                                "Member {} refunded but not cancelled on team {}: {e}",
                                member.member_id,
                                team.team_id
                            );
                        }
                    }
                }
                Err(e) => {
                    errors += 1;
                    log::error!(
                        "Refund failed for member {} of team {}: {e}",
                        member.member_id,
                        team.team_id
                    );
                }
            }
        }

        if errors > 0 {
            log::error!(
                "ALERT team {} refunds incomplete: {refunded} ok, {errors} failed, manual reconciliation required",
                team.team_id
            );
        }

        Ok(())
    }

    /// 过期团扫描：joining 且 expire_time 已过的团逐个转失败
    ///
    /// 单个团失败不影响其他团；与在线参团并发安全（依赖团锁）；
    /// 重复执行无副作用。返回（处理数, 出错数）。
    pub async fn sweep_expired_teams(&self) -> AppResult<(usize, usize)> {
        let now = Utc::now();

        let expired: Vec<i64> = teams::Entity::find()
            .filter(teams::Column::TeamStatus.eq(TeamStatus::Joining))
            .filter(teams::Column::ExpireTime.lt(now))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|t| t.team_id)
            .collect();

        if expired.is_empty() {
            return Ok((0, 0));
        }

        log::info!("Expiry sweep found {} teams past deadline", expired.len());

        let mut processed = 0usize;
        let mut errors = 0usize;

        for team_id in expired {
            match self.fail_team(team_id).await {
                Ok(()) => processed += 1,
                Err(e) => {
                    errors += 1;
                    log::error!("Expiry sweep failed for team {team_id}: {e}");
                }
            }
        }

        log::info!("Expiry sweep done: {processed} processed, {errors} errors");
        Ok((processed, errors))
    }

    /// 团详情（快照读，不加锁）
    pub async fn get_team_detail(&self, team_id: i64) -> AppResult<TeamDetailResponse> {
        let team = self.find_team(team_id).await?;
        let activity = activities::Entity::find_by_id(team.activity_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::ActivityNotFound)?;
        let members = self.find_team_members(team_id).await?;

        Ok(self.build_team_detail(&team, &activity, Some(members)))
    }

    /// 活动的团列表（同社区优先，组内按创建时间倒序）
    ///
    /// 默认只看拼团中且未过期的团；管理端可带状态/含过期筛选。
    pub async fn get_activity_teams(
        &self,
        activity_id: i64,
        query: &ActivityTeamsQuery,
    ) -> AppResult<Vec<TeamDetailResponse>> {
        let activity = activities::Entity::find_by_id(activity_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::ActivityNotFound)?;

        let now = Utc::now();
        let include_expired = query.include_expired.unwrap_or(false);

        let mut finder = teams::Entity::find().filter(teams::Column::ActivityId.eq(activity_id));
        match query.status {
            Some(status) => finder = finder.filter(teams::Column::TeamStatus.eq(status)),
            None => finder = finder.filter(teams::Column::TeamStatus.eq(TeamStatus::Joining)),
        }
        if !include_expired {
            finder = finder.filter(teams::Column::ExpireTime.gt(now));
        }

        let mut list = finder
            .order_by(teams::Column::CreateTime, Order::Desc)
            .all(&self.pool)
            .await?;

        // 已按创建时间倒序，stable sort 下同社区的整体提前
        if let Some(community_id) = query.community_id {
            list.sort_by_key(|t| if t.community_id == Some(community_id) { 0 } else { 1 });
        }
        list.truncate(self.config.activity_teams_limit as usize);

        Ok(list
            .into_iter()
            .map(|team| self.build_team_detail(&team, &activity, None))
            .collect())
    }

    /// 我参与的拼团（按参团时间倒序）
    pub async fn get_my_teams(&self, user_id: i64) -> AppResult<Vec<MyTeamResponse>> {
        let memberships = team_members::Entity::find()
            .filter(team_members::Column::UserId.eq(user_id))
            .order_by(team_members::Column::JoinTime, Order::Desc)
            .all(&self.pool)
            .await?;

        let mut result = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let Some(team) = teams::Entity::find_by_id(membership.team_id)
                .one(&self.pool)
                .await?
            else {
                log::warn!("Membership {} references missing team", membership.member_id);
                continue;
            };
            let Some(activity) = activities::Entity::find_by_id(team.activity_id)
                .one(&self.pool)
                .await?
            else {
                continue;
            };

            result.push(MyTeamResponse {
                member_id: membership.member_id,
                member_status: membership.status,
                is_launcher: membership.is_launcher,
                quantity: membership.quantity,
                pay_amount_cents: membership.pay_amount_cents,
                join_time: membership.join_time,
                order_id: membership.order_id,
                team_id: team.team_id,
                team_no: team.team_no,
                activity_id: activity.activity_id,
                product_id: activity.product_id,
                product_name: activity.product_name,
                group_price_cents: activity.group_price_cents,
                leader_id: team.leader_id,
                community_id: team.community_id,
                required_num: team.required_num,
                current_num: team.current_num,
                team_status: team.team_status,
                success_time: team.success_time,
                expire_time: team.expire_time,
                create_time: team.create_time,
            });
        }

        Ok(result)
    }

    /// 团长发起的团（分页，可按状态筛选）
    pub async fn get_leader_teams(
        &self,
        leader_id: i64,
        query: &LeaderTeamsQuery,
    ) -> AppResult<PaginatedResponse<TeamDetailResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut finder = teams::Entity::find().filter(teams::Column::LeaderId.eq(leader_id));
        if let Some(status) = query.status {
            finder = finder.filter(teams::Column::TeamStatus.eq(status));
        }

        let total = finder.clone().count(&self.pool).await? as i64;

        let list = finder
            .order_by(teams::Column::CreateTime, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let mut items = Vec::with_capacity(list.len());
        for team in list {
            let Some(activity) = activities::Entity::find_by_id(team.activity_id)
                .one(&self.pool)
                .await?
            else {
                continue;
            };
            let members = self.find_team_members(team.team_id).await?;
            items.push(self.build_team_detail(&team, &activity, Some(members)));
        }

        Ok(PaginatedResponse::new(
            items,
            params.get_page(),
            params.get_per_page(),
            total,
        ))
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    async fn find_team(&self, team_id: i64) -> AppResult<teams::Model> {
        teams::Entity::find_by_id(team_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::TeamNotFound)
    }

    async fn find_team_members(&self, team_id: i64) -> AppResult<Vec<team_members::Model>> {
        Ok(team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team_id))
            .order_by(team_members::Column::JoinTime, Order::Asc)
            .all(&self.pool)
            .await?)
    }

    /// 成员取消 + 团人数回退，单事务
    async fn persist_membership_cancel(
        &self,
        team: &teams::Model,
        member: &team_members::Model,
    ) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let mut member_am = member.clone().into_active_model();
        member_am.status = Set(MemberStatus::Cancelled);
        member_am.update(&txn).await?;

        let mut team_am = team.clone().into_active_model();
        team_am.current_num = Set((team.current_num - 1).max(0));
        team_am.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    fn build_team_detail(
        &self,
        team: &teams::Model,
        activity: &activities::Model,
        members: Option<Vec<team_members::Model>>,
    ) -> TeamDetailResponse {
        let now = Utc::now();
        TeamDetailResponse {
            team_id: team.team_id,
            team_no: team.team_no.clone(),
            activity_id: activity.activity_id,
            product_id: activity.product_id,
            product_name: activity.product_name.clone(),
            group_price_cents: activity.group_price_cents,
            launcher_id: team.launcher_id,
            leader_id: team.leader_id,
            community_id: team.community_id,
            required_num: team.required_num,
            current_num: team.current_num,
            remain_num: (team.required_num - team.current_num).max(0),
            team_status: team.team_status,
            success_time: team.success_time,
            expire_time: team.expire_time,
            create_time: team.create_time,
            remaining_secs: remaining_secs(team, now),
            members: members.map(|list| list.into_iter().map(MemberInfoResponse::from).collect()),
        }
    }

    /// 上游同步调用的超时保护：超时返回 UpstreamTimeout，该步骤之前
    /// 没有任何状态变更时调用方可以直接透传
    async fn with_timeout<T>(
        &self,
        what: &str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        let timeout = std::time::Duration::from_millis(self.config.upstream_timeout_ms);
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::UpstreamTimeout(what.to_string())),
        }
    }

    /// 把已扣的款退回去。补偿本身失败是致命告警，不允许静默丢弃。
    async fn compensate_debit(
        &self,
        user_id: i64,
        amount_cents: i64,
        context: &str,
    ) -> AppResult<()> {
        match self
            .with_timeout(
                "compensating credit",
                self.ledger.credit(user_id, amount_cents),
            )
            .await
        {
            Ok(()) => {
                log::info!("Refunded {amount_cents} cents to user {user_id} after {context}");
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "ALERT compensating credit of {amount_cents} cents to user {user_id} failed: {e}"
                );
                Err(AppError::CompensationFailed(format!(
                    "credit {amount_cents} cents to user {user_id} after {context}: {e}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::commission_record_entity as commission_records;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use tokio::sync::Mutex;

    const INITIAL_BALANCE: i64 = 1_000_000;
    const LEADER_ID: i64 = 100;
    const GROUP_PRICE: i64 = 500;

    struct FakeLedger {
        balances: Mutex<HashMap<i64, i64>>,
        fail_debits: AtomicBool,
        fail_credits: AtomicBool,
    }

    impl FakeLedger {
        fn new() -> Self {
            Self {
                balances: Mutex::new(HashMap::new()),
                fail_debits: AtomicBool::new(false),
                fail_credits: AtomicBool::new(false),
            }
        }

        async fn balance(&self, user_id: i64) -> i64 {
            *self
                .balances
                .lock()
                .await
                .get(&user_id)
                .unwrap_or(&INITIAL_BALANCE)
        }
    }

    #[async_trait::async_trait]
    impl AccountLedger for FakeLedger {
        async fn debit(&self, user_id: i64, amount_cents: i64) -> AppResult<()> {
            if self.fail_debits.load(Ordering::SeqCst) {
                return Err(AppError::InsufficientFunds);
            }
            let mut balances = self.balances.lock().await;
            let balance = balances.entry(user_id).or_insert(INITIAL_BALANCE);
            if *balance < amount_cents {
                return Err(AppError::InsufficientFunds);
            }
            *balance -= amount_cents;
            Ok(())
        }

        async fn credit(&self, user_id: i64, amount_cents: i64) -> AppResult<()> {
            if self.fail_credits.load(Ordering::SeqCst) {
                return Err(AppError::ExternalApiError("ledger unavailable".to_string()));
            }
            let mut balances = self.balances.lock().await;
            *balances.entry(user_id).or_insert(INITIAL_BALANCE) += amount_cents;
            Ok(())
        }
    }

    struct FakeOrderFactory {
        next_id: AtomicI64,
        fail: AtomicBool,
    }

    #[async_trait::async_trait]
    impl OrderFactory for FakeOrderFactory {
        async fn create_order(&self, _order: NewOrder) -> AppResult<i64> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::OrderCreationFailed(
                    "order service unavailable".to_string(),
                ));
            }
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
        }
    }

    struct TestEnv {
        service: TeamService,
        ledger: Arc<FakeLedger>,
        orders: Arc<FakeOrderFactory>,
        pool: DatabaseConnection,
    }

    async fn setup() -> TestEnv {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).sqlx_logging(false);
        let pool = Database::connect(options).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();

        let ledger = Arc::new(FakeLedger::new());
        let orders = Arc::new(FakeOrderFactory {
            next_id: AtomicI64::new(1),
            fail: AtomicBool::new(false),
        });

        leaders::ActiveModel {
            leader_id: Set(LEADER_ID),
            leader_name: Set("Community Leader".to_string()),
            community_id: Set(1),
            commission_rate_bp: Set(1000),
            status: Set(LeaderStatus::Active),
            create_time: Set(Utc::now()),
        }
        .insert(&pool)
        .await
        .unwrap();

        let service = TeamService::new(
            pool.clone(),
            ledger.clone(),
            orders.clone(),
            CommissionService::new(pool.clone()),
            GroupBuyConfig::default(),
        );

        TestEnv {
            service,
            ledger,
            orders,
            pool,
        }
    }

    async fn seed_activity(pool: &DatabaseConnection, required_num: i32) -> activities::Model {
        activities::ActiveModel {
            product_id: Set(1),
            product_name: Set("Apple Gift Box".to_string()),
            group_price_cents: Set(GROUP_PRICE),
            original_price_cents: Set(GROUP_PRICE * 2),
            required_num: Set(required_num),
            max_num: Set(None),
            start_time: Set(Utc::now() - Duration::hours(1)),
            end_time: Set(Utc::now() + Duration::hours(24)),
            status: Set(ActivityStatus::Ongoing),
            create_time: Set(Utc::now()),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap()
    }

    async fn launch(env: &TestEnv, activity_id: i64) -> TeamDetailResponse {
        env.service
            .launch_team(
                LEADER_ID,
                LaunchTeamRequest {
                    activity_id,
                    leader_id: None,
                    join_immediately: false,
                    quantity: None,
                    address_id: None,
                    duration_hours: None,
                },
            )
            .await
            .unwrap()
            .team
    }

    fn join_request() -> JoinTeamRequest {
        JoinTeamRequest {
            address_id: 1,
            quantity: 1,
        }
    }

    async fn reload_team(pool: &DatabaseConnection, team_id: i64) -> teams::Model {
        teams::Entity::find_by_id(team_id)
            .one(pool)
            .await
            .unwrap()
            .unwrap()
    }

    async fn expire_team(pool: &DatabaseConnection, team_id: i64) {
        let mut am = reload_team(pool, team_id).await.into_active_model();
        am.expire_time = Set(Utc::now() - Duration::hours(2));
        am.update(pool).await.unwrap();
    }

    async fn team_commissions(
        pool: &DatabaseConnection,
        team_id: i64,
    ) -> Vec<commission_records::Model> {
        commission_records::Entity::find()
            .filter(commission_records::Column::TeamId.eq(team_id))
            .all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_launch_creates_joining_team() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;

        let team = launch(&env, activity.activity_id).await;
        assert_eq!(team.team_status, TeamStatus::Joining);
        assert_eq!(team.current_num, 0);
        assert_eq!(team.required_num, 3);
        assert!(team.team_no.starts_with('T'));
        assert_eq!(team.community_id, Some(1));
        assert!(team.remaining_secs > 23 * 3600);
    }

    #[tokio::test]
    async fn test_launch_with_immediate_join() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;

        let response = env
            .service
            .launch_team(
                LEADER_ID,
                LaunchTeamRequest {
                    activity_id: activity.activity_id,
                    leader_id: None,
                    join_immediately: true,
                    quantity: Some(2),
                    address_id: Some(1),
                    duration_hours: None,
                },
            )
            .await
            .unwrap();

        assert!(response.join_error.is_none());
        let member = response.member.unwrap();
        assert_eq!(member.current_num, 1);
        assert_eq!(member.pay_amount_cents, GROUP_PRICE * 2);
        assert_eq!(response.team.current_num, 1);
        assert_eq!(env.ledger.balance(LEADER_ID).await, INITIAL_BALANCE - GROUP_PRICE * 2);

        let members = response.team.members.unwrap();
        assert_eq!(members.len(), 1);
        assert!(members[0].is_launcher);
    }

    #[tokio::test]
    async fn test_launch_join_failure_keeps_empty_team() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        env.orders.fail.store(true, Ordering::SeqCst);

        let response = env
            .service
            .launch_team(
                LEADER_ID,
                LaunchTeamRequest {
                    activity_id: activity.activity_id,
                    leader_id: None,
                    join_immediately: true,
                    quantity: Some(1),
                    address_id: Some(1),
                    duration_hours: None,
                },
            )
            .await
            .unwrap();

        assert!(response.member.is_none());
        assert!(response.join_error.is_some());
        assert_eq!(response.team.team_status, TeamStatus::Joining);
        assert_eq!(response.team.current_num, 0);
        assert_eq!(env.ledger.balance(LEADER_ID).await, INITIAL_BALANCE);
    }

    #[tokio::test]
    async fn test_launch_rejects_ended_activity() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;

        let mut am = activity.clone().into_active_model();
        am.status = Set(ActivityStatus::Ended);
        am.update(&env.pool).await.unwrap();

        let result = env
            .service
            .launch_team(
                LEADER_ID,
                LaunchTeamRequest {
                    activity_id: activity.activity_id,
                    leader_id: None,
                    join_immediately: false,
                    quantity: None,
                    address_id: None,
                    duration_hours: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::ActivityNotOngoing)));
    }

    /// 三人团完整走一遍：两次普通参团、第三次触发成团、第四次被拒
    #[tokio::test]
    async fn test_join_until_success() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        let first = env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        assert_eq!(first.current_num, 1);
        assert_eq!(first.team_status, TeamStatus::Joining);

        let second = env.service.join_team(team.team_id, 2, join_request()).await.unwrap();
        assert_eq!(second.current_num, 2);
        assert_eq!(second.team_status, TeamStatus::Joining);

        let third = env.service.join_team(team.team_id, 3, join_request()).await.unwrap();
        assert_eq!(third.current_num, 3);
        assert_eq!(third.team_status, TeamStatus::Success);

        let stored = reload_team(&env.pool, team.team_id).await;
        assert_eq!(stored.team_status, TeamStatus::Success);
        assert!(stored.success_time.is_some());
        assert_eq!(stored.current_num, 3);

        let members = env.service.get_team_detail(team.team_id).await.unwrap().members.unwrap();
        assert_eq!(members.len(), 3);
        assert!(members.iter().all(|m| m.status == MemberStatus::Success));

        // 每个成员一条佣金记录：500 分 × 10% = 50 分
        let commissions = team_commissions(&env.pool, team.team_id).await;
        assert_eq!(commissions.len(), 3);
        assert!(commissions.iter().all(|c| c.commission_amount_cents == 50));
        assert!(commissions.iter().all(|c| c.leader_id == LEADER_ID));

        let rejected = env.service.join_team(team.team_id, 4, join_request()).await;
        assert!(matches!(rejected, Err(AppError::TeamNotJoinable(_))));
        assert_eq!(reload_team(&env.pool, team.team_id).await.current_num, 3);
    }

    /// 八个用户并发抢三个名额：恰好三人成功、成团恰好翻转一次、
    /// 人数不超员、佣金恰好三条、落败者余额分文未动
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_never_overshoot() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        let mut handles = Vec::new();
        for user_id in 1..=8 {
            let service = env.service.clone();
            let team_id = team.team_id;
            handles.push(tokio::spawn(async move {
                (user_id, service.join_team(team_id, user_id, join_request()).await)
            }));
        }

        let mut joined = Vec::new();
        let mut rejected = Vec::new();
        for handle in handles {
            let (user_id, result) = handle.await.unwrap();
            match result {
                Ok(_) => joined.push(user_id),
                Err(AppError::TeamNotJoinable(_)) | Err(AppError::TeamFull) => {
                    rejected.push(user_id)
                }
                Err(e) => panic!("unexpected join error: {e}"),
            }
        }

        assert_eq!(joined.len(), 3);
        assert_eq!(rejected.len(), 5);

        let stored = reload_team(&env.pool, team.team_id).await;
        assert_eq!(stored.current_num, 3);
        assert_eq!(stored.team_status, TeamStatus::Success);
        assert!(stored.success_time.is_some());

        let members = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team.team_id))
            .all(&env.pool)
            .await
            .unwrap();
        assert_eq!(members.len(), 3);
        assert!(members.iter().all(|m| m.status == MemberStatus::Success));

        assert_eq!(team_commissions(&env.pool, team.team_id).await.len(), 3);

        for user_id in joined {
            assert_eq!(env.ledger.balance(user_id).await, INITIAL_BALANCE - GROUP_PRICE);
        }
        for user_id in rejected {
            assert_eq!(env.ledger.balance(user_id).await, INITIAL_BALANCE);
        }
    }

    #[tokio::test]
    async fn test_double_join_rejected() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        let second = env.service.join_team(team.team_id, 1, join_request()).await;
        assert!(matches!(second, Err(AppError::AlreadyJoined)));

        assert_eq!(reload_team(&env.pool, team.team_id).await.current_num, 1);
        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE - GROUP_PRICE);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_no_state() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        env.ledger.fail_debits.store(true, Ordering::SeqCst);
        let result = env.service.join_team(team.team_id, 1, join_request()).await;
        assert!(matches!(result, Err(AppError::InsufficientFunds)));

        assert_eq!(reload_team(&env.pool, team.team_id).await.current_num, 0);
        let members = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team.team_id))
            .count(&env.pool)
            .await
            .unwrap();
        assert_eq!(members, 0);
    }

    /// 建单失败后扣款必须原路退回：前后余额一致
    #[tokio::test]
    async fn test_order_failure_refunds_debit() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        env.orders.fail.store(true, Ordering::SeqCst);
        let result = env.service.join_team(team.team_id, 1, join_request()).await;
        assert!(matches!(result, Err(AppError::OrderCreationFailed(_))));

        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE);
        assert_eq!(reload_team(&env.pool, team.team_id).await.current_num, 0);
        let members = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team.team_id))
            .count(&env.pool)
            .await
            .unwrap();
        assert_eq!(members, 0);
    }

    /// 建单失败叠加退款失败：升级为 CompensationFailed，不静默
    #[tokio::test]
    async fn test_failed_compensation_escalates() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        env.orders.fail.store(true, Ordering::SeqCst);
        env.ledger.fail_credits.store(true, Ordering::SeqCst);

        let result = env.service.join_team(team.team_id, 1, join_request()).await;
        assert!(matches!(result, Err(AppError::CompensationFailed(_))));
    }

    /// 退团退款，人数回退，且可重新参团（取消记录不挡路）
    #[tokio::test]
    async fn test_quit_refunds_and_allows_rejoin() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE - GROUP_PRICE);

        env.service.quit_team(team.team_id, 1).await.unwrap();
        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE);
        assert_eq!(reload_team(&env.pool, team.team_id).await.current_num, 0);

        let rejoined = env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        assert_eq!(rejoined.current_num, 1);
    }

    #[tokio::test]
    async fn test_quit_requires_membership() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        let result = env.service.quit_team(team.team_id, 42).await;
        assert!(matches!(result, Err(AppError::NotAMember)));
    }

    #[tokio::test]
    async fn test_quit_rejected_after_success() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 2).await;
        let team = launch(&env, activity.activity_id).await;

        env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        env.service.join_team(team.team_id, 2, join_request()).await.unwrap();

        let result = env.service.quit_team(team.team_id, 1).await;
        assert!(matches!(result, Err(AppError::TeamNotJoinable(_))));
    }

    /// 两人团只来了一人，过期扫描：团失败、成员取消、恰好退款一次；
    /// 重复扫描不再退款
    #[tokio::test]
    async fn test_expiry_sweep_is_idempotent() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 2).await;
        let team = launch(&env, activity.activity_id).await;

        env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE - GROUP_PRICE);

        expire_team(&env.pool, team.team_id).await;

        let (processed, errors) = env.service.sweep_expired_teams().await.unwrap();
        assert_eq!((processed, errors), (1, 0));

        let stored = reload_team(&env.pool, team.team_id).await;
        assert_eq!(stored.team_status, TeamStatus::Failed);
        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE);

        let members = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team.team_id))
            .all(&env.pool)
            .await
            .unwrap();
        assert!(members.iter().all(|m| m.status == MemberStatus::Cancelled));

        // 第二次扫描什么都不做，余额不会退两次
        let (processed, errors) = env.service.sweep_expired_teams().await.unwrap();
        assert_eq!((processed, errors), (0, 0));
        env.service.fail_team(team.team_id).await.unwrap();
        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE);

        assert!(team_commissions(&env.pool, team.team_id).await.is_empty());
    }

    /// 过期团拒绝参团，并顺手完成失败转移
    #[tokio::test]
    async fn test_expired_team_rejects_join() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        expire_team(&env.pool, team.team_id).await;

        let result = env.service.join_team(team.team_id, 2, join_request()).await;
        assert!(matches!(result, Err(AppError::TeamExpired)));

        let stored = reload_team(&env.pool, team.team_id).await;
        assert_eq!(stored.team_status, TeamStatus::Failed);
        // 先加入的人已退款
        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE);
        // 后来者分文未扣
        assert_eq!(env.ledger.balance(2).await, INITIAL_BALANCE);
    }

    #[tokio::test]
    async fn test_cancel_team_refunds_members() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        env.service.join_team(team.team_id, 2, join_request()).await.unwrap();

        // 非团长不能取消
        let forbidden = env.service.cancel_team(team.team_id, 1, None).await;
        assert!(matches!(forbidden, Err(AppError::Forbidden)));

        env.service
            .cancel_team(team.team_id, LEADER_ID, Some("supply issue".to_string()))
            .await
            .unwrap();

        let stored = reload_team(&env.pool, team.team_id).await;
        assert_eq!(stored.team_status, TeamStatus::Failed);
        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE);
        assert_eq!(env.ledger.balance(2).await, INITIAL_BALANCE);
        assert!(team_commissions(&env.pool, team.team_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_member_refunds_and_decrements() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let team = launch(&env, activity.activity_id).await;

        let joined = env.service.join_team(team.team_id, 1, join_request()).await.unwrap();

        env.service
            .remove_member(team.team_id, joined.member_id, LEADER_ID, None)
            .await
            .unwrap();

        assert_eq!(env.ledger.balance(1).await, INITIAL_BALANCE);
        assert_eq!(reload_team(&env.pool, team.team_id).await.current_num, 0);

        // 之后可以再次参团
        let rejoined = env.service.join_team(team.team_id, 1, join_request()).await.unwrap();
        assert_eq!(rejoined.current_num, 1);
    }

    #[tokio::test]
    async fn test_remove_member_protects_launcher() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;

        let response = env
            .service
            .launch_team(
                LEADER_ID,
                LaunchTeamRequest {
                    activity_id: activity.activity_id,
                    leader_id: None,
                    join_immediately: true,
                    quantity: Some(1),
                    address_id: Some(1),
                    duration_hours: None,
                },
            )
            .await
            .unwrap();
        let launcher_member = response.member.unwrap();

        let result = env
            .service
            .remove_member(response.team.team_id, launcher_member.member_id, LEADER_ID, None)
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_activity_teams_community_priority() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;

        // 另一个社区的团长
        leaders::ActiveModel {
            leader_id: Set(200),
            leader_name: Set("Other Leader".to_string()),
            community_id: Set(2),
            commission_rate_bp: Set(800),
            status: Set(LeaderStatus::Active),
            create_time: Set(Utc::now()),
        }
        .insert(&env.pool)
        .await
        .unwrap();

        let first = launch(&env, activity.activity_id).await;
        let second = env
            .service
            .launch_team(
                200,
                LaunchTeamRequest {
                    activity_id: activity.activity_id,
                    leader_id: None,
                    join_immediately: false,
                    quantity: None,
                    address_id: None,
                    duration_hours: None,
                },
            )
            .await
            .unwrap()
            .team;

        // 社区 2 的访问者看到自己社区的团排在前面
        let listed = env
            .service
            .get_activity_teams(
                activity.activity_id,
                &ActivityTeamsQuery {
                    community_id: Some(2),
                    status: None,
                    include_expired: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].team_id, second.team_id);
        assert_eq!(listed[1].team_id, first.team_id);
    }

    #[tokio::test]
    async fn test_my_teams_newest_first() {
        let env = setup().await;
        let activity = seed_activity(&env.pool, 3).await;
        let first = launch(&env, activity.activity_id).await;
        let second = launch(&env, activity.activity_id).await;

        env.service.join_team(first.team_id, 1, join_request()).await.unwrap();
        env.service.join_team(second.team_id, 1, join_request()).await.unwrap();

        let mine = env.service.get_my_teams(1).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].join_time >= mine[1].join_time);
        assert_eq!(mine[1].team_id, first.team_id);
    }
}
