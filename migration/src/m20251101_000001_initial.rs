use sea_orm_migration::prelude::*;

/// 拼团活动表（活动模板，管理员创建）
#[derive(DeriveIden)]
enum Activities {
    Table,
    ActivityId,
    ProductId,
    ProductName,
    GroupPriceCents,
    OriginalPriceCents,
    RequiredNum,
    MaxNum,
    StartTime,
    EndTime,
    Status,
    CreateTime,
}

/// 团长表（佣金比例与归属社区来源）
#[derive(DeriveIden)]
enum Leaders {
    Table,
    LeaderId,
    LeaderName,
    CommunityId,
    CommissionRateBp,
    Status,
    CreateTime,
}

/// 团实例表（核心表）
#[derive(DeriveIden)]
enum Teams {
    Table,
    TeamId,
    TeamNo,
    ActivityId,
    LauncherId,
    LeaderId,
    CommunityId,
    RequiredNum,
    CurrentNum,
    TeamStatus,
    SuccessTime,
    ExpireTime,
    CreateTime,
}

/// 参团记录表
///
/// (team_id, user_id) 为普通索引而非唯一索引：已取消的记录永久保留，
/// 退出后重新参团不能被旧记录阻塞，唯一性由引擎在团锁内校验。
#[derive(DeriveIden)]
enum TeamMembers {
    Table,
    MemberId,
    TeamId,
    UserId,
    OrderId,
    IsLauncher,
    Quantity,
    PayAmountCents,
    JoinTime,
    Status,
}

/// 佣金记录表（追加式，按 member_id 唯一）
#[derive(DeriveIden)]
enum CommissionRecords {
    Table,
    CommissionId,
    LeaderId,
    TeamId,
    MemberId,
    OrderId,
    OrderAmountCents,
    CommissionRateBp,
    CommissionAmountCents,
    Status,
    SettledAt,
    CreateTime,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 金额统一使用分 (cents)，佣金比例使用 basis points (10000bp = 100%)。
/// 状态列使用短字符串存储，取值见 entities 中的枚举定义。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 活动表
        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activities::ActivityId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Activities::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activities::ProductName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activities::GroupPriceCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activities::OriginalPriceCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activities::RequiredNum)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Activities::MaxNum).integer())
                    .col(
                        ColumnDef::new(Activities::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activities::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Activities::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Activities::CreateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 团长表
        manager
            .create_table(
                Table::create()
                    .table(Leaders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Leaders::LeaderId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Leaders::LeaderName).string_len(64).not_null())
                    .col(ColumnDef::new(Leaders::CommunityId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Leaders::CommissionRateBp)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Leaders::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Leaders::CreateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 团实例表
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teams::TeamId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teams::TeamNo).string_len(32).not_null())
                    .col(ColumnDef::new(Teams::ActivityId).big_integer().not_null())
                    .col(ColumnDef::new(Teams::LauncherId).big_integer().not_null())
                    .col(ColumnDef::new(Teams::LeaderId).big_integer().not_null())
                    .col(ColumnDef::new(Teams::CommunityId).big_integer())
                    .col(ColumnDef::new(Teams::RequiredNum).integer().not_null())
                    .col(ColumnDef::new(Teams::CurrentNum).integer().not_null())
                    .col(ColumnDef::new(Teams::TeamStatus).string_len(16).not_null())
                    .col(ColumnDef::new(Teams::SuccessTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Teams::ExpireTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Teams::CreateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_teams_team_no")
                    .table(Teams::Table)
                    .col(Teams::TeamNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_teams_activity_id")
                    .table(Teams::Table)
                    .col(Teams::ActivityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_teams_leader_id")
                    .table(Teams::Table)
                    .col(Teams::LeaderId)
                    .to_owned(),
            )
            .await?;

        // 过期扫描走 (team_status, expire_time)
        manager
            .create_index(
                Index::create()
                    .name("idx_teams_status_expire")
                    .table(Teams::Table)
                    .col(Teams::TeamStatus)
                    .col(Teams::ExpireTime)
                    .to_owned(),
            )
            .await?;

        // 参团记录表
        manager
            .create_table(
                Table::create()
                    .table(TeamMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMembers::MemberId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamMembers::TeamId).big_integer().not_null())
                    .col(ColumnDef::new(TeamMembers::UserId).big_integer().not_null())
                    .col(ColumnDef::new(TeamMembers::OrderId).big_integer())
                    .col(ColumnDef::new(TeamMembers::IsLauncher).boolean().not_null())
                    .col(ColumnDef::new(TeamMembers::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(TeamMembers::PayAmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeamMembers::JoinTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeamMembers::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_team_members_team_user")
                    .table(TeamMembers::Table)
                    .col(TeamMembers::TeamId)
                    .col(TeamMembers::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_team_members_user_id")
                    .table(TeamMembers::Table)
                    .col(TeamMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // 佣金记录表
        manager
            .create_table(
                Table::create()
                    .table(CommissionRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommissionRecords::CommissionId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::LeaderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::TeamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::MemberId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommissionRecords::OrderId).big_integer())
                    .col(
                        ColumnDef::new(CommissionRecords::OrderAmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::CommissionRateBp)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::CommissionAmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRecords::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommissionRecords::SettledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(CommissionRecords::CreateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_commission_records_member_id")
                    .table(CommissionRecords::Table)
                    .col(CommissionRecords::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commission_records_leader_id")
                    .table(CommissionRecords::Table)
                    .col(CommissionRecords::LeaderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commission_records_status")
                    .table(CommissionRecords::Table)
                    .col(CommissionRecords::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommissionRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeamMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Leaders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await?;
        Ok(())
    }
}
