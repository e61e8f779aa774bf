pub mod activities;
pub mod commission_records;
pub mod leaders;
pub mod team_members;
pub mod teams;

pub use activities as activity_entity;
pub use commission_records as commission_record_entity;
pub use leaders as leader_entity;
pub use team_members as team_member_entity;
pub use teams as team_entity;

pub use activities::ActivityStatus;
pub use commission_records::SettlementStatus;
pub use leaders::LeaderStatus;
pub use team_members::MemberStatus;
pub use teams::TeamStatus;
