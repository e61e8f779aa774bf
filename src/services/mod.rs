pub mod activity_service;
pub mod commission_service;
pub mod team_lock;
pub mod team_service;

pub use activity_service::*;
pub use commission_service::*;
pub use team_lock::*;
pub use team_service::*;
