pub mod jwt;
pub mod team_no;

pub use jwt::*;
pub use team_no::generate_unique_team_no;
