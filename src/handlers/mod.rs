pub mod activity;
pub mod commission;
pub mod team;

pub use activity::activity_config;
pub use commission::commission_config;
pub use team::team_config;

use crate::error::AppError;
use crate::middlewares::AuthUser;
use actix_web::{HttpMessage, HttpRequest};

/// 从请求扩展里取出认证中间件写入的用户信息
pub(crate) fn current_user(req: &HttpRequest) -> Result<AuthUser, AppError> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing authenticated user".to_string()))
}
