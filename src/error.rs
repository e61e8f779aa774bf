use crate::models::ApiResponse;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Activity not found")]
    ActivityNotFound,

    #[error("Activity is not ongoing")]
    ActivityNotOngoing,

    #[error("Team not found")]
    TeamNotFound,

    #[error("Team is not joinable: {0}")]
    TeamNotJoinable(String),

    #[error("Team is full")]
    TeamFull,

    #[error("Team has expired")]
    TeamExpired,

    #[error("Team has already failed")]
    TeamAlreadyFailed,

    #[error("Already joined this team")]
    AlreadyJoined,

    #[error("Not a member of this team")]
    NotAMember,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Order creation failed: {0}")]
    OrderCreationFailed(String),

    #[error("Upstream call timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Compensation failed, manual reconciliation required: {0}")]
    CompensationFailed(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// 稳定错误码，客户端按 code 分支而不是解析 message
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ActivityNotFound => "ACTIVITY_NOT_FOUND",
            AppError::ActivityNotOngoing => "ACTIVITY_NOT_ONGOING",
            AppError::TeamNotFound => "TEAM_NOT_FOUND",
            AppError::TeamNotJoinable(_) => "TEAM_NOT_JOINABLE",
            AppError::TeamFull => "TEAM_FULL",
            AppError::TeamExpired => "TEAM_EXPIRED",
            AppError::TeamAlreadyFailed => "TEAM_ALREADY_FAILED",
            AppError::AlreadyJoined => "ALREADY_JOINED",
            AppError::NotAMember => "NOT_A_MEMBER",
            AppError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            AppError::OrderCreationFailed(_) => "ORDER_CREATION_FAILED",
            AppError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            AppError::CompensationFailed(_) => "COMPENSATION_FAILED",
            AppError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            AppError::ConfigError(_) => "CONFIG_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::JwtError(_) => "AUTH_ERROR",
            AppError::ReqwestError(_) => "EXTERNAL_API_ERROR",
            AppError::SerdeJsonError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotFound(_)
            | AppError::ActivityNotFound
            | AppError::TeamNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            // 团锁内检测到的冲突：无任何部分变更，调用方换个动作即可重试
            AppError::ActivityNotOngoing
            | AppError::TeamNotJoinable(_)
            | AppError::TeamFull
            | AppError::TeamExpired
            | AppError::TeamAlreadyFailed
            | AppError::AlreadyJoined
            | AppError::NotAMember => (StatusCode::CONFLICT, self.to_string()),
            AppError::InsufficientFunds => (StatusCode::PAYMENT_REQUIRED, self.to_string()),
            AppError::OrderCreationFailed(msg) => {
                log::error!("Order creation failed: {msg}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            // 超时后结果未知：提示调用方先查询状态，不要盲目重试
            AppError::UpstreamTimeout(what) => {
                log::error!("Upstream call timed out: {what}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Upstream timeout, re-query state before retrying".to_string(),
                )
            }
            AppError::CompensationFailed(msg) => {
                log::error!("ALERT compensation failed: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => {
                log::error!("External API error: {self}");
                (StatusCode::BAD_GATEWAY, "External service error".to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(ApiResponse::<()>::error(self.code(), message))
    }
}
