use crate::config::AccountLedgerConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// 账户服务的余额不足结果码
const CODE_INSUFFICIENT_BALANCE: i32 = 1501;
const CODE_OK: i32 = 200;

/// 用户余额账本（外部账户服务）
///
/// 单次 debit/credit 在账户服务内部原子执行；并发扣减同一用户
/// 由账户服务自行串行化，本服务将其当作黑盒。
#[async_trait::async_trait]
pub trait AccountLedger: Send + Sync {
    /// 扣减余额，余额不足返回 `InsufficientFunds`
    async fn debit(&self, user_id: i64, amount_cents: i64) -> AppResult<()>;

    /// 增加余额（退款/佣金入账）
    async fn credit(&self, user_id: i64, amount_cents: i64) -> AppResult<()>;
}

#[derive(Debug, Deserialize)]
struct LedgerReply {
    code: i32,
    message: Option<String>,
}

#[derive(Clone)]
pub struct HttpAccountLedger {
    client: Client,
    config: AccountLedgerConfig,
}

impl HttpAccountLedger {
    pub fn new(config: AccountLedgerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn post_amount(&self, path: &str, user_id: i64, amount_cents: i64) -> AppResult<()> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "user_id": user_id,
                "amount_cents": amount_cents,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Account ledger call failed: {path}, status={status}, body={error_text}");
            return Err(AppError::ExternalApiError(format!(
                "Account ledger returned {status}"
            )));
        }

        let reply: LedgerReply = response.json().await?;
        match reply.code {
            CODE_OK => Ok(()),
            CODE_INSUFFICIENT_BALANCE => Err(AppError::InsufficientFunds),
            code => Err(AppError::ExternalApiError(format!(
                "Account ledger error {code}: {}",
                reply.message.unwrap_or_default()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl AccountLedger for HttpAccountLedger {
    async fn debit(&self, user_id: i64, amount_cents: i64) -> AppResult<()> {
        self.post_amount("/internal/account/debit", user_id, amount_cents)
            .await
    }

    async fn credit(&self, user_id: i64, amount_cents: i64) -> AppResult<()> {
        self.post_amount("/internal/account/credit", user_id, amount_cents)
            .await
    }
}
