use crate::config::OrderFactoryConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const CODE_OK: i32 = 200;

/// 新订单参数（商品信息为参团时刻的快照）
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub user_id: i64,
    pub leader_id: i64,
    pub address_id: i64,
    pub activity_id: i64,
    pub team_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_amount_cents: i64,
}

/// 订单服务（外部）：为参团记录创建关联订单
#[async_trait::async_trait]
pub trait OrderFactory: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> AppResult<i64>;
}

#[derive(Debug, Deserialize)]
struct OrderReply {
    code: i32,
    message: Option<String>,
    data: Option<i64>,
}

#[derive(Clone)]
pub struct HttpOrderFactory {
    client: Client,
    config: OrderFactoryConfig,
}

impl HttpOrderFactory {
    pub fn new(config: OrderFactoryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl OrderFactory for HttpOrderFactory {
    async fn create_order(&self, order: NewOrder) -> AppResult<i64> {
        let url = format!("{}/internal/orders", self.config.base_url);

        let response = self.client.post(&url).json(&order).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Order creation failed: status={status}, body={error_text}");
            return Err(AppError::OrderCreationFailed(format!(
                "Order service returned {status}"
            )));
        }

        let reply: OrderReply = response.json().await?;
        if reply.code != CODE_OK {
            return Err(AppError::OrderCreationFailed(format!(
                "Order service error {}: {}",
                reply.code,
                reply.message.unwrap_or_default()
            )));
        }

        reply
            .data
            .ok_or_else(|| AppError::OrderCreationFailed("Order service returned no id".to_string()))
    }
}
