use crate::entities::{ActivityStatus, activity_entity as activities};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateActivityRequest {
    pub product_id: i64,
    pub product_name: String,
    pub group_price_cents: i64,
    pub original_price_cents: i64,
    pub required_num: i32,
    pub max_num: Option<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityQuery {
    pub status: Option<ActivityStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityResponse {
    pub activity_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub group_price_cents: i64,
    pub original_price_cents: i64,
    pub required_num: i32,
    pub max_num: Option<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ActivityStatus,
    pub create_time: DateTime<Utc>,
}

impl From<activities::Model> for ActivityResponse {
    fn from(a: activities::Model) -> Self {
        Self {
            activity_id: a.activity_id,
            product_id: a.product_id,
            product_name: a.product_name,
            group_price_cents: a.group_price_cents,
            original_price_cents: a.original_price_cents,
            required_num: a.required_num,
            max_num: a.max_num,
            start_time: a.start_time,
            end_time: a.end_time,
            status: a.status,
            create_time: a.create_time,
        }
    }
}
