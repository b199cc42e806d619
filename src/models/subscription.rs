use crate::entities::subscriptions;
use crate::utils::format_month_year;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Missing fields decode to their empty value and are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(default)]
pub struct CreateSubscriptionRequest {
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[schema(example = 400)]
    pub price: i32,
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,
    #[schema(example = "07-2025")]
    pub start_date: String,
    #[schema(example = "12-2025")]
    pub end_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(default)]
pub struct UpdateSubscriptionRequest {
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[schema(example = 500)]
    pub price: i32,
    #[schema(example = "07-2025")]
    pub start_date: String,
    #[schema(example = "06-2026")]
    pub end_date: String,
}

/// A validated subscription ready to be stored. Dates are still `MM-YYYY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    pub start_date: String,
    pub end_date: String,
}

impl NewSubscription {
    pub fn from_request(id: Uuid, request: CreateSubscriptionRequest) -> Self {
        Self {
            id,
            service_name: request.service_name,
            price: request.price,
            user_id: request.user_id,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SubscriptionResponse {
    pub id: String,
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    #[schema(example = "07-2025")]
    pub start_date: String,
    #[schema(example = "12-2025")]
    pub end_date: String,
}

impl From<subscriptions::Model> for SubscriptionResponse {
    fn from(m: subscriptions::Model) -> Self {
        Self {
            id: m.id.to_string(),
            service_name: m.service_name,
            price: m.price,
            user_id: m.user_id,
            start_date: format_month_year(&m.start_date),
            end_date: format_month_year(&m.end_date),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IdResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListSubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SumSubscriptionsResponse {
    pub sum: i64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SumQuery {
    /// Only sum this user's subscriptions
    pub user_id: Option<String>,
    /// First month of the window, `MM-YYYY`
    pub start_date: Option<String>,
    /// Last month of the window (inclusive), `MM-YYYY`
    pub end_date: Option<String>,
    /// Only sum subscriptions to this service
    pub service_name: Option<String>,
}

/// Store-level filter for the cost sum. `None` means "no filter".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumFilter {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
    pub start_date: String,
    pub end_date: String,
}
