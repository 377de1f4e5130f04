use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `order` document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub order_id: String,
    pub table_id: Option<String>,
    pub order_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `orderItem` document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct OrderItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub order_item_id: String,
    pub order_id: String,
    pub food_id: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostOrderItemsRequest {
    pub table_id: Option<String>,
    #[serde(default)]
    pub order_items: Vec<NewOrderItem>,
}

/// Line item as submitted, fields are checked by the coordinator.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct NewOrderItem {
    pub food_id: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct PostOrderItemsResponse {
    pub order_id: String,
    pub inserted_ids: Vec<String>,
}
