use serde::{Deserialize, Serialize};

/// One joined line item.
///
/// Fields coming from a join are absent when the join found nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SummaryRow {
    pub amount: Option<f64>,
    pub food_name: Option<String>,
    pub food_image: Option<String>,
    pub table_number: Option<i64>,
    pub table_id: Option<String>,
    pub order_id: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
}

/// Totals of one order, the response of `GET /orderItems-order/{order_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct OrderItemSummary {
    pub payment_due: f64,
    pub total_count: u64,
    pub table_number: Option<i64>,
    pub order_items: Vec<SummaryRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SummaryOutcome {
    /// the order has no line items
    Empty,
    Summary(OrderItemSummary),
}
