use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use crate::server::model::summary::SummaryRow;

/// Rendered in place of an unset payment method.
pub(crate) const UNSET_PAYMENT_METHOD: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum PaymentMethod {
    #[display("CARD")]
    Card,
    #[display("CASH")]
    Cash,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum PaymentStatus {
    #[default]
    #[display("PENDING")]
    Pending,
    #[display("PAID")]
    Paid,
}

/// `invoice` document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub invoice_id: String,
    pub order_id: String,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub payment_due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostInvoiceRequest {
    pub order_id: String,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct PostInvoiceResponse {
    pub invoice_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PatchInvoiceRequest {
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
}

/// Invoice merged with the totals of its order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct InvoiceView {
    pub invoice_id: String,
    pub order_id: String,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_due: f64,
    pub table_number: Option<i64>,
    pub payment_due_date: DateTime<Utc>,
    pub order_details: Vec<SummaryRow>,
}
