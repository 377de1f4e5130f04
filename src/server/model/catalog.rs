//! read-only catalog documents
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Food {
    pub food_id: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub food_image: Option<String>,
    pub menu_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Table {
    pub table_id: String,
    pub table_number: Option<i64>,
    pub number_of_guests: Option<i64>,
}
