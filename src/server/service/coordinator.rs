//! Creates an order together with its line items.

use crate::server::database::{filter_eq, from_document, to_document, Collection, DocumentStore};
use crate::server::model::catalog::{Food, Table};
use crate::server::model::order::{NewOrderItem, Order, OrderItem, PostOrderItemsResponse};
use crate::server::service::error::ServiceError;
use crate::server::util::id::new_object_id;
use crate::server::util::price::{round_price, PRICE_PLACES};
use crate::server::util::time::helper::get_utc_now;
use log::{debug, info, warn};
use std::collections::HashSet;

/// Line items accepted in one order, keeps the item batch within one statement.
pub(crate) const MAX_ORDER_ITEMS: usize = 1_000;
pub(crate) const MAX_QUANTITY: i64 = 10_000;
/// Upper bound of a unit price, keeps order totals well inside Decimal range.
pub(crate) const MAX_UNIT_PRICE: f64 = 1_000_000.0;

/// A submitted line item that passed validation, price already rounded.
#[derive(Debug, Clone, PartialEq)]
struct CheckedItem {
    food_id: String,
    quantity: i64,
    unit_price: f64,
}

pub(crate) struct OrderCoordinator<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> OrderCoordinator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Validate, check references, insert the order, then insert its items in one batch.
    ///
    /// Both writes get their own store budget. There is no transaction around
    /// them: when the batch fails the order stays behind without items.
    pub async fn create_order_with_items(
        &self,
        table_id: Option<String>,
        items: Vec<NewOrderItem>,
    ) -> Result<PostOrderItemsResponse, ServiceError> {
        let items = check_items(items)?;
        self.verify_table(table_id.as_deref()).await?;
        self.verify_foods(&items).await?;

        let now = get_utc_now();
        let order_id = new_object_id();
        let order = Order {
            id: order_id.clone(),
            order_id: order_id.clone(),
            table_id,
            order_date: now,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_one(Collection::Order, to_document(&order)?).await?;

        let documents = items
            .into_iter()
            .map(|item| {
                let id = new_object_id();
                to_document(&OrderItem {
                    id: id.clone(),
                    order_item_id: id,
                    order_id: order_id.clone(),
                    food_id: item.food_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    created_at: now,
                    updated_at: now,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match self.store.insert_many(Collection::OrderItem, documents).await {
            Ok(inserted_ids) => {
                info!("order {} created with {} items", order_id, inserted_ids.len());
                Ok(PostOrderItemsResponse { order_id, inserted_ids })
            }
            Err(e) => {
                warn!("order {} was stored without its items, {}", order_id, e);
                Err(e.into())
            }
        }
    }

    async fn verify_table(&self, table_id: Option<&str>) -> Result<(), ServiceError> {
        let Some(table_id) = table_id else {
            return Ok(());
        };
        if table_id.is_empty() {
            return Err(ServiceError::validation("table_id must not be empty"));
        }
        match self.store.find_one(Collection::Table, &filter_eq("table_id", table_id)).await? {
            Some(doc) => {
                let table: Table = from_document(doc)?;
                debug!("ordering for table number {:?}", table.table_number);
                Ok(())
            }
            None => Err(ServiceError::dependency(format!("table {}", table_id))),
        }
    }

    async fn verify_foods(&self, items: &[CheckedItem]) -> Result<(), ServiceError> {
        let mut seen = HashSet::new();
        for item in items.iter().filter(|item| seen.insert(item.food_id.as_str())) {
            let Some(doc) = self.store.find_one(Collection::Food, &filter_eq("food_id", item.food_id.as_str())).await? else {
                return Err(ServiceError::dependency(format!("food {}", item.food_id)));
            };
            let food: Food = from_document(doc)?;
            if food.price != Some(item.unit_price) {
                debug!("food {} listed at {:?}, ordered at {}", item.food_id, food.price, item.unit_price);
            }
        }
        Ok(())
    }
}

fn check_items(items: Vec<NewOrderItem>) -> Result<Vec<CheckedItem>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::validation("order_items must not be empty"));
    }
    if items.len() > MAX_ORDER_ITEMS {
        return Err(ServiceError::validation(format!(
            "order_items must not hold more than {} items",
            MAX_ORDER_ITEMS
        )));
    }
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let invalid = |what: &str| ServiceError::validation(format!("order_items[{}].{}", i, what));
            let food_id = item
                .food_id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| invalid("food_id is required"))?;
            let quantity = item.quantity.ok_or_else(|| invalid("quantity is required"))?;
            if !(1..=MAX_QUANTITY).contains(&quantity) {
                return Err(invalid(&format!("quantity must be between 1 and {}", MAX_QUANTITY)));
            }
            let unit_price = item.unit_price.ok_or_else(|| invalid("unit_price is required"))?;
            if !unit_price.is_finite() || unit_price < 0.0 {
                return Err(invalid("unit_price must not be negative"));
            }
            if unit_price > MAX_UNIT_PRICE {
                return Err(invalid(&format!("unit_price must not exceed {}", MAX_UNIT_PRICE)));
            }
            let unit_price =
                round_price(unit_price, PRICE_PLACES).ok_or_else(|| invalid("unit_price is not a valid price"))?;
            Ok(CheckedItem {
                food_id,
                quantity,
                unit_price,
            })
        })
        .collect()
}
