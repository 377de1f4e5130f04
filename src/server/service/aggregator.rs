//! Consolidated view of the line items of one order.

use crate::server::database::pipeline::{Accumulator, Expr, Pipeline};
use crate::server::database::{filter_eq, from_document, Collection, DocumentStore, StoreError};
use crate::server::model::config::PricingSource;
use crate::server::model::summary::{OrderItemSummary, SummaryOutcome};
use log::warn;

pub(crate) struct OrderItemAggregator<'a, S> {
    store: &'a S,
    pricing: PricingSource,
}

impl<'a, S: DocumentStore> OrderItemAggregator<'a, S> {
    pub fn new(store: &'a S, pricing: PricingSource) -> Self {
        Self { store, pricing }
    }

    /// Match, join food, order and table, project, group, project.
    pub fn pipeline(&self, order_id: &str) -> Pipeline {
        let (amount, price) = match self.pricing {
            PricingSource::Catalog => (Expr::Field("food.price"), Expr::Field("food.price")),
            PricingSource::LineItem => (
                Expr::Multiply(Box::new(Expr::Field("unit_price")), Box::new(Expr::Field("quantity"))),
                Expr::Field("unit_price"),
            ),
        };

        Pipeline::new()
            .match_on(filter_eq("order_id", order_id))
            .left_join(Collection::Food, "food_id", "food_id", "food")
            .left_join(Collection::Order, "order_id", "order_id", "order")
            .left_join(Collection::Table, "order.table_id", "table_id", "table")
            .project(vec![
                ("amount", amount),
                ("food_name", Expr::Field("food.name")),
                ("food_image", Expr::Field("food.food_image")),
                ("table_number", Expr::Field("table.table_number")),
                ("table_id", Expr::Field("table.table_id")),
                ("order_id", Expr::Field("order.order_id")),
                ("price", price),
                ("quantity", Expr::Field("quantity")),
            ])
            .group(
                vec![
                    ("order_id", Expr::Field("order_id")),
                    ("table_id", Expr::Field("table_id")),
                    ("table_number", Expr::Field("table_number")),
                ],
                vec![
                    ("payment_due", Accumulator::Sum(Expr::Field("amount"))),
                    ("total_count", Accumulator::Count),
                    ("order_items", Accumulator::PushRow),
                ],
            )
            .project(vec![
                ("payment_due", Expr::Field("payment_due")),
                ("total_count", Expr::Field("total_count")),
                ("table_number", Expr::Field("_id.table_number")),
                ("order_items", Expr::Field("order_items")),
            ])
    }

    /// Totals of `order_id`, `Empty` when the order has no line items.
    pub async fn summarize(&self, order_id: &str) -> Result<SummaryOutcome, StoreError> {
        let buckets = self.store.aggregate(Collection::OrderItem, &self.pipeline(order_id)).await?;
        if buckets.len() > 1 {
            warn!("order {} summarized into {} buckets, using the first", order_id, buckets.len());
        }
        match buckets.into_iter().next() {
            None => Ok(SummaryOutcome::Empty),
            Some(bucket) => Ok(SummaryOutcome::Summary(from_document::<OrderItemSummary>(bucket)?)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::server::database::memory::MemoryStore;
    use crate::server::database::pipeline::Stage;
    use crate::server::database::to_document;
    use crate::server::model::catalog::{Food, Table};
    use crate::server::model::summary::SummaryRow;
    use serde_json::json;

    pub(crate) async fn seed_catalog(store: &impl DocumentStore) {
        for (id, name, price) in [("F1", "soup", 4.25), ("F2", "bread", 1.5), ("F3", "wine", 9.99)] {
            let food = Food {
                food_id: id.to_string(),
                name: Some(name.to_string()),
                price: Some(price),
                food_image: Some(format!("{}.png", name)),
                menu_id: Some("M1".to_string()),
            };
            store.insert_one(Collection::Food, to_document(&food).unwrap()).await.unwrap();
        }
        let table = Table {
            table_id: "T1".to_string(),
            table_number: Some(7),
            number_of_guests: Some(4),
        };
        store.insert_one(Collection::Table, to_document(&table).unwrap()).await.unwrap();
    }

    pub(crate) const ORDER_DATE: &str = "2024-03-01T12:00:00Z";

    /// order `order_id` at table T1 with (food_id, quantity, unit_price) items
    pub(crate) async fn seed_order(store: &impl DocumentStore, order_id: &str, items: &[(&str, i64, f64)]) {
        let order = json!({
            "_id": order_id,
            "order_id": order_id,
            "table_id": "T1",
            "order_date": ORDER_DATE,
            "created_at": ORDER_DATE,
            "updated_at": ORDER_DATE,
        });
        store.insert_one(Collection::Order, order.as_object().cloned().unwrap()).await.unwrap();
        let items = items
            .iter()
            .map(|(food_id, quantity, unit_price)| {
                json!({"order_id": order_id, "food_id": food_id, "quantity": quantity, "unit_price": unit_price})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect();
        store.insert_many(Collection::OrderItem, items).await.unwrap();
    }

    fn summary(outcome: SummaryOutcome) -> OrderItemSummary {
        match outcome {
            SummaryOutcome::Summary(summary) => summary,
            SummaryOutcome::Empty => panic!("expected a summary"),
        }
    }

    #[tokio::test]
    async fn totals_follow_catalog_prices() {
        let store = MemoryStore::new();
        seed_catalog(&store).await;
        seed_order(&store, "O1", &[("F1", 2, 4.0), ("F2", 1, 1.5), ("F3", 3, 9.99)]).await;
        seed_order(&store, "O2", &[("F3", 1, 9.99)]).await;

        let aggregator = OrderItemAggregator::new(&store, PricingSource::Catalog);
        let summary = summary(aggregator.summarize("O1").await.unwrap());

        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.payment_due, 15.74);
        assert_eq!(summary.table_number, Some(7));
        assert_eq!(
            summary.order_items[0],
            SummaryRow {
                amount: Some(4.25),
                food_name: Some("soup".to_string()),
                food_image: Some("soup.png".to_string()),
                table_number: Some(7),
                table_id: Some("T1".to_string()),
                order_id: Some("O1".to_string()),
                price: Some(4.25),
                quantity: Some(2),
            }
        );
        let names = summary.order_items.iter().map(|r| r.food_name.clone().unwrap()).collect::<Vec<_>>();
        assert_eq!(names, vec!["soup", "bread", "wine"]);
    }

    #[tokio::test]
    async fn line_item_pricing() {
        let store = MemoryStore::new();
        seed_catalog(&store).await;
        seed_order(&store, "O1", &[("F1", 2, 4.0), ("F2", 3, 1.25)]).await;

        let aggregator = OrderItemAggregator::new(&store, PricingSource::LineItem);
        let summary = summary(aggregator.summarize("O1").await.unwrap());

        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.payment_due, 11.75);
        assert_eq!(summary.order_items[0].price, Some(4.0));
        assert_eq!(summary.order_items[0].amount, Some(8.0));
        assert_eq!(summary.order_items[1].amount, Some(3.75));
    }

    #[tokio::test]
    async fn no_items_is_empty() {
        let store = MemoryStore::new();
        seed_catalog(&store).await;
        seed_order(&store, "O1", &[("F1", 1, 4.25)]).await;

        let aggregator = OrderItemAggregator::new(&store, PricingSource::Catalog);

        assert_eq!(aggregator.summarize("O404").await.unwrap(), SummaryOutcome::Empty);
    }

    #[tokio::test]
    async fn unknown_food_counts_as_zero() {
        let store = MemoryStore::new();
        seed_catalog(&store).await;
        seed_order(&store, "O1", &[("F1", 1, 4.25), ("F404", 2, 3.0)]).await;

        let aggregator = OrderItemAggregator::new(&store, PricingSource::Catalog);
        let summary = summary(aggregator.summarize("O1").await.unwrap());

        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.payment_due, 4.25);
        let missing = &summary.order_items[1];
        assert_eq!(missing.food_name, None);
        assert_eq!(missing.food_image, None);
        assert_eq!(missing.price, None);
        assert_eq!(missing.amount, None);
        assert_eq!(missing.quantity, Some(2));
        assert_eq!(missing.table_number, Some(7));
    }

    #[tokio::test]
    async fn order_without_table() {
        let store = MemoryStore::new();
        seed_catalog(&store).await;
        store
            .insert_one(Collection::Order, json!({"order_id": "O1"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        store
            .insert_one(
                Collection::OrderItem,
                json!({"order_id": "O1", "food_id": "F2", "quantity": 1}).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();

        let aggregator = OrderItemAggregator::new(&store, PricingSource::Catalog);
        let summary = summary(aggregator.summarize("O1").await.unwrap());

        assert_eq!(summary.table_number, None);
        assert_eq!(summary.order_items[0].table_id, None);
        assert_eq!(summary.payment_due, 1.5);
    }

    #[tokio::test]
    async fn overflowing_amount_is_an_error() {
        let store = MemoryStore::new();
        seed_catalog(&store).await;
        seed_order(&store, "O1", &[("F1", 9_000_000_000_000_000_000, 1e20)]).await;

        let aggregator = OrderItemAggregator::new(&store, PricingSource::LineItem);

        assert!(matches!(aggregator.summarize("O1").await, Err(StoreError::Overflow { .. })));
    }

    #[tokio::test]
    async fn summarize_is_idempotent() {
        let store = MemoryStore::new();
        seed_catalog(&store).await;
        seed_order(&store, "O1", &[("F1", 1, 4.25), ("F3", 1, 9.99)]).await;

        let aggregator = OrderItemAggregator::new(&store, PricingSource::Catalog);
        let first = aggregator.summarize("O1").await.unwrap();
        let second = aggregator.summarize("O1").await.unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn stage_order() {
        let store = MemoryStore::new();
        let pipeline = OrderItemAggregator::new(&store, PricingSource::Catalog).pipeline("O1");
        let kinds = pipeline
            .stages()
            .iter()
            .map(|stage| match stage {
                Stage::Match(_) => "match".to_string(),
                Stage::LeftJoin { from, .. } => format!("join {}", from),
                Stage::Project(_) => "project".to_string(),
                Stage::Group { .. } => "group".to_string(),
            })
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec!["match", "join food", "join order", "join table", "project", "group", "project"]
        );
    }
}
