//! Invoice creation, payment updates and the invoice view.

use crate::server::database::{filter_eq, from_document, to_document, Collection, Document, DocumentStore, UpdateResult};
use crate::server::model::config::PricingSource;
use crate::server::model::invoice::{
    Invoice, InvoiceView, PatchInvoiceRequest, PostInvoiceRequest, UNSET_PAYMENT_METHOD,
};
use crate::server::model::order::Order;
use crate::server::model::summary::SummaryOutcome;
use crate::server::service::aggregator::OrderItemAggregator;
use crate::server::service::error::ServiceError;
use crate::server::util::id::new_object_id;
use crate::server::util::time::helper::get_utc_now;
use chrono::{SecondsFormat, TimeDelta};
use serde_json::Value;

/// Merges an invoice with the summary of its order.
pub(crate) struct InvoiceViewBuilder<'a, S> {
    store: &'a S,
    aggregator: OrderItemAggregator<'a, S>,
}

impl<'a, S: DocumentStore> InvoiceViewBuilder<'a, S> {
    pub fn new(store: &'a S, pricing: PricingSource) -> Self {
        Self {
            store,
            aggregator: OrderItemAggregator::new(store, pricing),
        }
    }

    pub async fn build(&self, invoice_id: &str) -> Result<InvoiceView, ServiceError> {
        let invoice: Invoice = match self
            .store
            .find_one(Collection::Invoice, &filter_eq("invoice_id", invoice_id))
            .await?
        {
            Some(doc) => from_document(doc)?,
            None => {
                return Err(ServiceError::NotFound {
                    what: format!("invoice {}", invoice_id),
                })
            }
        };

        let summary = match self.aggregator.summarize(&invoice.order_id).await? {
            SummaryOutcome::Summary(summary) => summary,
            SummaryOutcome::Empty => {
                return Err(ServiceError::EmptyResult {
                    order_id: invoice.order_id,
                })
            }
        };

        Ok(InvoiceView {
            invoice_id: invoice.invoice_id,
            order_id: invoice.order_id,
            payment_method: invoice
                .payment_method
                .map_or_else(|| UNSET_PAYMENT_METHOD.to_string(), |method| method.to_string()),
            payment_status: invoice.payment_status,
            payment_due: summary.payment_due,
            table_number: summary.table_number,
            payment_due_date: invoice.payment_due_date,
            order_details: summary.order_items,
        })
    }
}

/// Writes invoices.
pub(crate) struct InvoiceRegistrar<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> InvoiceRegistrar<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// New invoice for an existing order, due one day after the order was placed.
    pub async fn create(&self, req: PostInvoiceRequest) -> Result<String, ServiceError> {
        let order: Order = match self
            .store
            .find_one(Collection::Order, &filter_eq("order_id", req.order_id.as_str()))
            .await?
        {
            Some(doc) => from_document(doc)?,
            None => return Err(ServiceError::dependency(format!("order {}", req.order_id))),
        };

        let now = get_utc_now();
        let invoice_id = new_object_id();
        let invoice = Invoice {
            id: invoice_id.clone(),
            invoice_id: invoice_id.clone(),
            order_id: order.order_id,
            payment_method: req.payment_method,
            payment_status: req.payment_status.unwrap_or_default(),
            payment_due_date: order.created_at + TimeDelta::days(1),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_one(Collection::Invoice, to_document(&invoice)?).await?;
        Ok(invoice_id)
    }

    /// Set the supplied payment fields and bump `updated_at`.
    pub async fn update(&self, invoice_id: &str, req: PatchInvoiceRequest) -> Result<UpdateResult, ServiceError> {
        let mut set = Document::new();
        if let Some(method) = req.payment_method {
            set.insert("payment_method".to_string(), Value::String(method.to_string()));
        }
        if let Some(status) = req.payment_status {
            set.insert("payment_status".to_string(), Value::String(status.to_string()));
        }
        set.insert(
            "updated_at".to_string(),
            Value::String(get_utc_now().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );

        let result = self
            .store
            .update_one(Collection::Invoice, &filter_eq("invoice_id", invoice_id), set, false)
            .await?;
        if result.matched_count == 0 {
            return Err(ServiceError::NotFound {
                what: format!("invoice {}", invoice_id),
            });
        }
        Ok(result)
    }
}
