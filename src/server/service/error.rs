use crate::server::database::StoreError;
use derive_more::{Display, Error};

/// Failures of the order and invoice services.
#[derive(Debug, Display, Error)]
pub(crate) enum ServiceError {
    #[display("invalid request: {reason}")]
    Validation { reason: String },
    /// a referenced order, food or table does not exist
    #[display("{what} was not found")]
    DependencyNotFound { what: String },
    #[display("{what} was not found")]
    NotFound { what: String },
    #[display("no order items for order {order_id}")]
    EmptyResult { order_id: String },
    #[display("{source}")]
    Store { source: StoreError },
}

impl ServiceError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ServiceError::Validation { reason: reason.into() }
    }

    pub fn dependency(what: impl Into<String>) -> Self {
        ServiceError::DependencyNotFound { what: what.into() }
    }
}

impl From<StoreError> for ServiceError {
    fn from(source: StoreError) -> Self {
        ServiceError::Store { source }
    }
}
