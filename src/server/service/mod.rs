pub(crate) mod aggregator;
pub(crate) mod coordinator;
pub(crate) mod error;
pub(crate) mod invoice;
