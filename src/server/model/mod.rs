pub(crate) mod catalog;
pub(crate) mod config;
pub(crate) mod invoice;
pub(crate) mod order;
pub(crate) mod summary;
