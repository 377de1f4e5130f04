pub(crate) mod id;
pub(crate) mod price;
pub(crate) mod time;
