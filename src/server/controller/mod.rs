pub(crate) mod error;
pub(crate) mod invoice;
pub(crate) mod order_item;

use crate::server::controller::error::ApiError;
use actix_web::web;

/// Routes of the back office api.
pub(crate) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()))
        .service(order_item::get_order_summary)
        .service(order_item::post_order_items)
        .service(invoice::get_invoice)
        .service(invoice::post_invoice)
        .service(invoice::patch_invoice);
}
