use crate::server::controller::error::ApiError;
use crate::server::model::order::PostOrderItemsRequest;
use crate::server::model::summary::SummaryOutcome;
use crate::server::service::aggregator::OrderItemAggregator;
use crate::server::service::coordinator::OrderCoordinator;
use crate::server::state::AppState;
use actix_web::{get, post, web, Responder};

#[get("/orderItems-order/{order_id}")]
/// consolidated line items of an order
async fn get_order_summary(
    order_id: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let order_id = order_id.into_inner();
    match OrderItemAggregator::new(data.get_store(), data.get_pricing())
        .summarize(&order_id)
        .await?
    {
        SummaryOutcome::Summary(summary) => Ok(web::Json(summary)),
        SummaryOutcome::Empty => Err(ApiError::EmptyResult { order_id }),
    }
}

#[post("/orderItems")]
/// place an order with its line items
async fn post_order_items(
    req: web::Json<PostOrderItemsRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let PostOrderItemsRequest { table_id, order_items } = req.into_inner();
    let created = OrderCoordinator::new(data.get_store())
        .create_order_with_items(table_id, order_items)
        .await?;
    Ok(web::Json(created))
}
