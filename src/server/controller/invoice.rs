use crate::server::controller::error::ApiError;
use crate::server::model::invoice::{PatchInvoiceRequest, PostInvoiceRequest, PostInvoiceResponse};
use crate::server::service::invoice::{InvoiceRegistrar, InvoiceViewBuilder};
use crate::server::state::AppState;
use actix_web::{get, patch, post, web, Responder};
use log::info;

#[get("/invoices/{invoice_id}")]
/// invoice merged with the totals of its order
async fn get_invoice(invoice_id: web::Path<String>, data: web::Data<AppState>) -> Result<impl Responder, ApiError> {
    let view = InvoiceViewBuilder::new(data.get_store(), data.get_pricing())
        .build(&invoice_id)
        .await?;
    Ok(web::Json(view))
}

#[post("/invoices")]
async fn post_invoice(req: web::Json<PostInvoiceRequest>, data: web::Data<AppState>) -> Result<impl Responder, ApiError> {
    let invoice_id = InvoiceRegistrar::new(data.get_store()).create(req.into_inner()).await?;
    info!("invoice {} created", invoice_id);
    Ok(web::Json(PostInvoiceResponse { invoice_id }))
}

#[patch("/invoices/{invoice_id}")]
/// record payment method and status
async fn patch_invoice(
    invoice_id: web::Path<String>,
    req: web::Json<PatchInvoiceRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let result = InvoiceRegistrar::new(data.get_store())
        .update(&invoice_id, req.into_inner())
        .await?;
    Ok(web::Json(result))
}

#[cfg(test)]
mod tests {
    use crate::server::controller::configure;
    use crate::server::database::store::Store;
    use crate::server::model::config::PricingSource;
    use crate::server::service::aggregator::tests::{seed_catalog, seed_order};
    use crate::server::state::AppState;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};
    use std::time::Duration;

    async fn seeded_state() -> web::Data<AppState> {
        let state = AppState::new(Store::memory(Duration::from_secs(5)), PricingSource::Catalog);
        seed_catalog(state.get_store()).await;
        seed_order(state.get_store(), "O1", &[("F1", 1, 4.25), ("F3", 2, 9.99)]).await;
        seed_order(state.get_store(), "O2", &[]).await;
        web::Data::new(state)
    }

    #[actix_web::test]
    async fn create_pay_and_view() {
        let app = test::init_service(App::new().app_data(seeded_state().await).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/invoices")
            .set_json(json!({"order_id": "O1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let created: Value = test::read_body_json(resp).await;
        let invoice_id = created["invoice_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/invoices/{}", invoice_id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["payment_method"], json!("null"));
        assert_eq!(view["payment_status"], json!("PENDING"));
        assert_eq!(view["payment_due"], json!(14.24));
        assert_eq!(view["table_number"], json!(7));
        assert_eq!(view["payment_due_date"], json!("2024-03-02T12:00:00Z"));
        assert_eq!(view["order_details"].as_array().map(Vec::len), Some(2));

        let req = test::TestRequest::patch()
            .uri(&format!("/invoices/{}", invoice_id))
            .set_json(json!({"payment_method": "CASH", "payment_status": "PAID"}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated, json!({"matched_count": 1, "modified_count": 1, "upserted_id": null}));

        let req = test::TestRequest::get()
            .uri(&format!("/invoices/{}", invoice_id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["payment_method"], json!("CASH"));
        assert_eq!(view["payment_status"], json!("PAID"));
    }

    #[actix_web::test]
    async fn unknown_references() {
        let app = test::init_service(App::new().app_data(seeded_state().await).configure(configure)).await;

        let req = test::TestRequest::get().uri("/invoices/I404").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/invoices")
            .set_json(json!({"order_id": "O404"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "order O404 was not found"}));

        let req = test::TestRequest::patch()
            .uri("/invoices/I404")
            .set_json(json!({"payment_status": "PAID"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn view_of_order_without_items() {
        let app = test::init_service(App::new().app_data(seeded_state().await).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/invoices")
            .set_json(json!({"order_id": "O2", "payment_method": "CARD"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&format!("/invoices/{}", created["invoice_id"].as_str().unwrap()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "no order items for order O2"}));
    }

    #[actix_web::test]
    async fn rejects_unknown_payment_method() {
        let app = test::init_service(App::new().app_data(seeded_state().await).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/invoices")
            .set_json(json!({"order_id": "O1", "payment_method": "BITCOIN"}))
            .to_request();

        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
