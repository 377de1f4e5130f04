use crate::server::database::StoreError;
use crate::server::service::error::ServiceError;
use actix_web::http::StatusCode;
use actix_web::{error, HttpResponse};
use derive_more::{Display, Error};
use log::{error, warn};
use serde::Serialize;

#[derive(Debug, Display, Error)]
pub(crate) enum ApiError {
    #[display("server is busy")]
    ServerIsBusy,
    #[display("invalid request: {reason}")]
    BadRequest { reason: String },
    #[display("{what} was not found")]
    NotFound { what: String },
    #[display("no order items for order {order_id}")]
    EmptyResult { order_id: String },
    #[display("database error")]
    DbError,
    #[display("timeout occurred")]
    Timeout,
}

impl ApiError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        ApiError::BadRequest { reason: reason.into() }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation { reason } => ApiError::BadRequest { reason },
            ServiceError::DependencyNotFound { what } | ServiceError::NotFound { what } => {
                ApiError::NotFound { what }
            }
            ServiceError::EmptyResult { order_id } => ApiError::EmptyResult { order_id },
            ServiceError::Store { source } => source.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Timeout { .. } => {
                warn!("store call timed out, {}", e);
                ApiError::Timeout
            }
            StoreError::Busy => ApiError::ServerIsBusy,
            e => {
                error!("store call failed, {}", e);
                ApiError::DbError
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::ServerIsBusy | ApiError::DbError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } | ApiError::EmptyResult { .. } => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
