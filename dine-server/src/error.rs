//! Unified service-layer error type
//!
//! `ServiceError` bridges persistence errors (`StoreError`) and the API-layer
//! error (`AppError`), so services can use `?` on both.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::StoreError;

/// Service-layer error
///
/// - `Store`: persistence/infrastructure errors (logged, mapped to a generic code)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(StoreError::Duplicate(what)) => {
                AppError::with_message(ErrorCode::AlreadyExists, format!("{what} already exists"))
            }
            ServiceError::Store(StoreError::NotFound(what)) => {
                AppError::with_message(ErrorCode::NotFound, format!("{what} not found"))
            }
            ServiceError::Store(store_err @ StoreError::Unavailable(_)) => {
                tracing::error!(error = %store_err, "Store unavailable");
                AppError::new(ErrorCode::DatabaseError)
            }
            ServiceError::Store(store_err @ StoreError::Corrupt(_)) => {
                tracing::error!(error = %store_err, "Stored record failed to decode");
                AppError::new(ErrorCode::InternalError)
            }
            ServiceError::Store(store_err) => {
                tracing::error!(error = %store_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
