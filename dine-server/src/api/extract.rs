//! Request body extractor
//!
//! `axum::Json` answers malformed bodies with plain-text 400/415/422
//! responses. [`ValidJson`] folds those rejections into the JSON error
//! envelope with `InvalidFormat`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, OptionalFromRequest, Request};
use serde::de::DeserializeOwned;
use shared::error::AppError;

/// JSON body whose rejection is an [`AppError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        <Json<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map(|Json(value)| ValidJson(value))
            .map_err(rejection_to_error)
    }
}

/// `Option<ValidJson<T>>`: `None` when the request carries no JSON body
impl<S, T> OptionalFromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        <Json<T> as OptionalFromRequest<S>>::from_request(req, state)
            .await
            .map(|body| body.map(|Json(value)| ValidJson(value)))
            .map_err(rejection_to_error)
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let reason = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "content-type",
        JsonRejection::JsonSyntaxError(_) => "syntax",
        JsonRejection::JsonDataError(_) => "data",
        _ => "body",
    };
    tracing::debug!(reason, error = %rejection.body_text(), "Rejected request body");
    AppError::invalid_format(rejection.body_text()).with_detail("reason", reason)
}
