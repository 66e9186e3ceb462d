//! Body extractors whose rejections go through `AppError`, so a malformed
//! submission gets the same JSON error body as any other validation failure.

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// FormBody
///
/// `application/x-www-form-urlencoded` body, decoded like `axum::Form`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBody<T>(pub T);

impl<S, T> FromRequest<S> for FormBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Form::<T>::from_request(req, state)
            .await
            .map(|Form(value)| FormBody(value))
            .map_err(|rejection| {
                tracing::debug!("form rejected: {}", rejection.body_text());
                AppError::validation(rejection.body_text())
            })
    }
}

/// JsonBody
///
/// JSON body for the admin endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| JsonBody(value))
            .map_err(|rejection| AppError::validation(rejection.body_text()))
    }
}
