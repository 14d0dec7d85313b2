//! Extractors whose rejections use the JSON error envelope.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::errors::JsonApiError;

pub const PATH_REJECTED: u16 = 3001;
pub const BODY_REJECTED: u16 = 3002;

/// `Path<T>` that answers a malformed segment with [`JsonApiError`].
pub struct JsonPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for JsonPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(JsonPath(value)),
            Err(rejection) => Err(JsonApiError::rejected(rejection.status(), rejection.body_text(), PATH_REJECTED)),
        }
    }
}

/// `Json<T>` body that answers bad JSON or an oversized body with [`JsonApiError`].
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = JsonApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(JsonApiError::rejected(rejection.status(), rejection.body_text(), BODY_REJECTED)),
        }
    }
}
