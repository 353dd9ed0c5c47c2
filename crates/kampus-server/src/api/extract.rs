//! Request extractors that turn framework rejections into envelope errors.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::ServerError;

/// A JSON body that has been deserialized and passed `validator` checks.
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| ServerError::BadRequest(describe(&errors)))?;
        Ok(Payload(value))
    }
}

/// Query-string parameters.
pub struct Params<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
        Ok(Params(value))
    }
}

/// Parse a path identifier, rejecting malformed ids with 400.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServerError::BadRequest(format!("Invalid {what} id")))
}

/// One readable sentence per failing field, in a stable order.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.dedup();
    messages.join("; ")
}
