use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use matchstats_domain::{ServiceError, ValidationError, fields::FieldMap};
use serde_json::Value;

use crate::ApiError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body of a write request, normalized to a `FieldMap` before any validation runs.
///
/// A form content type is decoded as a form and a JSON content type as a JSON object.
/// Without either, the body is tried as JSON first and as a form second.
pub struct StatPayload(pub FieldMap);

impl<S> FromRequest<S> for StatPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                value
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase()
            });

        let body = Bytes::from_request(req, state).await.map_err(|e| {
            ApiError::from(ServiceError::from(ValidationError::MalformedBody(
                e.body_text(),
            )))
        })?;

        negotiate(content_type.as_deref(), &body)
            .map(StatPayload)
            .map_err(|e| ApiError::from(ServiceError::from(e)))
    }
}

fn is_json(content_type: &str) -> bool {
    content_type == "application/json" || content_type.ends_with("+json")
}

pub fn negotiate(content_type: Option<&str>, body: &[u8]) -> Result<FieldMap, ValidationError> {
    match content_type {
        Some(FORM_CONTENT_TYPE) => Ok(parse_form(body)),
        Some(ct) if is_json(ct) => parse_json(body),
        _ => parse_json(body).or_else(|_| Ok(parse_form(body))),
    }
}

fn parse_json(body: &[u8]) -> Result<FieldMap, ValidationError> {
    serde_json::from_slice::<FieldMap>(body)
        .map_err(|e| ValidationError::MalformedBody(format!("expected a JSON object: {}", e)))
}

fn parse_form(body: &[u8]) -> FieldMap {
    url::form_urlencoded::parse(body)
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}
