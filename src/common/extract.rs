// Extratores que devolvem erro no mesmo formato JSON do resto da API
// (o Json/Query do axum respondem 422/400 em texto puro).

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header, request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;

use crate::{common::error::ApiError, middleware::i18n::Locale};

pub struct JsonBody<T>(pub T);

pub struct QueryParams<T>(pub T);

fn malformed(locale: &Locale, detail: String) -> ApiError {
    let message = if locale.is_english() {
        "Malformed request."
    } else {
        "Requisição malformada."
    };
    ApiError {
        status: StatusCode::BAD_REQUEST,
        message: message.to_string(),
        errors: Some(vec![detail]),
    }
}

fn locale_of(headers: &axum::http::HeaderMap) -> Locale {
    Locale::from_header(
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok()),
    )
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let locale = locale_of(req.headers());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(malformed(&locale, rejection.body_text())),
        }
    }
}

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = locale_of(&parts.headers);
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(malformed(&locale, rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status::StatusPayload;
    use axum::body::Body;

    #[tokio::test]
    async fn unknown_status_value_is_a_bad_request() {
        let req = Request::builder()
            .method("PATCH")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"archived"}"#))
            .unwrap();

        let err = match JsonBody::<StatusPayload>::from_request(req, &()).await {
            Err(err) => err,
            Ok(_) => panic!("status desconhecido deveria falhar"),
        };
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.errors.is_some());
    }

    #[tokio::test]
    async fn valid_body_is_parsed() {
        let req = Request::builder()
            .method("PATCH")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"inactive"}"#))
            .unwrap();

        let JsonBody(payload) = match JsonBody::<StatusPayload>::from_request(req, &()).await {
            Ok(body) => body,
            Err(err) => panic!("falhou: {}", err.message),
        };
        assert_eq!(payload.status, crate::models::status::EntityStatus::Inactive);
    }
}
