//! Request extractors feeding the access-decision engine.
//!
//! None of these reject: a missing or malformed value becomes an empty app id
//! or a nil account-kind id, and the engine denies it like any other
//! unauthorized request. Request bodies are read as raw bytes and decoded
//! with [`json_body`] only once the decision chain has allowed the call.

use authz::Claims;
use axum::{async_trait, body::Bytes, extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Header naming the calling application.
pub const APP_ID_HEADER: &str = "appid";

/// Header carrying an account-kind id for calls made before a token exists.
pub const ACCOUNT_KIND_HEADER: &str = "x-account-type-id";

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

/// The calling application's id; empty when the header is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AppId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            header_str(parts, APP_ID_HEADER)
                .unwrap_or_default()
                .to_string(),
        ))
    }
}

/// Claims the authentication layer attached to the request, if any.
#[derive(Debug, Clone, Default)]
pub struct Principal(pub Option<Claims>);

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Claims>().cloned()))
    }
}

/// Account-kind id set by the upstream identity service; nil when absent or unparsable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountKindHeader(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AccountKindHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_str(parts, ACCOUNT_KIND_HEADER)
            .and_then(|value| Uuid::parse_str(value).ok())
            .unwrap_or_else(Uuid::nil);
        Ok(Self(id))
    }
}

/// Parses a path id, falling back to nil so authorization still runs first.
pub fn path_id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::nil())
}

/// Decodes a JSON request body; a malformed body is a 400.
pub fn json_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::ValidationError(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz::AccountKind;
    use axum::{body::Body, http::Request};

    fn head(request: Request<Body>) -> Parts {
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_app_id_header() {
        let mut parts = head(
            Request::builder()
                .header("AppId", "mobile-1")
                .body(Body::empty())
                .unwrap(),
        );
        let app_id = AppId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(app_id, AppId("mobile-1".to_string()));
    }

    #[tokio::test]
    async fn test_missing_app_id_is_empty() {
        let mut parts = head(Request::builder().body(Body::empty()).unwrap());
        let app_id = AppId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(app_id.0, "");
    }

    #[tokio::test]
    async fn test_principal_from_extensions() {
        let claims = Claims::for_subject(Uuid::new_v4(), AccountKind::User.id());
        let mut request = Request::builder().body(Body::empty()).unwrap();
        request.extensions_mut().insert(claims.clone());

        let mut parts = head(request);
        let principal = Principal::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(principal.0, Some(claims));
    }

    #[tokio::test]
    async fn test_account_kind_header() {
        let mut parts = head(
            Request::builder()
                .header(ACCOUNT_KIND_HEADER, AccountKind::Operator.id().to_string())
                .body(Body::empty())
                .unwrap(),
        );
        let kind = AccountKindHeader::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(kind.0, AccountKind::Operator.id());

        let mut parts = head(
            Request::builder()
                .header(ACCOUNT_KIND_HEADER, "Operator")
                .body(Body::empty())
                .unwrap(),
        );
        let kind = AccountKindHeader::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(kind.0, Uuid::nil());
    }

    #[test]
    fn test_path_id() {
        let id = Uuid::new_v4();
        assert_eq!(path_id(&id.to_string()), id);
        assert_eq!(path_id("latest"), Uuid::nil());
    }

    #[test]
    fn test_json_body() {
        let request: crate::models::UpdateBookRequest =
            json_body(&Bytes::from_static(br#"{"title":"Dune"}"#)).unwrap();
        assert_eq!(request.title, "Dune");

        let err = json_body::<crate::models::UpdateBookRequest>(&Bytes::from_static(b"{"))
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }
}
