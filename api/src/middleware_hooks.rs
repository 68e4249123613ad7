use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info};

use crate::AppState;

pub const VERSION_HEADER: HeaderName = HeaderName::from_static("x-bookshelf-version");

/// Request processing middleware hook
///
/// Logs each request with the calling application and how long the handler
/// chain took. Authorization itself happens in the handlers, where the
/// endpoint and any resource ids are known.
pub async fn request_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let app_id = request
        .headers()
        .get(crate::extract::APP_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let start = Instant::now();

    debug!("REQUEST MIDDLEWARE: {} {} from app {}", method, uri, app_id);

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        app_id,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

/// Response processing middleware hook
///
/// Stamps every response with the server version.
pub async fn response_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}
