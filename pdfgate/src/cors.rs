//! Origin policy.
//!
//! The allow-list is an immutable configuration set queried per request;
//! origins are compared as exact strings. Allowed origins get the full header
//! bundle (exact-origin echo, `Vary: Origin`, permitted methods and request
//! headers); everything else gets no cross-origin headers at all. The
//! middleware sits outermost on the router so success responses, error
//! responses, and the 404 fallback all carry the bundle, and it answers every
//! `OPTIONS` request directly with `204 No Content` before routing.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Compute the CORS header bundle for a request origin.
fn bundle(allowed_origins: &[String], origin: Option<&HeaderValue>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let Some(origin) = origin else {
        return headers;
    };
    let Ok(origin_str) = origin.to_str() else {
        return headers;
    };
    if !allowed_origins.iter().any(|allowed| allowed == origin_str) {
        return headers;
    }

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    headers
}

/// Apply the origin policy to every request.
pub async fn origin_policy_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let cors = bundle(&state.config.cors.allowed_origins, request.headers().get(header::ORIGIN));

    // Preflight and any other OPTIONS short-circuit before routing
    if request.method() == Method::OPTIONS {
        let mut response = axum::http::StatusCode::NO_CONTENT.into_response();
        response.headers_mut().extend(cors);
        return response;
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(cors);
    response
}
