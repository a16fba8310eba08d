//! Cross-origin handling driven by [`OriginPolicy`].
//!
//! [`cors_layer`] writes the CORS headers and answers every `OPTIONS` request
//! before it reaches a handler. [`origin_gate`] wraps it: a request from a
//! denied origin is refused with `403` and carries no CORS headers, so the
//! browser reports it as blocked, and preflight answers become `204`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{CONTENT_TYPE, ORIGIN},
        request::Parts,
    },
    middleware::{Next, from_fn_with_state},
    response::Response,
};
use qrshare_core::cors::OriginPolicy;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;

use crate::error::ApiError;

/// How long a preflight decision may be cached.
pub const MAX_AGE: Duration = Duration::from_secs(86_400);

/// Error code for requests from a denied origin.
pub const ORIGIN_NOT_ALLOWED: &str = "ORIGIN_NOT_ALLOWED";

/// Whether the request's `Origin` header passes the policy.
///
/// A request without one is same-origin and always passes. A header that is
/// not visible ASCII cannot match a configured origin.
fn origin_allowed(policy: &OriginPolicy, headers: &HeaderMap) -> bool {
    headers.get(ORIGIN).is_none_or(|value| allows(policy, value))
}

fn allows(policy: &OriginPolicy, origin: &HeaderValue) -> bool {
    policy.is_open()
        || origin
            .to_str()
            .is_ok_and(|origin| policy.is_allowed(Some(origin)))
}

/// CORS headers for `policy`.
///
/// An open policy answers with `*`; a restricted one echoes allowed origins.
#[must_use]
pub fn cors_layer(policy: &Arc<OriginPolicy>) -> CorsLayer {
    let allow_origin = if policy.is_open() {
        AllowOrigin::any()
    } else {
        let policy = Arc::clone(policy);
        AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            allows(&policy, origin)
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(MAX_AGE)
}

/// Refuses denied origins and turns preflight answers into `204`.
pub async fn origin_gate(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let is_options = request.method() == Method::OPTIONS;

    if !is_options && !origin_allowed(&policy, request.headers()) {
        debug!(
            method = %request.method(),
            path = %request.uri().path(),
            "request from denied origin refused"
        );
        return ApiError::respond(StatusCode::FORBIDDEN, ORIGIN_NOT_ALLOWED, "Origin not allowed");
    }

    let mut response = next.run(request).await;
    if is_options && response.status().is_success() {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// Applies the origin policy to every route of `router`.
pub fn with_origin_policy<S>(router: Router<S>, policy: Arc<OriginPolicy>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(cors_layer(&policy))
        .layer(from_fn_with_state(policy, origin_gate))
}
