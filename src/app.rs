//! Router assembly — CRUD routes wrapped in the middleware stack.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::{
    CONTENT_TYPE, HeaderValue, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ApiError, ConfigError};
use crate::jobs::routes::job_routes;
use crate::session::{CollectionStore, SessionLayer};

/// Build the full application router: CRUD routes behind session resolution,
/// CORS, security headers, panic recovery, and request tracing.
pub fn build_router(
    config: &ServerConfig,
    store: Arc<dyn CollectionStore>,
) -> Result<Router, ConfigError> {
    let origin: HeaderValue =
        config
            .client_origin
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "CLIENT_ORIGIN".to_string(),
                message: "not a valid Origin header value".to_string(),
            })?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let trusted_hops = config.trusted_proxy_hops;
    let trace = TraceLayer::new_for_http().make_span_with(move |req: &Request| {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip());
        let client = client_ip(req.headers(), peer, trusted_hops);
        tracing::info_span!(
            "request",
            method = %req.method(),
            uri = %req.uri(),
            client = %client,
        )
    });

    Ok(job_routes(store).layer(
        ServiceBuilder::new()
            .layer(trace)
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(SetResponseHeaderLayer::if_not_present(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ))
            .layer(cors)
            .layer(SessionLayer::new(config)),
    ))
}

/// Terminal handler for uncaught faults: the detail is logged server-side and
/// the client only ever sees the fixed plain-text 500.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::Internal(detail.to_string()).into_response()
}

/// Resolve the client IP behind `trusted_hops` reverse proxies.
///
/// With zero trusted hops the peer address is authoritative. Otherwise the
/// n-th entry from the right of `X-Forwarded-For` is the first address a
/// trusted proxy recorded; anything further left is client-controlled.
pub fn client_ip(headers: &HeaderMap, peer: IpAddr, trusted_hops: usize) -> IpAddr {
    if trusted_hops == 0 {
        return peer;
    }
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').rev().nth(trusted_hops - 1))
        .and_then(|entry| entry.trim().parse().ok())
        .unwrap_or(peer)
}
