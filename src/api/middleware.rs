use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, OriginalUri},
    http::Request,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::observability::{get_metrics, LatencyTimer, RequestContext};

/// Attaches a [`RequestContext`] to the request and records HTTP metrics with
/// the status the handler actually returned.
///
/// Must run after the request-id layer so the context picks up `x-request-id`.
pub async fn request_context_middleware(mut req: Request<Body>, next: Next) -> Response {
    let timer = LatencyTimer::new();

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    // Nested routers see a stripped URI; the log wants the one the client sent.
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let ctx = RequestContext::from_request_data(req.method(), &path, req.headers(), peer);

    let method = ctx.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| ctx.path().to_string());

    req.extensions_mut().insert(ctx);
    let response = next.run(req).await;

    get_metrics().record_http_request(
        &method,
        &route,
        response.status().as_u16(),
        timer.elapsed_ms(),
    );

    response
}
