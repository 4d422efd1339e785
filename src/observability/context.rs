use axum::extract::{ConnectInfo, FromRequestParts};
use http::{request::Parts, HeaderMap, Method, StatusCode};
use std::convert::Infallible;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the client-visible correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header set by reverse proxies with the original client chain.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Client IP reported when the request context exists but has no usable address.
pub const IP_UNRESOLVED: &str = "CLI";

/// Server-generated identity of one in-flight request. Keys the timing registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Arc::from(id.into()))
    }

    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the request logger needs to know about the current HTTP request.
///
/// Built once per request by the context middleware and handed to handlers
/// through request extensions. Every accessor returns a usable value; missing
/// pieces fall back to defaults instead of failing.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    correlation_id: Option<String>,
    method: Method,
    path: String,
    peer_addr: Option<SocketAddr>,
    forwarded_for: Option<String>,
    status: Option<StatusCode>,
}

impl RequestContext {
    pub fn new(request_id: RequestId, method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id,
            correlation_id: None,
            method,
            path: path.into(),
            peer_addr: None,
            forwarded_for: None,
            status: None,
        }
    }

    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    pub fn with_correlation_id(mut self, value: impl Into<String>) -> Self {
        self.correlation_id = Some(value.into());
        self
    }

    pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
        self.forwarded_for = Some(value.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds a context from request parts, reading the peer address from
    /// axum's `ConnectInfo` when the server was started with it.
    pub fn from_parts(parts: &Parts) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self::from_request_data(&parts.method, parts.uri.path(), &parts.headers, peer)
    }

    /// The request identity is always generated here. A client-sent
    /// `x-request-id` is kept only as the correlation id, so two requests
    /// carrying the same header never share a timing entry.
    pub fn from_request_data(
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        peer_addr: Option<SocketAddr>,
    ) -> Self {
        let forwarded_for = headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let correlation_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Self {
            request_id: RequestId::generate(),
            correlation_id,
            method: method.clone(),
            path: path.to_string(),
            peer_addr,
            forwarded_for,
            status: None,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// The `x-request-id` the request arrived with, if any.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    pub fn path(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Resolves the originating client address.
    ///
    /// The first entry of `X-Forwarded-For` wins over the socket peer. Returns
    /// [`IP_UNRESOLVED`] when neither source yields an address.
    pub fn client_ip(&self) -> String {
        if let Some(first) = self
            .forwarded_for
            .as_deref()
            .and_then(|chain| chain.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return first.to_string();
        }

        self.peer_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| IP_UNRESOLVED.to_string())
    }

    fn peer_ip(&self) -> Option<IpAddr> {
        self.peer_addr.map(|addr| addr.ip())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_parts(parts)))
    }
}
