//! Per-client rate limiting middleware.
//!
//! Sliding-window limits per client address, sized from `ServerConfig`
//! (60/min and 600/hour by default).

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Extract a rate-limit key from the request. The socket peer is the
/// client unless `trust_forwarded` is set, in which case the first hop of
/// `X-Forwarded-For` (written by the fronting proxy) wins.
fn rate_key(req: &Request<axum::body::Body>, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let forwarded = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return format!("ip:{ip}");
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| format!("ip:{}", addr.ip()))
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Per-client rate limiting. Returns 429 if exceeded.
/// Accesses `ApiContext` from request extensions.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    match limit_inner(req, next).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn limit_inner(req: Request<axum::body::Body>, next: Next) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let key = rate_key(&req, ctx.config.server.trust_forwarded_for);

    // MutexGuard is !Send, drop it before .await
    {
        let mut limiter = ctx
            .rate_limiter
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock".into()))?;

        limiter.check(&key).map_err(|retry_after| {
            tracing::debug!(client = %key, retry_after, "Rate limit hit");
            ApiError::RateLimited { retry_after }
        })?;
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn forwarded_request() -> Request<Body> {
        let mut req = Request::builder()
            .header("X-Forwarded-For", "198.51.100.4, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 5555))));
        req
    }

    #[test]
    fn forwarded_header_ignored_by_default() {
        assert_eq!(rate_key(&forwarded_request(), false), "ip:192.0.2.9");
    }

    #[test]
    fn forwarded_header_used_when_trusted() {
        assert_eq!(rate_key(&forwarded_request(), true), "ip:198.51.100.4");
    }

    #[test]
    fn trusted_without_header_falls_back_to_peer() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 5555))));
        assert_eq!(rate_key(&req, true), "ip:192.0.2.9");
    }

    #[test]
    fn unknown_client_is_anonymous() {
        let req = Request::builder()
            .header("X-Forwarded-For", "198.51.100.4")
            .body(Body::empty())
            .unwrap();
        assert_eq!(rate_key(&req, false), "anonymous");
    }
}
