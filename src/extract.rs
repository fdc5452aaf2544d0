use std::convert::Infallible;
use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts, Host};
use axum::http::request::Parts;
use axum::http::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Best-effort address of the client that sent the request.
///
/// Prefers the first `X-Forwarded-For` entry, then the peer address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = first_value(&parts.headers, X_FORWARDED_FOR);
        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };

        let addr = match forwarded {
            Some(addr) => addr.to_owned(),
            None => peer().unwrap_or_else(|| "unknown".to_owned()),
        };
        Ok(ClientAddr(addr))
    }
}

/// Scheme and host the client used to reach us.
///
/// The host is resolved by axum's [`Host`] extractor (`Forwarded`,
/// `X-Forwarded-Host`, `Host`, then the request URI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let scheme = first_value(&parts.headers, X_FORWARDED_PROTO)
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http")
            .to_owned();

        let host = match Host::from_request_parts(parts, state).await {
            Ok(Host(host)) => host,
            Err(_) => "localhost".to_owned(),
        };

        Ok(RequestOrigin { scheme, host })
    }
}

/// First non-empty entry of a comma-separated header.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
