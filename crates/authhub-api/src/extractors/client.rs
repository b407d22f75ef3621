//! `ClientInfo` extractor: client IP and user agent for auditing and rate limiting.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};

use authhub_auth::ClientContext;

/// Longest IP representation stored (an IPv6 literal).
const MAX_IP_LEN: usize = 45;
/// Longest user agent stored.
const MAX_USER_AGENT_LEN: usize = 512;

/// Client attributes of the current request.
#[derive(Debug, Clone)]
pub struct ClientInfo(pub ClientContext);

impl std::ops::Deref for ClientInfo {
    type Target = ClientContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(ClientContext::new(
            client_ip(&parts.headers, &parts.extensions),
            user_agent(&parts.headers),
        )))
    }
}

/// Number of trusted reverse proxies, installed as a request extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedProxies(pub usize);

/// Client IP used for rate limiting and audit rows.
///
/// Without trusted proxies this is the peer address. With `n` trusted
/// proxies it is the `X-Forwarded-For` entry the outermost one appended,
/// the `n`th from the right. Entries further left are client-supplied.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
    let trusted = extensions.get::<TrustedProxies>().copied().unwrap_or_default();

    let ip = forwarded_client(headers, trusted.0)
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());
    ip.chars().take(MAX_IP_LEN).collect()
}

fn forwarded_client(headers: &HeaderMap, trusted: usize) -> Option<String> {
    if trusted == 0 {
        return None;
    }

    let hops: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();

    hops.get(hops.len().saturating_sub(trusted))
        .map(|hop| hop.to_string())
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .chars()
        .take(MAX_USER_AGENT_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn peer(ip: [u8; 4]) -> Extensions {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from((ip, 5555))));
        extensions
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_forwarded_for_ignored_without_trusted_proxies() {
        let headers = forwarded("203.0.113.9, 10.0.0.1");
        assert_eq!(client_ip(&headers, &peer([192, 0, 2, 4])), "192.0.2.4");
    }

    #[test]
    fn test_trusted_proxy_hop_counts_from_the_right() {
        let headers = forwarded("10.9.9.1, 203.0.113.9, 10.0.0.1");

        let mut one = peer([10, 0, 0, 2]);
        one.insert(TrustedProxies(1));
        assert_eq!(client_ip(&headers, &one), "10.0.0.1");

        let mut two = peer([10, 0, 0, 2]);
        two.insert(TrustedProxies(2));
        assert_eq!(client_ip(&headers, &two), "203.0.113.9");
    }

    #[test]
    fn test_short_forwarded_chain_uses_leftmost_hop() {
        let mut extensions = peer([10, 0, 0, 2]);
        extensions.insert(TrustedProxies(3));
        assert_eq!(
            client_ip(&forwarded("203.0.113.9, 10.0.0.1"), &extensions),
            "203.0.113.9"
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut extensions = peer([192, 0, 2, 4]);
        extensions.insert(TrustedProxies(1));
        assert_eq!(client_ip(&HeaderMap::new(), &extensions), "192.0.2.4");
        assert_eq!(client_ip(&HeaderMap::new(), &Extensions::new()), "unknown");
    }

    #[test]
    fn test_user_agent_is_truncated() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_str(&"a".repeat(600)).unwrap());
        assert_eq!(user_agent(&headers).len(), MAX_USER_AGENT_LEN);
    }
}
