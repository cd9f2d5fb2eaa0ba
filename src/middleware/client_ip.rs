//! IP del cliente
//!
//! La clave del rate limiter es la dirección del peer TCP. `X-Forwarded-For`
//! sólo se tiene en cuenta cuando el peer es uno de los proxies de
//! `TRUSTED_PROXIES`; en ese caso se toma la entrada más a la derecha que no
//! sea otro proxy de confianza. Si no se puede resolver se entrega `None` y el
//! rate limiter de reservas deja pasar la petición.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use tracing::debug;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // También resuelve `MockConnectInfo` en los tests
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientIp(resolve_client_ip(
            &parts.headers,
            peer,
            &state.config.trusted_proxies,
        )))
    }
}

/// IP efectiva de la petición según el peer y la lista de proxies de confianza
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trusted_proxies: &[IpAddr],
) -> Option<IpAddr> {
    let peer = peer?;
    if !trusted_proxies.contains(&peer) {
        if headers.contains_key("x-forwarded-for") {
            debug!(peer = %peer, "Ignoring X-Forwarded-For from untrusted peer");
        }
        return Some(peer);
    }

    let chain = forwarded_chain(headers);
    chain
        .iter()
        .rev()
        .find(|ip| !trusted_proxies.contains(*ip))
        .or_else(|| chain.first())
        .copied()
        .or(Some(peer))
}

fn forwarded_chain(headers: &HeaderMap) -> Vec<IpAddr> {
    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|entry| entry.trim().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::http::{HeaderValue, Request};

    use crate::config::EnvironmentConfig;
    use crate::repositories::MemoryStore;
    use crate::services::SystemClock;

    fn ip(raw: &str) -> IpAddr {
        raw.parse().unwrap()
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_untrusted_peer_header_is_ignored() {
        let peer = Some(ip("1.2.3.4"));
        assert_eq!(resolve_client_ip(&forwarded("9.9.9.1"), peer, &[]), peer);
        assert_eq!(resolve_client_ip(&forwarded("9.9.9.2"), peer, &[]), peer);
    }

    #[test]
    fn test_trusted_proxy_uses_rightmost_untrusted_entry() {
        let trusted = [ip("10.0.0.1"), ip("10.0.0.2")];
        let headers = forwarded("6.6.6.6, 203.0.113.7, 10.0.0.2");
        assert_eq!(
            resolve_client_ip(&headers, Some(ip("10.0.0.1")), &trusted),
            Some(ip("203.0.113.7"))
        );
    }

    #[test]
    fn test_trusted_proxy_without_header_falls_back_to_peer() {
        let trusted = [ip("10.0.0.1")];
        assert_eq!(
            resolve_client_ip(&HeaderMap::new(), Some(ip("10.0.0.1")), &trusted),
            Some(ip("10.0.0.1"))
        );
        assert_eq!(
            resolve_client_ip(&forwarded("unknown"), Some(ip("10.0.0.1")), &trusted),
            Some(ip("10.0.0.1"))
        );
    }

    #[test]
    fn test_no_peer_resolves_nothing() {
        assert_eq!(resolve_client_ip(&forwarded("9.9.9.1"), None, &[]), None);
    }

    #[tokio::test]
    async fn test_extractor_keys_on_peer_for_spoofed_headers() {
        let state = AppState::new(
            EnvironmentConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
        )
        .unwrap();
        let peer = SocketAddr::from(([1, 2, 3, 4], 5000));

        for spoofed in ["9.9.9.1", "9.9.9.2"] {
            let (mut parts, _) = Request::builder()
                .header("x-forwarded-for", spoofed)
                .extension(ConnectInfo(peer))
                .body(())
                .unwrap()
                .into_parts();

            let ClientIp(key) = ClientIp::from_request_parts(&mut parts, &state).await.unwrap();
            assert_eq!(key, Some(peer.ip()));
        }
    }
}
