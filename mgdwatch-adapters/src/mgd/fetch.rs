//! HTTP retrieval of the raw status body.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::AdapterError;

/// Port assumed when a server address carries none.
pub const DEFAULT_PORT: u16 = 50000;

/// Address polled when no servers are configured.
pub const DEFAULT_ADDRESS: &str = ":50000";

/// Ceiling for a whole fetch: connect, request and body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Append the default port unless `address` already has one.
///
/// Follows host:port splitting rules: a bracketed IPv6 host needs a trailing
/// `:port`; otherwise exactly one `:` marks a port.
pub fn normalize_address(address: &str) -> String {
    if has_port(address) {
        address.to_string()
    } else {
        format!("{}:{}", address, DEFAULT_PORT)
    }
}

fn has_port(address: &str) -> bool {
    match address.strip_prefix('[') {
        Some(rest) => rest
            .find(']')
            .map(|end| rest[end + 1..].starts_with(':'))
            .unwrap_or(false),
        None => address.matches(':').count() == 1,
    }
}

/// URL of the status document for a normalized address.
///
/// An empty host (`:50000`) means the local machine.
pub fn status_url(address: &str) -> String {
    if address.starts_with(':') {
        format!("http://localhost{}/", address)
    } else {
        format!("http://{}/", address)
    }
}

/// Performs one GET per call against an mgd status endpoint. Never retries.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with the fixed [`FETCH_TIMEOUT`].
    pub fn new() -> Result<Self, AdapterError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// Fetch the raw status body from `address` (already normalized).
    pub async fn fetch(&self, address: &str) -> Result<Vec<u8>, AdapterError> {
        let url = status_url(address);
        debug!(%url, "fetching mgd status");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let body = response.bytes().await?;
        debug!(%url, bytes = body.len(), "received mgd status");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("a:1"), "a:1");
        assert_eq!(normalize_address("b"), "b:50000");
        assert_eq!(normalize_address("10.0.0.1"), "10.0.0.1:50000");
        assert_eq!(normalize_address(":50000"), ":50000");
        assert_eq!(normalize_address("host:"), "host:");
        assert_eq!(normalize_address("[::1]:8080"), "[::1]:8080");
        assert_eq!(normalize_address("[::1]"), "[::1]:50000");
    }

    #[test]
    fn test_status_url() {
        assert_eq!(status_url("mgd-1:50000"), "http://mgd-1:50000/");
        assert_eq!(status_url(":50000"), "http://localhost:50000/");
        assert_eq!(status_url("[::1]:80"), "http://[::1]:80/");
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = Fetcher::new().unwrap();
        let err = fetcher.fetch(&addr.to_string()).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Transport);
    }
}
