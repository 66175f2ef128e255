//! HTTP GET transport.

use std::time::Duration;
use thiserror::Error;

/// Transport error types.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Plain GET of a full response body.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Blocking reqwest transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// The release API rejects requests without a User-Agent.
    const USER_AGENT: &'static str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    /// Bound on establishing a connection; the transfer itself is limited
    /// only by `download_timeout`.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// `None` puts no limit on the whole transfer.
    pub fn new(download_timeout: Option<Duration>) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(Self::USER_AGENT)
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .timeout(download_timeout)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        tracing::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok(body.to_vec())
    }
}
