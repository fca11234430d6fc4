//! HttpTransport -- concrete [`Transport`] implementation over reqwest.
//!
//! Sends shaped requests to the configured completion endpoint and exposes
//! the response body as a raw byte stream. Line framing and delta decoding
//! happen downstream in `banter-core`; this layer only moves bytes.

use std::time::Duration;

use futures_util::TryStreamExt;

use banter_core::api::{ByteStream, RequestSpec, Transport};
use banter_types::error::TransportError;

/// Streaming HTTP transport for an OpenAI-style completion endpoint.
///
/// Holds a connection-pooled [`reqwest::Client`]. Dropping the stream
/// returned by [`Transport::open`] aborts the in-flight request, which is
/// how stream cancellation reaches the server.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a new transport targeting the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min ceiling for long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build the full URL for a given endpoint path.
    ///
    /// Tolerates a trailing slash on the configured base URL.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

// HttpTransport intentionally does NOT derive Debug: the request specs it
// sends carry a materialized Authorization header, and the transport should
// never be the place where one leaks into logs.

impl Transport for HttpTransport {
    async fn open(&self, request: &RequestSpec) -> Result<ByteStream, TransportError> {
        let url = self.url(request.path);

        let mut req = self.client.post(&url);
        for (name, value) in &request.headers {
            req = req.header(*name, value);
        }

        let response = req
            .json(&request.body)
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| TransportError::Read(e.to_string()));

        Ok(Box::pin(stream))
    }
}
