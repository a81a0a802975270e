use std::time::Duration;

use codes_logging::{codes_debug, codes_warn};
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::{FailureKind, TransportError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole-request budget. Nothing is retried after it runs out.
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 1024 * 1024,
        }
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and parse the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError>;

    /// POST to `url` with an empty body. Any 2xx counts as success.
    async fn post_delete(&self, url: &str) -> Result<(), TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: FetchSettings,
}

impl ReqwestTransport {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(FailureKind::Unknown, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> TransportError {
        TransportError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        let parsed = parse_url(url)?;
        let client = self.build_client()?;

        let response = client
            .get(parsed)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            codes_warn!("GET {} returned {}", url, status);
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        codes_debug!("GET {} read {} bytes", url, bytes.len());

        serde_json::from_slice(&bytes)
            .map_err(|err| TransportError::new(FailureKind::InvalidBody, err.to_string()))
    }

    async fn post_delete(&self, url: &str) -> Result<(), TransportError> {
        let parsed = parse_url(url)?;
        let client = self.build_client()?;

        let response = client
            .post(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            codes_warn!("POST {} returned {}", url, status);
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_url(url: &str) -> Result<reqwest::Url, TransportError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(TransportError::new(FailureKind::EmptyUrl, "no url configured"));
    }
    reqwest::Url::parse(trimmed)
        .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_connect() || err.is_request() || err.is_body() {
        return TransportError::new(FailureKind::Network, err.to_string());
    }
    TransportError::new(FailureKind::Unknown, err.to_string())
}
