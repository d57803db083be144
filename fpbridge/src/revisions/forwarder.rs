//! Outbound HTTP delivery of notification payloads.

use async_trait::async_trait;
use thiserror::Error;

/// Failure to deliver a payload. Only transport-level problems count; a
/// webhook answering with a non-2xx status is still a delivery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("failed to encode notification payload: {message}")]
    Encode { message: String },

    #[error("{message}")]
    Transport { message: String },
}

/// What came back from the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub status_code: u16,
}

/// Posts a JSON body to a URL.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn post_json(&self, url: &str, body: String) -> Result<Delivery, SendError>;
}

/// [`Forwarder`] backed by a shared `reqwest` client. No retries, and no
/// timeout beyond the client's defaults.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    http_client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new() -> Result<Self, SendError> {
        // main installs the provider; library and test callers may not have
        if rustls::crypto::CryptoProvider::get_default().is_none() {
            let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("fpbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SendError::Transport {
                message: format!("failed to create webhook HTTP client: {e}"),
            })?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn post_json(&self, url: &str, body: String) -> Result<Delivery, SendError> {
        let response = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| SendError::Transport { message: e.to_string() })?;

        Ok(Delivery {
            status_code: response.status().as_u16(),
        })
    }
}
