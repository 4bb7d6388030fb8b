//! Commerce API client.
//!
//! # Architecture
//!
//! - Plain JSON-over-HTTP via `reqwest`; every payload is wrapped in the
//!   API's response envelope
//! - The API is source of truth - no local sync, no caching; repeated
//!   fetches are fresh requests and render identical output
//! - Credential is a static `user-token` header attached to every call
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine_storefront::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config);
//!
//! let entries = client.fetch_checkout().await?;
//! client.submit_purchase(&purchase_request).await?;
//! ```

pub mod types;

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::config::StorefrontConfig;
use types::{ApiEnvelope, CheckoutPayload, PurchaseRequest};

/// Fixed checkout resource identifier for this storefront.
pub const CHECKOUT_IDENTIFIER: &str = "95BD9233-8FDC-48AD-B4C5-E5BAF7578C15";

/// Errors that can occur when talking to the commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// Transport failure reaching the API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response, carries the status and body text.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not parse as the expected envelope.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// 2xx response whose envelope reports `executed: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Client for the commerce API.
///
/// Cheaply cloneable; holds the base URL and the `user-token` credential
/// taken from the startup configuration.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    user_token: String,
}

impl CommerceClient {
    /// Create a new commerce API client from the startup configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.clone(),
                user_token: config.api_token.expose_secret().to_string(),
            }),
        }
    }

    /// Fetch the checkout configuration (video metadata + product lists).
    ///
    /// Returns the envelope's `object` array verbatim, in API order.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, and parse errors unchanged; the caller
    /// decides how to surface them.
    #[instrument(skip(self))]
    pub async fn fetch_checkout(&self) -> Result<Vec<CheckoutPayload>, CommerceError> {
        let envelope: ApiEnvelope<Vec<CheckoutPayload>> = self
            .get(&format!("/checkout/{CHECKOUT_IDENTIFIER}"))
            .await?;
        Ok(envelope.object)
    }

    /// Submit a purchase for the product named in the request.
    ///
    /// A 2xx status alone is not success: the envelope's `executed` flag is
    /// checked, and `executed: false` maps to [`CommerceError::Rejected`]
    /// with the API's message.
    ///
    /// # Errors
    ///
    /// Returns transport/status/parse errors, or `Rejected` when the API
    /// declined the purchase at the business level.
    #[instrument(skip(self, request), fields(product_id = request.product_id))]
    pub async fn submit_purchase(&self, request: &PurchaseRequest) -> Result<(), CommerceError> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .post(&format!("/buy/{}", request.product_id), request)
            .await?;

        if !envelope.executed {
            return Err(CommerceError::Rejected(envelope.message));
        }
        Ok(())
    }

    /// Issue a GET and parse the response envelope.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>, CommerceError> {
        let response = self
            .inner
            .client
            .get(format!("{}{path}", self.inner.base_url))
            .header("Content-Type", "application/json")
            .header("user-token", &self.inner.user_token)
            .send()
            .await?;
        Self::parse_envelope(response).await
    }

    /// Issue a POST with a JSON body and parse the response envelope.
    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiEnvelope<T>, CommerceError> {
        let response = self
            .inner
            .client
            .post(format!("{}{path}", self.inner.base_url))
            .header("Content-Type", "application/json")
            .header("user-token", &self.inner.user_token)
            .json(body)
            .send()
            .await?;
        Self::parse_envelope(response).await
    }

    /// Turn a raw response into a parsed envelope or a `CommerceError`.
    async fn parse_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiEnvelope<T>, CommerceError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "commerce API returned non-success status"
            );
            return Err(CommerceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str(&body) {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "failed to parse commerce API response"
                );
                Err(CommerceError::Parse(e))
            }
        }
    }
}
