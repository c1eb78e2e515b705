//! HTTP client for a ledger node's account-property API.
//!
//! ## API Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/api/v1/properties?owner&setter&property` | Read one property (`{"value": ..}` or 404) |
//! | PUT    | `/api/v1/properties` | Set a property (signed) |
//! | DELETE | `/api/v1/properties` | Delete a property (signed) |
//!
//! Writes carry a JSON body naming owner, setter, property and (for PUT)
//! value. The body is signed by the setter through the configured
//! [`IdentityProvider`] and the token travels as `Authorization: Token <token>`.
//!
//! No retries are performed; every request is bounded by the configured
//! timeout.

use std::sync::Arc;
use std::time::Duration;

use apx_core::{AccountId, TransportError};
use apx_crypto::{Identity, IdentityProvider};
use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::store::LedgerStore;

const PROPERTIES_PATH: &str = "api/v1/properties";

/// Body of a signed write request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyWrite {
    pub owner: String,
    pub setter: String,
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyValue {
    value: String,
}

/// [`LedgerStore`] backed by a remote ledger node.
#[derive(Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    base_url: url::Url,
    provider: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for HttpLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLedgerClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpLedgerClient {
    /// Build a client. `provider` signs write requests.
    pub fn new(
        config: LedgerConfig,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Connection {
                endpoint: "client_init".into(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: config.base_url,
            provider,
        })
    }

    /// The node this client talks to.
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn properties_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{PROPERTIES_PATH}")
    }

    async fn send_signed(
        &self,
        method: reqwest::Method,
        body: PropertyWrite,
        signer: &Identity,
    ) -> Result<(), TransportError> {
        let endpoint = format!("{method} /{PROPERTIES_PATH}");
        let payload = serde_json::to_string(&body).map_err(|e| TransportError::Node {
            endpoint: endpoint.clone(),
            description: format!("could not encode request: {e}"),
        })?;
        let token = self.provider.sign_token(&payload, signer.secret());

        tracing::debug!(
            endpoint = %endpoint,
            owner = %body.owner,
            property = %body.property,
            "ledger write"
        );

        let resp = self
            .http
            .request(method, self.properties_url())
            .header(reqwest::header::AUTHORIZATION, format!("Token {token}"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| connection_error(&endpoint, e))?;

        if !resp.status().is_success() {
            return Err(node_error(endpoint, resp).await);
        }
        Ok(())
    }
}

fn connection_error(endpoint: &str, err: reqwest::Error) -> TransportError {
    TransportError::Connection {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    }
}

async fn node_error(endpoint: String, resp: reqwest::Response) -> TransportError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let description = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        body
    };
    TransportError::Node {
        endpoint,
        description,
    }
}

#[async_trait::async_trait]
impl LedgerStore for HttpLedgerClient {
    async fn get_property(
        &self,
        owner: &AccountId,
        setter: &AccountId,
        property: &str,
    ) -> Result<Option<String>, TransportError> {
        let endpoint = format!("GET /{PROPERTIES_PATH}");
        tracing::debug!(%owner, %setter, property, "ledger read");

        let resp = self
            .http
            .get(self.properties_url())
            .query(&[
                ("owner", owner.as_str()),
                ("setter", setter.as_str()),
                ("property", property),
            ])
            .send()
            .await
            .map_err(|e| connection_error(&endpoint, e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(node_error(endpoint, resp).await);
        }

        let body: PropertyValue = resp.json().await.map_err(|e| TransportError::Node {
            endpoint,
            description: format!("malformed response: {e}"),
        })?;
        Ok(Some(body.value))
    }

    async fn set_property(
        &self,
        owner: &AccountId,
        property: &str,
        value: &str,
        signer: &Identity,
    ) -> Result<(), TransportError> {
        let body = PropertyWrite {
            owner: owner.to_string(),
            setter: signer.account().to_string(),
            property: property.to_string(),
            value: Some(value.to_string()),
        };
        self.send_signed(reqwest::Method::PUT, body, signer).await
    }

    async fn delete_property(
        &self,
        owner: &AccountId,
        property: &str,
        signer: &Identity,
    ) -> Result<(), TransportError> {
        let body = PropertyWrite {
            owner: owner.to_string(),
            setter: signer.account().to_string(),
            property: property.to_string(),
            value: None,
        };
        self.send_signed(reqwest::Method::DELETE, body, signer).await
    }
}
