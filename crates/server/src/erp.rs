//! Client for the ERP that archives the raw CT-e blobs. The server only
//! reads from it; retry policy stays with the caller.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use fretado_core::config::ErpConfig;

#[derive(Debug, Error)]
pub enum ErpError {
    #[error("erp request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("erp returned unexpected status {0}")]
    Status(u16),
    #[error("document `{0}` not found in the erp")]
    NotFound(String),
}

/// Raw document row as the ERP serves it: the base64 blob plus listing
/// metadata.
#[derive(Clone, Debug, Deserialize)]
pub struct ErpDocument {
    #[serde(rename = "Serial")]
    pub serial: String,
    #[serde(rename = "XmlFile")]
    pub xml_file: String,
    #[serde(rename = "NomeEmissor")]
    pub issuer_name: Option<String>,
    #[serde(rename = "DataEmissao")]
    pub emitted_at: Option<String>,
    #[serde(rename = "ValorTotal")]
    pub declared_total: Option<String>,
}

pub struct ErpClient {
    http: Client,
    base_url: String,
    api_token: Option<SecretString>,
}

impl ErpClient {
    /// Builds the client when the ERP integration is enabled and
    /// configured; `None` otherwise.
    pub fn from_config(config: &ErpConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let base_url = config.base_url.as_deref()?.trim_end_matches('/').to_string();

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .ok()?;

        Some(Self { http, base_url, api_token: config.api_token.clone() })
    }

    /// Fetches one archived document by its ERP serial.
    pub async fn fetch_document(&self, serial: &str) -> Result<ErpDocument, ErpError> {
        let url = format!("{}/documents/{serial}", self.base_url);

        let mut request = self.http.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => Ok(response.json::<ErpDocument>().await?),
            StatusCode::NOT_FOUND => Err(ErpError::NotFound(serial.to_string())),
            other => Err(ErpError::Status(other.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use fretado_core::config::ErpConfig;

    use super::ErpClient;

    #[test]
    fn disabled_config_builds_no_client() {
        let config =
            ErpConfig { enabled: false, base_url: None, api_token: None, timeout_secs: 30 };
        assert!(ErpClient::from_config(&config).is_none());
    }

    #[test]
    fn enabled_config_trims_trailing_slash() {
        let config = ErpConfig {
            enabled: true,
            base_url: Some("https://erp.example.com/".to_string()),
            api_token: Some("token".to_string().into()),
            timeout_secs: 30,
        };
        let client = ErpClient::from_config(&config).expect("client");
        assert_eq!(client.base_url, "https://erp.example.com");
    }
}
