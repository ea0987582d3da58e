//! Uniform wrapper around outbound calls to the forecast service.
//!
//! Every endpoint goes through `RequestDispatcher::dispatch`, which is the
//! single place where non-success responses are turned into `ApiError`.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use salescast_core::config::ApiConfig;

use crate::error::ApiError;

/// Structured error body returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Issues requests against one service base URL.
#[derive(Debug, Clone)]
pub struct RequestDispatcher {
    client: Client,
    base_url: Url,
}

impl RequestDispatcher {
    /// Build a dispatcher from the API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::with_client(client, &config.base_url)
    }

    /// Build a dispatcher around an existing client.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ApiError> {
        // A trailing slash makes `Url::join` append paths instead of
        // replacing the last segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Send one request and normalize a non-success status into `ApiError`.
    pub async fn dispatch(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request could not be sent");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Response received");
        if status.is_success() {
            return Ok(response);
        }

        let detail = error_detail(response).await;
        warn!(status = status.as_u16(), detail = %detail, "Request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    /// GET a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let response = self.dispatch(self.client.get(url)).await?;
        Ok(response.json::<T>().await?)
    }

    /// POST form fields and return the raw response body.
    pub async fn post_form_bytes(
        &self,
        path: &str,
        fields: &[(&str, String)],
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path)?;
        let response = self.dispatch(self.client.post(url).form(fields)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// POST form fields and decode a JSON response.
    pub async fn post_form_json<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let response = self.dispatch(self.client.post(url).form(fields)).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Extract the `detail` of an error response, falling back to the status text.
async fn error_detail(response: Response) -> String {
    let status_text = response
        .status()
        .canonical_reason()
        .unwrap_or("Unknown Status")
        .to_string();

    match response.json::<ErrorBody>().await {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(detail)),
        }) if !detail.is_empty() => detail,
        Ok(ErrorBody {
            detail: Some(detail),
        }) if !detail.is_null() && !detail.is_string() => detail.to_string(),
        _ => status_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(base: &str) -> RequestDispatcher {
        RequestDispatcher::with_client(Client::new(), base).unwrap()
    }

    #[test]
    fn test_url_joins_paths() {
        let d = dispatcher("http://localhost:8000");
        assert_eq!(
            d.url("/products/").unwrap().as_str(),
            "http://localhost:8000/products/"
        );
        assert_eq!(
            d.url("forecast/").unwrap().as_str(),
            "http://localhost:8000/forecast/"
        );
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let d = dispatcher("https://example.com/api/");
        assert_eq!(
            d.url("/ask-ai/").unwrap().as_str(),
            "https://example.com/api/ask-ai/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = RequestDispatcher::with_client(Client::new(), "not a url");
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_new_from_config() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..ApiConfig::default()
        };
        let d = RequestDispatcher::new(&config).unwrap();
        assert_eq!(d.base_url().as_str(), "http://127.0.0.1:1/");
    }
}
