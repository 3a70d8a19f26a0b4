//! HTTP utilities for GCP REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Per-request timeout applied by the HTTP client
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Error reported by a GCP API (non-2xx response)
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed: {status} - {message}")]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Provider error message (`error.message` of the response body when present)
    pub message: String,
}

impl ApiError {
    /// Build from a raw response body, preferring the structured GCP error message
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message").or(Some(e)))
                    .and_then(|m| m.as_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| sanitize_for_log(body));

        Self { status, message }
    }

    /// Look for an `ApiError` anywhere in an error chain
    pub fn find(error: &anyhow::Error) -> Option<&ApiError> {
        error.chain().find_map(|e| e.downcast_ref::<ApiError>())
    }
}

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX_LOG_BODY_LENGTH)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("gcpops/{}", crate::VERSION))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);
        self.send(self.client.get(url).bearer_auth(token)).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.send(request).await
    }

    /// Make a PATCH request to a GCP API
    pub async fn patch(&self, url: &str, token: &str, body: &Value) -> Result<Value> {
        tracing::debug!("PATCH {}", url);
        self.send(self.client.patch(url).bearer_auth(token).json(body))
            .await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(url).bearer_auth(token)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError::from_body(status.as_u16(), &body).into());
        }

        // Handle empty response
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format a GCP API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    if let Some(api) = ApiError::find(error) {
        let friendly = match api.status {
            403 => Some("Permission denied. Check your GCP IAM permissions."),
            401 => Some("Authentication failed. Run 'gcloud auth application-default login'."),
            404 => Some("Resource not found."),
            429 => Some("Rate limit exceeded. Please try again later."),
            400 => Some("Invalid request. Check your parameters."),
            409 => Some("Resource conflict. The resource may already exist or be in use."),
            500 | 502 | 503 => Some("GCP service temporarily unavailable. Please try again."),
            _ => None,
        };
        if let Some(msg) = friendly {
            return msg.to_string();
        }
    }

    // Truncate long error messages and remove potential sensitive data
    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_prefers_structured_message() {
        let body = r#"{"error": {"code": 404, "message": "The resource 'web-1' was not found"}}"#;
        let err = ApiError::from_body(404, body);
        assert_eq!(err.status, 404);
        assert_eq!(err.message, "The resource 'web-1' was not found");
    }

    #[test]
    fn test_api_error_falls_back_to_body() {
        let err = ApiError::from_body(502, "Bad Gateway");
        assert_eq!(err.message, "Bad Gateway");
    }

    #[test]
    fn test_api_error_found_through_context() {
        let err: anyhow::Error = ApiError::from_body(403, "{}").into();
        let err = err.context("Failed to stop instance");
        assert_eq!(ApiError::find(&err).map(|e| e.status), Some(403));
    }

    #[test]
    fn test_format_gcp_error_maps_status() {
        let err: anyhow::Error = ApiError::from_body(429, "{}").into();
        assert_eq!(
            format_gcp_error(&err),
            "Rate limit exceeded. Please try again later."
        );
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.contains("[truncated, 500 bytes total]"));
    }
}
