//! JSON-over-HTTP transport
//!
//! Operations live at `POST {base_url}/api/v1/{operation}` with the payload
//! as the JSON body. The surface has no request/response correlation id;
//! the harness relies on its strict one-request-in-flight sequencing.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use super::{Outcome, Request, Transport};
use crate::common::Result;

pub struct HttpRest {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRest {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Outcome {
        tracing::debug!(">>> POST {} {}", url, body);

        let response = match self.client.post(url).json(body).send().await {
            Ok(r) => r,
            // Connection refusal and timeouts both mean the server is gone
            Err(e) => return Outcome::Unreachable(e.to_string()),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return Outcome::Unreachable(format!("failed to read body: {}", e)),
        };

        tracing::debug!("<<< {} {}", status, text);
        classify_body(status, &text)
    }
}

#[async_trait::async_trait]
impl Transport for HttpRest {
    async fn send(&mut self, request: &Request) -> Outcome {
        let url = format!("{}/api/v1/{}", self.base_url, request.operation);
        self.post_json(&url, &Value::Object(request.payload.clone()))
            .await
    }

    async fn list_operations(&mut self, _id: u64) -> Outcome {
        let url = format!("{}/endpoints", self.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return Outcome::Unreachable(e.to_string()),
        };

        if !response.status().is_success() {
            return Outcome::Failure(format!("GET /endpoints returned {}", response.status()));
        }

        let value: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return Outcome::Malformed(format!("invalid JSON: {}", e)),
        };

        match value.get("endpoints").and_then(Value::as_array) {
            Some(endpoints) => Outcome::Success(Value::Array(endpoints.clone())),
            None => Outcome::Malformed("response carries no endpoints array".to_string()),
        }
    }
}

/// Classify an HTTP status plus body.
///
/// 200 with no `error` field is a success; any other status, or a 200 body
/// carrying an `error` field, is an explicit rejection.
pub(crate) fn classify_body(status: StatusCode, body: &str) -> Outcome {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => return Outcome::Malformed(format!("invalid JSON body: {}", e)),
    };

    let error = value.get("error").and_then(Value::as_str);

    if status.is_success() {
        match error {
            Some(message) => Outcome::Failure(message.to_string()),
            None => Outcome::Success(value),
        }
    } else {
        let message = error
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Outcome::Failure(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ok() {
        let outcome = classify_body(StatusCode::OK, r#"{"data":{"user_id":"10232"}}"#);
        assert!(matches!(outcome, Outcome::Success(_)));
    }

    #[test]
    fn test_classify_denied_status() {
        let outcome = classify_body(
            StatusCode::FORBIDDEN,
            r#"{"error":"permission denied: create_user requires create capability"}"#,
        );
        assert_eq!(
            outcome,
            Outcome::Failure("permission denied: create_user requires create capability".to_string())
        );
    }

    #[test]
    fn test_classify_error_field_in_ok_body() {
        let outcome = classify_body(StatusCode::OK, r#"{"error":"rejected"}"#);
        assert_eq!(outcome, Outcome::Failure("rejected".to_string()));
    }

    #[test]
    fn test_classify_non_ok_without_error_field() {
        let outcome = classify_body(StatusCode::INTERNAL_SERVER_ERROR, r#"{}"#);
        assert_eq!(outcome, Outcome::Failure("HTTP 500 Internal Server Error".to_string()));
    }

    #[test]
    fn test_classify_non_json_body() {
        let outcome = classify_body(StatusCode::OK, "<html>oops</html>");
        assert!(matches!(outcome, Outcome::Malformed(_)));
    }
}
