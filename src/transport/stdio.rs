//! Newline-delimited JSON-RPC transport
//!
//! Each call writes exactly one request line to the server's stdin and
//! reads exactly one response line from its stdout, so request/response
//! correlation is implicit in call ordering. The harness never pipelines
//! two outstanding requests on this transport. Reads are bounded by a
//! timeout so a hung server maps to `Unreachable` instead of blocking the
//! run forever.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{ChildStdin, ChildStdout};

use super::{Outcome, Request, Transport};

pub struct StdioJsonRpc {
    reader: BufReader<ChildStdout>,
    writer: BufWriter<ChildStdin>,
    read_timeout: Duration,
}

impl StdioJsonRpc {
    pub fn new(stdin: ChildStdin, stdout: ChildStdout, read_timeout: Duration) -> Self {
        Self {
            reader: BufReader::new(stdout),
            writer: BufWriter::new(stdin),
            read_timeout,
        }
    }

    /// One-time handshake before the first tool call
    pub async fn initialize(&mut self, id: u64) -> Outcome {
        self.exchange(
            id,
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "gatecheck",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
        )
        .await
    }

    /// Write one request line, read one response line, classify
    async fn exchange(&mut self, id: u64, method: &str, params: Option<Value>) -> Outcome {
        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
        });
        if let Some(params) = params {
            request["params"] = params;
        }

        let line = request.to_string();
        tracing::debug!(">>> {}", line);

        if let Err(e) = self.write_line(&line).await {
            return Outcome::Unreachable(format!("write failed: {}", e));
        }

        let response = match tokio::time::timeout(self.read_timeout, self.read_line()).await {
            Err(_) => {
                return Outcome::Unreachable(format!(
                    "no response within {} seconds",
                    self.read_timeout.as_secs()
                ))
            }
            Ok(Err(e)) => return Outcome::Unreachable(format!("read failed: {}", e)),
            Ok(Ok(None)) => return Outcome::Unreachable("server closed its output stream".to_string()),
            Ok(Ok(Some(line))) => line,
        };

        tracing::debug!("<<< {}", response);
        classify_response(id, &response)
    }

    async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line).await?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end().to_string()))
    }
}

#[async_trait::async_trait]
impl Transport for StdioJsonRpc {
    async fn send(&mut self, request: &Request) -> Outcome {
        self.exchange(
            request.id,
            "tools/call",
            Some(json!({
                "name": request.operation,
                "arguments": Value::Object(request.payload.clone()),
            })),
        )
        .await
    }

    async fn list_operations(&mut self, id: u64) -> Outcome {
        match self.exchange(id, "tools/list", None).await {
            Outcome::Success(result) => match result.get("tools").and_then(Value::as_array) {
                Some(tools) => {
                    let names: Vec<Value> = tools
                        .iter()
                        .filter_map(|t| t.get("name").cloned())
                        .collect();
                    Outcome::Success(Value::Array(names))
                }
                None => Outcome::Malformed("tools/list result carries no tools array".to_string()),
            },
            other => other,
        }
    }
}

/// Classify one raw response line against the originating request id.
///
/// The protocol signals failure at two layers: the JSON-RPC `error` field,
/// and an application-level `isError` flag nested inside an otherwise
/// successful `result`. Both classify as `Failure`; the nested form is
/// prefixed with `tool error:` so the report distinguishes them.
pub(crate) fn classify_response(id: u64, line: &str) -> Outcome {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Outcome::Malformed(format!("invalid JSON: {}", e)),
    };

    match value.get("id").and_then(Value::as_u64) {
        Some(got) if got == id => {}
        got => {
            // The stream is alive but the exchange can no longer be trusted
            return Outcome::Malformed(format!(
                "response id {:?} does not match request id {}",
                got, id
            ));
        }
    }

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error")
            .to_string();
        return Outcome::Failure(message);
    }

    match value.get("result") {
        Some(result) => {
            if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
                let text = result
                    .get("content")
                    .and_then(|c| c.get(0))
                    .and_then(|c| c.get("text"))
                    .and_then(Value::as_str)
                    .unwrap_or("unspecified tool error");
                return Outcome::Failure(format!("tool error: {}", text));
            }
            Outcome::Success(result.clone())
        }
        None => Outcome::Malformed("response carries neither result nor error".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_result() {
        let outcome = classify_response(3, r#"{"jsonrpc":"2.0","id":3,"result":{"ok":true}}"#);
        assert!(matches!(outcome, Outcome::Success(_)));
    }

    #[test]
    fn test_classify_protocol_error() {
        let outcome = classify_response(
            4,
            r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32000,"message":"permission denied"}}"#,
        );
        assert_eq!(outcome, Outcome::Failure("permission denied".to_string()));
    }

    #[test]
    fn test_classify_nested_tool_error() {
        let outcome = classify_response(
            5,
            r#"{"jsonrpc":"2.0","id":5,"result":{"isError":true,"content":[{"type":"text","text":"create not allowed"}]}}"#,
        );
        assert_eq!(
            outcome,
            Outcome::Failure("tool error: create not allowed".to_string())
        );
    }

    #[test]
    fn test_classify_id_mismatch() {
        let outcome = classify_response(7, r#"{"jsonrpc":"2.0","id":8,"result":{}}"#);
        assert!(matches!(outcome, Outcome::Malformed(_)));
    }

    #[test]
    fn test_classify_garbage() {
        let outcome = classify_response(1, "not json at all");
        assert!(matches!(outcome, Outcome::Malformed(_)));
    }

    #[test]
    fn test_classify_missing_result_and_error() {
        let outcome = classify_response(2, r#"{"jsonrpc":"2.0","id":2}"#);
        assert!(matches!(outcome, Outcome::Malformed(_)));
    }
}
