//! Transport abstraction
//!
//! A transport delivers one request and classifies the raw response into
//! the same four-way outcome regardless of wire mechanism, so the scenario
//! engine never branches on transport kind.

pub mod http;
pub mod stdio;

pub use http::HttpRest;
pub use stdio::StdioJsonRpc;

use serde_json::{Map, Value};

/// A single operation invocation
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlation id, unique within a harness run
    pub id: u64,
    /// Operation name, as advertised by the server
    pub operation: String,
    /// Operation arguments
    pub payload: Map<String, Value>,
}

/// Four-way classification of a response
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The server accepted the operation
    Success(Value),
    /// The server explicitly rejected the operation
    Failure(String),
    /// The response could not be parsed or was inconsistent
    Malformed(String),
    /// The server could not be reached, closed its stream, or timed out
    Unreachable(String),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Failure(_) => "failure",
            Outcome::Malformed(_) => "malformed",
            Outcome::Unreachable(_) => "unreachable",
        }
    }

    /// Human-readable description for report details
    pub fn describe(&self) -> String {
        match self {
            Outcome::Success(_) => "success".to_string(),
            Outcome::Failure(message) => format!("failure: {}", message),
            Outcome::Malformed(reason) => format!("malformed: {}", reason),
            Outcome::Unreachable(reason) => format!("unreachable: {}", reason),
        }
    }
}

/// One request in, one classified response out
#[async_trait::async_trait]
pub trait Transport {
    /// Send one operation request and classify the response
    async fn send(&mut self, request: &Request) -> Outcome;

    /// Ask the server for its operation catalogue. On success the outcome
    /// value is a JSON array of operation names.
    async fn list_operations(&mut self, id: u64) -> Outcome;
}
