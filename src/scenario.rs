//! Scenario engine
//!
//! Holds the fixed scenario list and executes it in declaration order
//! against a single chosen transport, recording exactly one result per
//! scenario. The engine never short-circuits: a mismatch or a dead server
//! still leaves a full report behind.

use serde_json::{json, Map, Value};

use crate::transport::{Outcome, Request, Transport};

/// Expected outcome of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// The server should accept the operation
    Accepted,
    /// The server should explicitly reject the operation
    Rejected,
}

impl Expectation {
    pub fn label(&self) -> &'static str {
        match self {
            Expectation::Accepted => "accepted",
            Expectation::Rejected => "rejected",
        }
    }
}

/// One named conformance test case, immutable once defined
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub operation: &'static str,
    pub payload: Map<String, Value>,
    pub expected: Expectation,
}

/// Result of one executed scenario
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub expected: Expectation,
    pub outcome: Outcome,
    pub matched: bool,
    pub detail: String,
}

/// The fixed conformance scenarios, written against the reference policy:
/// user read=true create=false delete=false, message create=true.
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "allowed-read-get-user",
            operation: "get_user",
            payload: object(json!({"user_id": "10232"})),
            expected: Expectation::Accepted,
        },
        Scenario {
            name: "denied-create-user",
            operation: "create_user",
            payload: object(json!({"user_id": "test999", "name": "X", "dept_id": 1})),
            expected: Expectation::Rejected,
        },
        Scenario {
            name: "allowed-send-text-message",
            operation: "send_text_message",
            payload: object(json!({"to_user": "10232", "content": "conformance probe"})),
            expected: Expectation::Accepted,
        },
        Scenario {
            name: "denied-delete-user",
            operation: "delete_user",
            payload: object(json!({"user_id": "test999"})),
            expected: Expectation::Rejected,
        },
    ]
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Executes scenarios and accumulates results
pub struct Engine {
    scenarios: Vec<Scenario>,
    next_id: u64,
    results: Vec<ScenarioResult>,
    catalogue: Option<usize>,
    introspection_ok: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_scenarios(builtin_scenarios())
    }

    pub fn with_scenarios(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            next_id: 0,
            results: Vec::new(),
            catalogue: None,
            introspection_ok: false,
        }
    }

    /// Allocate a fresh correlation id, unique within this run
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    /// Catalogue size reported by introspection, if it succeeded
    pub fn catalogue(&self) -> Option<usize> {
        self.catalogue
    }

    pub fn introspection_ok(&self) -> bool {
        self.introspection_ok
    }

    #[cfg(test)]
    pub(crate) fn push_result(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    #[cfg(test)]
    pub(crate) fn set_introspection(&mut self, ok: bool, catalogue: Option<usize>) {
        self.introspection_ok = ok;
        self.catalogue = catalogue;
    }

    /// Run the introspection call, then every scenario in declaration order
    pub async fn run(&mut self, transport: &mut dyn Transport) {
        let id = self.next_id();
        match transport.list_operations(id).await {
            Outcome::Success(value) => {
                let count = value.as_array().map(Vec::len).unwrap_or(0);
                tracing::info!("server advertises {} operations", count);
                self.catalogue = Some(count);
                self.introspection_ok = true;
            }
            outcome => {
                tracing::warn!("introspection failed: {}", outcome.describe());
                self.introspection_ok = false;
            }
        }

        let scenarios = self.scenarios.clone();
        for scenario in &scenarios {
            let request = Request {
                id: self.next_id(),
                operation: scenario.operation.to_string(),
                payload: scenario.payload.clone(),
            };

            tracing::debug!("running scenario '{}' (id {})", scenario.name, request.id);
            let outcome = transport.send(&request).await;
            self.results.push(classify(scenario, outcome));
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Match an outcome against a scenario's expectation.
///
/// `Unreachable` and `Malformed` never satisfy `Rejected`: those indicate
/// harness or server infrastructure failure, not policy enforcement. An
/// `Accepted` scenario that comes back `Unreachable` means the server died
/// mid-run and is flagged as a harness failure, distinct from a policy
/// mismatch.
pub(crate) fn classify(scenario: &Scenario, outcome: Outcome) -> ScenarioResult {
    let (matched, detail) = match (scenario.expected, &outcome) {
        (Expectation::Accepted, Outcome::Success(_)) => {
            (true, "accepted as expected".to_string())
        }
        (Expectation::Rejected, Outcome::Failure(message)) if !message.is_empty() => {
            (true, format!("rejected as expected: {}", message))
        }
        (Expectation::Rejected, Outcome::Failure(_)) => {
            (false, "rejected with an empty error message".to_string())
        }
        (Expectation::Accepted, Outcome::Failure(message)) => (
            false,
            format!("policy mismatch: expected accept, server rejected: {}", message),
        ),
        (Expectation::Rejected, Outcome::Success(_)) => (
            false,
            "policy mismatch: expected reject, server accepted".to_string(),
        ),
        (Expectation::Accepted, Outcome::Unreachable(reason)) => (
            false,
            format!("harness failure: server unreachable mid-run: {}", reason),
        ),
        (Expectation::Rejected, Outcome::Unreachable(reason)) => {
            (false, format!("server unreachable: {}", reason))
        }
        (_, Outcome::Malformed(reason)) => {
            (false, format!("malformed response: {}", reason))
        }
    };

    ScenarioResult {
        name: scenario.name.to_string(),
        expected: scenario.expected,
        outcome,
        matched,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(expected: Expectation) -> Scenario {
        Scenario {
            name: "probe",
            operation: "get_user",
            payload: Map::new(),
            expected,
        }
    }

    #[test]
    fn test_accepted_matches_success() {
        let result = classify(&scenario(Expectation::Accepted), Outcome::Success(json!({})));
        assert!(result.matched);
    }

    #[test]
    fn test_rejected_matches_failure_with_message() {
        let result = classify(
            &scenario(Expectation::Rejected),
            Outcome::Failure("permission denied".to_string()),
        );
        assert!(result.matched);
        assert!(result.detail.contains("permission denied"));
    }

    #[test]
    fn test_rejected_requires_nonempty_message() {
        let result = classify(&scenario(Expectation::Rejected), Outcome::Failure(String::new()));
        assert!(!result.matched);
    }

    #[test]
    fn test_rejected_never_satisfied_by_unreachable() {
        let result = classify(
            &scenario(Expectation::Rejected),
            Outcome::Unreachable("connection refused".to_string()),
        );
        assert!(!result.matched);
    }

    #[test]
    fn test_rejected_never_satisfied_by_malformed() {
        let result = classify(
            &scenario(Expectation::Rejected),
            Outcome::Malformed("bad json".to_string()),
        );
        assert!(!result.matched);
    }

    #[test]
    fn test_accepted_unreachable_is_harness_failure() {
        let result = classify(
            &scenario(Expectation::Accepted),
            Outcome::Unreachable("stream closed".to_string()),
        );
        assert!(!result.matched);
        assert!(result.detail.starts_with("harness failure"));
    }

    #[test]
    fn test_accepted_failure_is_policy_mismatch() {
        let result = classify(
            &scenario(Expectation::Accepted),
            Outcome::Failure("denied".to_string()),
        );
        assert!(!result.matched);
        assert!(result.detail.starts_with("policy mismatch"));
    }

    #[test]
    fn test_builtin_scenarios_shape() {
        let scenarios = builtin_scenarios();
        assert_eq!(scenarios.len(), 4);
        assert_eq!(scenarios[0].operation, "get_user");
        assert_eq!(scenarios[1].expected, Expectation::Rejected);
        assert_eq!(scenarios[3].operation, "delete_user");
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut engine = Engine::new();
        let a = engine.next_id();
        let b = engine.next_id();
        assert!(b > a);
    }
}
