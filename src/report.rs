//! Result aggregation and verdict
//!
//! Scenario narration goes to stdout; diagnostics stay on stderr. Output
//! is deterministic for a fixed result sequence.

use colored::Colorize;

use crate::scenario::{Engine, ScenarioResult};

/// Aggregated view of a finished run
#[derive(Debug)]
pub struct Report {
    pub total: usize,
    pub matched: usize,
    pub mismatches: Vec<Mismatch>,
    pub introspection_ok: bool,
    pub catalogue: Option<usize>,
}

/// One scenario whose outcome disagreed with its expectation
#[derive(Debug)]
pub struct Mismatch {
    pub name: String,
    pub detail: String,
}

impl Report {
    pub fn build(engine: &Engine) -> Self {
        let results = engine.results();
        let matched = results.iter().filter(|r| r.matched).count();
        let mismatches = results
            .iter()
            .filter(|r| !r.matched)
            .map(|r| Mismatch {
                name: r.name.clone(),
                detail: r.detail.clone(),
            })
            .collect();

        Self {
            total: results.len(),
            matched,
            mismatches,
            introspection_ok: engine.introspection_ok(),
            catalogue: engine.catalogue(),
        }
    }

    /// Full match and a successful introspection call
    pub fn passed(&self) -> bool {
        self.matched == self.total && self.introspection_ok
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Print per-scenario narration and the summary to stdout
pub fn print(results: &[ScenarioResult], report: &Report) {
    println!();
    match report.catalogue {
        Some(count) => println!(
            "{} server advertises {} operations",
            "✓".green(),
            count
        ),
        None => println!("{} introspection failed", "✗".red()),
    }

    for result in results {
        let mark = if result.matched {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "{} {} [{} expected {}]: {}",
            mark,
            result.name.bold(),
            result.outcome.label(),
            result.expected.label(),
            result.detail.dimmed()
        );
    }

    println!();
    println!(
        "Scenarios: {} total, {} matched, {} mismatched",
        report.total,
        report.matched,
        report.mismatches.len()
    );

    if report.passed() {
        println!("{}", "Conformance: PASS".green().bold());
    } else {
        println!("{}", "Conformance: FAIL".red().bold());
        for mismatch in &report.mismatches {
            println!("  {} {}", mismatch.name.red(), mismatch.detail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{classify, Expectation, Scenario};
    use crate::transport::Outcome;
    use serde_json::{json, Map};

    // Drives classification directly; the engine's transport loop is
    // covered by the integration tests.
    fn engine_with(cases: Vec<(Expectation, Outcome)>, introspection_ok: bool) -> Engine {
        let mut engine = Engine::with_scenarios(Vec::new());
        for (expected, outcome) in cases {
            let scenario = Scenario {
                name: "probe",
                operation: "get_user",
                payload: Map::new(),
                expected,
            };
            engine.push_result(classify(&scenario, outcome));
        }
        engine.set_introspection(introspection_ok, introspection_ok.then_some(28));
        engine
    }

    #[test]
    fn test_all_matched_passes() {
        let engine = engine_with(
            vec![
                (Expectation::Accepted, Outcome::Success(json!({}))),
                (Expectation::Rejected, Outcome::Failure("denied".to_string())),
            ],
            true,
        );
        let report = Report::build(&engine);
        assert!(report.passed());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.catalogue, Some(28));
    }

    #[test]
    fn test_mismatch_fails() {
        let engine = engine_with(
            vec![(Expectation::Rejected, Outcome::Success(json!({})))],
            true,
        );
        let report = Report::build(&engine);
        assert!(!report.passed());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.mismatches.len(), 1);
    }

    #[test]
    fn test_failed_introspection_fails_even_with_full_match() {
        let engine = engine_with(
            vec![(Expectation::Accepted, Outcome::Success(json!({})))],
            false,
        );
        let report = Report::build(&engine);
        assert!(!report.passed());
    }
}
