//! Run orchestration
//!
//! Wires the process controller, a transport, the scenario engine, and the
//! reporter together for one harness run. Teardown of a spawned server is
//! guaranteed on every path: the run body executes first, the kill happens
//! after it regardless of outcome, and `kill_on_drop` backstops a panic.

use std::path::Path;
use std::time::Duration;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::report::{self, Report};
use crate::scenario::Engine;
use crate::sut::{self, SutProcess};
use crate::transport::{HttpRest, Outcome, StdioJsonRpc};

/// Spawn the server, run the conformance scenarios over its stdio, tear it
/// down, and report.
pub async fn run_stdio(
    config: &Config,
    program: &Path,
    args: &[String],
    settle_ms: Option<u64>,
) -> Result<Report> {
    let settle = Duration::from_millis(settle_ms.unwrap_or(config.timeouts.settle_ms));
    let request_timeout = Duration::from_secs(config.timeouts.request_secs);

    let program = program.to_string_lossy().to_string();
    let mut server = SutProcess::spawn(&program, args)?;

    let result = drive_stdio(&mut server, settle, request_timeout).await;

    if let Err(e) = server.shutdown().await {
        tracing::warn!("teardown: {}", e);
    }

    let engine = result?;
    let report = Report::build(&engine);
    report::print(engine.results(), &report);
    Ok(report)
}

async fn drive_stdio(
    server: &mut SutProcess,
    settle: Duration,
    request_timeout: Duration,
) -> Result<Engine> {
    let (stdin, stdout) = server.take_pipes()?;
    let mut transport = StdioJsonRpc::new(stdin, stdout, request_timeout);

    server.settle(settle).await;

    let mut engine = Engine::new();

    // The handshake doubles as a readiness probe: a server that never came
    // up fails here, before any scenario runs.
    match transport.initialize(engine.next_id()).await {
        Outcome::Success(_) => tracing::info!("initialize handshake complete"),
        Outcome::Failure(message) => {
            return Err(Error::Protocol(format!("initialize rejected: {}", message)))
        }
        Outcome::Malformed(reason) => {
            return Err(Error::Protocol(format!(
                "initialize response malformed: {}",
                reason
            )))
        }
        Outcome::Unreachable(_) => {
            return Err(Error::ReadinessTimeout(request_timeout.as_secs()))
        }
    }

    engine.run(&mut transport).await;
    Ok(engine)
}

/// Run the conformance scenarios against an externally started server over
/// HTTP. The harness owns no process in this mode.
pub async fn run_http(
    config: &Config,
    base_url: Option<String>,
    ready_secs: Option<u64>,
) -> Result<Report> {
    let base_url = base_url.unwrap_or_else(|| config.http.base_url.clone());
    let ready = Duration::from_secs(ready_secs.unwrap_or(config.timeouts.ready_secs));
    let request_timeout = Duration::from_secs(config.timeouts.request_secs);

    sut::await_http_ready(&base_url, ready).await?;

    let mut transport = HttpRest::new(&base_url, request_timeout)?;
    let mut engine = Engine::new();
    engine.run(&mut transport).await;

    let report = Report::build(&engine);
    report::print(engine.results(), &report);
    Ok(report)
}
