//! Server-under-test process lifecycle
//!
//! Owns the child process when the harness launches the server itself
//! (stdio mode): spawn with piped stdio, a settling delay in place of an
//! explicit readiness signal, and kill-and-wait teardown. In HTTP mode the
//! server is externally started and this module only polls its health
//! endpoint.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::common::{Error, Result};

/// Handle to a spawned server process
#[derive(Debug)]
pub struct SutProcess {
    child: Child,
    program: String,
}

impl SutProcess {
    /// Spawn the server with stdin/stdout piped for the stdio transport.
    /// Stderr is piped too and drained into the diagnostic log.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Backstop: if the harness itself dies, the child goes with it
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| Error::spawn(program, e))?;

        if let Some(stderr) = child.stderr.take() {
            let name = program.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!("[{} stderr] {}", name, line);
                }
            });
        }

        tracing::info!("spawned server: {}", program);

        Ok(Self {
            child,
            program: program.to_string(),
        })
    }

    /// Take the stdio pipes for the transport (can only be done once)
    pub fn take_pipes(&mut self) -> Result<(ChildStdin, ChildStdout)> {
        let stdin = self
            .child
            .stdin
            .take()
            .ok_or_else(|| Error::Process("server stdin already taken".to_string()))?;
        let stdout = self
            .child
            .stdout
            .take()
            .ok_or_else(|| Error::Process("server stdout already taken".to_string()))?;
        Ok((stdin, stdout))
    }

    /// Fixed settling delay before the first request. The stdio protocol has
    /// no readiness signal, so the harness simply waits.
    pub async fn settle(&self, delay: Duration) {
        tracing::debug!("settling for {:?} before first request", delay);
        tokio::time::sleep(delay).await;
    }

    /// Terminate the server and block until it exits. Runs on every exit
    /// path of a harness run, so no orphan survives.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Err(e) = self.child.start_kill() {
            // Already exited on its own
            tracing::debug!("kill signal not delivered: {}", e);
        }

        let status = self.child.wait().await?;
        tracing::info!("server '{}' exited: {}", self.program, status);
        Ok(())
    }

    /// Whether the child has already exited
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

/// Poll `GET {base_url}/health` until it answers 200 or the deadline passes
pub async fn await_http_ready(base_url: &str, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::ReadinessTimeout(timeout.as_secs()));
        }

        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("health check passed: {}", url);
                return Ok(());
            }
            Ok(resp) => {
                tracing::debug!("health check returned {}", resp.status());
            }
            Err(e) => {
                tracing::debug!("health check not reachable yet: {}", e);
            }
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_missing_binary() {
        let err = SutProcess::spawn("/nonexistent/no-such-server", &[]).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let mut sut = SutProcess::spawn("cat", &[]).unwrap();
        let (_stdin, _stdout) = sut.take_pipes().unwrap();
        assert!(!sut.has_exited());
        sut.shutdown().await.unwrap();
        assert!(sut.has_exited());
    }

    #[tokio::test]
    async fn test_pipes_taken_once() {
        let mut sut = SutProcess::spawn("cat", &[]).unwrap();
        assert!(sut.take_pipes().is_ok());
        assert!(sut.take_pipes().is_err());
        sut.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_http_ready_times_out() {
        // Nothing listens on this port
        let err = await_http_ready("http://127.0.0.1:1", Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReadinessTimeout(_)));
    }
}
