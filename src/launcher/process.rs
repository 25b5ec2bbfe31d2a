//! Process spawn, endpoint parse, and guarded shutdown.

// ============================================================================
// Imports
// ============================================================================

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::options::LaunchOptions;

// ============================================================================
// Constants
// ============================================================================

/// How long to wait for the endpoint line on standard error.
const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a kill may take before escalating to a force signal.
const KILL_TIMEOUT: Duration = Duration::from_secs(5);

/// Marker preceding the WebSocket endpoint on standard error.
const ENDPOINT_MARKER: &str = "DevTools listening on ";

// ============================================================================
// ChromeProcess
// ============================================================================

/// A running Chrome process owned by the engine.
///
/// Dropping the handle sends a kill signal; [`ChromeProcess::kill`] is the
/// clean path and also removes a temporary profile directory.
#[derive(Debug)]
pub struct ChromeProcess {
    child: Option<Child>,
    pid: u32,
    ws_endpoint: String,
    port: u16,
    temp_dir: Option<tempfile::TempDir>,
}

impl ChromeProcess {
    /// Returns the browser-level WebSocket endpoint.
    #[inline]
    #[must_use]
    pub fn ws_endpoint(&self) -> &str {
        &self.ws_endpoint
    }

    /// Returns the debugging port Chrome actually bound.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the HTTP endpoint base for `/json/*` discovery.
    #[must_use]
    pub fn http_base(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Returns the process id.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Terminates the process, waits for exit, and removes a temporary
    /// profile directory.
    ///
    /// An exit that does not complete within 5 seconds escalates to a force
    /// signal.
    pub async fn kill(mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing Chrome process");

            if let Err(e) = child.start_kill() {
                debug!(pid = self.pid, error = %e, "Kill signal failed");
            }

            match timeout(KILL_TIMEOUT, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(pid = self.pid, %status, "Chrome terminated");
                }
                Ok(Err(e)) => {
                    warn!(pid = self.pid, error = %e, "Failed to reap Chrome");
                }
                Err(_) => {
                    warn!(pid = self.pid, "Chrome ignored kill; forcing");
                    let _ = child.kill().await;
                }
            }
        }

        // Dropping the TempDir removes the profile directory.
        if let Some(temp_dir) = self.temp_dir.take() {
            drop(temp_dir);
            debug!(pid = self.pid, "Removed temporary profile directory");
        }

        Ok(())
    }
}

impl Drop for ChromeProcess {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// launch
// ============================================================================

/// Spawns Chrome with debugging flags and waits for its endpoint line.
///
/// # Errors
///
/// - [`Error::ChromeNotFound`] when no executable was found or configured
/// - [`Error::ProcessLaunchFailed`] when the process fails to start
/// - [`Error::ConnectionTimeout`] when the endpoint line never appears
pub async fn launch(options: LaunchOptions) -> Result<ChromeProcess> {
    let executable = options
        .executable
        .clone()
        .or_else(super::find_chrome)
        .ok_or(Error::ChromeNotFound)?;

    let (user_data_dir, temp_dir) = match &options.user_data_dir {
        Some(dir) => (dir.clone(), None),
        None => {
            let temp = tempfile::TempDir::with_prefix("chrome-debugger-")?;
            (temp.path().to_path_buf(), Some(temp))
        }
    };

    let mut cmd = Command::new(&executable);
    cmd.args(options.to_args())
        .arg(format!("--user-data-dir={}", user_data_dir.display()))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(Error::process_launch_failed)?;
    let pid = child.id().unwrap_or(0);
    info!(pid, executable = %executable.display(), "Chrome process spawned");

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::config("child stderr not captured"))?;

    let ws_endpoint = match timeout(ENDPOINT_TIMEOUT, read_endpoint_line(stderr)).await {
        Ok(Ok(endpoint)) => endpoint,
        Ok(Err(e)) => {
            let _ = child.start_kill();
            return Err(e);
        }
        Err(_) => {
            let _ = child.start_kill();
            return Err(Error::connection_timeout(ENDPOINT_TIMEOUT.as_millis() as u64));
        }
    };

    let port = parse_port(&ws_endpoint).unwrap_or(options.port);
    debug!(pid, %ws_endpoint, port, "Endpoint discovered");

    Ok(ChromeProcess {
        child: Some(child),
        pid,
        ws_endpoint,
        port,
        temp_dir,
    })
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Scans standard error for the endpoint line, draining the rest in the
/// background so the pipe never backs up.
async fn read_endpoint_line(stderr: tokio::process::ChildStderr) -> Result<String> {
    let mut lines = BufReader::new(stderr).lines();

    while let Some(line) = lines.next_line().await? {
        if let Some(endpoint) = parse_endpoint_line(&line) {
            tokio::spawn(async move {
                let mut lines = lines;
                while let Ok(Some(_)) = lines.next_line().await {}
            });
            return Ok(endpoint);
        }
    }

    Err(Error::ProcessLaunchFailed {
        message: "Chrome exited before announcing its DevTools endpoint".to_string(),
    })
}

/// Extracts the WebSocket URL from an endpoint line.
fn parse_endpoint_line(line: &str) -> Option<String> {
    line.find(ENDPOINT_MARKER)
        .map(|idx| line[idx + ENDPOINT_MARKER.len()..].trim().to_string())
        .filter(|url| url.starts_with("ws://") || url.starts_with("wss://"))
}

/// Extracts the port from a `ws://host:port/...` URL.
fn parse_port(ws_url: &str) -> Option<u16> {
    let after_scheme = ws_url.split("://").nth(1)?;
    let authority = after_scheme.split('/').next()?;
    authority.rsplit(':').next()?.parse().ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_line() {
        let line = "DevTools listening on ws://127.0.0.1:9222/devtools/browser/abc-def";
        assert_eq!(
            parse_endpoint_line(line).as_deref(),
            Some("ws://127.0.0.1:9222/devtools/browser/abc-def")
        );
    }

    #[test]
    fn test_parse_endpoint_line_rejects_noise() {
        assert!(parse_endpoint_line("[WARNING] something happened").is_none());
        assert!(parse_endpoint_line("DevTools listening on nothing-useful").is_none());
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(
            parse_port("ws://127.0.0.1:9222/devtools/browser/abc"),
            Some(9222)
        );
        assert_eq!(parse_port("ws://localhost:0/x"), Some(0));
        assert!(parse_port("not-a-url").is_none());
    }

    #[test]
    fn test_kill_timeout_constant() {
        assert_eq!(KILL_TIMEOUT.as_secs(), 5);
    }
}
