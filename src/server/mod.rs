pub mod handler;
pub mod http;
pub mod tools;

pub use handler::DrugToolServer;
pub use tools::{call_tool, ToolKind, ToolOutput};

use rmcp::ServiceExt;
use tracing::info;

use crate::error::{DrugError, Result};

/// Process shutdown signals, registered before the server starts so none is missed
pub struct ShutdownSignal {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    pub fn install() -> Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .map_err(|e| DrugError::Other(anyhow::anyhow!("failed to install SIGTERM handler: {}", e)))?,
        })
    }

    /// Wait for ctrl-c or SIGTERM and return which one arrived
    #[cfg(unix)]
    pub async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => "ctrl-c",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }
}

/// Serve MCP over stdin/stdout until the client disconnects or a shutdown signal
pub async fn serve_stdio(server: DrugToolServer) -> Result<()> {
    let shutdown = ShutdownSignal::install()?;
    info!("Starting stdio MCP server...");

    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| DrugError::Other(anyhow::anyhow!("MCP initialization failed: {}", e)))?;

    tokio::select! {
        quit = running.waiting() => {
            let reason = quit.map_err(|e| DrugError::Other(anyhow::anyhow!("Server error: {}", e)))?;
            info!("MCP session ended: {:?}", reason);
        }
        signal = shutdown.recv() => {
            info!("Received {}, shutting down...", signal);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_stops_server() {
        let shutdown = ShutdownSignal::install().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let received = tokio::time::timeout(Duration::from_secs(5), shutdown.recv())
            .await
            .unwrap();
        assert_eq!(received, "SIGTERM");
    }
}
