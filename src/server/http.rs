use axum::{routing::get, Router};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use tracing::info;

use crate::{
    error::{DrugError, Result},
    server::{DrugToolServer, ShutdownSignal},
};

async fn health() -> &'static str {
    "OK"
}

/// Routes: `GET /health` and the streamable-HTTP MCP endpoint at `/mcp`
pub fn router(server: DrugToolServer) -> Router {
    let mcp = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .route("/health", get(health))
        .nest_service("/mcp", mcp)
}

/// Serve MCP over HTTP on `address` until ctrl-c or SIGTERM
pub async fn serve_http(server: DrugToolServer, address: &str) -> Result<()> {
    let shutdown = ShutdownSignal::install()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|e| DrugError::Config(format!("failed to bind {}: {}", address, e)))?;

    info!("Starting HTTP MCP server on {}", address);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async move {
            let signal = shutdown.recv().await;
            info!("Received {}, shutting down...", signal);
        })
        .await
        .map_err(|e| DrugError::Other(anyhow::anyhow!("HTTP server error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::ndc::EligibilityCache;
    use crate::rxnav::MockTerminologyApi;
    use crate::service::DrugService;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_endpoint() {
        let service = DrugService::from_parts(
            Arc::new(MockTerminologyApi::new()),
            Arc::new(EligibilityCache::new()),
        );
        let config = ServerConfig {
            name: "340b-drugs".to_string(),
            version: "1.0.0".to_string(),
            port: None,
            bind_address: "127.0.0.1".to_string(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(DrugToolServer::new(service, &config));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let body = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "OK");
    }
}
