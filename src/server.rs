//! MCP server over stdio and streamable HTTP.
//!
//! Both transports share one [`MemoryService`]; the HTTP transport builds a
//! fresh tool handler per MCP session around the same service.

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use std::sync::Arc;

use crate::config::CrewMemoryConfig;
use crate::service::MemoryService;
use crate::tools::CrewMemoryTools;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Transport {
    Stdio,
    Http,
}

impl std::str::FromStr for Transport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => anyhow::bail!("unknown transport: {other} (expected stdio or http)"),
        }
    }
}

fn shared_service(config: &CrewMemoryConfig) -> Arc<MemoryService> {
    tracing::info!(
        session_db = %config.resolved_session_db_path().display(),
        vector_dir = %config.resolved_vector_dir().display(),
        "memory stores configured"
    );
    Arc::new(MemoryService::new(config))
}

/// Start the server on `transport`, or the configured one when `None`.
pub async fn serve(config: CrewMemoryConfig, transport: Option<Transport>) -> Result<()> {
    let transport = match transport {
        Some(t) => t,
        None => config.server.transport.parse()?,
    };
    match transport {
        Transport::Stdio => serve_stdio(config).await,
        Transport::Http => serve_http(config).await,
    }
}

pub async fn serve_stdio(config: CrewMemoryConfig) -> Result<()> {
    tracing::info!("starting crew-memory MCP server on stdio");

    let tools = CrewMemoryTools::new(shared_service(&config));
    let server = tools.serve(rmcp::transport::stdio()).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");
    Ok(())
}

pub async fn serve_http(config: CrewMemoryConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting crew-memory MCP server on streamable HTTP");

    let service = shared_service(&config);
    let mcp = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(CrewMemoryTools::new(Arc::clone(&service))),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", mcp);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
