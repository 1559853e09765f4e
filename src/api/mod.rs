//! API module for the CourseForge segment orchestrator
//!
//! Provides the tick endpoint polled by the web UI and scheduled triggers,
//! plus read-only course progress.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::orchestrator::Orchestrator;

pub mod handlers;
pub mod models;
pub mod server;

/// API Server for handling REST requests
pub struct ApiServer {
    orchestrator: Arc<Orchestrator>,
    config: Arc<Config>,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(orchestrator: Arc<Orchestrator>, config: Arc<Config>, port: u16) -> Self {
        Self {
            orchestrator,
            config,
            port,
        }
    }

    /// Start the API server in the background
    pub fn start_background(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.start().await })
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.port);

        server::start_http_server(self.orchestrator, self.config, self.port).await
    }
}
