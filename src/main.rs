use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use courseforge_rust::api::ApiServer;
use courseforge_rust::config::Config;
use courseforge_rust::generator::HttpSegmentGenerator;
use courseforge_rust::orchestrator::Orchestrator;
use courseforge_rust::store::rest::RestStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("courseforge_rust=info,warn")
        .init();

    let matches = Command::new("CourseForge Orchestrator")
        .version("0.1.0")
        .author("CourseForge")
        .about("Segment processing orchestrator for YouTube-to-course generation")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port for the HTTP API"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Path to a configuration file"),
        )
        .arg(
            Arg::new("course-id")
                .short('c')
                .long("course-id")
                .value_name("UUID")
                .help("Run a single tick for this course and print the report instead of serving"),
        )
        .arg(
            Arg::new("check-only")
                .long("check-only")
                .help("With --course-id, report counts without dispatching")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("verbose") {
        info!("Verbose logging enabled");
    }

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port.parse()?;
    }

    config.validate()?;
    info!("🚀 CourseForge orchestrator starting...");
    info!("{}", config.summary());

    // Wire up collaborators
    let store = Arc::new(RestStore::new(config.store.clone())?);
    let generator = Arc::new(HttpSegmentGenerator::new(config.generator.clone())?);
    let orchestrator = Arc::new(Orchestrator::new(
        store,
        generator,
        config.orchestrator.clone(),
    ));

    // One-shot mode for scheduled triggers
    if let Some(course_id) = matches.get_one::<String>("course-id") {
        let course_id: Uuid = course_id.parse()?;
        let check_only = matches.get_flag("check-only");

        let outcome = orchestrator.tick(course_id, check_only).await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    // Serve the polling API
    let port = config.server.port;
    let server = ApiServer::new(orchestrator, Arc::new(config), port);
    server.start().await
}
