//! API request handlers

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::orchestrator::{Orchestrator, TickOutcome};

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(serde_json::json!({
        "status": "healthy",
        "service": "courseforge-orchestrator",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Handle tick invocations: run one reap/evaluate/dispatch cycle
pub async fn process_course(
    orchestrator: &Arc<Orchestrator>,
    course_id: Uuid,
    check_only: bool,
) -> Result<Value> {
    let outcome = orchestrator.tick(course_id, check_only).await?;
    outcome_body(&outcome)
}

/// Handle read-only course status requests
pub async fn get_course_status(
    orchestrator: &Arc<Orchestrator>,
    course_id: Uuid,
) -> Result<Value> {
    let outcome = orchestrator.course_status(course_id).await?;
    outcome_body(&outcome)
}

/// Flatten a tick outcome into the response body, with the success flag
/// all non-fatal outcomes carry.
fn outcome_body(outcome: &TickOutcome) -> Result<Value> {
    let mut body = serde_json::to_value(outcome)?;
    body["success"] = Value::Bool(true);
    Ok(body)
}
