//! Segment processing orchestrator
//!
//! Drives course generation one bounded unit of work at a time: each tick
//! reaps stuck segments, evaluates course completion, and dispatches at most
//! one eligible segment to the external generator. The orchestrator is
//! invoked repeatedly by polling clients or scheduled triggers rather than
//! running as a long-lived loop; every tick re-reads fresh state.

pub mod completion;
pub mod dispatcher;
pub mod reaper;
pub mod selector;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::generator::SegmentGenerator;
use crate::segment::{completed_count, status_breakdown};
use crate::store::DataStore;

/// Errors that abort a tick
///
/// Everything else (reap writes, question counts, description backfill) is
/// tolerated and surfaced only as log lines.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("Course not found: {0}")]
    CourseNotFound(Uuid),

    #[error("No segments found for course {0}")]
    NoSegments(Uuid),

    #[error("Segment dispatch failed: {0}")]
    Dispatch(#[source] anyhow::Error),

    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),
}

/// Result of one orchestrator invocation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Every segment reached terminal success
    Completed {
        segments_total: usize,
        segments_completed: usize,
        questions_total: u64,
        course_published: bool,
    },

    /// Aggregate counts without dispatching (check-only)
    InProgress {
        segments_total: usize,
        segments_completed: usize,
        status_breakdown: HashMap<String, usize>,
    },

    /// No segment eligible for dispatch this tick
    Waiting {
        message: String,
        segments_total: usize,
        segments_completed: usize,
    },

    /// One segment was claimed and dispatched
    Processing {
        triggered_segment: u32,
        segments_total: usize,
        segments_completed: usize,
        /// Generator acknowledgment, forwarded verbatim
        response: Value,
    },
}

/// Composes reap, completion evaluation, selection, and dispatch into one
/// bounded tick per invocation
pub struct Orchestrator {
    store: Arc<dyn DataStore>,
    generator: Arc<dyn SegmentGenerator>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn DataStore>,
        generator: Arc<dyn SegmentGenerator>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    fn stuck_timeout(&self) -> Duration {
        Duration::seconds(self.config.stuck_timeout_seconds as i64)
    }

    /// Run one tick: reap stuck segments, report completion, else claim and
    /// dispatch at most one eligible segment.
    pub async fn tick(&self, course_id: Uuid, check_only: bool) -> Result<TickOutcome, TickError> {
        let now = Utc::now();

        let course = self
            .store
            .get_course(course_id)
            .await
            .map_err(TickError::Store)?
            .ok_or(TickError::CourseNotFound(course_id))?;

        let mut segments = self
            .store
            .list_segments(course_id)
            .await
            .map_err(TickError::Store)?;
        if segments.is_empty() {
            return Err(TickError::NoSegments(course_id));
        }

        // Reap before anything else so later decisions never observe a
        // segment that is "processing" but actually abandoned
        reaper::reap_stuck_segments(&*self.store, &mut segments, self.stuck_timeout(), now).await;

        if let Some(report) =
            completion::evaluate_completion(&*self.store, &course, &segments).await
        {
            return Ok(TickOutcome::Completed {
                segments_total: report.segments_total,
                segments_completed: report.segments_completed,
                questions_total: report.questions_total,
                course_published: report.course_published,
            });
        }

        let segments_total = segments.len();
        let segments_completed = completed_count(&segments);

        if check_only {
            return Ok(TickOutcome::InProgress {
                segments_total,
                segments_completed,
                status_breakdown: status_breakdown(&segments),
            });
        }

        let Some(position) = selector::select_next_segment(&segments, self.stuck_timeout(), now)
        else {
            info!(
                "⏳ Course {}: no eligible segment ({}/{} completed)",
                course_id, segments_completed, segments_total
            );
            return Ok(TickOutcome::Waiting {
                message: "No eligible segment; waiting on in-flight or blocked segments"
                    .to_string(),
                segments_total,
                segments_completed,
            });
        };

        let selected = &segments[position];
        let worker_id = format!("orchestrator-{}", Uuid::new_v4());

        let claimed = self
            .store
            .claim_segment(selected.id, &worker_id, now)
            .await
            .map_err(TickError::Store)?;
        if !claimed {
            info!(
                "⏳ Segment {} of course {} already claimed elsewhere",
                selected.segment_index, course_id
            );
            return Ok(TickOutcome::Waiting {
                message: format!(
                    "Segment {} already claimed by another worker",
                    selected.segment_index
                ),
                segments_total,
                segments_completed,
            });
        }

        let previous = position.checked_sub(1).map(|p| &segments[p]);
        match dispatcher::dispatch_segment(
            &*self.generator,
            &course,
            selected,
            previous,
            segments_total,
            self.config.max_questions_per_segment,
        )
        .await
        {
            Ok(response) => Ok(TickOutcome::Processing {
                triggered_segment: selected.segment_index,
                segments_total,
                segments_completed,
                response,
            }),
            Err(e) => {
                // Release the claim so the next tick can retry immediately
                // instead of waiting out the stuck threshold
                let release_message = format!("Dispatch failed: {}", e);
                if let Err(release_err) =
                    self.store.mark_failed(&[selected.id], &release_message).await
                {
                    warn!(
                        "Failed to release claim on segment {}: {}",
                        selected.id, release_err
                    );
                }
                Err(TickError::Dispatch(e))
            }
        }
    }

    /// Read-only aggregate view of a course, without the reap write.
    pub async fn course_status(&self, course_id: Uuid) -> Result<TickOutcome, TickError> {
        self.store
            .get_course(course_id)
            .await
            .map_err(TickError::Store)?
            .ok_or(TickError::CourseNotFound(course_id))?;

        let segments = self
            .store
            .list_segments(course_id)
            .await
            .map_err(TickError::Store)?;
        if segments.is_empty() {
            return Err(TickError::NoSegments(course_id));
        }

        Ok(TickOutcome::InProgress {
            segments_total: segments.len(),
            segments_completed: completed_count(&segments),
            status_breakdown: status_breakdown(&segments),
        })
    }
}
