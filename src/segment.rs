use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Processing status of a single segment
///
/// The orchestrator owns `pending -> processing` (claim) and
/// `processing -> failed` (reap); the external generator's completion
/// callback owns `processing -> completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    /// Never attempted
    Pending,

    /// Dispatch in flight
    Processing,

    /// Generation finished and persisted
    Completed,

    /// Attempt errored or timed out
    Failed,
}

impl SegmentStatus {
    /// Exhaustive transition table, enforced at the update layer.
    pub fn can_transition_to(&self, next: SegmentStatus) -> bool {
        matches!(
            (self, next),
            (SegmentStatus::Pending, SegmentStatus::Processing)
                | (SegmentStatus::Processing, SegmentStatus::Completed)
                | (SegmentStatus::Processing, SegmentStatus::Failed)
                | (SegmentStatus::Failed, SegmentStatus::Processing)
        )
    }

    /// Statuses from which a segment may be claimed for dispatch.
    pub fn is_claimable(&self) -> bool {
        matches!(self, SegmentStatus::Pending | SegmentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Pending => "pending",
            SegmentStatus::Processing => "processing",
            SegmentStatus::Completed => "completed",
            SegmentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-phase completion marker, distinct from full completion.
///
/// Set by the generator once a segment's planning pass lands; the selector
/// only ever compares against `Completed` to unblock the next segment early.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanningStatus {
    Pending,
    Processing,
    Completed,
}

/// A contiguous time slice of a source video, processed as one
/// independently dispatchable unit of course generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Segment row id
    pub id: Uuid,

    /// Owning course
    pub course_id: Uuid,

    /// Zero-based position within the course; defines dispatch order
    pub segment_index: u32,

    /// Start of the time range, seconds into the source video
    pub start_time: f64,

    /// End of the time range, seconds into the source video
    pub end_time: f64,

    /// Current processing status
    pub status: SegmentStatus,

    /// Sub-phase marker used to unblock the next segment early
    #[serde(default)]
    pub planning_status: Option<PlanningStatus>,

    /// Set on transition into `processing`, cleared on exit
    #[serde(default)]
    pub processing_started_at: Option<DateTime<Utc>>,

    /// Owner of the current dispatch attempt, cleared on reset
    #[serde(default)]
    pub worker_id: Option<String>,

    /// Last failure reason
    #[serde(default)]
    pub error_message: Option<String>,

    /// Key concepts accumulated across segments, handed to the successor
    #[serde(default)]
    pub cumulative_key_concepts: Vec<String>,
}

impl Segment {
    /// Whether this segment has been in `processing` for at least `timeout`.
    ///
    /// A missing `processing_started_at` on a processing segment counts as
    /// stuck: the timestamp is set atomically with the claim, so its absence
    /// means the row was left behind by a partial write.
    pub fn is_stuck(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        if self.status != SegmentStatus::Processing {
            return false;
        }
        match self.processing_started_at {
            Some(started) => now - started >= timeout,
            None => true,
        }
    }

    /// Whether the segment's planning sub-phase has landed.
    pub fn planning_completed(&self) -> bool {
        self.planning_status == Some(PlanningStatus::Completed)
    }
}

/// Count segments per status, keyed by the wire-format status string.
pub fn status_breakdown(segments: &[Segment]) -> HashMap<String, usize> {
    let mut breakdown = HashMap::new();
    for segment in segments {
        *breakdown.entry(segment.status.to_string()).or_insert(0) += 1;
    }
    breakdown
}

/// Count segments that reached terminal success.
pub fn completed_count(segments: &[Segment]) -> usize {
    segments
        .iter()
        .filter(|s| s.status == SegmentStatus::Completed)
        .count()
}
