use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A video-to-course conversion job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Course row id
    pub id: Uuid,

    /// Source video reference
    pub youtube_url: String,

    /// Flipped to true by the last segment's own completion handler,
    /// never by this orchestrator
    pub published: bool,

    /// Human-readable description; starts as a generic placeholder and is
    /// backfilled from the generated video summary once all segments land
    pub description: String,

    /// Generation session forwarded to the segment generator
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Course {
    /// Whether the description is still one of the generated placeholders
    /// written at course-setup time. Only placeholder descriptions are
    /// eligible for summary backfill; user-edited text is never overwritten.
    pub fn has_generic_description(&self) -> bool {
        let pattern = Regex::new(
            r"^(Interactive course (?:from|generated from)|Course generated from)\b",
        )
        .expect("placeholder pattern is valid");
        pattern.is_match(self.description.trim())
    }
}
