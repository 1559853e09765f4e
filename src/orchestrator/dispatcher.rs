use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::course::Course;
use crate::generator::{GenerationRequest, HandoffContext, SegmentGenerator};
use crate::segment::Segment;

/// Build the handoff context carried from the previous segment, if any.
///
/// Only key concepts, the previous index, and the processed duration are
/// reconstructed here; transcript excerpts, prior questions, and the
/// summary are the generator's own concern on subsequent calls and stay
/// empty at this layer.
pub fn build_handoff(previous: Option<&Segment>) -> HandoffContext {
    match previous {
        Some(prev) => HandoffContext {
            key_concepts: prev.cumulative_key_concepts.clone(),
            segment_index: Some(prev.segment_index),
            total_processed_duration: prev.end_time,
            ..HandoffContext::default()
        },
        None => HandoffContext::default(),
    }
}

/// Invoke the generation collaborator for the selected segment.
///
/// Fire-and-dispatch: returns the generator's synchronous acknowledgment;
/// segment completion is observed only by re-reading status on a later tick.
pub async fn dispatch_segment(
    generator: &dyn SegmentGenerator,
    course: &Course,
    segment: &Segment,
    previous: Option<&Segment>,
    total_segments: usize,
    max_questions: u32,
) -> Result<Value> {
    let request = GenerationRequest {
        course_id: course.id,
        segment_id: segment.id,
        segment_index: segment.segment_index,
        youtube_url: course.youtube_url.clone(),
        start_time: segment.start_time,
        end_time: segment.end_time,
        session_id: course.session_id.clone(),
        previous_segment_context: build_handoff(previous),
        total_segments,
        max_questions,
    };

    info!(
        "🚀 Dispatching segment {}/{} for course {} ({:.0}s-{:.0}s)",
        segment.segment_index + 1,
        total_segments,
        course.id,
        segment.start_time,
        segment.end_time
    );

    generator.generate(&request).await
}
