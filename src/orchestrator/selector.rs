use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::segment::{Segment, SegmentStatus};

/// Walk the ordered segment list and pick at most one segment eligible for
/// dispatch, returning its position in the slice.
///
/// Eligibility, in index order:
/// - `completed` segments are skipped;
/// - a segment with a predecessor is blocked until that predecessor is
///   `completed` or its planning sub-phase has landed;
/// - `pending` and `failed` segments are eligible;
/// - a `processing` segment under the stuck threshold is being handled
///   elsewhere and is skipped; at or over the threshold the reaper should
///   already have failed it, so selecting it here only covers the window
///   between a failed reap write and the next read.
///
/// At most one segment per invocation keeps progress strictly sequential
/// and bounds the generator to one in-flight call per course.
pub fn select_next_segment(
    segments: &[Segment],
    stuck_timeout: Duration,
    now: DateTime<Utc>,
) -> Option<usize> {
    for (position, segment) in segments.iter().enumerate() {
        if segment.status == SegmentStatus::Completed {
            continue;
        }

        if position > 0 {
            let previous = &segments[position - 1];
            let unblocked =
                previous.status == SegmentStatus::Completed || previous.planning_completed();
            if !unblocked {
                debug!(
                    "Segment {} blocked on predecessor {} ({})",
                    segment.segment_index, previous.segment_index, previous.status
                );
                continue;
            }
        }

        match segment.status {
            SegmentStatus::Pending | SegmentStatus::Failed => return Some(position),
            SegmentStatus::Processing => {
                if segment.is_stuck(stuck_timeout, now) {
                    debug!(
                        "Segment {} stuck in processing past the reap window",
                        segment.segment_index
                    );
                    return Some(position);
                }
                debug!(
                    "Segment {} currently being handled elsewhere",
                    segment.segment_index
                );
            }
            SegmentStatus::Completed => unreachable!("completed segments are skipped above"),
        }
    }

    None
}
