use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::segment::{Segment, SegmentStatus};
use crate::store::DataStore;

/// Demote every stuck `processing` segment to `failed` with a single
/// batched store update, and mirror the patch onto the local list so
/// downstream decisions in the same tick never observe abandoned work.
///
/// A failed write is logged and swallowed: the local list stays stale and
/// the next tick re-attempts the reap.
pub async fn reap_stuck_segments(
    store: &dyn DataStore,
    segments: &mut [Segment],
    timeout: Duration,
    now: DateTime<Utc>,
) -> usize {
    let stuck_ids: Vec<Uuid> = segments
        .iter()
        .filter(|s| s.is_stuck(timeout, now))
        .map(|s| s.id)
        .collect();

    if stuck_ids.is_empty() {
        return 0;
    }

    let error_message = format!(
        "Processing timeout - exceeded {} minutes",
        timeout.num_minutes()
    );

    if let Err(e) = store.mark_failed(&stuck_ids, &error_message).await {
        warn!("Failed to reap {} stuck segments: {}", stuck_ids.len(), e);
        return 0;
    }

    for segment in segments.iter_mut() {
        if stuck_ids.contains(&segment.id) {
            segment.status = SegmentStatus::Failed;
            segment.error_message = Some(error_message.clone());
            segment.worker_id = None;
            segment.processing_started_at = None;
        }
    }

    info!("🧹 Reaped {} stuck segments", stuck_ids.len());
    stuck_ids.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn segment(course_id: Uuid, index: u32, status: SegmentStatus) -> Segment {
        Segment {
            id: Uuid::new_v4(),
            course_id,
            segment_index: index,
            start_time: index as f64 * 300.0,
            end_time: (index as f64 + 1.0) * 300.0,
            status,
            planning_status: None,
            processing_started_at: None,
            worker_id: None,
            error_message: None,
            cumulative_key_concepts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_reaps_only_timed_out_segments() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let now = Utc::now();

        let mut stale = segment(course_id, 0, SegmentStatus::Processing);
        stale.processing_started_at = Some(now - Duration::minutes(10));
        stale.worker_id = Some("worker-old".to_string());

        let mut fresh = segment(course_id, 1, SegmentStatus::Processing);
        fresh.processing_started_at = Some(now - Duration::minutes(2));

        store
            .insert_segments(course_id, vec![stale.clone(), fresh.clone()])
            .await;
        let mut segments = vec![stale, fresh];

        let reaped =
            reap_stuck_segments(&*store, &mut segments, Duration::minutes(5), now).await;
        assert_eq!(reaped, 1);

        // Local view and store agree
        assert_eq!(segments[0].status, SegmentStatus::Failed);
        assert_eq!(
            segments[0].error_message.as_deref(),
            Some("Processing timeout - exceeded 5 minutes")
        );
        assert!(segments[0].worker_id.is_none());
        assert_eq!(segments[1].status, SegmentStatus::Processing);

        let stored = store.get_segment(course_id, 0).await.unwrap();
        assert_eq!(stored.status, SegmentStatus::Failed);
    }

    #[tokio::test]
    async fn test_reap_is_idempotent() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let now = Utc::now();

        let mut stale = segment(course_id, 0, SegmentStatus::Processing);
        stale.processing_started_at = Some(now - Duration::minutes(10));
        store.insert_segments(course_id, vec![stale.clone()]).await;
        let mut segments = vec![stale];

        let first = reap_stuck_segments(&*store, &mut segments, Duration::minutes(5), now).await;
        assert_eq!(first, 1);

        // Second pass with no time change: nothing left to reap
        let second = reap_stuck_segments(&*store, &mut segments, Duration::minutes(5), now).await;
        assert_eq!(second, 0);

        let stored = store.get_segment(course_id, 0).await.unwrap();
        assert_eq!(
            stored.error_message.as_deref(),
            Some("Processing timeout - exceeded 5 minutes")
        );
    }

    #[tokio::test]
    async fn test_reap_write_failure_leaves_local_view_stale() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let now = Utc::now();

        let mut stale = segment(course_id, 0, SegmentStatus::Processing);
        stale.processing_started_at = Some(now - Duration::minutes(10));
        store.insert_segments(course_id, vec![stale.clone()]).await;
        store.set_fail_mark_failed(true);
        let mut segments = vec![stale];

        let reaped =
            reap_stuck_segments(&*store, &mut segments, Duration::minutes(5), now).await;
        assert_eq!(reaped, 0);

        // Not patched locally either: the next tick retries the reap
        assert_eq!(segments[0].status, SegmentStatus::Processing);
    }
}
