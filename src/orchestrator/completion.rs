use tracing::{debug, info, warn};

use crate::course::Course;
use crate::segment::{completed_count, Segment, SegmentStatus};
use crate::store::DataStore;

/// Course-level completion report
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub segments_total: usize,
    pub segments_completed: usize,
    pub questions_total: u64,
    pub course_published: bool,
}

/// Check whether every segment reached terminal success; if so, gather the
/// course-level report and backfill the description from the generated
/// video summary.
///
/// Returns `None` when the course is not yet complete. Flipping `published`
/// is the last segment's own completion handler's job, not ours — doing it
/// here would race that segment's question rows. The description backfill is
/// cosmetic and safe to race, so it is best-effort: count and summary
/// failures are logged and never block the completed report.
pub async fn evaluate_completion(
    store: &dyn DataStore,
    course: &Course,
    segments: &[Segment],
) -> Option<CompletionReport> {
    if !segments
        .iter()
        .all(|s| s.status == SegmentStatus::Completed)
    {
        return None;
    }

    let questions_total = match store.count_questions(course.id).await {
        Ok(count) => count,
        Err(e) => {
            warn!("Failed to count questions for course {}: {}", course.id, e);
            0
        }
    };

    if !course.published && course.has_generic_description() {
        backfill_description(store, course).await;
    }

    info!(
        "🎉 Course {} complete: {} segments, {} questions",
        course.id,
        segments.len(),
        questions_total
    );

    Some(CompletionReport {
        segments_total: segments.len(),
        segments_completed: completed_count(segments),
        questions_total,
        course_published: course.published,
    })
}

/// Replace the placeholder description with the generated video summary,
/// if one exists. Idempotent: re-running with the same summary writes the
/// same text.
async fn backfill_description(store: &dyn DataStore, course: &Course) {
    let summary = match store.latest_video_summary(course.id).await {
        Ok(Some(summary)) if !summary.trim().is_empty() => summary,
        Ok(_) => {
            debug!("No video summary available for course {}", course.id);
            return;
        }
        Err(e) => {
            warn!(
                "Failed to fetch video summary for course {}: {}",
                course.id, e
            );
            return;
        }
    };

    match store.update_description(course.id, &summary).await {
        Ok(()) => info!("📝 Backfilled description for course {}", course.id),
        Err(e) => warn!(
            "Failed to backfill description for course {}: {}",
            course.id, e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::CourseStore;
    use uuid::Uuid;

    fn course(id: Uuid, description: &str, published: bool) -> Course {
        Course {
            id,
            youtube_url: "https://www.youtube.com/watch?v=abc123".to_string(),
            published,
            description: description.to_string(),
            session_id: None,
        }
    }

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
    async fn test_incomplete_course_returns_none() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let c = course(course_id, "Interactive course from a video", false);
        let segments = vec![
            segment(course_id, 0, SegmentStatus::Completed),
            segment(course_id, 1, SegmentStatus::Processing),
        ];

        assert!(evaluate_completion(&*store, &c, &segments).await.is_none());
    }

    #[tokio::test]
    async fn test_completed_course_reports_counts() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let c = course(course_id, "My real description", true);
        store.insert_course(c.clone()).await;
        store.set_question_count(course_id, 15).await;

        let segments = vec![
            segment(course_id, 0, SegmentStatus::Completed),
            segment(course_id, 1, SegmentStatus::Completed),
            segment(course_id, 2, SegmentStatus::Completed),
        ];

        let report = evaluate_completion(&*store, &c, &segments).await.unwrap();
        assert_eq!(
            report,
            CompletionReport {
                segments_total: 3,
                segments_completed: 3,
                questions_total: 15,
                course_published: true,
            }
        );
    }

    #[tokio::test]
    async fn test_description_backfilled_from_summary() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let c = course(course_id, "Interactive course from youtube.com/watch", false);
        store.insert_course(c.clone()).await;
        store
            .set_video_summary(course_id, "A hands-on tour of Rust ownership.")
            .await;

        let segments = vec![segment(course_id, 0, SegmentStatus::Completed)];
        evaluate_completion(&*store, &c, &segments).await.unwrap();

        let updated = store.get_course(course_id).await.unwrap().unwrap();
        assert_eq!(updated.description, "A hands-on tour of Rust ownership.");
    }

    #[tokio::test]
    async fn test_backfill_is_idempotent() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let c = course(course_id, "Interactive course from youtube.com/watch", false);
        store.insert_course(c.clone()).await;
        store
            .set_video_summary(course_id, "A hands-on tour of Rust ownership.")
            .await;

        let segments = vec![segment(course_id, 0, SegmentStatus::Completed)];
        evaluate_completion(&*store, &c, &segments).await.unwrap();
        evaluate_completion(&*store, &c, &segments).await.unwrap();

        let updated = store.get_course(course_id).await.unwrap().unwrap();
        // No duplication or concatenation on the second pass
        assert_eq!(updated.description, "A hands-on tour of Rust ownership.");
    }

    #[tokio::test]
    async fn test_user_description_never_overwritten() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let c = course(course_id, "Hand-written by the author", false);
        store.insert_course(c.clone()).await;
        store.set_video_summary(course_id, "Generated summary").await;

        let segments = vec![segment(course_id, 0, SegmentStatus::Completed)];
        evaluate_completion(&*store, &c, &segments).await.unwrap();

        let updated = store.get_course(course_id).await.unwrap().unwrap();
        assert_eq!(updated.description, "Hand-written by the author");
    }

    #[tokio::test]
    async fn test_summary_fetch_failure_still_reports_completed() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let c = course(course_id, "Interactive course from a video", false);
        store.insert_course(c.clone()).await;
        store.set_fail_transcripts(true);

        let segments = vec![segment(course_id, 0, SegmentStatus::Completed)];
        let report = evaluate_completion(&*store, &c, &segments).await;
        assert!(report.is_some());
    }
}
