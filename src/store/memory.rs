use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CourseStore, QuestionStore, SegmentStore, TranscriptStore};
use crate::course::Course;
use crate::segment::{Segment, SegmentStatus};

/// In-process store for tests and local development
///
/// Applies the same status transition rules the hosted store enforces, so
/// orchestrator behavior against it matches production.
#[derive(Debug, Default)]
pub struct MemoryStore {
    courses: RwLock<HashMap<Uuid, Course>>,
    segments: RwLock<HashMap<Uuid, Vec<Segment>>>,
    question_counts: RwLock<HashMap<Uuid, u64>>,
    video_summaries: RwLock<HashMap<Uuid, String>>,
    fail_mark_failed: AtomicBool,
    fail_transcripts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn insert_course(&self, course: Course) {
        self.courses.write().await.insert(course.id, course);
    }

    pub async fn insert_segments(&self, course_id: Uuid, mut segments: Vec<Segment>) {
        segments.sort_by_key(|s| s.segment_index);
        self.segments.write().await.insert(course_id, segments);
    }

    pub async fn set_question_count(&self, course_id: Uuid, count: u64) {
        self.question_counts.write().await.insert(course_id, count);
    }

    pub async fn set_video_summary(&self, course_id: Uuid, summary: impl Into<String>) {
        self.video_summaries
            .write()
            .await
            .insert(course_id, summary.into());
    }

    /// Make subsequent `mark_failed` calls error, to exercise the
    /// tolerated-reap-failure path.
    pub fn set_fail_mark_failed(&self, fail: bool) {
        self.fail_mark_failed.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent transcript reads error, to exercise the
    /// best-effort backfill path.
    pub fn set_fail_transcripts(&self, fail: bool) {
        self.fail_transcripts.store(fail, Ordering::SeqCst);
    }

    pub async fn get_segment(&self, course_id: Uuid, segment_index: u32) -> Option<Segment> {
        self.segments
            .read()
            .await
            .get(&course_id)?
            .iter()
            .find(|s| s.segment_index == segment_index)
            .cloned()
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>> {
        Ok(self.courses.read().await.get(&course_id).cloned())
    }

    async fn update_description(&self, course_id: Uuid, description: &str) -> Result<()> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(&course_id)
            .ok_or_else(|| anyhow!("Course not found: {}", course_id))?;
        course.description = description.to_string();
        Ok(())
    }
}

#[async_trait]
impl SegmentStore for MemoryStore {
    async fn list_segments(&self, course_id: Uuid) -> Result<Vec<Segment>> {
        Ok(self
            .segments
            .read()
            .await
            .get(&course_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_failed(&self, segment_ids: &[Uuid], error_message: &str) -> Result<()> {
        if self.fail_mark_failed.load(Ordering::SeqCst) {
            return Err(anyhow!("mark_failed write rejected"));
        }

        let mut segments = self.segments.write().await;
        for course_segments in segments.values_mut() {
            for segment in course_segments.iter_mut() {
                if segment_ids.contains(&segment.id)
                    && segment.status.can_transition_to(SegmentStatus::Failed)
                {
                    segment.status = SegmentStatus::Failed;
                    segment.error_message = Some(error_message.to_string());
                    segment.worker_id = None;
                    segment.processing_started_at = None;
                }
            }
        }
        Ok(())
    }

    async fn claim_segment(
        &self,
        segment_id: Uuid,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut segments = self.segments.write().await;
        for course_segments in segments.values_mut() {
            if let Some(segment) = course_segments.iter_mut().find(|s| s.id == segment_id) {
                if !segment.status.is_claimable() {
                    return Ok(false);
                }
                segment.status = SegmentStatus::Processing;
                segment.worker_id = Some(worker_id.to_string());
                segment.processing_started_at = Some(now);
                return Ok(true);
            }
        }
        Err(anyhow!("Segment not found: {}", segment_id))
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn count_questions(&self, course_id: Uuid) -> Result<u64> {
        Ok(self
            .question_counts
            .read()
            .await
            .get(&course_id)
            .copied()
            .unwrap_or(0))
    }
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn latest_video_summary(&self, course_id: Uuid) -> Result<Option<String>> {
        if self.fail_transcripts.load(Ordering::SeqCst) {
            return Err(anyhow!("transcript read rejected"));
        }

        Ok(self.video_summaries.read().await.get(&course_id).cloned())
    }
}
