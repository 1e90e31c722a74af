use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::models::asset::{MediaKind, SocialMetadata, StoredObjectRef};
use crate::models::insight::{ProcessedMediaResult, RecognitionOutput};
use crate::models::job::{JobStatus, PollOutcome};
use crate::services::recognition::RecognitionBackend;
use crate::services::transcription::TranscriptionBackend;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Interval between status polls of a long-running job.
    pub poll_interval: Duration,
    /// Poll budget per job; exhausting it yields `PollOutcome::TimedOut`.
    pub max_poll_attempts: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 120,
        }
    }
}

/// A single observation of a polling job, as fed to the poll driver.
pub enum PollTick<T> {
    InProgress,
    Succeeded(T),
    Failed(String),
}

/// Drive one polling job to a terminal outcome: sleep an interval, ask for
/// status, repeat until the job terminates, the attempt budget runs out, or
/// the caller cancels. A transport error on the status call terminates the
/// job as failed rather than burning the rest of the budget.
pub async fn drive_poll<T, E, F, Fut>(
    interval: Duration,
    max_attempts: u32,
    cancel: &CancellationToken,
    mut poll: F,
) -> PollOutcome<T>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollTick<T>, E>>,
{
    for _ in 0..max_attempts {
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep(interval) => {}
        }

        match poll().await {
            Ok(PollTick::InProgress) => continue,
            Ok(PollTick::Succeeded(value)) => return PollOutcome::Succeeded(value),
            Ok(PollTick::Failed(reason)) => return PollOutcome::Failed(reason),
            Err(e) => return PollOutcome::Failed(e.to_string()),
        }
    }

    PollOutcome::TimedOut
}

/// Media Analysis Coordinator: decides which analysis jobs apply to the
/// stored object, runs them, and merges whatever succeeded. A failed,
/// timed-out or cancelled job leaves its field unset; `analyze` itself
/// never fails.
pub struct MediaAnalyzer {
    recognition: Arc<dyn RecognitionBackend>,
    transcription: Arc<dyn TranscriptionBackend>,
    config: AnalysisConfig,
}

impl MediaAnalyzer {
    pub fn new(
        recognition: Arc<dyn RecognitionBackend>,
        transcription: Arc<dyn TranscriptionBackend>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            recognition,
            transcription,
            config,
        }
    }

    pub async fn analyze(
        &self,
        object: &StoredObjectRef,
        mime_type: &str,
        social: Option<&SocialMetadata>,
        cancel: &CancellationToken,
    ) -> ProcessedMediaResult {
        let kind = MediaKind::from_mime(mime_type);
        tracing::info!(key = %object.key, mime = %mime_type, kind = %kind, "starting media analysis");

        // Storage is already confirmed, so both jobs can run against the
        // object at once; each reaches a terminal state before the merge.
        let (transcript, recognition) = tokio::join!(
            self.run_transcription(object, mime_type, kind, cancel),
            self.run_recognition(object, kind, cancel),
        );

        ProcessedMediaResult::merge(recognition, transcript, social)
    }

    async fn run_transcription(
        &self,
        object: &StoredObjectRef,
        mime_type: &str,
        kind: MediaKind,
        cancel: &CancellationToken,
    ) -> Option<String> {
        if !kind.wants_transcription() {
            return None;
        }

        let job_name = match self
            .transcription
            .start_job(&object.bucket, &object.key, mime_type)
            .await
        {
            Ok(name) => name,
            Err(e) => {
                return absorb_failure("transcription", &e.to_string());
            }
        };

        tracing::info!(job_name = %job_name, "transcription job started");

        let backend = Arc::clone(&self.transcription);
        let name = job_name.clone();
        let outcome = drive_poll(
            self.config.poll_interval,
            self.config.max_poll_attempts,
            cancel,
            move || {
                let backend = Arc::clone(&backend);
                let name = name.clone();
                async move {
                    let poll = backend.poll_job(&name).await?;
                    Ok::<_, crate::services::transcription::TranscriptionError>(match poll.status {
                        JobStatus::Succeeded => match poll.result_uri {
                            Some(uri) => PollTick::Succeeded(uri),
                            None => {
                                PollTick::Failed("job succeeded without a result URI".to_string())
                            }
                        },
                        JobStatus::Failed => {
                            PollTick::Failed("provider reported the job failed".to_string())
                        }
                        JobStatus::InProgress => PollTick::InProgress,
                    })
                }
            },
        )
        .await;

        match outcome {
            PollOutcome::Succeeded(result_uri) => {
                match self.transcription.fetch_transcript(&result_uri).await {
                    Ok(transcripts) => {
                        tracing::info!(job_name = %job_name, "transcription complete");
                        Some(transcripts)
                    }
                    Err(e) => absorb_failure("transcription", &e.to_string()),
                }
            }
            PollOutcome::Failed(reason) => absorb_failure("transcription", &reason),
            PollOutcome::TimedOut => absorb_failure("transcription", "poll budget exhausted"),
            PollOutcome::Cancelled => absorb_failure("transcription", "cancelled"),
        }
    }

    async fn run_recognition(
        &self,
        object: &StoredObjectRef,
        kind: MediaKind,
        cancel: &CancellationToken,
    ) -> Option<RecognitionOutput> {
        match kind {
            MediaKind::Image => self.recognize_image(object).await,
            MediaKind::Video => self.recognize_video(object, cancel).await,
            MediaKind::Audio | MediaKind::Other => None,
        }
    }

    /// Image recognition is two synchronous calls; either failing absorbs
    /// the whole pass.
    async fn recognize_image(&self, object: &StoredObjectRef) -> Option<RecognitionOutput> {
        let labels = match self
            .recognition
            .detect_labels(&object.bucket, &object.key)
            .await
        {
            Ok(labels) => labels,
            Err(e) => return absorb_failure("recognition", &e.to_string()),
        };

        let text = match self
            .recognition
            .detect_text(&object.bucket, &object.key)
            .await
        {
            Ok(text) => text,
            Err(e) => return absorb_failure("recognition", &e.to_string()),
        };

        tracing::info!(key = %object.key, labels = labels.len(), text = text.len(), "image recognition complete");

        Some(RecognitionOutput {
            labels,
            text_detections: Some(text),
        })
    }

    async fn recognize_video(
        &self,
        object: &StoredObjectRef,
        cancel: &CancellationToken,
    ) -> Option<RecognitionOutput> {
        let job_id = match self
            .recognition
            .start_video_label_job(&object.bucket, &object.key)
            .await
        {
            Ok(id) => id,
            Err(e) => return absorb_failure("video_labels", &e.to_string()),
        };

        tracing::info!(job_id = %job_id, "video label job started");

        let backend = Arc::clone(&self.recognition);
        let id = job_id.clone();
        let outcome = drive_poll(
            self.config.poll_interval,
            self.config.max_poll_attempts,
            cancel,
            move || {
                let backend = Arc::clone(&backend);
                let id = id.clone();
                async move {
                    let poll = backend.poll_video_label_job(&id).await?;
                    Ok::<_, crate::services::recognition::RecognitionError>(match poll.status {
                        JobStatus::Succeeded => {
                            PollTick::Succeeded(poll.labels.unwrap_or_default())
                        }
                        JobStatus::Failed => {
                            PollTick::Failed("provider reported the job failed".to_string())
                        }
                        JobStatus::InProgress => PollTick::InProgress,
                    })
                }
            },
        )
        .await;

        match outcome {
            PollOutcome::Succeeded(labels) => {
                tracing::info!(job_id = %job_id, labels = labels.len(), "video label job complete");
                Some(RecognitionOutput {
                    labels,
                    text_detections: None,
                })
            }
            PollOutcome::Failed(reason) => absorb_failure("video_labels", &reason),
            PollOutcome::TimedOut => absorb_failure("video_labels", "poll budget exhausted"),
            PollOutcome::Cancelled => absorb_failure("video_labels", "cancelled"),
        }
    }
}

/// A failed analysis job only costs its own field.
fn absorb_failure<T>(job: &'static str, reason: &str) -> Option<T> {
    tracing::warn!(job = job, reason = %reason, "analysis job absorbed as failed");
    metrics::counter!("analysis_jobs_failed_total", "job" => job).increment(1);
    None
}
