use async_trait::async_trait;
use aws_sdk_transcribe::types::{LanguageCode, Media, MediaFormat};
use aws_sdk_transcribe::Client as TranscribeClient;
use chrono::Utc;
use serde::Deserialize;

use crate::models::job::JobStatus;

/// One status poll of a transcription job. On success the collaborator
/// reports a URI the transcript document has to be fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionPoll {
    pub status: JobStatus,
    pub result_uri: Option<String>,
}

/// Speech transcription collaborator: start a job, poll it, then fetch the
/// finished transcript from the reported result URI.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    async fn start_job(
        &self,
        bucket: &str,
        key: &str,
        mime_type: &str,
    ) -> Result<String, TranscriptionError>;

    async fn poll_job(&self, job_name: &str) -> Result<TranscriptionPoll, TranscriptionError>;

    /// Fetch the transcript document and return the `results.transcripts`
    /// array as a JSON string.
    async fn fetch_transcript(&self, result_uri: &str) -> Result<String, TranscriptionError>;
}

/// AWS Transcribe implementation.
pub struct TranscribeBackend {
    client: TranscribeClient,
    http: reqwest::Client,
    language_code: String,
}

impl TranscribeBackend {
    pub fn new(
        sdk_config: &aws_config::SdkConfig,
        http: reqwest::Client,
        language_code: String,
    ) -> Self {
        Self {
            client: TranscribeClient::new(sdk_config),
            http,
            language_code,
        }
    }
}

/// The service wants a container format, not a MIME type. Derive it from
/// the subtype, special-casing mp4 so `audio/mp4` and `video/mp4` both map
/// cleanly.
fn media_format(mime_type: &str) -> String {
    if mime_type.contains("mp4") {
        "mp4".to_string()
    } else {
        mime_type
            .split('/')
            .nth(1)
            .unwrap_or("mp4")
            .to_string()
    }
}

/// Shape of the transcript document behind the result URI.
#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    #[serde(default)]
    transcripts: Vec<serde_json::Value>,
}

#[async_trait]
impl TranscriptionBackend for TranscribeBackend {
    async fn start_job(
        &self,
        bucket: &str,
        key: &str,
        mime_type: &str,
    ) -> Result<String, TranscriptionError> {
        let job_name = format!("transcription-job-{}", Utc::now().timestamp_millis());
        let media = Media::builder()
            .media_file_uri(format!("s3://{bucket}/{key}"))
            .build();

        self.client
            .start_transcription_job()
            .transcription_job_name(&job_name)
            .language_code(LanguageCode::from(self.language_code.as_str()))
            .media_format(MediaFormat::from(media_format(mime_type).as_str()))
            .media(media)
            .send()
            .await
            .map_err(|e| TranscriptionError::Api(e.to_string()))?;

        Ok(job_name)
    }

    async fn poll_job(&self, job_name: &str) -> Result<TranscriptionPoll, TranscriptionError> {
        let response = self
            .client
            .get_transcription_job()
            .transcription_job_name(job_name)
            .send()
            .await
            .map_err(|e| TranscriptionError::Api(e.to_string()))?;

        let job = response
            .transcription_job()
            .ok_or(TranscriptionError::MissingField("transcription_job"))?;

        let status = match job.transcription_job_status().map(|s| s.as_str()) {
            Some("COMPLETED") => JobStatus::Succeeded,
            Some("FAILED") => JobStatus::Failed,
            _ => JobStatus::InProgress,
        };

        let result_uri = job
            .transcript()
            .and_then(|t| t.transcript_file_uri())
            .map(|uri| uri.to_string());

        Ok(TranscriptionPoll { status, result_uri })
    }

    async fn fetch_transcript(&self, result_uri: &str) -> Result<String, TranscriptionError> {
        let document: TranscriptDocument = self
            .http
            .get(result_uri)
            .send()
            .await
            .map_err(TranscriptionError::Http)?
            .error_for_status()
            .map_err(TranscriptionError::Http)?
            .json()
            .await
            .map_err(TranscriptionError::Http)?;

        serde_json::to_string(&document.results.transcripts)
            .map_err(|e| TranscriptionError::Api(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("transcription call failed: {0}")]
    Api(String),

    #[error("transcript fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transcription response missing {0}")]
    MissingField(&'static str),
}
