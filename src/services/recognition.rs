use async_trait::async_trait;
use aws_sdk_rekognition::types::{Image, S3Object, Video};
use aws_sdk_rekognition::Client as RekognitionClient;
use serde_json::json;

use crate::models::job::JobStatus;

// Tuning applied to both the image and the video label passes.
const MAX_LABELS: i32 = 5;
const MIN_CONFIDENCE: f32 = 75.0;

/// One status poll of the video label job.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoLabelPoll {
    pub status: JobStatus,
    pub labels: Option<Vec<serde_json::Value>>,
}

/// Label/text recognition collaborator. Images get two synchronous calls;
/// video goes through a start/poll job pair.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<serde_json::Value>, RecognitionError>;

    async fn detect_text(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<serde_json::Value>, RecognitionError>;

    async fn start_video_label_job(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<String, RecognitionError>;

    async fn poll_video_label_job(&self, job_id: &str)
        -> Result<VideoLabelPoll, RecognitionError>;
}

/// AWS Rekognition implementation.
pub struct RekognitionBackend {
    client: RekognitionClient,
}

impl RekognitionBackend {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: RekognitionClient::new(sdk_config),
        }
    }
}

fn s3_object(bucket: &str, key: &str) -> S3Object {
    S3Object::builder().bucket(bucket).name(key).build()
}

#[async_trait]
impl RecognitionBackend for RekognitionBackend {
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<serde_json::Value>, RecognitionError> {
        let response = self
            .client
            .detect_labels()
            .image(Image::builder().s3_object(s3_object(bucket, key)).build())
            .max_labels(MAX_LABELS)
            .min_confidence(MIN_CONFIDENCE)
            .send()
            .await
            .map_err(|e| RecognitionError::Api(e.to_string()))?;

        let labels = response
            .labels()
            .iter()
            .map(|label| {
                json!({
                    "name": label.name(),
                    "confidence": label.confidence(),
                })
            })
            .collect();

        Ok(labels)
    }

    async fn detect_text(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<serde_json::Value>, RecognitionError> {
        let response = self
            .client
            .detect_text()
            .image(Image::builder().s3_object(s3_object(bucket, key)).build())
            .send()
            .await
            .map_err(|e| RecognitionError::Api(e.to_string()))?;

        let detections = response
            .text_detections()
            .iter()
            .map(|text| {
                json!({
                    "detected_text": text.detected_text(),
                    "type": text.r#type().map(|t| t.as_str()),
                    "confidence": text.confidence(),
                })
            })
            .collect();

        Ok(detections)
    }

    async fn start_video_label_job(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<String, RecognitionError> {
        let response = self
            .client
            .start_label_detection()
            .video(Video::builder().s3_object(s3_object(bucket, key)).build())
            .min_confidence(MIN_CONFIDENCE)
            .send()
            .await
            .map_err(|e| RecognitionError::Api(e.to_string()))?;

        response
            .job_id()
            .map(|id| id.to_string())
            .ok_or(RecognitionError::MissingField("job_id"))
    }

    async fn poll_video_label_job(
        &self,
        job_id: &str,
    ) -> Result<VideoLabelPoll, RecognitionError> {
        let response = self
            .client
            .get_label_detection()
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| RecognitionError::Api(e.to_string()))?;

        let status = match response.job_status().map(|s| s.as_str()) {
            Some("SUCCEEDED") => JobStatus::Succeeded,
            Some("FAILED") => JobStatus::Failed,
            _ => JobStatus::InProgress,
        };

        let labels = if status == JobStatus::Succeeded {
            let labels = response
                .labels()
                .iter()
                .map(|detection| {
                    json!({
                        "timestamp": detection.timestamp(),
                        "name": detection.label().and_then(|l| l.name()),
                        "confidence": detection.label().and_then(|l| l.confidence()),
                    })
                })
                .collect();
            Some(labels)
        } else {
            None
        };

        Ok(VideoLabelPoll { status, labels })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("recognition call failed: {0}")]
    Api(String),

    #[error("recognition response missing {0}")]
    MissingField(&'static str),
}
