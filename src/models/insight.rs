use serde::Serialize;

use crate::models::asset::SocialMetadata;

/// What one recognition pass produced. For images this is labels plus text
/// annotations from the two synchronous calls; for video the labels come
/// from the polling job and there is no text pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOutput {
    pub labels: Vec<serde_json::Value>,
    pub text_detections: Option<Vec<serde_json::Value>>,
}

/// Aggregate of every analysis signal that survived the fan-out. Each field
/// is independently absent: an analysis that did not apply or failed leaves
/// its field unset and is never fatal to the pipeline.
///
/// Serialized field names follow the wire shape consumed by the listing
/// front-end.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessedMediaResult {
    #[serde(rename = "imageToTextData")]
    pub image_to_text_data: Option<String>,
    #[serde(rename = "videoRecognition")]
    pub video_recognition: Option<String>,
    #[serde(rename = "videoToTextTranscribe")]
    pub video_to_text_transcribe: Option<String>,
    #[serde(rename = "socialmediaCaption")]
    pub socialmedia_caption: Option<String>,
    #[serde(rename = "socialmediaHashtags")]
    pub socialmedia_hashtags: Option<String>,
}

impl ProcessedMediaResult {
    /// Merge independently-computed optional analysis outputs into the
    /// aggregate. This is the only way the aggregate is built, so partial
    /// failure combination is a single pure function.
    pub fn merge(
        recognition: Option<RecognitionOutput>,
        transcript: Option<String>,
        social: Option<&SocialMetadata>,
    ) -> Self {
        let (video_recognition, image_to_text_data) = match recognition {
            Some(output) => {
                let labels = serde_json::to_string_pretty(&output.labels).ok();
                let text = output
                    .text_detections
                    .as_ref()
                    .and_then(|t| serde_json::to_string_pretty(t).ok());
                (labels, text)
            }
            None => (None, None),
        };

        let (socialmedia_caption, socialmedia_hashtags) = match social {
            Some(meta) => {
                let hashtags = if meta.hashtags.is_empty() {
                    None
                } else {
                    serde_json::to_string(&meta.hashtags).ok()
                };
                (meta.caption.clone(), hashtags)
            }
            None => (None, None),
        };

        Self {
            image_to_text_data,
            video_recognition,
            video_to_text_transcribe: transcript,
            socialmedia_caption,
            socialmedia_hashtags,
        }
    }
}
