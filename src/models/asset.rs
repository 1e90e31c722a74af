use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the caller handed the asset to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AcquireMode {
    Upload,
    Link,
}

/// A file received through the multipart upload path.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub original_name: String,
}

/// The pipeline's transport-independent input: a mode plus whichever
/// payload the caller supplied. Validation of the mode/payload pairing
/// happens in the acquirer, not here.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub mode: AcquireMode,
    pub file: Option<UploadedFile>,
    pub link: Option<String>,
}

/// Resolved media bytes plus declared type. Ephemeral: consumed by the
/// object store gateway.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub original_name: String,
}

/// Durable-storage coordinate of an uploaded asset. Immutable once
/// created; every downstream analysis job addresses the asset through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObjectRef {
    pub bucket: String,
    pub key: String,
}

/// Caption and hashtags scraped alongside a social-media link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialMetadata {
    pub caption: Option<String>,
    pub hashtags: Vec<String>,
}

/// Broad media class derived from the top-level component of the declared
/// MIME type. Drives which analysis jobs run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaKind {
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type.split('/').next().unwrap_or_default() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Other,
        }
    }

    /// Audio and video go through the transcription job.
    pub fn wants_transcription(self) -> bool {
        matches!(self, Self::Audio | Self::Video)
    }

    /// Images and video frames go through recognition.
    pub fn wants_recognition(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn classifies_common_mime_types() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("audio/mpeg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Other);
        assert_eq!(MediaKind::from_mime(""), MediaKind::Other);
    }

    #[test]
    fn dispatch_matrix() {
        assert!(MediaKind::Image.wants_recognition());
        assert!(!MediaKind::Image.wants_transcription());
        assert!(MediaKind::Video.wants_recognition());
        assert!(MediaKind::Video.wants_transcription());
        assert!(!MediaKind::Audio.wants_recognition());
        assert!(MediaKind::Audio.wants_transcription());
        assert!(!MediaKind::Other.wants_recognition());
        assert!(!MediaKind::Other.wants_transcription());
    }

    #[test]
    fn mode_parses_from_form_value() {
        assert_eq!(AcquireMode::from_str("upload").unwrap(), AcquireMode::Upload);
        assert_eq!(AcquireMode::from_str("link").unwrap(), AcquireMode::Link);
        assert!(AcquireMode::from_str("bogus").is_err());
    }
}
