//! Scripted fake collaborators for pipeline tests.
//!
//! Every fake records how often it was called so tests can assert not just
//! on outputs but on which jobs were dispatched at all.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use media_insight::models::asset::{AcquireMode, ProcessRequest, UploadedFile};
use media_insight::models::job::JobStatus;
use media_insight::services::acquire::AssetAcquirer;
use media_insight::services::analysis::{AnalysisConfig, MediaAnalyzer};
use media_insight::services::genai::{GenAiError, GenerativeModel, SeedExchange};
use media_insight::services::insight::InsightSynthesizer;
use media_insight::services::pipeline::Pipeline;
use media_insight::services::recognition::{RecognitionBackend, RecognitionError, VideoLabelPoll};
use media_insight::services::scrape::{MediaScraper, ResolvedMedia, ScrapeError};
use media_insight::services::storage::{MediaStoreGateway, ObjectStore, StorageError};
use media_insight::services::transcription::{
    TranscriptionBackend, TranscriptionError, TranscriptionPoll,
};

/// In-memory object store recording every confirmed write.
pub struct MemoryStore {
    pub puts: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, _bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Config("injected write failure".to_string()));
        }
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string()));
        Ok(())
    }

    fn bucket_name(&self) -> &str {
        "test-bucket"
    }
}

/// Recognition fake: canned synchronous results plus a scripted sequence
/// of video-job polls. An exhausted poll script keeps reporting InProgress.
pub struct ScriptedRecognition {
    labels: Vec<serde_json::Value>,
    text: Vec<serde_json::Value>,
    video_polls: Mutex<VecDeque<VideoLabelPoll>>,
    fail_sync: bool,
    detect_labels_count: AtomicU32,
    detect_text_count: AtomicU32,
    start_video_count: AtomicU32,
    poll_video_count: AtomicU32,
}

impl ScriptedRecognition {
    fn base() -> Self {
        Self {
            labels: Vec::new(),
            text: Vec::new(),
            video_polls: Mutex::new(VecDeque::new()),
            fail_sync: false,
            detect_labels_count: AtomicU32::new(0),
            detect_text_count: AtomicU32::new(0),
            start_video_count: AtomicU32::new(0),
            poll_video_count: AtomicU32::new(0),
        }
    }

    pub fn detect_labels_calls(&self) -> u32 {
        self.detect_labels_count.load(Ordering::SeqCst)
    }

    pub fn detect_text_calls(&self) -> u32 {
        self.detect_text_count.load(Ordering::SeqCst)
    }

    pub fn start_video_calls(&self) -> u32 {
        self.start_video_count.load(Ordering::SeqCst)
    }

    pub fn poll_video_calls(&self) -> u32 {
        self.poll_video_count.load(Ordering::SeqCst)
    }

    pub fn unused() -> Self {
        Self::base()
    }

    pub fn for_image(labels: Vec<serde_json::Value>, text: Vec<serde_json::Value>) -> Self {
        Self {
            labels,
            text,
            ..Self::base()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_sync: true,
            ..Self::base()
        }
    }

    pub fn for_video(polls: Vec<VideoLabelPoll>) -> Self {
        Self {
            video_polls: Mutex::new(polls.into()),
            ..Self::base()
        }
    }
}

#[async_trait]
impl RecognitionBackend for ScriptedRecognition {
    async fn detect_labels(
        &self,
        _bucket: &str,
        _key: &str,
    ) -> Result<Vec<serde_json::Value>, RecognitionError> {
        self.detect_labels_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync {
            return Err(RecognitionError::Api("injected failure".to_string()));
        }
        Ok(self.labels.clone())
    }

    async fn detect_text(
        &self,
        _bucket: &str,
        _key: &str,
    ) -> Result<Vec<serde_json::Value>, RecognitionError> {
        self.detect_text_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync {
            return Err(RecognitionError::Api("injected failure".to_string()));
        }
        Ok(self.text.clone())
    }

    async fn start_video_label_job(
        &self,
        _bucket: &str,
        _key: &str,
    ) -> Result<String, RecognitionError> {
        self.start_video_count.fetch_add(1, Ordering::SeqCst);
        Ok("video-job-1".to_string())
    }

    async fn poll_video_label_job(
        &self,
        _job_id: &str,
    ) -> Result<VideoLabelPoll, RecognitionError> {
        self.poll_video_count.fetch_add(1, Ordering::SeqCst);
        let next = self.video_polls.lock().unwrap().pop_front();
        Ok(next.unwrap_or(VideoLabelPoll {
            status: JobStatus::InProgress,
            labels: None,
        }))
    }
}

/// Transcription fake with a scripted poll sequence and a canned
/// transcript document.
pub struct ScriptedTranscription {
    polls: Mutex<VecDeque<TranscriptionPoll>>,
    transcript: String,
    fail_start: bool,
    start_count: AtomicU32,
    poll_count: AtomicU32,
    fetch_count: AtomicU32,
}

impl ScriptedTranscription {
    fn base() -> Self {
        Self {
            polls: Mutex::new(VecDeque::new()),
            transcript: r#"[{"transcript":"hello world"}]"#.to_string(),
            fail_start: false,
            start_count: AtomicU32::new(0),
            poll_count: AtomicU32::new(0),
            fetch_count: AtomicU32::new(0),
        }
    }

    pub fn start_calls(&self) -> u32 {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn unused() -> Self {
        Self::base()
    }

    /// One poll straight to a finished job.
    pub fn succeeding() -> Self {
        Self {
            polls: Mutex::new(
                vec![TranscriptionPoll {
                    status: JobStatus::Succeeded,
                    result_uri: Some("https://results.test/transcript.json".to_string()),
                }]
                .into(),
            ),
            ..Self::base()
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::base()
        }
    }
}

#[async_trait]
impl TranscriptionBackend for ScriptedTranscription {
    async fn start_job(
        &self,
        _bucket: &str,
        _key: &str,
        _mime_type: &str,
    ) -> Result<String, TranscriptionError> {
        self.start_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(TranscriptionError::Api("injected failure".to_string()));
        }
        Ok("transcription-job-1".to_string())
    }

    async fn poll_job(&self, _job_name: &str) -> Result<TranscriptionPoll, TranscriptionError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        Ok(next.unwrap_or(TranscriptionPoll {
            status: JobStatus::InProgress,
            result_uri: None,
        }))
    }

    async fn fetch_transcript(&self, _result_uri: &str) -> Result<String, TranscriptionError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.transcript.clone())
    }
}

/// Scraper fake: either resolves to a fixed item or reports no media.
pub struct ScriptedScraper {
    result: Option<ResolvedMedia>,
    resolve_count: AtomicU32,
}

impl ScriptedScraper {
    pub fn unused() -> Self {
        Self {
            result: None,
            resolve_count: AtomicU32::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::unused()
    }

    pub fn resolving(media: ResolvedMedia) -> Self {
        Self {
            result: Some(media),
            resolve_count: AtomicU32::new(0),
        }
    }

    pub fn resolve_calls(&self) -> u32 {
        self.resolve_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaScraper for ScriptedScraper {
    async fn resolve(&self, _url: &str) -> Result<ResolvedMedia, ScrapeError> {
        self.resolve_count.fetch_add(1, Ordering::SeqCst);
        self.result.clone().ok_or(ScrapeError::NoMedia)
    }
}

/// Model fake recording every outbound prompt.
pub struct RecordingModel {
    pub prompts: Mutex<Vec<String>>,
    response: Result<String, String>,
}

impl RecordingModel {
    pub fn answering(response: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            response: Ok(response.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            response: Err("injected model failure".to_string()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeModel for RecordingModel {
    async fn send(&self, prompt: &str) -> Result<String, GenAiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone().map_err(GenAiError::Api)
    }
}

/// Everything a test needs: the assembled pipeline plus handles to the
/// fakes behind it.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub recognition: Arc<ScriptedRecognition>,
    pub transcription: Arc<ScriptedTranscription>,
    pub scraper: Arc<ScriptedScraper>,
    pub model: Arc<RecordingModel>,
    pub pipeline: Pipeline,
}

pub fn analysis_config(max_poll_attempts: u32) -> AnalysisConfig {
    AnalysisConfig {
        poll_interval: Duration::from_millis(1),
        max_poll_attempts,
    }
}

pub fn build_harness(
    recognition: ScriptedRecognition,
    transcription: ScriptedTranscription,
    scraper: ScriptedScraper,
    store: MemoryStore,
    model: RecordingModel,
) -> Harness {
    let store = Arc::new(store);
    let recognition = Arc::new(recognition);
    let transcription = Arc::new(transcription);
    let scraper = Arc::new(scraper);
    let model = Arc::new(model);

    let acquirer = AssetAcquirer::new(
        reqwest::Client::new(),
        Arc::clone(&scraper) as Arc<dyn MediaScraper>,
    );
    let gateway = MediaStoreGateway::new(Arc::clone(&store) as Arc<dyn ObjectStore>);
    let analyzer = MediaAnalyzer::new(
        Arc::clone(&recognition) as Arc<dyn RecognitionBackend>,
        Arc::clone(&transcription) as Arc<dyn TranscriptionBackend>,
        analysis_config(10),
    );
    let synthesizer = InsightSynthesizer::new(
        Arc::clone(&model) as Arc<dyn GenerativeModel>,
        SeedExchange::default(),
    );

    Harness {
        pipeline: Pipeline::new(acquirer, gateway, analyzer, synthesizer),
        store,
        recognition,
        transcription,
        scraper,
        model,
    }
}

pub fn upload_request(mime_type: &str, name: &str) -> ProcessRequest {
    ProcessRequest {
        mode: AcquireMode::Upload,
        file: Some(UploadedFile {
            bytes: vec![0xAB; 64],
            mime_type: mime_type.to_string(),
            original_name: name.to_string(),
        }),
        link: None,
    }
}

pub fn empty_upload_request() -> ProcessRequest {
    ProcessRequest {
        mode: AcquireMode::Upload,
        file: None,
        link: None,
    }
}

pub fn link_request(url: &str) -> ProcessRequest {
    ProcessRequest {
        mode: AcquireMode::Link,
        file: None,
        link: Some(url.to_string()),
    }
}
