use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::asset::ProcessRequest;
use crate::services::acquire::AssetAcquirer;
use crate::services::analysis::MediaAnalyzer;
use crate::services::insight::InsightSynthesizer;
use crate::services::storage::MediaStoreGateway;

/// Fatal pipeline outcomes. Failures of individual analysis jobs are not
/// here: those are absorbed by the coordinator, and a synthesis failure
/// degrades to a sentinel answer instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("missing input: no {0} provided")]
    MissingInput(&'static str),

    #[error("could not resolve media from the link: {0}")]
    ResolutionFailed(String),

    #[error("failed to fetch media: {0}")]
    FetchFailed(String),

    #[error("failed to store media: {0}")]
    StorageFailed(String),

    #[error("processing was cancelled")]
    Cancelled,
}

/// The full acquire → store → analyze → synthesize sequence for one
/// request. Stateless across requests; every collaborator client is shared
/// read-only.
pub struct Pipeline {
    acquirer: AssetAcquirer,
    store: MediaStoreGateway,
    analyzer: MediaAnalyzer,
    synthesizer: InsightSynthesizer,
}

impl Pipeline {
    pub fn new(
        acquirer: AssetAcquirer,
        store: MediaStoreGateway,
        analyzer: MediaAnalyzer,
        synthesizer: InsightSynthesizer,
    ) -> Self {
        Self {
            acquirer,
            store,
            analyzer,
            synthesizer,
        }
    }

    /// Runs one pipeline execution to a definite outcome: the insight text
    /// or a typed error. The cancellation token aborts in-flight polling;
    /// a cancelled run surfaces as `PipelineError::Cancelled`.
    pub async fn run(
        &self,
        request: ProcessRequest,
        cancel: CancellationToken,
    ) -> Result<String, PipelineError> {
        let started = Instant::now();
        metrics::counter!("pipeline_requests_total").increment(1);

        let (asset, social) = self.acquirer.acquire(&request).await?;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mime_type = asset.mime_type.clone();
        let object = self
            .store
            .store(&asset)
            .await
            .map_err(|e| PipelineError::StorageFailed(e.to_string()))?;
        // The asset is durable now; nothing downstream touches the bytes.
        drop(asset);

        let processed = self
            .analyzer
            .analyze(&object, &mime_type, social.as_ref(), &cancel)
            .await;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let insights = self.synthesizer.synthesize(&processed).await;

        metrics::histogram!("pipeline_processing_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            key = %object.key,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline complete"
        );

        Ok(insights)
    }
}
