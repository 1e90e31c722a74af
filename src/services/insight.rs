use std::sync::Arc;

use crate::models::insight::ProcessedMediaResult;
use crate::services::genai::{GenerativeModel, SeedExchange};

/// Sentinel returned when the model call fails or answers with text that
/// is not well-formed JSON. The caller still gets the partial analysis
/// value of a definite response instead of an error.
pub const SYNTHESIS_FAILED: &str = "Failed to generate AI insights.";

/// Sentinel returned when the model answers with no text at all.
pub const NO_INSIGHTS: &str = "No insights generated.";

/// Insight Synthesizer: renders every available analysis signal into one
/// prompt, anchored by the seed exchange's example answer, and returns the
/// model's structured text.
pub struct InsightSynthesizer {
    model: Arc<dyn GenerativeModel>,
    seed: SeedExchange,
}

impl InsightSynthesizer {
    pub fn new(model: Arc<dyn GenerativeModel>, seed: SeedExchange) -> Self {
        Self { model, seed }
    }

    /// Prompt construction is a pure function of the merged result: same
    /// input, byte-identical prompt. Absent fields render as `null` so the
    /// model sees which signals are missing.
    pub fn build_prompt(&self, result: &ProcessedMediaResult) -> String {
        fn render(field: &Option<String>) -> &str {
            field.as_deref().unwrap_or("null")
        }

        format!(
            "Generate insights from the following data:\n\
             Video Recognition Data: {video},\n\
             Image to Text Data: {image},\n\
             Video to Text Transcription: {transcript},\n\
             Social Media Caption: {caption},\n\
             Hashtags: {hashtags}\n\
             It should follow the JSON output like: {example}",
            video = render(&result.video_recognition),
            image = render(&result.image_to_text_data),
            transcript = render(&result.video_to_text_transcribe),
            caption = render(&result.socialmedia_caption),
            hashtags = render(&result.socialmedia_hashtags),
            example = self.seed.model,
        )
    }

    /// Never fails: a model error or malformed answer degrades to a fixed
    /// sentinel so the partial analysis already computed is not lost.
    pub async fn synthesize(&self, result: &ProcessedMediaResult) -> String {
        let prompt = self.build_prompt(result);

        match self.model.send(&prompt).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!("model returned no text");
                NO_INSIGHTS.to_string()
            }
            Ok(text) => {
                let insights = strip_code_fence(&text);
                if serde_json::from_str::<serde_json::Value>(insights).is_ok() {
                    insights.to_string()
                } else {
                    tracing::warn!("model answer was not well-formed JSON");
                    metrics::counter!("synthesis_failed_total").increment(1);
                    SYNTHESIS_FAILED.to_string()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "model call failed");
                metrics::counter!("synthesis_failed_total").increment(1);
                SYNTHESIS_FAILED.to_string()
            }
        }
    }
}

/// Models sometimes wrap JSON answers in a Markdown code fence even when
/// asked for raw JSON.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
