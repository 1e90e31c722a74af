use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Fixed one-shot request/response pair prepended to every model call to
/// anchor the output format. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct SeedExchange {
    pub user: String,
    pub model: String,
}

impl Default for SeedExchange {
    fn default() -> Self {
        Self {
            user: SEED_USER.to_string(),
            model: SEED_MODEL.to_string(),
        }
    }
}

const SEED_USER: &str = r#"My user wants to add their product to eCommerce platforms like Amazon, Myntra, Flipkart, etc. Please generate relevant information in JSON format about the product such as title, categories, features, color, description (not more than 200 words), based on provided data (e.g., video recognition data, transcription data, image-to-text data).

Example Input Data:
- Video Recognition Data: Categories: Name: Person, Confidence: 99.89%, Instances: BoundingBox: Height: 0.92
- Transcription Data: "Your morning's bright. Alexa, switch on the geezers. Alexa, play romantic songs on the speaker. Alexa, start yoga mode."
- Text-to-Image Data: {image description data}

Please generate a structured JSON output for the product."#;

const SEED_MODEL: &str = r#"{
    "title": "Noise-Canceling Wireless Earbuds",
    "brand": "SoundPro",
    "categories": ["Audio", "Wireless Earbuds", "Wearable Technology"],
    "features": [
        "Advanced noise-canceling technology",
        "High-quality stereo sound",
        "Touch-sensitive controls",
        "Sweat and water-resistant design",
        "Long-lasting battery life with quick charge",
        "Seamless Bluetooth connectivity"
    ],
    "aboutThisItem": [
        "Immerse yourself in superior audio quality with our cutting-edge wireless earbuds.",
        "Eliminate distractions with advanced noise-canceling technology and enjoy crystal-clear sound.",
        "Effortlessly control music and calls with intuitive touch-sensitive controls.",
        "Designed for active lifestyles, these earbuds are sweat and water-resistant.",
        "Stay connected all day with long-lasting battery life and quick charge support."
    ],
    "description": "Discover unparalleled audio clarity with these noise-canceling wireless earbuds. Designed for audiophiles and active users alike, they deliver immersive sound, convenient touch controls, and all-day comfort. Perfect for music lovers, commuters, and fitness enthusiasts.",
    "color": ["White", "Black", "Blue"],
    "price": "$149.99"
}"#;

/// Sampling parameters for the generative model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
    pub max_output_tokens: i32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: "application/json".to_string(),
        }
    }
}

/// Generative-model collaborator: one prompt in, one text answer out.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn send(&self, prompt: &str) -> Result<String, GenAiError>;
}

/// Client for the Gemini `generateContent` REST API. The seed exchange is
/// fixed at construction and prepended to every request, recreating a chat
/// session over the stateless endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    seed: SeedExchange,
    generation: GenerationConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        model: String,
        seed: SeedExchange,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            http,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key,
            model,
            seed,
            generation,
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn send(&self, prompt: &str) -> Result<String, GenAiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GenerateRequest {
            contents: vec![
                Content {
                    role: "user",
                    parts: vec![Part {
                        text: &self.seed.user,
                    }],
                },
                Content {
                    role: "model",
                    parts: vec![Part {
                        text: &self.seed.model,
                    }],
                },
                Content {
                    role: "user",
                    parts: vec![Part { text: prompt }],
                },
            ],
            generation_config: &self.generation,
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(GenAiError::Http)?;

        if !response.status().is_success() {
            return Err(GenAiError::Api(format!(
                "model endpoint answered {}",
                response.status()
            )));
        }

        let response: GenerateResponse = response.json().await.map_err(GenAiError::Http)?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        Ok(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model call failed: {0}")]
    Api(String),
}
