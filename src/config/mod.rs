use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// AWS region used by the recognition and transcription services
    pub aws_region: String,

    /// S3 bucket receiving uploaded media
    pub s3_bucket: String,

    /// Apify API token for the social-media scraper
    pub apify_token: String,

    /// Apify actor id of the post scraper
    #[serde(default = "default_apify_actor")]
    pub apify_actor: String,

    /// Google Gemini API key
    pub gemini_api_key: String,

    /// Gemini model id
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Interval between status polls of long-running analysis jobs, seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Poll budget per job; exhausting it counts as a timed-out job
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Language code passed to the transcription service
    #[serde(default = "default_language_code")]
    pub transcribe_language_code: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_apify_actor() -> String {
    // Apify's Instagram post scraper actor
    "shu8hvrXbJbY3Eb9W".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_poll_attempts() -> u32 {
    120
}

fn default_language_code() -> String {
    "en-US".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
