//! Apify Social-Media Scraper Client
//!
//! Resolves a social-media post URL into a direct media URL plus caption
//! and hashtags by running an Apify actor synchronously and reading its
//! dataset items.

use async_trait::async_trait;
use serde::Deserialize;

/// What the scraper resolved for a link: a directly fetchable media URL
/// plus whatever post metadata came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    pub media_url: String,
    pub caption: Option<String>,
    pub hashtags: Vec<String>,
}

/// Scraping collaborator. "The post has no usable media" is a distinct
/// failure from "the scraper call itself failed".
#[async_trait]
pub trait MediaScraper: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, ScrapeError>;
}

/// Client for the Apify actor API.
pub struct ApifyScraper {
    http: reqwest::Client,
    base_url: String,
    token: String,
    actor: String,
}

/// One dataset item returned by the post-scraper actor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApifyItem {
    video_url: Option<String>,
    image_url: Option<String>,
    display_url: Option<String>,
    caption: Option<String>,
    #[serde(default)]
    hashtags: Vec<String>,
}

impl ApifyItem {
    /// Video beats still image beats display thumbnail.
    fn media_url(&self) -> Option<&str> {
        self.video_url
            .as_deref()
            .or(self.image_url.as_deref())
            .or(self.display_url.as_deref())
    }
}

impl ApifyScraper {
    pub fn new(http: reqwest::Client, token: String, actor: String) -> Self {
        Self {
            http,
            base_url: "https://api.apify.com/v2".to_string(),
            token,
            actor,
        }
    }
}

#[async_trait]
impl MediaScraper for ApifyScraper {
    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, ScrapeError> {
        let endpoint = format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.base_url, self.actor
        );

        let body = serde_json::json!({
            "directUrls": [url],
            "resultsType": "posts",
            "resultsLimit": 100,
        });

        let items: Vec<ApifyItem> = self
            .http
            .post(&endpoint)
            .query(&[("token", self.token.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(ScrapeError::Http)?
            .error_for_status()
            .map_err(ScrapeError::Http)?
            .json()
            .await
            .map_err(ScrapeError::Http)?;

        let first = items.first().ok_or(ScrapeError::NoMedia)?;
        let media_url = first.media_url().ok_or(ScrapeError::NoMedia)?.to_string();

        Ok(ResolvedMedia {
            media_url,
            caption: first.caption.clone(),
            hashtags: first.hashtags.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("scraper request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scraper returned no usable media for the link")]
    NoMedia,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_url_precedence() {
        let item: ApifyItem = serde_json::from_str(
            r#"{"videoUrl":"https://cdn/video.mp4","imageUrl":"https://cdn/img.jpg","displayUrl":"https://cdn/thumb.jpg"}"#,
        )
        .unwrap();
        assert_eq!(item.media_url(), Some("https://cdn/video.mp4"));

        let item: ApifyItem = serde_json::from_str(
            r#"{"imageUrl":"https://cdn/img.jpg","displayUrl":"https://cdn/thumb.jpg"}"#,
        )
        .unwrap();
        assert_eq!(item.media_url(), Some("https://cdn/img.jpg"));

        let item: ApifyItem = serde_json::from_str(r#"{"caption":"no media here"}"#).unwrap();
        assert_eq!(item.media_url(), None);
    }

    #[test]
    fn item_parses_post_fields() {
        let item: ApifyItem = serde_json::from_str(
            r##"{"displayUrl":"https://cdn/p.jpg","caption":"new drop","hashtags":["#sale"]}"##,
        )
        .unwrap();
        assert_eq!(item.caption.as_deref(), Some("new drop"));
        assert_eq!(item.hashtags, vec!["#sale"]);
    }
}
