use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;

use crate::models::asset::{AcquireMode, MediaAsset, ProcessRequest, SocialMetadata};
use crate::services::pipeline::PipelineError;
use crate::services::scrape::MediaScraper;

/// Asset Acquirer: resolves the pipeline's input into raw bytes plus a
/// declared MIME type, consulting the scraping collaborator for links.
pub struct AssetAcquirer {
    http: reqwest::Client,
    scraper: Arc<dyn MediaScraper>,
}

impl AssetAcquirer {
    pub fn new(http: reqwest::Client, scraper: Arc<dyn MediaScraper>) -> Self {
        Self { http, scraper }
    }

    /// Validates the mode/payload pairing before any network call, then
    /// produces the asset and, for links, the social metadata that rides
    /// along to the synthesis step.
    pub async fn acquire(
        &self,
        request: &ProcessRequest,
    ) -> Result<(MediaAsset, Option<SocialMetadata>), PipelineError> {
        match request.mode {
            AcquireMode::Upload => {
                let file = request
                    .file
                    .as_ref()
                    .filter(|f| !f.bytes.is_empty())
                    .ok_or(PipelineError::MissingInput("file"))?;

                let asset = MediaAsset {
                    bytes: file.bytes.clone(),
                    mime_type: file.mime_type.clone(),
                    original_name: file.original_name.clone(),
                };
                Ok((asset, None))
            }
            AcquireMode::Link => {
                let link = request
                    .link
                    .as_deref()
                    .filter(|l| !l.is_empty())
                    .ok_or(PipelineError::MissingInput("link"))?;

                let resolved = self
                    .scraper
                    .resolve(link)
                    .await
                    .map_err(|e| PipelineError::ResolutionFailed(e.to_string()))?;

                tracing::info!(link = %link, media_url = %resolved.media_url, "link resolved");

                let asset = self.fetch_media(&resolved.media_url, link).await?;
                let social = SocialMetadata {
                    caption: resolved.caption,
                    hashtags: resolved.hashtags,
                };
                Ok((asset, Some(social)))
            }
        }
    }

    async fn fetch_media(&self, media_url: &str, link: &str) -> Result<MediaAsset, PipelineError> {
        let response = self
            .http
            .get(media_url)
            .send()
            .await
            .map_err(|e| PipelineError::FetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::FetchFailed(format!(
                "media URL answered {}",
                response.status()
            )));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::FetchFailed(e.to_string()))?;

        if bytes.is_empty() {
            return Err(PipelineError::FetchFailed("media body was empty".to_string()));
        }

        Ok(MediaAsset {
            bytes: bytes.to_vec(),
            mime_type,
            original_name: name_from_link(link),
        })
    }
}

/// The stored object keeps the link's last path segment as its name.
fn name_from_link(link: &str) -> String {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("media")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_comes_from_last_path_segment() {
        assert_eq!(name_from_link("https://instagram.com/p/Cxyz123/"), "Cxyz123");
        assert_eq!(
            name_from_link("https://instagram.com/p/Cxyz123?igsh=abc"),
            "Cxyz123"
        );
        assert_eq!(name_from_link("https://host/"), "host");
        assert_eq!(name_from_link("/"), "media");
    }
}
