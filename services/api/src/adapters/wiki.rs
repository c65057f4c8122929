//! services/api/src/adapters/wiki.rs
//!
//! This module contains the adapter for the Wikipedia REST API.
//! It implements the `ArticleSource` port from the `core` crate.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use wikidle_core::ports::{ArticleSource, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ArticleSource` port over the Wikipedia REST API.
#[derive(Clone)]
pub struct WikipediaAdapter {
    client: Client,
    base_url: Url,
}

impl WikipediaAdapter {
    /// Creates a new `WikipediaAdapter`. Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PortError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PortError::Unexpected(format!("Invalid wiki base URL: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("wikidle-builder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// `{base}/api/rest_v1/page/{endpoint}/{title}`, with the title percent-encoded.
    fn page_url(&self, endpoint: &str, title: &str) -> PortResult<Url> {
        let page = title.replace(' ', "_");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected(format!("Base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "rest_v1", "page", endpoint, page.as_str()]);
        Ok(url)
    }
}

//=========================================================================================
// Response Payloads
//=========================================================================================

#[derive(Deserialize)]
struct RelatedResponse {
    #[serde(default)]
    pages: Vec<RelatedPage>,
}

#[derive(Deserialize)]
struct RelatedPage {
    title: String,
    titles: Option<RelatedTitles>,
}

#[derive(Deserialize)]
struct RelatedTitles {
    normalized: Option<String>,
}

//=========================================================================================
// `ArticleSource` Trait Implementation
//=========================================================================================

#[async_trait]
impl ArticleSource for WikipediaAdapter {
    async fn fetch_markup(&self, title: &str) -> PortResult<String> {
        let url = self.page_url("html", title)?;
        debug!("Fetching article markup from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!("Article '{}' does not exist", title)));
        }

        response
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .text()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn related_titles(&self, title: &str) -> PortResult<Vec<String>> {
        let url = self.page_url("related", title)?;
        debug!("Fetching related articles from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // An article without related pages simply has no clues.
        if response.status() == StatusCode::NOT_FOUND {
            warn!("No related articles for '{}'", title);
            return Ok(Vec::new());
        }

        let related: RelatedResponse = response
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(related
            .pages
            .into_iter()
            .map(|p| p.titles.and_then(|t| t.normalized).unwrap_or(p.title))
            .collect())
    }
}
