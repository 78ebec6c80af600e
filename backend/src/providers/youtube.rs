use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{
    DETAIL_CACHE_TTL, MASKED_KEY, ProviderError, TrailerProvider, parse_base_url, render_url,
};
use crate::cache::ResponseCache;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/search";

/// Connection settings for the YouTube Data API search endpoint.
#[derive(Debug, Clone)]
pub struct YoutubeSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub ttl: Duration,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            ttl: DETAIL_CACHE_TTL,
        }
    }
}

/// YouTube-backed [`TrailerProvider`].
#[derive(Debug)]
pub struct YoutubeClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    lookups: ResponseCache<String, Option<String>>,
}

impl YoutubeClient {
    pub fn new(settings: YoutubeSettings) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Self::with_client(http, settings)
    }

    pub fn with_client(http: Client, settings: YoutubeSettings) -> Result<Self, ProviderError> {
        let base_url = parse_base_url(&settings.base_url)?;
        Ok(Self {
            http,
            base_url,
            api_key: settings.api_key.filter(|key| !key.trim().is_empty()),
            lookups: ResponseCache::new(settings.ttl),
        })
    }

    fn params(&self, title: &str, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("part", "snippet".to_string()),
            ("q", format!("{title} Official Trailer")),
            ("type", "video".to_string()),
            ("key", api_key.to_string()),
            ("maxResults", "1".to_string()),
        ]
    }

    async fn fetch(&self, title: &str, api_key: &str) -> Result<Option<String>, ProviderError> {
        let response = self
            .http
            .get(self.base_url.clone())
            .query(&self.params(title, api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let body: SearchListResponse = response.json().await?;
        Ok(body
            .items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .filter(|id| !id.is_empty()))
    }
}

#[async_trait]
impl TrailerProvider for YoutubeClient {
    async fn trailer_video_id(&self, title: &str) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("YouTube API key is not configured; skipping trailer lookup");
            return None;
        };
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let key = title.to_string();
        if let Some(cached) = self.lookups.get(&key) {
            return cached;
        }

        let started = Instant::now();
        match self.fetch(title, api_key).await {
            Ok(video_id) => {
                tracing::debug!(
                    title,
                    found = video_id.is_some(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "trailer lookup completed"
                );
                self.lookups.insert(key, video_id.clone());
                video_id
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    url = %self.trailer_url(title),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "trailer lookup failed"
                );
                None
            }
        }
    }

    fn trailer_url(&self, title: &str) -> String {
        render_url(&self.base_url, &self.params(title, MASKED_KEY))
    }
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}
