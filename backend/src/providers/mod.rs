//! Remote fetchers for title metadata and trailers.
//!
//! Implementations normalize every failure at this boundary: callers only
//! ever observe a [`SearchPage`] with `ok == false` or an absent value.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::titles::{DetailRecord, MediaType, SearchPage};

pub mod omdb;
pub mod youtube;

pub use omdb::{OmdbClient, OmdbSettings};
pub use youtube::{YoutubeClient, YoutubeSettings};

/// Lifetime of cached search pages.
pub const SEARCH_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Lifetime of cached detail and trailer lookups.
pub const DETAIL_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Replacement for API keys in URLs rendered for diagnostics.
pub const MASKED_KEY: &str = "*****";

pub const NO_QUERY_MESSAGE: &str = "No query provided";
pub const NO_GENRE_MESSAGE: &str = "No genre provided";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data";

/// Internal failure classification; never escapes a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream responded with status {status}")]
    Status { status: u16 },

    #[error("upstream reported no match")]
    NotFound,
}

/// Parameters of one paged title search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleQuery {
    pub query: String,
    pub page: u32,
    pub media_type: Option<MediaType>,
    pub year: Option<String>,
}

impl TitleQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            media_type: None,
            year: None,
        }
    }

    /// Pages are 1-based; zero is coerced to the first page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn media_type(mut self, media_type: Option<MediaType>) -> Self {
        self.media_type = media_type;
        self
    }

    pub fn year(mut self, year: Option<String>) -> Self {
        self.year = year
            .map(|year| year.trim().to_string())
            .filter(|year| !year.is_empty());
        self
    }

    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Page-1 movie search on the first genre of a comma-separated list.
    pub fn recommendations_for(genres: &[String]) -> Option<Self> {
        let primary = genres
            .first()
            .and_then(|genre| genre.split(',').next())
            .map(str::trim)
            .filter(|genre| !genre.is_empty())?;
        Some(Self::new(primary).media_type(Some(MediaType::Movie)))
    }
}

/// Title metadata source (search + detail lookups).
#[async_trait]
pub trait TitleProvider: Send + Sync {
    /// Run one paged search. A blank query short-circuits without I/O.
    async fn search_titles(&self, query: &TitleQuery) -> SearchPage;

    /// Fetch the full record for `id`; blank ids and misses are `None`.
    async fn title_detail(&self, id: &str) -> Option<DetailRecord>;

    /// URL of the search request with the API key masked.
    fn search_url(&self, query: &TitleQuery) -> String;

    /// URL of the detail request with the API key masked.
    fn detail_url(&self, id: &str) -> String;

    /// Titles sharing the primary genre of `genres`.
    async fn recommendations(&self, genres: &[String]) -> SearchPage {
        match TitleQuery::recommendations_for(genres) {
            Some(query) => self.search_titles(&query).await,
            None => SearchPage::failed(NO_GENRE_MESSAGE),
        }
    }
}

/// Trailer lookup source.
#[async_trait]
pub trait TrailerProvider: Send + Sync {
    /// Video id of the best trailer match for `title`, if any.
    async fn trailer_video_id(&self, title: &str) -> Option<String>;

    /// URL of the trailer search with the API key masked.
    fn trailer_url(&self, title: &str) -> String;
}

pub(crate) fn parse_base_url(raw: &str) -> Result<reqwest::Url, ProviderError> {
    reqwest::Url::parse(raw).map_err(|err| ProviderError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })
}

pub(crate) fn render_url(base: &reqwest::Url, params: &[(&str, String)]) -> String {
    let mut url = base.clone();
    url.query_pairs_mut()
        .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())));
    url.to_string()
}
