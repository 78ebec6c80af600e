use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{
    DETAIL_CACHE_TTL, FETCH_FAILED_MESSAGE, MASKED_KEY, NO_QUERY_MESSAGE, ProviderError,
    SEARCH_CACHE_TTL, TitleProvider, TitleQuery, parse_base_url, render_url,
};
use crate::{
    cache::ResponseCache,
    titles::{
        DetailRecord, MediaType, SearchPage, SummaryRecord,
        fields::{parse_count, present, split_genres},
    },
};

pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

/// Connection settings for the OMDb API.
#[derive(Debug, Clone)]
pub struct OmdbSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub search_ttl: Duration,
    pub detail_ttl: Duration,
}

impl Default for OmdbSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            search_ttl: SEARCH_CACHE_TTL,
            detail_ttl: DETAIL_CACHE_TTL,
        }
    }
}

/// OMDb-backed [`TitleProvider`].
#[derive(Debug)]
pub struct OmdbClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    searches: ResponseCache<TitleQuery, SearchPage>,
    details: ResponseCache<String, DetailRecord>,
}

impl OmdbClient {
    pub fn new(settings: OmdbSettings) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Self::with_client(http, settings)
    }

    pub fn with_client(http: Client, settings: OmdbSettings) -> Result<Self, ProviderError> {
        let base_url = parse_base_url(&settings.base_url)?;
        let api_key = settings.api_key.filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("OMDb API key is not configured; upstream will reject requests");
        }

        Ok(Self {
            http,
            base_url,
            api_key,
            searches: ResponseCache::new(settings.search_ttl),
            details: ResponseCache::new(settings.detail_ttl),
        })
    }

    fn search_params(&self, query: &TitleQuery, api_key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apikey", api_key.to_string()),
            ("s", query.query.clone()),
            ("page", query.page.to_string()),
        ];
        if let Some(media_type) = query.media_type {
            params.push(("type", media_type.as_str().to_string()));
        }
        if let Some(year) = &query.year {
            params.push(("y", year.clone()));
        }
        params
    }

    fn detail_params(&self, id: &str, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", api_key.to_string()),
            ("i", id.to_string()),
            ("plot", "full".to_string()),
        ]
    }

    fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    async fn get_json<T>(&self, params: &[(&'static str, String)]) -> Result<T, ProviderError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(self.base_url.clone())
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    async fn fetch_search(&self, query: &TitleQuery) -> Result<SearchPage, ProviderError> {
        let params = self.search_params(query, self.api_key());
        let body: OmdbSearchResponse = self.get_json(&params).await?;
        Ok(body.into_page())
    }

    async fn fetch_detail(&self, id: &str) -> Result<DetailRecord, ProviderError> {
        let params = self.detail_params(id, self.api_key());
        let body: OmdbDetailResponse = self.get_json(&params).await?;
        body.into_record().ok_or(ProviderError::NotFound)
    }
}

#[async_trait]
impl TitleProvider for OmdbClient {
    async fn search_titles(&self, query: &TitleQuery) -> SearchPage {
        if query.is_blank() {
            return SearchPage::failed(NO_QUERY_MESSAGE);
        }
        if let Some(page) = self.searches.get(query) {
            tracing::debug!(query = %query.query, page = query.page, "omdb search served from cache");
            return page;
        }

        let started = Instant::now();
        match self.fetch_search(query).await {
            Ok(page) => {
                tracing::debug!(
                    query = %query.query,
                    page = query.page,
                    items = page.items.len(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "omdb search completed"
                );
                self.searches.insert(query.clone(), page.clone());
                page
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    url = %self.search_url(query),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "omdb search failed"
                );
                SearchPage::failed(FETCH_FAILED_MESSAGE)
            }
        }
    }

    async fn title_detail(&self, id: &str) -> Option<DetailRecord> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        let key = id.to_string();
        if let Some(record) = self.details.get(&key) {
            return Some(record);
        }

        let started = Instant::now();
        match self.fetch_detail(id).await {
            Ok(record) => {
                tracing::debug!(
                    id,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "omdb detail completed"
                );
                self.details.insert(key, record.clone());
                Some(record)
            }
            Err(ProviderError::NotFound) => {
                tracing::debug!(id, "omdb detail not found");
                None
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    url = %self.detail_url(id),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "omdb detail failed"
                );
                None
            }
        }
    }

    fn search_url(&self, query: &TitleQuery) -> String {
        render_url(&self.base_url, &self.search_params(query, MASKED_KEY))
    }

    fn detail_url(&self, id: &str) -> String {
        render_url(&self.base_url, &self.detail_params(id, MASKED_KEY))
    }
}

/// `True`/`False` flag OMDb puts in every payload.
fn response_ok(flag: &str) -> bool {
    flag.eq_ignore_ascii_case("true")
}

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    search: Option<Vec<OmdbSummary>>,
    #[serde(rename = "totalResults", default)]
    total_results: Option<String>,
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

impl OmdbSearchResponse {
    fn into_page(self) -> SearchPage {
        if !response_ok(&self.response) {
            return SearchPage::failed(
                self.error
                    .unwrap_or_else(|| FETCH_FAILED_MESSAGE.to_string()),
            );
        }

        let items = self
            .search
            .unwrap_or_default()
            .into_iter()
            .filter_map(OmdbSummary::into_record)
            .collect();
        let total = self.total_results.as_deref().map(parse_count).unwrap_or(0);
        SearchPage::found(items, total)
    }
}

#[derive(Debug, Deserialize)]
struct OmdbSummary {
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
    #[serde(rename = "Type", default)]
    kind: Option<String>,
}

impl OmdbSummary {
    /// Entries without an id cannot be deduplicated or looked up.
    fn into_record(self) -> Option<SummaryRecord> {
        let id = present(&self.imdb_id)?;
        Some(SummaryRecord {
            id,
            title: self.title,
            year: self.year,
            poster_url: self.poster.as_deref().and_then(present),
            media_type: self
                .kind
                .as_deref()
                .map(MediaType::from_wire)
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmdbDetailResponse {
    #[serde(flatten)]
    summary: OmdbSummary,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Actors", default)]
    actors: Option<String>,
    #[serde(rename = "Writer", default)]
    writer: Option<String>,
    #[serde(rename = "Awards", default)]
    awards: Option<String>,
    #[serde(rename = "Rated", default)]
    rated: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes", default)]
    imdb_votes: Option<String>,
    #[serde(rename = "Metascore", default)]
    metascore: Option<String>,
    #[serde(rename = "Response", default)]
    response: String,
}

impl OmdbDetailResponse {
    fn into_record(self) -> Option<DetailRecord> {
        if !response_ok(&self.response) {
            return None;
        }
        let clean = |value: Option<String>| value.as_deref().and_then(present);

        Some(DetailRecord {
            genre_list: self.genre.as_deref().map(split_genres).unwrap_or_default(),
            plot: clean(self.plot),
            director: clean(self.director),
            cast: clean(self.actors),
            writers: clean(self.writer),
            awards: clean(self.awards),
            rated: clean(self.rated),
            runtime: clean(self.runtime),
            imdb_rating: clean(self.imdb_rating),
            vote_count: clean(self.imdb_votes),
            metascore: clean(self.metascore),
            summary: self.summary.into_record()?,
        })
    }
}
