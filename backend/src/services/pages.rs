//! Page-level orchestration over the remote fetchers.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::{
    providers::{TitleProvider, TitleQuery, TrailerProvider},
    services::{
        debug::{DebugEntry, Timed, timed},
        enrich::DetailAggregator,
        filter::{TitleFilter, available_genres},
        merge::merge_pages,
    },
    titles::{DetailRecord, MediaType, SummaryRecord},
};

/// Page size the metadata provider uses for searches.
pub const RESULTS_PER_PAGE: u64 = 10;

pub const MAX_RECOMMENDATIONS: usize = 5;

const FEATURED_QUERY: &str = "movie";
const SERIES_QUERY: &str = "Star Wars";
const HERO_QUERY: &str = "zootopia 2";

const POSTER_SIZE: &str = "SX300";
const POSTER_SIZE_HD: &str = "SX1000";
const EMBED_BASE_URL: &str = "https://www.youtube.com/embed/";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub hero: Option<SummaryRecord>,
    pub featured: Vec<SummaryRecord>,
    pub series: Vec<SummaryRecord>,
    pub debug: Vec<DebugEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub page: u32,
    pub total_results: u64,
    pub total_pages: u64,
    pub items: Vec<DetailRecord>,
    pub available_genres: Vec<String>,
    /// Upstream-reported query error, surfaced verbatim.
    pub error: Option<String>,
    pub debug: Vec<DebugEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Trailer {
    pub video_id: String,
    pub embed_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailPage {
    pub title: DetailRecord,
    pub poster_hd_url: Option<String>,
    pub trailer: Option<Trailer>,
    pub recommendations: Vec<SummaryRecord>,
    pub favorite: bool,
    pub debug: Vec<DebugEntry>,
}

/// Builds the home, search and detail payloads.
pub struct PageService {
    titles: Arc<dyn TitleProvider>,
    trailers: Arc<dyn TrailerProvider>,
    aggregator: DetailAggregator,
}

impl PageService {
    pub fn new(
        titles: Arc<dyn TitleProvider>,
        trailers: Arc<dyn TrailerProvider>,
        aggregator: DetailAggregator,
    ) -> Self {
        Self {
            titles,
            trailers,
            aggregator,
        }
    }

    pub async fn title(&self, id: &str) -> Option<DetailRecord> {
        self.titles.title_detail(id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn home(&self) -> HomePage {
        let featured_1 = TitleQuery::new(FEATURED_QUERY).media_type(Some(MediaType::Movie));
        let featured_2 = featured_1.clone().page(2);
        let series_1 = TitleQuery::new(SERIES_QUERY).media_type(Some(MediaType::Series));
        let series_2 = series_1.clone().page(2);
        let hero_query = TitleQuery::new(HERO_QUERY).media_type(Some(MediaType::Movie));

        let titles = self.titles.as_ref();
        let (featured_1_page, featured_2_page, series_1_page, series_2_page, hero_page) = tokio::join!(
            timed(titles.search_titles(&featured_1)),
            timed(titles.search_titles(&featured_2)),
            timed(titles.search_titles(&series_1)),
            timed(titles.search_titles(&series_2)),
            timed(titles.search_titles(&hero_query)),
        );

        let featured = merge_pages([&featured_1_page.value, &featured_2_page.value]);
        let series = merge_pages([&series_1_page.value, &series_2_page.value]);
        let hero = hero_page
            .value
            .items
            .first()
            .or_else(|| featured.first())
            .cloned();

        let debug = [
            (&featured_1, &featured_1_page),
            (&featured_2, &featured_2_page),
            (&series_1, &series_1_page),
            (&series_2, &series_2_page),
            (&hero_query, &hero_page),
        ]
        .into_iter()
        .map(|(query, page)| {
            DebugEntry::new(search_source(query), titles.search_url(query), page)
        })
        .collect();

        HomePage {
            hero,
            featured,
            series,
            debug,
        }
    }

    /// Search one page, enrich the hits with full records, then filter them.
    #[tracing::instrument(skip(self, query, filter), fields(query = %query.query, page = query.page))]
    pub async fn search(&self, query: &TitleQuery, filter: &TitleFilter) -> SearchResults {
        let page = timed(self.titles.search_titles(query)).await;
        let debug = vec![DebugEntry::new(
            search_source(query),
            self.titles.search_url(query),
            &page,
        )];
        let Timed { value: page, .. } = page;

        if !page.ok {
            return SearchResults {
                query: query.query.clone(),
                page: query.page,
                total_results: 0,
                total_pages: 0,
                items: Vec::new(),
                available_genres: Vec::new(),
                error: page.error_message,
                debug,
            };
        }

        let enriched = self.aggregator.enrich(self.titles.as_ref(), &page.items).await;
        let genres = available_genres(&enriched);
        let items = filter.apply(&enriched);
        tracing::debug!(
            hits = page.items.len(),
            enriched = enriched.len(),
            kept = items.len(),
            "search page assembled"
        );

        SearchResults {
            query: query.query.clone(),
            page: query.page,
            total_results: page.total_count,
            total_pages: page.total_count.div_ceil(RESULTS_PER_PAGE),
            items,
            available_genres: genres,
            error: None,
            debug,
        }
    }

    /// Detail, trailer and recommendations for one title; `None` when unknown.
    #[tracing::instrument(skip(self))]
    pub async fn detail_page(&self, id: &str) -> Option<DetailPage> {
        let detail = timed(self.titles.title_detail(id)).await;
        let record = detail.value.clone()?;

        let (recommended, trailer) = tokio::join!(
            timed(self.titles.recommendations(&record.genre_list)),
            timed(self.trailers.trailer_video_id(&record.summary.title)),
        );

        let recommendations_url = TitleQuery::recommendations_for(&record.genre_list)
            .map(|query| self.titles.search_url(&query))
            .unwrap_or_default();
        let trailer_response = trailer.clone().map(|video_id| match video_id {
            Some(video_id) => json!({ "videoId": video_id }),
            None => json!("No trailer found"),
        });
        let debug = vec![
            DebugEntry::new("OMDb Detail", self.titles.detail_url(id), &detail),
            DebugEntry::new("OMDb Recommendations", recommendations_url, &recommended),
            DebugEntry::new(
                "YouTube Trailer",
                self.trailers.trailer_url(&record.summary.title),
                &trailer_response,
            ),
        ];

        let recommendations = recommended
            .value
            .items
            .into_iter()
            .filter(|candidate| candidate.id != record.summary.id)
            .take(MAX_RECOMMENDATIONS)
            .collect();

        Some(DetailPage {
            poster_hd_url: record
                .summary
                .poster_url
                .as_deref()
                .map(|poster| poster.replace(POSTER_SIZE, POSTER_SIZE_HD)),
            trailer: trailer.value.map(|video_id| Trailer {
                embed_url: format!("{EMBED_BASE_URL}{video_id}"),
                video_id,
            }),
            recommendations,
            favorite: false,
            debug,
            title: record,
        })
    }
}

fn search_source(query: &TitleQuery) -> String {
    format!("OMDb Search ({}, Page {})", query.query, query.page)
}
