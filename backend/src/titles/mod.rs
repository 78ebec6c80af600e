use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod fields;

/// Kind of title reported by the metadata provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
    Episode,
    /// Anything the provider reports that we do not model (e.g. `game`).
    #[default]
    #[serde(other)]
    Unknown,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
            MediaType::Episode => "episode",
            MediaType::Unknown => "unknown",
        }
    }

    /// Lenient conversion used for upstream payloads.
    pub fn from_wire(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a media type string is not one of the searchable kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("type must be one of movie, series, or episode (got '{0}')")]
pub struct InvalidMediaType(pub String);

impl FromStr for MediaType {
    type Err = InvalidMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "series" => Ok(MediaType::Series),
            "episode" => Ok(MediaType::Episode),
            _ => Err(InvalidMediaType(s.to_string())),
        }
    }
}

/// A title as returned by a search query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: String,
    /// `None` when the provider has no image for the title.
    #[serde(default, deserialize_with = "fields::optional_field")]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub media_type: MediaType,
}

/// Full record for a single title. Absent upstream values ("N/A") are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    #[serde(flatten)]
    pub summary: SummaryRecord,
    pub plot: Option<String>,
    #[serde(default)]
    pub genre_list: Vec<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub writers: Option<String>,
    pub awards: Option<String>,
    pub rated: Option<String>,
    pub runtime: Option<String>,
    pub imdb_rating: Option<String>,
    pub vote_count: Option<String>,
    pub metascore: Option<String>,
}

impl DetailRecord {
    pub fn id(&self) -> &str {
        &self.summary.id
    }

    /// Numeric rating, if the provider reported a parseable one.
    pub fn rating(&self) -> Option<f64> {
        self.imdb_rating.as_deref().and_then(fields::parse_decimal)
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genre_list.iter().any(|candidate| candidate == genre)
    }
}

/// Result of one paged search query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SummaryRecord>,
    pub total_count: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SearchPage {
    pub fn found(items: Vec<SummaryRecord>, total_count: u64) -> Self {
        Self {
            items,
            total_count,
            ok: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            ok: false,
            error_message: Some(message.into()),
        }
    }
}
