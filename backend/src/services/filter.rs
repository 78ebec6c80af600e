use std::collections::BTreeSet;

use thiserror::Error;

use crate::titles::{DetailRecord, fields::parse_decimal};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("minRating must be a decimal number (got '{0}')")]
pub struct InvalidRating(pub String);

/// Genre/rating criteria applied to enriched search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleFilter {
    genre: Option<String>,
    min_rating: Option<f64>,
}

impl TitleFilter {
    /// Build a filter; empty criteria are treated as "not set".
    pub fn new(genre: Option<&str>, min_rating: Option<&str>) -> Result<Self, InvalidRating> {
        let genre = genre
            .filter(|genre| !genre.is_empty())
            .map(str::to_string);

        let min_rating = match min_rating.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(parse_decimal(raw).ok_or_else(|| InvalidRating(raw.to_string()))?),
            None => None,
        };

        Ok(Self { genre, min_rating })
    }

    pub fn is_empty(&self) -> bool {
        self.genre.is_none() && self.min_rating.is_none()
    }

    /// Genre must be an exact, case-sensitive element of the genre list.
    /// With a rating threshold, unrated titles never match.
    pub fn matches(&self, record: &DetailRecord) -> bool {
        if let Some(genre) = &self.genre {
            if !record.has_genre(genre) {
                return false;
            }
        }

        if let Some(threshold) = self.min_rating {
            match record.rating() {
                Some(rating) if rating >= threshold => {}
                _ => return false,
            }
        }

        true
    }

    /// Surviving records in their original relative order.
    pub fn apply(&self, records: &[DetailRecord]) -> Vec<DetailRecord> {
        if self.is_empty() {
            return records.to_vec();
        }
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

/// One-shot form of [`TitleFilter::apply`].
pub fn filter_titles(
    records: &[DetailRecord],
    genre: Option<&str>,
    min_rating: Option<&str>,
) -> Result<Vec<DetailRecord>, InvalidRating> {
    Ok(TitleFilter::new(genre, min_rating)?.apply(records))
}

/// Sorted, de-duplicated genres across `records`, used to offer filter choices.
pub fn available_genres(records: &[DetailRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.genre_list.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
