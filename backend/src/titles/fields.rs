//! Helpers for the provider's loosely-typed string fields.

use serde::{Deserialize, Deserializer};

/// Sentinel the metadata provider uses for missing values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Return the trimmed value unless it is empty or the "N/A" sentinel.
pub fn present(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Serde adapter mapping `null`, `""` and `"N/A"` to `None`.
pub fn optional_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(present))
}

/// Split a comma-separated genre string ("Action, Adventure") into its elements.
pub fn split_genres(raw: &str) -> Vec<String> {
    if present(raw).is_none() {
        return Vec::new();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a decimal, rejecting the sentinel, NaN and infinities.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let value = present(raw)?.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Parse a count such as `"1,234"`; anything unparseable is zero.
pub fn parse_count(raw: &str) -> u64 {
    raw.trim().replace(',', "").parse().unwrap_or(0)
}
