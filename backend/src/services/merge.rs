use std::collections::HashSet;

use crate::titles::{SearchPage, SummaryRecord};

/// Union the items of several pages into one list keyed by title id.
///
/// Pages are visited in order and the first occurrence of an id wins; later
/// duplicates are dropped rather than merged. Failed pages are not special
/// cased: they simply carry no items.
pub fn merge_pages<'a, I>(pages: I) -> Vec<SummaryRecord>
where
    I: IntoIterator<Item = &'a SearchPage>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for item in pages.into_iter().flat_map(|page| page.items.iter()) {
        if seen.insert(item.id.as_str()) {
            merged.push(item.clone());
        }
    }

    merged
}
