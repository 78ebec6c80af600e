use futures::{StreamExt, future, stream};

use crate::{
    providers::TitleProvider,
    titles::{DetailRecord, SummaryRecord},
};

pub const DEFAULT_DETAIL_CONCURRENCY: usize = 8;

/// Fetches full records for a batch of search results.
///
/// One detail lookup is issued per summary with at most `concurrency` in
/// flight. The batch settles once every lookup has settled; lookups that come
/// back empty are dropped. Output follows input order.
#[derive(Debug, Clone, Copy)]
pub struct DetailAggregator {
    concurrency: usize,
}

impl Default for DetailAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_DETAIL_CONCURRENCY)
    }
}

impl DetailAggregator {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub async fn enrich(
        &self,
        provider: &dyn TitleProvider,
        summaries: &[SummaryRecord],
    ) -> Vec<DetailRecord> {
        if summaries.is_empty() {
            return Vec::new();
        }

        // Built eagerly so the stream holds futures, not a borrowing closure.
        let lookups: Vec<_> = summaries
            .iter()
            .map(|summary| provider.title_detail(&summary.id))
            .collect();
        let details: Vec<DetailRecord> = stream::iter(lookups)
            .buffered(self.concurrency)
            .filter_map(future::ready)
            .collect()
            .await;

        let dropped = summaries.len() - details.len();
        if dropped > 0 {
            tracing::debug!(
                requested = summaries.len(),
                dropped,
                "detail lookups without a result were skipped"
            );
        }
        details
    }
}
