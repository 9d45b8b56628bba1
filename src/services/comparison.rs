//! Concurrent current/previous fetch under one shared deadline.

use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use super::upstream::{SeriesProvider, SeriesQuery};
use crate::error::FetchError;
use crate::models::series::RawSeriesByKey;

/// Both periods of one comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonData {
    pub current: RawSeriesByKey,
    pub previous: RawSeriesByKey,
}

/// Fetches `query` and its trailing window concurrently.
///
/// Either both datasets arrive within `deadline` or the whole call fails;
/// a partial pair is never returned.
pub async fn fetch_comparison(
    provider: &dyn SeriesProvider,
    query: &SeriesQuery,
    deadline: Duration,
) -> Result<ComparisonData, FetchError> {
    let previous_query = query.previous();
    let both = async {
        tokio::try_join!(
            provider.fetch_series(query),
            provider.fetch_series(&previous_query)
        )
    };

    match timeout(deadline, both).await {
        Ok(Ok((current, previous))) => Ok(ComparisonData { current, previous }),
        Ok(Err(err)) => Err(err),
        Err(_) => {
            warn!(pattern = %query.pattern, ?deadline, "Comparison fetch timed out");
            Err(FetchError::Timeout(deadline))
        }
    }
}
