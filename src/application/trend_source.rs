// Trend source trait for fetching raw windows
use crate::application::errors::UpstreamError;
use crate::domain::sample::RawSample;
use async_trait::async_trait;

/// What to ask the trend service for on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendQuery {
    pub keyword: String,
    pub geo: String,
    pub category: i64,
    pub time_range: String,
}

#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Fetch the current, freshly normalised window for the query.
    /// Samples are returned in the order the service reports them.
    async fn fetch_window(&self, query: &TrendQuery) -> Result<Vec<RawSample>, UpstreamError>;
}
