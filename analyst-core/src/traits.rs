use async_trait::async_trait;

use crate::domain::{ChartData, Dataset, ImagePayload, SourceRef};
use crate::error::Result;

/// Resolves a source reference into a dataset.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn load(&self, source: &SourceRef) -> Result<Dataset>;

    fn name(&self) -> &str;
}

/// Turns computed chart data into an inline image.
pub trait ChartRenderer: Send + Sync {
    /// `max_chars` bounds the length of the returned data URI.
    fn render(&self, chart: &ChartData, max_chars: usize) -> Result<ImagePayload>;
}
