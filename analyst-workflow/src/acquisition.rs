//! Data acquisition: resolve a [`SourceRef`] to a parsed [`Dataset`].

pub mod catalog;
pub mod http;
pub mod parsers;

use analyst_core::{AnalystError, DataSource, Dataset, Result, SourceRef};
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};
use url::Url;

use crate::config::AcquisitionConfig;
pub use catalog::{DatasetCatalog, DatasetLocation};
pub use http::{FetchError, FetchedDocument, HttpFetcher};
pub use parsers::ContentKind;

/// Fetches URLs over HTTP and reads catalog entries from disk or HTTP.
#[derive(Debug, Clone)]
pub struct DataAcquisition {
    fetcher: HttpFetcher,
    catalog: DatasetCatalog,
}

impl DataAcquisition {
    pub fn new(config: &AcquisitionConfig, catalog: DatasetCatalog) -> Result<Self> {
        let fetcher = HttpFetcher::new(config)
            .map_err(|e| AnalystError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { fetcher, catalog })
    }

    async fn load_url(&self, source: &SourceRef, url: &Url, name: &str) -> Result<Dataset> {
        let document = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| AnalystError::source_unavailable(source.to_string(), e.to_string()))?;

        let kind = ContentKind::detect(document.content_type.as_deref(), url.path(), &document.body);
        parse(source, name, kind, &document.body)
    }

    async fn load_file(&self, source: &SourceRef, path: &Path, name: &str) -> Result<Dataset> {
        info!(path = %path.display(), "Reading dataset file");
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AnalystError::source_unavailable(source.to_string(), e.to_string()))?;

        let kind = ContentKind::detect(None, &path.to_string_lossy(), &body);
        parse(source, name, kind, &body)
    }
}

fn parse(source: &SourceRef, name: &str, kind: ContentKind, body: &str) -> Result<Dataset> {
    let dataset = parsers::parse_dataset(name, kind, body).map_err(|e| {
        warn!(source = %source, error = %e, "Could not parse data source");
        AnalystError::source_unavailable(source.to_string(), e.to_string())
    })?;

    if dataset.is_empty() {
        return Err(AnalystError::source_unavailable(
            source.to_string(),
            "no data rows found",
        ));
    }

    info!(
        source = %source,
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Loaded dataset"
    );
    Ok(dataset)
}

#[async_trait]
impl DataSource for DataAcquisition {
    async fn load(&self, source: &SourceRef) -> Result<Dataset> {
        match source {
            SourceRef::Url(url) => self.load_url(source, url, url.as_str()).await,
            SourceRef::Dataset(name) => match self.catalog.location(name) {
                Some(DatasetLocation::Remote(url)) => self.load_url(source, url, name).await,
                Some(DatasetLocation::File(path)) => self.load_file(source, path, name).await,
                None => Err(AnalystError::source_unavailable(
                    source.to_string(),
                    "dataset is not registered in the catalog",
                )),
            },
        }
    }

    fn name(&self) -> &str {
        "data-acquisition"
    }
}
