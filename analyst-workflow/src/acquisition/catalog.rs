use std::collections::BTreeMap;
use std::path::PathBuf;
use url::Url;

/// Where a named dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocation {
    Remote(Url),
    File(PathBuf),
}

/// Named datasets a task can refer to instead of giving a URL.
#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    entries: BTreeMap<String, DatasetLocation>,
}

impl DatasetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `name -> location` pairs; `http(s)` locations are remote, anything else a path.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut catalog = Self::new();
        for (name, location) in entries {
            catalog.register(name, location);
        }
        catalog
    }

    pub fn register(&mut self, name: &str, location: &str) {
        let location = match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => DatasetLocation::Remote(url),
            _ => DatasetLocation::File(PathBuf::from(location)),
        };
        self.entries.insert(name.trim().to_lowercase(), location);
    }

    pub fn location(&self, name: &str) -> Option<&DatasetLocation> {
        self.entries.get(&name.trim().to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
