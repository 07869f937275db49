use crate::config::SourceConfig;
use crate::error::SourceError;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can hand over the raw bytes of a numbered voting record.
pub trait DocumentSource {
    fn fetch(&mut self, id: u64) -> Result<Vec<u8>, SourceError>;
}

/// Fetches records over HTTP from a URL template. Any non-success status is a miss.
pub struct HttpSource {
    client: Client,
    config: SourceConfig,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&mut self, id: u64) -> Result<Vec<u8>, SourceError> {
        let url = self.config.url_for(id);
        debug!(id, %url, "requesting document");

        let transport = |source| SourceError::Transport { id, source };
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/pdf")
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::NotFound {
                id,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

/// Wraps a source and keeps a copy of every fetched document on disk.
///
/// Each document is written once, as `acta_<id>.pdf`. With `reuse` set, an existing
/// copy is served instead of fetching again.
pub struct CachingSource<S> {
    inner: S,
    dir: PathBuf,
    reuse: bool,
}

impl<S: DocumentSource> CachingSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>, reuse: bool) -> Self {
        Self {
            inner,
            dir: dir.into(),
            reuse,
        }
    }

    pub fn cached_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("acta_{id}.pdf"))
    }

    fn save(&self, path: &Path, bytes: &[u8]) {
        if path.exists() {
            return;
        }
        let written = fs::create_dir_all(&self.dir).and_then(|_| fs::write(path, bytes));
        match written {
            Ok(()) => debug!(path = %path.display(), "cached raw document"),
            Err(err) => warn!(path = %path.display(), error = %err, "could not cache raw document"),
        }
    }
}

impl<S: DocumentSource> DocumentSource for CachingSource<S> {
    fn fetch(&mut self, id: u64) -> Result<Vec<u8>, SourceError> {
        let path = self.cached_path(id);
        if self.reuse {
            if let Ok(bytes) = fs::read(&path) {
                debug!(id, "serving document from cache");
                return Ok(bytes);
            }
        }

        let bytes = self.inner.fetch(id)?;
        self.save(&path, &bytes);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource {
        docs: HashMap<u64, Vec<u8>>,
        calls: usize,
    }

    impl DocumentSource for MapSource {
        fn fetch(&mut self, id: u64) -> Result<Vec<u8>, SourceError> {
            self.calls += 1;
            self.docs
                .get(&id)
                .cloned()
                .ok_or(SourceError::NotFound { id, status: 404 })
        }
    }

    fn map_source() -> MapSource {
        MapSource {
            docs: HashMap::from([(1, b"first".to_vec())]),
            calls: 0,
        }
    }

    #[test]
    fn saves_fetched_documents_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CachingSource::new(map_source(), dir.path(), false);

        assert_eq!(source.fetch(1).unwrap(), b"first");
        let path = source.cached_path(1);
        assert_eq!(fs::read(&path).unwrap(), b"first");

        fs::write(&path, b"edited").unwrap();
        source.fetch(1).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"edited");
        assert_eq!(source.inner.calls, 2);
    }

    #[test]
    fn misses_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CachingSource::new(map_source(), dir.path(), false);

        assert!(matches!(
            source.fetch(2),
            Err(SourceError::NotFound { id: 2, .. })
        ));
        assert!(!source.cached_path(2).exists());
    }

    #[test]
    fn reuse_serves_cached_copy_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("acta_9.pdf"), b"cached").unwrap();
        let mut source = CachingSource::new(map_source(), dir.path(), true);

        assert_eq!(source.fetch(9).unwrap(), b"cached");
        assert_eq!(source.inner.calls, 0);
    }

    #[test]
    fn http_source_builds_urls_from_template() {
        let config = SourceConfig {
            url_template: "http://localhost/acta/{}/pdf".into(),
            ..Default::default()
        };
        let source = HttpSource::new(&config).unwrap();
        assert_eq!(source.config.url_for(42), "http://localhost/acta/42/pdf");
    }
}
