//! Package manifests.
//!
//! Operations linked as `node:<package>#<export>` are described by their
//! package's manifest, a Turtle file found either in a local directory
//! (`<dir>/<package>/manifest.ttl`) or on a registry
//! (`<registry_url>/<package>/manifest.ttl`).
//!
//! Several operations usually share one package, so manifests go through a
//! single-flight cache: the first lookup of a package loads it, concurrent
//! lookups of the same package wait for that load, later ones reuse it.

use crate::core::config::SchemaConfig;
use crate::core::error::SchemaError;
use crate::graph::store::GraphStore;
use crate::graph::turtle;
use crate::pipeline::model::CodeLink;
use crate::schema::source::SchemaSource;
use crate::schema::spec::OperationSchema;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use url::Url;

/// Outcome of loading one package manifest. `None` when no manifest exists.
type ManifestResult = Result<Option<Arc<GraphStore>>, SchemaError>;

/// Where manifests are looked for.
#[derive(Debug, Clone)]
pub struct ManifestLocator {
    dirs: Vec<PathBuf>,
    manifest_file: String,
    registry_url: Option<String>,
    timeout: Duration,
}

impl ManifestLocator {
    /// Locator for `config`, adding `<document_dir>/node_modules` when enabled.
    pub fn from_config(config: &SchemaConfig, document_dir: Option<&Path>) -> Self {
        let mut dirs = config.manifest_dirs.clone();
        if config.search_document_dir {
            if let Some(dir) = document_dir {
                dirs.push(dir.join("node_modules"));
            }
        }
        Self {
            dirs,
            manifest_file: config.manifest_file.clone(),
            registry_url: config.registry_url.clone(),
            timeout: config.timeout(),
        }
    }

    /// Candidate files for `package`, in search order.
    pub fn local_paths(&self, package: &str) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(package).join(&self.manifest_file))
            .collect()
    }

    /// Registry URL of the manifest of `package`, if a registry is configured.
    pub fn remote_url(&self, package: &str) -> Option<String> {
        let base = self.registry_url.as_deref()?;
        Some(format!(
            "{}/{}/{}",
            base.trim_end_matches('/'),
            package,
            self.manifest_file
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.registry_url.is_none()
    }
}

/// Manifest cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestCacheStats {
    /// Packages actually loaded.
    pub loads: u64,
    /// Lookups answered by an earlier or in-flight load.
    pub hits: u64,
}

/// Single-flight cache of package manifests, scoped to one run.
#[derive(Default)]
pub struct ManifestCache {
    cells: Mutex<HashMap<String, Arc<OnceCell<ManifestResult>>>>,
    stats: Mutex<ManifestCacheStats>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the manifest of `package`, running `load` only for the first lookup.
    pub async fn get_or_load<F>(&self, package: &str, load: F) -> ManifestResult
    where
        F: std::future::Future<Output = ManifestResult>,
    {
        let cell = {
            let mut cells = self.cells.lock();
            cells.entry(package.to_string()).or_default().clone()
        };

        let mut loaded = false;
        let result = cell
            .get_or_init(|| {
                loaded = true;
                load
            })
            .await
            .clone();

        let mut stats = self.stats.lock();
        if loaded {
            stats.loads += 1;
        } else {
            stats.hits += 1;
            log::debug!("manifest cache hit for {}", package);
        }
        result
    }

    pub fn stats(&self) -> ManifestCacheStats {
        *self.stats.lock()
    }

    pub fn len(&self) -> usize {
        self.cells.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.lock().is_empty()
    }
}

/// Resolves `node:` operations from their package manifests.
pub struct ManifestSchemaSource {
    locator: ManifestLocator,
    cache: ManifestCache,
}

impl ManifestSchemaSource {
    pub fn new(locator: ManifestLocator) -> Self {
        Self {
            locator,
            cache: ManifestCache::new(),
        }
    }

    pub fn cache_stats(&self) -> ManifestCacheStats {
        self.cache.stats()
    }

    async fn load(&self, package: &str) -> ManifestResult {
        let start = Instant::now();
        for path in self.locator.local_paths(package) {
            match tokio::fs::read_to_string(&path).await {
                Ok(source) => {
                    let location = path.display().to_string();
                    let base = Url::from_file_path(&path)
                        .map(|url| url.to_string())
                        .unwrap_or_else(|_| location.clone());
                    let graph = parse_manifest(&source, &base, &location)?;
                    log::info!("loaded manifest of {} from {} in {:?}", package, location, start.elapsed());
                    return Ok(Some(graph));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(SchemaError::ManifestUnavailable {
                        location: path.display().to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        }

        let Some(url) = self.locator.remote_url(package) else {
            log::debug!("no manifest for package {}", package);
            return Ok(None);
        };
        let fetched = fetch(url.clone(), self.locator.timeout).await?;
        match fetched {
            Some(source) => {
                let graph = parse_manifest(&source, &url, &url)?;
                log::info!("fetched manifest of {} from {} in {:?}", package, url, start.elapsed());
                Ok(Some(graph))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SchemaSource for ManifestSchemaSource {
    fn name(&self) -> &str {
        "manifest"
    }

    async fn resolve(&self, operation: &CodeLink) -> Result<Option<OperationSchema>, SchemaError> {
        let Some(package) = operation.package() else {
            return Ok(None);
        };
        let manifest = self.cache.get_or_load(&package, self.load(&package)).await?;
        match manifest {
            Some(graph) => OperationSchema::from_graph(&graph, operation.id()),
            None => Ok(None),
        }
    }
}

fn parse_manifest(source: &str, base: &str, location: &str) -> Result<Arc<GraphStore>, SchemaError> {
    let outcome = turtle::parse(source, Some(base));
    if let Some(first) = outcome.errors.first() {
        return Err(SchemaError::ManifestMalformed {
            location: location.to_string(),
            count: outcome.errors.len(),
            first: first.to_string(),
        });
    }
    Ok(Arc::new(GraphStore::from_triples(outcome.document, outcome.triples)))
}

/// Fetch a remote manifest on a blocking thread. `None` on 404.
async fn fetch(url: String, timeout: Duration) -> Result<Option<String>, SchemaError> {
    let location = url.clone();
    let request = tokio::task::spawn_blocking(move || -> Result<Option<String>, String> {
        match ureq::get(&url).timeout(timeout).call() {
            Ok(response) => response.into_string().map(Some).map_err(|e| e.to_string()),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(code, _)) => Err(format!("HTTP status {}", code)),
            Err(e) => Err(e.to_string()),
        }
    });

    match tokio::time::timeout(timeout, request).await {
        Err(_) => Err(SchemaError::Timeout {
            location,
            secs: timeout.as_secs(),
        }),
        Ok(Err(join)) => Err(SchemaError::ManifestUnavailable {
            location,
            reason: join.to_string(),
        }),
        Ok(Ok(result)) => result.map_err(|reason| SchemaError::ManifestUnavailable { location, reason }),
    }
}
