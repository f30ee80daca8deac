use anyhow::Context;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::catalog::snapshot::{LocalSnapshotStore, SnapshotSource};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::search::classifier::Classifier;

/// Shared application state.
///
/// The active catalog sits behind a swappable `Arc`: requests clone the
/// pointer and scan their own snapshot without holding any lock, and a
/// reload replaces the pointer only once the new catalog is fully built.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub classifier: Classifier,
    catalog: Arc<RwLock<Arc<Catalog>>>,
    source: Arc<dyn SnapshotSource>,
    reload_semaphore: Arc<tokio::sync::Semaphore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state backed by the local snapshot store named in `config`.
    /// Fails if the initial catalog cannot be loaded.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let source = LocalSnapshotStore::new(&config.catalog.root, &config.catalog.model);
        Self::with_source(config, Arc::new(source))
    }

    pub fn with_source(config: Config, source: Arc<dyn SnapshotSource>) -> anyhow::Result<Self> {
        config.validate()?;
        let classifier = Classifier::new(config.classifier)?;

        let catalog = Catalog::load(
            source.as_ref(),
            &config.catalog.version,
            config.catalog.embedding_dim,
        )
        .with_context(|| {
            format!(
                "Failed to load catalog version {} from {}",
                config.catalog.version,
                config.catalog.root.display()
            )
        })?;

        Ok(Self {
            config,
            classifier,
            catalog: Arc::new(RwLock::new(Arc::new(catalog))),
            source,
            reload_semaphore: Arc::new(tokio::sync::Semaphore::new(1)),
        })
    }

    /// Snapshot of the currently active catalog.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    /// Atomically replace the active catalog, returning the previous one.
    /// In-flight requests keep using whichever snapshot they already hold.
    pub fn swap_catalog(&self, catalog: Catalog) -> Arc<Catalog> {
        self.install(Arc::new(catalog))
    }

    fn install(&self, next: Arc<Catalog>) -> Arc<Catalog> {
        std::mem::replace(&mut *self.catalog.write(), next)
    }

    /// Load `version` (or the configured version) and swap it in. On failure
    /// the active catalog is left untouched.
    pub async fn reload(&self, version: Option<String>) -> anyhow::Result<Arc<Catalog>> {
        // One reload at a time; concurrent triggers queue up.
        let _permit = self.reload_semaphore.acquire().await?;

        let version = version.unwrap_or_else(|| self.config.catalog.version.clone());
        let dimension = self.config.catalog.embedding_dim;
        let source = self.source.clone();

        let requested = version.clone();
        let catalog = tokio::task::spawn_blocking(move || {
            Catalog::load(source.as_ref(), &requested, dimension)
        })
        .await
        .context("Catalog load task failed")?
        .with_context(|| format!("Failed to load catalog version {version}"))?;

        let next = Arc::new(catalog);
        let previous = self.install(next.clone());
        tracing::info!(
            "Catalog swapped: {} -> {}",
            previous.version(),
            next.version()
        );
        Ok(next)
    }
}
