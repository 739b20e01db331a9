//! Storage bootstrap and shared application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use catalog::CatalogIndex;
use storage::{FavoriteStore, FilmStore, InMemoryStore, PgStore};
use tracing::info;

use crate::config::{Config, StorageBackend, StorageConfig};
use crate::service::CatalogService;

/// The configured backend, seen through both storage ports
#[derive(Clone)]
pub struct Storage {
    pub films: Arc<dyn FilmStore>,
    pub favorites: Arc<dyn FavoriteStore>,
}

impl Storage {
    pub fn memory(index: Arc<CatalogIndex>) -> Self {
        let store = Arc::new(InMemoryStore::new(index));
        Self {
            films: store.clone(),
            favorites: store,
        }
    }

    /// Open the backend selected in the config
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let start = Instant::now();
        let storage = match config.backend {
            StorageBackend::Memory => {
                let data_dir = config.data_dir.clone();
                info!(data_dir = %data_dir.display(), "Loading catalog");
                // Parsing is CPU-bound; keep it off the async workers
                let index = tokio::task::spawn_blocking(move || CatalogIndex::load_from_files(&data_dir))
                    .await
                    .context("Catalog loading task failed")?
                    .context("Failed to load catalog")?;
                Self::memory(Arc::new(index))
            }
            StorageBackend::Postgres => {
                let store = Arc::new(
                    PgStore::connect(&config.postgres)
                        .await
                        .context("Failed to connect to Postgres")?,
                );
                Self {
                    films: store.clone(),
                    favorites: store,
                }
            }
        };
        info!(
            backend = storage.films.backend(),
            elapsed = ?start.elapsed(),
            "Storage ready"
        );
        Ok(storage)
    }
}

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub service: CatalogService,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(storage: Storage, request_timeout: Duration) -> Self {
        Self {
            service: CatalogService::new(storage.films, storage.favorites),
            request_timeout,
        }
    }

    pub fn from_config(storage: Storage, config: &Config) -> Self {
        Self::new(storage, config.request_timeout())
    }
}
