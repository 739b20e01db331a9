//! # Storage Crate
//!
//! The storage port of the film service and its backends.
//!
//! ## Components
//!
//! ### Port
//! [`FilmStore`] exposes single-predicate set queries (title, release date,
//! rating, content rating, genres, actors), point lookups for films and actors,
//! and a rating rollup. [`FavoriteStore`] holds per-user favorites. Callers
//! depend on these traits only.
//!
//! ### Backends
//! - [`InMemoryStore`]: answers from a loaded [`catalog::CatalogIndex`]
//! - [`PgStore`]: answers from Postgres through a sqlx pool
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::CatalogIndex;
//! use storage::{FilmStore, InMemoryStore};
//! use std::sync::Arc;
//!
//! let index = Arc::new(CatalogIndex::load_from_files("data/catalog".as_ref())?);
//! let store: Arc<dyn FilmStore> = Arc::new(InMemoryStore::new(index));
//!
//! let dramas = store.find_by_genres(&["Drama".to_string()]).await?;
//! ```

pub mod memory;
pub mod port;
pub mod postgres;

// Re-export commonly used types
pub use memory::InMemoryStore;
pub use port::{FavoriteStore, FilmStore, StorageError, StorageResult};
pub use postgres::{PgStore, PostgresConfig};
