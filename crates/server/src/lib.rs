//! Server crate for the film catalog.
//!
//! This crate wires the storage backends and the search core into an HTTP
//! service: configuration, storage bootstrap, the catalog service, routes
//! and the background storage health check.

pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod health;
pub mod service;
pub mod state;
pub mod telemetry;

pub use api::router;
pub use config::Config;
pub use envelope::Envelope;
pub use error::ApiError;
pub use health::HealthMonitor;
pub use service::{ActorDetails, Calendar, CalendarDay, CatalogService, FilmDetails};
pub use state::{AppState, Storage};
