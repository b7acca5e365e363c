//! # volsurface-rs
//!
//! A data pipeline that turns an options contract listing into an implied
//! volatility surface with a gamma exposure overlay.
//!
//! ## Features
//!
//! - Async client for an options reference-data API with request timeouts
//! - Synthetic market generation with a deterministic, seedable random source
//! - Fixed-resolution surface grids with two-pass hole interpolation
//! - Renderable mesh, point-cloud and gamma-plane coordinate output
//! - Heatmap PNGs and a plain-text options chain
//! - Environment-based configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use volsurface_rs::api::ContractsClient;
//! use volsurface_rs::config::Config;
//! use volsurface_rs::surface::SurfaceService;
//! use volsurface_rs::utils::chain_table::render_chain_table;
//!
//! #[tokio::main]
//! async fn main() -> volsurface_rs::error::Result<()> {
//!     let config = Config::from_env()?;
//!     config.init_logging()?;
//!
//!     let client = ContractsClient::new(config.api.clone())?;
//!     let service = SurfaceService::new(config.surface.clone());
//!
//!     let now = chrono::Utc::now();
//!     let ticket = service.begin_refresh();
//!     let raw = client
//!         .fetch_contracts(&config.surface.symbol, now, config.surface.expiry_range_days)
//!         .await?;
//!     let snapshot = service.apply(ticket, &config.surface.symbol, &raw, now)?;
//!
//!     println!(
//!         "{}",
//!         render_chain_table(&snapshot.records, snapshot.spot_estimate, &config.surface)
//!     );
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod surface;
pub mod utils;

// Re-export commonly used types
pub use api::ContractsClient;
pub use config::Config;
pub use error::{Result, SurfaceError};
pub use surface::{SurfaceService, SurfaceSnapshot};
