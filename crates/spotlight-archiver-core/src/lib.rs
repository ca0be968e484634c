//! Core functionality for archiving Windows Spotlight wallpapers.
//!
//! This library provides the components of an archiving run:
//! - Catalog fetching from the Spotlight delivery API (v3 and v4)
//! - Image download, perceptual fingerprinting and EXIF tagging
//! - A SQLite record store that makes repeated runs idempotent
//! - Paced multi-locale sweeps with bounded retry
//! - A Markdown report of probable duplicates

// -- External Dependencies --

use log::{debug, info};

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod config;
pub mod download;
pub mod driver;
pub mod listing;
pub mod locale;
pub mod logging;
pub mod metadata;
pub mod orchestrator;
pub mod pacing;
pub mod persistence;
pub mod processing;
pub mod report;
pub mod retry;
pub mod types;
pub mod upstream;

use download::HttpImageFetcher;
use driver::LocaleDriver;
use locale::LocaleCatalog;
use orchestrator::Orchestrator;
use pacing::CountdownPacer;
use persistence::RecordStore;
use upstream::SpotlightClient;

/// Main entry point for an archiving run
pub struct SpotlightArchiver;

impl SpotlightArchiver {
    /// Wire the production components for `config`
    ///
    /// Opens (or creates) the record store under the save directory and loads
    /// the locale catalog for the configured API version.
    pub fn build(config: Config) -> Result<Orchestrator> {
        config.validate()?;

        let store = RecordStore::initialize(&config.save_dir)?;
        let catalog = LocaleCatalog::load(&config.locale_cache_dir, config.api_version)?;
        let source = SpotlightClient::new(config.request_timeout(), config.download_deadline())?;
        let fetcher = HttpImageFetcher::new(config.request_timeout(), config.download_deadline())?;
        debug!("Record store at {}", config.database_path().display());

        info!(
            "Archiving {} {} images into {} ({} locales known)",
            config.api_version,
            config.orientation,
            config.image_dir().display(),
            catalog.len()
        );

        let driver = LocaleDriver::new(
            config,
            store,
            catalog,
            Box::new(source),
            Box::new(fetcher),
        );
        Ok(Orchestrator::new(driver, Box::new(CountdownPacer)))
    }
}
