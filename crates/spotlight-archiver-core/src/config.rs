use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{ApiVersion, Orientation};

/// Name of the SQLite file holding download records
pub const DB_FILENAME: &str = "downloaded_images.sqlite";

/// Name of the Markdown duplicates report written into the save directory
pub const REPORT_FILENAME: &str = "phash_duplicates_report.md";

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Configuration for an archiving run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory for images, the record store and the duplicates report
    pub save_dir: PathBuf,

    /// Delivery API version to query
    pub api_version: ApiVersion,

    /// Image orientation to download
    pub orientation: Orientation,

    /// Whether to embed EXIF metadata with exiftool
    pub embed_exif: bool,

    /// Path to the exiftool executable or the directory containing it
    pub exiftool_path: Option<PathBuf>,

    /// Print per-entry details
    pub verbose: bool,

    /// Directory holding the locale catalog cache
    pub locale_cache_dir: PathBuf,

    /// Maximum Hamming distance for two fingerprints to count as duplicates (0 = exact match)
    pub phash_threshold: u32,

    /// Attempts per locale before giving up
    pub max_attempts: u32,

    /// Fixed wait between attempts, in seconds
    pub retry_delay_secs: u64,

    /// Connect timeout of HTTP requests, in seconds
    pub request_timeout_secs: u64,

    /// Total time allowed for one HTTP response including its body, in seconds
    pub download_deadline_secs: u64,

    /// Locales processed between two pacing delays
    pub chunk_size: usize,

    /// Upper bound of the per-chunk pacing delay, in seconds
    pub max_chunk_delay_secs: u64,

    /// Stable sweeps in a row that end the exhaustive loop
    pub max_consecutive: u32,

    /// Hard cap on sweeps in the exhaustive loop
    pub max_calls: u32,

    /// Pause between two sweeps of the exhaustive loop, in seconds
    pub inter_call_pause_secs: u64,

    /// Escalating delays applied every ten sweeps, in seconds
    pub escalation_delays_secs: Vec<u64>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("downloaded_spotlight"),
            api_version: ApiVersion::V3,
            orientation: Orientation::Landscape,
            embed_exif: false,
            exiftool_path: None,
            verbose: false,
            locale_cache_dir: PathBuf::from(".cache"),
            phash_threshold: 0,
            max_attempts: 5,
            retry_delay_secs: 10,
            request_timeout_secs: 10,
            download_deadline_secs: 300,
            chunk_size: 15,
            max_chunk_delay_secs: 180,
            max_consecutive: 50,
            max_calls: 200,
            inter_call_pause_secs: 2,
            escalation_delays_secs: vec![5, 10, 15, 20, 30, 45, 60, 90, 120, 180],
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration(
                "Chunk size must be at least 1".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(Error::Configuration(
                "At least one attempt per locale is required".to_string(),
            ));
        }

        if self.escalation_delays_secs.is_empty() {
            return Err(Error::Configuration(
                "Escalation delay schedule must not be empty".to_string(),
            ));
        }

        if self.phash_threshold > 64 {
            return Err(Error::Configuration(
                "Perceptual hash threshold must be between 0 and 64".to_string(),
            ));
        }

        Ok(())
    }

    /// `<save_dir>/.cache`, home of the record store and logs
    pub fn cache_dir(&self) -> PathBuf {
        self.save_dir.join(".cache")
    }

    pub fn database_path(&self) -> PathBuf {
        self.cache_dir().join(DB_FILENAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.cache_dir().join("logs")
    }

    pub fn report_path(&self) -> PathBuf {
        self.save_dir.join(REPORT_FILENAME)
    }

    /// Directory images of the configured API version are saved to
    pub fn image_dir(&self) -> PathBuf {
        self.save_dir.join(self.api_version.image_subdir())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_deadline(&self) -> Duration {
        Duration::from_secs(self.download_deadline_secs)
    }

    pub fn inter_call_pause(&self) -> Duration {
        Duration::from_secs(self.inter_call_pause_secs)
    }
}
