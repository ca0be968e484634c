use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Version of the Spotlight delivery API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ApiVersion {
    /// `v3/Delivery/Placement`, 1080p images
    V3,
    /// `v4/api/selection`, 4K images
    V4,
}

impl ApiVersion {
    /// Sub-directory of the save directory that holds images for this version
    pub fn image_subdir(&self) -> &'static str {
        match self {
            Self::V3 => "1080p",
            Self::V4 => "4K",
        }
    }
}

impl TryFrom<u8> for ApiVersion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            other => Err(Error::Configuration(format!(
                "Unsupported API version {} (expected 3 or 4)",
                other
            ))),
        }
    }
}

impl From<ApiVersion> for u8 {
    fn from(value: ApiVersion) -> Self {
        match value {
            ApiVersion::V3 => 3,
            ApiVersion::V4 => 4,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", u8::from(*self))
    }
}

/// Which image assets of an entry to work with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Both,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Both => "both",
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landscape" => Ok(Self::Landscape),
            "portrait" => Ok(Self::Portrait),
            "both" => Ok(Self::Both),
            other => Err(Error::Configuration(format!(
                "Unknown orientation '{}' (expected landscape, portrait or both)",
                other
            ))),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog item returned by the delivery API for a locale
///
/// Every field may be absent in the upstream payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Landscape image URL
    pub landscape_url: Option<String>,

    /// Portrait image URL
    pub portrait_url: Option<String>,

    /// Picture title
    pub title: Option<String>,

    /// Copyright line
    pub copyright: Option<String>,

    /// Caption title (v4 only)
    pub caption_title: Option<String>,

    /// Caption description (v4 only)
    pub caption_description: Option<String>,
}

impl Entry {
    /// Image URLs of this entry that apply to `orientation`, landscape first
    pub fn image_urls(&self, orientation: Orientation) -> Vec<&str> {
        let landscape = self.landscape_url.as_deref();
        let portrait = self.portrait_url.as_deref();
        match orientation {
            Orientation::Landscape => landscape.into_iter().collect(),
            Orientation::Portrait => portrait.into_iter().collect(),
            Orientation::Both => landscape.into_iter().chain(portrait).collect(),
        }
    }
}

/// Result of handling a single image URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A record exists and the file is still on disk
    AlreadyValid,

    /// The image was fetched, fingerprinted and recorded
    Downloaded(PathBuf),

    /// Nothing could be fetched (no entries, no URL for the orientation)
    FetchFailed(String),
}

/// Download counters aggregated over entries, locales and sweeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepTally {
    /// Images fetched in this run
    pub downloaded: usize,

    /// Images skipped because they were already archived
    pub already_downloaded: usize,
}

impl SweepTally {
    pub fn new(downloaded: usize, already_downloaded: usize) -> Self {
        Self {
            downloaded,
            already_downloaded,
        }
    }

    /// Record a single outcome
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::AlreadyValid => self.already_downloaded += 1,
            DownloadOutcome::Downloaded(_) => self.downloaded += 1,
            DownloadOutcome::FetchFailed(_) => {}
        }
    }

    /// A sweep that found everything already archived
    pub fn is_stable(&self) -> bool {
        self.downloaded == 0 && self.already_downloaded > 0
    }
}

impl AddAssign for SweepTally {
    fn add_assign(&mut self, rhs: Self) {
        self.downloaded += rhs.downloaded;
        self.already_downloaded += rhs.already_downloaded;
    }
}
