use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A downloaded image as recorded in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Source URL, unique per record
    pub url: String,

    /// Perceptual hash, absent until computed
    pub fingerprint: Option<String>,

    /// File name relative to the API version's image directory
    pub filename: String,

    /// Time of the most recent write
    pub downloaded_at: NaiveDateTime,
}

impl ImageRecord {
    /// Check if the recorded file exists inside `image_dir`
    pub fn file_exists(&self, image_dir: &Path) -> bool {
        image_dir.join(&self.filename).exists()
    }
}
