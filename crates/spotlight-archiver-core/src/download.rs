use log::debug;
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::upstream::http_client;

/// Downloads one image into a directory
pub trait ImageFetcher {
    /// Fetch `url` into `image_dir` and return the written file path
    ///
    /// The file is complete on disk when this returns.
    fn fetch_image(&self, url: &str, image_dir: &Path) -> Result<PathBuf>;
}

/// Blocking HTTP image downloader
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// `deadline` bounds the whole response, body included
    pub fn new(connect_timeout: Duration, deadline: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(connect_timeout, deadline)?,
        })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch_image(&self, url: &str, image_dir: &Path) -> Result<PathBuf> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response.bytes()?;

        fs::create_dir_all(image_dir)?;
        let path = image_dir.join(image_filename(url));
        fs::write(&path, &bytes)?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// File name for an image URL: basename without query, always ending in `.jpg`
pub fn image_filename(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let basename = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    ensure_jpg_extension(basename)
}

fn ensure_jpg_extension(filename: &str) -> String {
    if filename.to_lowercase().ends_with(".jpg") {
        filename.to_string()
    } else {
        format!("{}.jpg", filename)
    }
}
