use log::{info, warn};
use std::time::Duration;

use crate::error::Result;
use crate::locale::{is_all, LocaleCatalog};
use crate::logging::log_download_error;
use crate::pacing::{chunk_delay, Pacer};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::types::{ApiVersion, Entry, Orientation};
use crate::upstream::EntrySource;

/// Lists image URLs without downloading anything
pub struct UrlLister<'a> {
    source: &'a dyn EntrySource,
    catalog: &'a LocaleCatalog,
    pacer: &'a dyn Pacer,
    retry: RetryPolicy,
    chunk_size: usize,
    max_chunk_delay: Duration,
}

impl<'a> UrlLister<'a> {
    pub fn new(source: &'a dyn EntrySource, catalog: &'a LocaleCatalog, pacer: &'a dyn Pacer) -> Self {
        Self {
            source,
            catalog,
            pacer,
            retry: RetryPolicy::default(),
            chunk_size: 15,
            max_chunk_delay: Duration::from_secs(180),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, max_chunk_delay: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.max_chunk_delay = max_chunk_delay;
        self
    }

    /// Hand the entries of `locale` (or of every locale for `all`) to `emit`
    ///
    /// Returns the number of entries listed. For `all`, locales that keep
    /// failing upstream are logged and skipped.
    pub fn list<F>(
        &self,
        api_version: ApiVersion,
        locale: &str,
        orientation: Orientation,
        mut emit: F,
    ) -> Result<usize>
    where
        F: FnMut(&str, &[Entry]),
    {
        if !is_all(locale) {
            let Some(code) = self.catalog.resolve(locale) else {
                warn!(
                    "Locale '{}' is not valid. Use one of: {}",
                    locale,
                    self.catalog.codes().join(", ")
                );
                return Ok(0);
            };
            let entries = self.fetch(api_version, code, orientation)?;
            emit(code, &entries);
            return Ok(entries.len());
        }

        let codes = self.catalog.codes();
        let chunk_count = codes.len().div_ceil(self.chunk_size);
        let mut total = 0;

        for (chunk_index, chunk) in codes.chunks(self.chunk_size).enumerate() {
            for code in chunk {
                info!("--- {} ---", code);
                match self.fetch(api_version, code, orientation) {
                    Ok(entries) => {
                        emit(code, &entries);
                        total += entries.len();
                    }
                    Err(e) if e.is_retryable() => log_download_error(code, &e),
                    Err(e) => return Err(e),
                }
            }

            if chunk_index + 1 < chunk_count {
                self.pacer
                    .wait(chunk_delay(chunk_index, self.max_chunk_delay));
            }
        }

        Ok(total)
    }

    fn fetch(&self, api_version: ApiVersion, code: &str, orientation: Orientation) -> Result<Vec<Entry>> {
        run_with_retry(&self.retry, code, || {
            self.source.fetch_entries(api_version, code, orientation)
        })
    }
}

/// Landscape and portrait URLs of `entry` on one line, separated by a space
pub fn format_entry_urls(entry: &Entry, orientation: Orientation) -> String {
    entry.image_urls(orientation).join(" ")
}
