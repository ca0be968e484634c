//! Per-locale download flow
//!
//! For a single locale the driver fetches the catalog entries, then for each
//! image URL it either skips (a record exists and its file is still on disk)
//! or downloads, fingerprints, records and optionally tags the image.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

use crate::config::Config;
use crate::download::ImageFetcher;
use crate::error::Result;
use crate::locale::LocaleCatalog;
use crate::logging::log_fs_modification;
use crate::metadata::{ExifToolEmbedder, MetadataEmbedder};
use crate::persistence::RecordStore;
use crate::processing::{Fingerprinter, PerceptualHasher};
use crate::types::{DownloadOutcome, Entry, Orientation, SweepTally};
use crate::upstream::EntrySource;

/// Downloads images of one locale at a time into the archive
pub struct LocaleDriver {
    config: Config,
    store: RecordStore,
    catalog: LocaleCatalog,
    source: Box<dyn EntrySource>,
    fetcher: Box<dyn ImageFetcher>,
    fingerprinter: Box<dyn Fingerprinter>,
    embedder: Box<dyn MetadataEmbedder>,
    rng: StdRng,
}

impl LocaleDriver {
    /// Driver with the DCT fingerprinter and the exiftool embedder
    pub fn new(
        config: Config,
        store: RecordStore,
        catalog: LocaleCatalog,
        source: Box<dyn EntrySource>,
        fetcher: Box<dyn ImageFetcher>,
    ) -> Self {
        let embedder =
            ExifToolEmbedder::new(config.exiftool_path.clone()).with_verbose(config.verbose);
        Self {
            config,
            store,
            catalog,
            source,
            fetcher,
            fingerprinter: Box::new(PerceptualHasher),
            embedder: Box::new(embedder),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_fingerprinter(mut self, fingerprinter: Box<dyn Fingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    pub fn with_embedder(mut self, embedder: Box<dyn MetadataEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    /// Make entry picks and locale shuffles reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn catalog(&self) -> &LocaleCatalog {
        &self.catalog
    }

    /// Every catalog locale in random order
    pub fn shuffled_locales(&mut self) -> Vec<String> {
        let mut codes = self.catalog.codes().to_vec();
        codes.shuffle(&mut self.rng);
        codes
    }

    /// Archive one randomly picked entry of `locale`
    ///
    /// Returns `true` when at least one requested image of the entry is now
    /// archived, whether it was downloaded or already present. Unknown
    /// locales and empty catalogs yield `false`.
    pub fn download_single_for_locale(
        &mut self,
        locale: &str,
        orientation: Orientation,
        embed: bool,
    ) -> Result<bool> {
        let outcomes = self.single_outcomes(locale, orientation, embed)?;

        let mut archived = false;
        for outcome in &outcomes {
            match outcome {
                DownloadOutcome::FetchFailed(reason) => warn!("{}", reason),
                _ => archived = true,
            }
        }
        Ok(archived)
    }

    fn single_outcomes(
        &mut self,
        locale: &str,
        orientation: Orientation,
        embed: bool,
    ) -> Result<Vec<DownloadOutcome>> {
        let Some(code) = self.resolve_locale(locale) else {
            return Ok(Vec::new());
        };

        let entries = self
            .source
            .fetch_entries(self.config.api_version, &code, orientation)?;

        let Some(entry) = entries.choose(&mut self.rng) else {
            return Ok(vec![DownloadOutcome::FetchFailed(format!(
                "No entries found to download for locale '{}'",
                code
            ))]);
        };

        let urls = entry.image_urls(orientation);
        if urls.is_empty() {
            return Ok(vec![DownloadOutcome::FetchFailed(format!(
                "Picked entry of '{}' has no {} image",
                code, orientation
            ))]);
        }

        urls.into_iter()
            .map(|url| self.process_url(url, entry, embed))
            .collect()
    }

    /// Archive every entry of `locale`
    pub fn download_all_for_locale(
        &mut self,
        locale: &str,
        orientation: Orientation,
        embed: bool,
    ) -> Result<SweepTally> {
        let mut tally = SweepTally::default();
        let Some(code) = self.resolve_locale(locale) else {
            return Ok(tally);
        };

        let entries = self
            .source
            .fetch_entries(self.config.api_version, &code, orientation)?;
        if entries.is_empty() {
            debug!("No entries found to download for locale '{}'", code);
            return Ok(tally);
        }

        for (i, entry) in entries.iter().enumerate() {
            for url in entry.image_urls(orientation) {
                let outcome = self.process_url(url, entry, embed)?;
                if self.config.verbose {
                    if let DownloadOutcome::Downloaded(_) = outcome {
                        info!("Downloaded entry {}: {}", i + 1, url);
                    }
                }
                tally.record(&outcome);
            }
        }

        info!(
            "{}: {} downloaded, {} already downloaded",
            code, tally.downloaded, tally.already_downloaded
        );
        Ok(tally)
    }

    fn resolve_locale(&self, locale: &str) -> Option<String> {
        let resolved = self.catalog.resolve(locale).map(str::to_string);
        if resolved.is_none() {
            warn!(
                "Locale '{}' is not valid. Use one of: {}",
                locale,
                self.catalog.codes().join(", ")
            );
        }
        resolved
    }

    /// Skip `url` if its recorded file is still present, otherwise download it
    fn process_url(&self, url: &str, entry: &Entry, embed: bool) -> Result<DownloadOutcome> {
        let image_dir = self.config.image_dir();

        if let Some(record) = self.store.lookup_by_url(url)? {
            if self.store.is_filename_valid(&record.filename, &image_dir)? {
                info!("Image already downloaded: {}", url);
                return Ok(DownloadOutcome::AlreadyValid);
            }
            debug!(
                "Record for {} points at missing file {}, downloading again",
                url, record.filename
            );
        }

        let path = self.fetcher.fetch_image(url, &image_dir)?;
        log_fs_modification("download", &path, Some(url));

        let fingerprint = self.fingerprinter.fingerprint(&path)?;
        self.store
            .upsert(url, Some(fingerprint.as_str()), &file_name(&path))?;

        if embed {
            self.embedder.embed(&path, entry);
        }

        info!("Image saved to: {}", path.display());
        Ok(DownloadOutcome::Downloaded(path))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
