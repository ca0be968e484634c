#![allow(dead_code)]

use image::{ImageBuffer, Rgb};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use spotlight_archiver_core::download::{image_filename, ImageFetcher};
use spotlight_archiver_core::driver::LocaleDriver;
use spotlight_archiver_core::locale::LocaleCatalog;
use spotlight_archiver_core::metadata::MetadataEmbedder;
use spotlight_archiver_core::pacing::Pacer;
use spotlight_archiver_core::persistence::RecordStore;
use spotlight_archiver_core::processing::Fingerprinter;
use spotlight_archiver_core::upstream::EntrySource;
use spotlight_archiver_core::{ApiVersion, Config, Entry, Error, Orientation, Result};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Entry with a landscape URL only
pub fn landscape(url: &str) -> Entry {
    Entry {
        landscape_url: Some(url.to_string()),
        title: Some(format!("Picture at {}", url)),
        ..Default::default()
    }
}

/// Entry with both orientations
pub fn dual(landscape_url: &str, portrait_url: &str) -> Entry {
    Entry {
        landscape_url: Some(landscape_url.to_string()),
        portrait_url: Some(portrait_url.to_string()),
        ..Default::default()
    }
}

/// Config rooted in `dir` that never sleeps
pub fn test_config(dir: &Path) -> Config {
    Config {
        save_dir: dir.join("archive"),
        locale_cache_dir: dir.join("locales"),
        max_attempts: 2,
        retry_delay_secs: 0,
        inter_call_pause_secs: 0,
        ..Default::default()
    }
}

/// Serves the same entries for every locale
pub struct StubSource {
    entries: Vec<Entry>,
    only_locale: Option<String>,
    failing: HashSet<String>,
    fresh_per_call: bool,
    pub calls: Rc<Cell<usize>>,
}

impl StubSource {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            only_locale: None,
            failing: HashSet::new(),
            fresh_per_call: false,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Every other locale gets an empty catalog
    pub fn only_for(mut self, locale: &str) -> Self {
        self.only_locale = Some(locale.to_string());
        self
    }

    /// `locale` always answers with HTTP 503
    pub fn failing_for(mut self, locale: &str) -> Self {
        self.failing.insert(locale.to_string());
        self
    }

    /// Every call also serves an entry no earlier call has seen
    pub fn fresh_per_call(mut self) -> Self {
        self.fresh_per_call = true;
        self
    }
}

impl EntrySource for StubSource {
    fn fetch_entries(
        &self,
        _api_version: ApiVersion,
        locale: &str,
        _orientation: Orientation,
    ) -> Result<Vec<Entry>> {
        self.calls.set(self.calls.get() + 1);

        if self.failing.contains(locale) {
            return Err(Error::HttpStatus {
                status: 503,
                url: format!("https://fd.api.iris.microsoft.com/{}", locale),
            });
        }
        let mut entries = match &self.only_locale {
            Some(only) if only != locale => return Ok(Vec::new()),
            _ => self.entries.clone(),
        };
        if self.fresh_per_call {
            entries.push(landscape(&format!("http://x/call-{}.jpg", self.calls.get())));
        }
        Ok(entries)
    }
}

/// Writes a small generated JPEG per URL
#[derive(Default)]
pub struct JpegFetcher {
    pub calls: Rc<Cell<usize>>,
    fail_after: Option<usize>,
}

impl JpegFetcher {
    /// Fetches past the first `n` fail with a disk error
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Default::default()
        }
    }
}

impl ImageFetcher for JpegFetcher {
    fn fetch_image(&self, url: &str, image_dir: &Path) -> Result<PathBuf> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_after.is_some_and(|n| self.calls.get() > n) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }

        std::fs::create_dir_all(image_dir)?;
        let path = image_dir.join(image_filename(url));
        let shade = (url.len() * 7 % 256) as u8;
        let img = ImageBuffer::from_fn(16, 16, |x, y| {
            Rgb([shade, (x * 16) as u8, (y * 16) as u8])
        });
        img.save(&path)?;
        Ok(path)
    }
}

/// Fingerprint derived from the file name, or a fixed value for every file
pub struct StubFingerprinter {
    fixed: Option<String>,
}

impl StubFingerprinter {
    pub fn by_name() -> Self {
        Self { fixed: None }
    }

    pub fn fixed(value: &str) -> Self {
        Self {
            fixed: Some(value.to_string()),
        }
    }
}

impl Fingerprinter for StubFingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<String> {
        if let Some(fixed) = &self.fixed {
            return Ok(fixed.clone());
        }
        // FNV-1a over the file name
        let name = path.file_name().unwrap().to_string_lossy();
        let hash = name
            .bytes()
            .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
        Ok(format!("{:016x}", hash))
    }
}

#[derive(Default)]
pub struct RecordingEmbedder {
    pub embedded: Rc<RefCell<Vec<PathBuf>>>,
}

impl MetadataEmbedder for RecordingEmbedder {
    fn embed(&self, path: &Path, _entry: &Entry) {
        self.embedded.borrow_mut().push(path.to_path_buf());
    }
}

#[derive(Default)]
pub struct RecordingPacer {
    pub waits: Rc<RefCell<Vec<Duration>>>,
}

impl Pacer for RecordingPacer {
    fn wait(&self, delay: Duration) {
        self.waits.borrow_mut().push(delay);
    }
}

/// Counters shared with the boxed collaborators of a [`build_driver`] driver
pub struct Probes {
    pub source_calls: Rc<Cell<usize>>,
    pub fetch_calls: Rc<Cell<usize>>,
    pub embedded: Rc<RefCell<Vec<PathBuf>>>,
}

pub fn build_driver(
    config: Config,
    codes: &[&str],
    source: StubSource,
    fingerprinter: StubFingerprinter,
) -> (LocaleDriver, Probes) {
    build_driver_with_fetcher(config, codes, source, fingerprinter, JpegFetcher::default())
}

pub fn build_driver_with_fetcher(
    config: Config,
    codes: &[&str],
    source: StubSource,
    fingerprinter: StubFingerprinter,
    fetcher: JpegFetcher,
) -> (LocaleDriver, Probes) {
    let store = RecordStore::initialize(&config.save_dir).unwrap();
    let embedder = RecordingEmbedder::default();

    let probes = Probes {
        source_calls: source.calls.clone(),
        fetch_calls: fetcher.calls.clone(),
        embedded: embedder.embedded.clone(),
    };

    let driver = LocaleDriver::new(
        config,
        store,
        LocaleCatalog::from_codes(codes.iter().copied()),
        Box::new(source),
        Box::new(fetcher),
    )
    .with_fingerprinter(Box::new(fingerprinter))
    .with_embedder(Box::new(embedder))
    .with_seed(7);

    (driver, probes)
}
