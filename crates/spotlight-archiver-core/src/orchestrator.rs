//! Multi-locale download runs
//!
//! Sweeps walk the locale catalog in chunks with a growing pause between
//! chunks. Every locale call goes through the retry policy; a locale that
//! keeps failing upstream is logged and skipped so the sweep can go on.

use log::{info, warn};
use std::time::Duration;

use crate::driver::LocaleDriver;
use crate::error::Result;
use crate::locale::is_all;
use crate::logging::log_download_error;
use crate::pacing::{chunk_delay, escalation_delay, Pacer};
use crate::report::report_duplicates;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::types::SweepTally;

/// Stop conditions and pauses of the exhaustive loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhaustionLimits {
    /// Stable sweeps in a row that end the loop
    pub max_consecutive: u32,

    /// Hard cap on sweeps
    pub max_calls: u32,

    /// Pause before every sweep but the first
    pub inter_call_pause: Duration,

    /// Delays applied every ten sweeps, in seconds
    pub escalation_delays_secs: Vec<u64>,
}

impl Default for ExhaustionLimits {
    fn default() -> Self {
        Self {
            max_consecutive: 50,
            max_calls: 200,
            inter_call_pause: Duration::from_secs(2),
            escalation_delays_secs: vec![5, 10, 15, 20, 30, 45, 60, 90, 120, 180],
        }
    }
}

/// How an exhaustive loop ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExhaustionSummary {
    /// Sweeps performed
    pub calls: u32,

    /// Stable sweeps in a row at the end
    pub consecutive: u32,

    /// Totals over every sweep
    pub totals: SweepTally,
}

impl ExhaustionSummary {
    /// Whether the loop ended because the catalog stopped yielding new images
    pub fn exhausted(&self, limits: &ExhaustionLimits) -> bool {
        self.consecutive >= limits.max_consecutive
    }
}

/// Repeat `sweep` until it is stable `max_consecutive` times in a row or
/// `max_calls` sweeps have run
///
/// A sweep is stable when it downloads nothing while finding at least one
/// image already archived. Every sweep but the first waits on `pacer` for the
/// inter-call pause. Every tenth sweep, unless the loop is about to stop, also
/// waits for the escalation delay.
pub fn run_until_exhausted<F>(
    limits: &ExhaustionLimits,
    pacer: &dyn Pacer,
    mut sweep: F,
) -> Result<ExhaustionSummary>
where
    F: FnMut() -> Result<SweepTally>,
{
    let mut summary = ExhaustionSummary::default();

    while summary.consecutive < limits.max_consecutive && summary.calls < limits.max_calls {
        if summary.calls > 0 && !limits.inter_call_pause.is_zero() {
            pacer.wait(limits.inter_call_pause);
        }

        let tally = sweep()?;
        summary.totals += tally;
        summary.calls += 1;

        if tally.is_stable() {
            summary.consecutive += 1;
            info!(
                "Number of consecutive calls with no new downloads: {}/{}",
                summary.consecutive, limits.max_consecutive
            );
        } else {
            summary.consecutive = 0;
        }

        let continuing =
            summary.consecutive < limits.max_consecutive && summary.calls < limits.max_calls;
        if continuing && summary.calls % 10 == 0 {
            pacer.wait(escalation_delay(
                summary.calls,
                &limits.escalation_delays_secs,
            ));
        }
    }

    info!(
        "Download finished ({} after {} calls)",
        if summary.exhausted(limits) {
            "exhausted"
        } else {
            "max calls reached"
        },
        summary.calls
    );
    Ok(summary)
}

/// Runs downloads over one or every locale
pub struct Orchestrator {
    driver: LocaleDriver,
    pacer: Box<dyn Pacer>,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(driver: LocaleDriver, pacer: Box<dyn Pacer>) -> Self {
        let retry = RetryPolicy::from_config(driver.config());
        Self {
            driver,
            pacer,
            retry,
        }
    }

    pub fn limits(&self) -> ExhaustionLimits {
        let config = self.driver.config();
        ExhaustionLimits {
            max_consecutive: config.max_consecutive,
            max_calls: config.max_calls,
            inter_call_pause: config.inter_call_pause(),
            escalation_delays_secs: config.escalation_delays_secs.clone(),
        }
    }

    fn embed_for(&self, locale: &str) -> bool {
        let embed = self.driver.config().embed_exif;
        if embed && is_all(locale) {
            warn!("Embedding EXIF metadata is not supported with locale 'all', disabling it");
            return false;
        }
        embed
    }

    /// Archive one image from `locale`, or from the first of the shuffled
    /// catalog that yields one when `locale` is `all`
    pub fn download_single(&mut self, locale: &str) -> Result<bool> {
        let found = if is_all(locale) {
            self.single_from_any_locale()?
        } else {
            let embed = self.embed_for(locale);
            let orientation = self.driver.config().orientation;
            let driver = &mut self.driver;
            run_with_retry(&self.retry, locale, || {
                driver.download_single_for_locale(locale, orientation, embed)
            })?
        };

        self.report()?;
        Ok(found)
    }

    fn single_from_any_locale(&mut self) -> Result<bool> {
        let orientation = self.driver.config().orientation;

        for code in self.driver.shuffled_locales() {
            info!("Trying locale: {}", code);
            let driver = &mut self.driver;
            let attempt = run_with_retry(&self.retry, &code, || {
                driver.download_single_for_locale(&code, orientation, false)
            });
            match attempt {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) if e.is_retryable() => log_download_error(&code, &e),
                Err(e) => return Err(e),
            }
        }

        warn!("No valid images found in any locale");
        Ok(false)
    }

    /// One bounded sweep over `locale`, or over the whole catalog for `all`
    pub fn download_multiple(&mut self, locale: &str) -> Result<SweepTally> {
        if !is_all(locale) {
            let embed = self.embed_for(locale);
            let orientation = self.driver.config().orientation;
            let driver = &mut self.driver;
            return run_with_retry(&self.retry, locale, || {
                driver.download_all_for_locale(locale, orientation, embed)
            });
        }

        let totals = sweep_catalog(&mut self.driver, self.pacer.as_ref(), &self.retry)?;
        self.report()?;
        Ok(totals)
    }

    /// Repeat [`Self::download_multiple`] until nothing new turns up
    ///
    /// Over `all` the duplicate report is rewritten after every sweep.
    pub fn download_multiple_until_exhausted(&mut self, locale: &str) -> Result<ExhaustionSummary> {
        let limits = self.limits();
        let embed = self.embed_for(locale);
        let orientation = self.driver.config().orientation;
        let all = is_all(locale);

        let Self {
            driver,
            pacer,
            retry,
        } = &mut *self;
        let pacer: &dyn Pacer = pacer.as_ref();
        let retry: &RetryPolicy = retry;

        let summary = run_until_exhausted(&limits, pacer, || {
            if all {
                let tally = sweep_catalog(driver, pacer, retry)?;
                write_report(driver)?;
                Ok(tally)
            } else {
                run_with_retry(retry, locale, || {
                    driver.download_all_for_locale(locale, orientation, embed)
                })
            }
        })?;

        if !all {
            self.report()?;
        }
        Ok(summary)
    }

    fn report(&self) -> Result<bool> {
        write_report(&self.driver)
    }
}

fn write_report(driver: &LocaleDriver) -> Result<bool> {
    let config = driver.config();
    report_duplicates(driver.store(), &config.report_path(), config.phash_threshold)
}

/// One paced pass over every catalog locale
fn sweep_catalog(
    driver: &mut LocaleDriver,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
) -> Result<SweepTally> {
    let config = driver.config();
    let orientation = config.orientation;
    let chunk_size = config.chunk_size.max(1);
    let max_delay = Duration::from_secs(config.max_chunk_delay_secs);
    let codes = driver.catalog().codes().to_vec();
    let chunk_count = codes.len().div_ceil(chunk_size);

    let mut totals = SweepTally::default();
    for (chunk_index, chunk) in codes.chunks(chunk_size).enumerate() {
        for code in chunk {
            info!("--- {} ---", code);
            let attempt = run_with_retry(retry, code, || {
                driver.download_all_for_locale(code, orientation, false)
            });
            match attempt {
                Ok(tally) => totals += tally,
                Err(e) if e.is_retryable() => log_download_error(code, &e),
                Err(e) => return Err(e),
            }
        }

        if chunk_index + 1 < chunk_count {
            pacer.wait(chunk_delay(chunk_index, max_delay));
        }
    }

    info!(
        "Sweep finished: {} downloaded, {} already downloaded",
        totals.downloaded, totals.already_downloaded
    );
    Ok(totals)
}
