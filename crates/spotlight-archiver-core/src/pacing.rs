//! Rate-limit pacing between locale chunks and between sweeps

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::thread;
use std::time::Duration;

/// Base step of the per-chunk delay, in seconds
const CHUNK_DELAY_STEP_SECS: u64 = 5;

/// Suspends the run between batches of API calls
pub trait Pacer {
    fn wait(&self, delay: Duration);
}

/// Never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPacer;

impl Pacer for NoopPacer {
    fn wait(&self, _delay: Duration) {}
}

/// Sleeps while showing an inline countdown
#[derive(Debug, Default, Clone, Copy)]
pub struct CountdownPacer;

impl Pacer for CountdownPacer {
    fn wait(&self, delay: Duration) {
        let total = delay.as_secs();
        if total == 0 {
            return;
        }

        debug!("Pacing for {} seconds", total);

        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.yellow} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        for remaining in (1..=total).rev() {
            bar.set_message(format!(
                "Delaying to avoid rate limiting... {}:{:02} remaining",
                remaining / 60,
                remaining % 60
            ));
            bar.tick();
            thread::sleep(Duration::from_secs(1));
            bar.inc(1);
        }

        bar.finish_and_clear();
    }
}

/// Delay after chunk `chunk_index` (0-based) of a sweep: 5 s per chunk done, capped at `max`
pub fn chunk_delay(chunk_index: usize, max: Duration) -> Duration {
    let secs = CHUNK_DELAY_STEP_SECS.saturating_mul(chunk_index as u64 + 1);
    Duration::from_secs(secs).min(max)
}

/// Escalating delay after `call_count` sweeps, looked up every ten calls
///
/// Index `call_count / 10 - 1`, clamped to the last element of `schedule`.
pub fn escalation_delay(call_count: u32, schedule: &[u64]) -> Duration {
    let Some(&last) = schedule.last() else {
        return Duration::ZERO;
    };
    let index = (call_count / 10).saturating_sub(1) as usize;
    Duration::from_secs(schedule.get(index).copied().unwrap_or(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE: [u64; 10] = [5, 10, 15, 20, 30, 45, 60, 90, 120, 180];

    #[test]
    fn chunk_delay_grows_linearly_and_caps() {
        let max = Duration::from_secs(180);
        assert_eq!(chunk_delay(0, max), Duration::from_secs(5));
        assert_eq!(chunk_delay(3, max), Duration::from_secs(20));
        assert_eq!(chunk_delay(35, max), Duration::from_secs(180));
        assert_eq!(chunk_delay(1000, max), Duration::from_secs(180));
    }

    #[test]
    fn escalation_follows_schedule() {
        assert_eq!(escalation_delay(10, &SCHEDULE), Duration::from_secs(5));
        assert_eq!(escalation_delay(20, &SCHEDULE), Duration::from_secs(10));
        assert_eq!(escalation_delay(100, &SCHEDULE), Duration::from_secs(180));
    }

    #[test]
    fn escalation_clamps_past_the_table() {
        assert_eq!(escalation_delay(110, &SCHEDULE), Duration::from_secs(180));
        assert_eq!(escalation_delay(500, &SCHEDULE), Duration::from_secs(180));
        assert_eq!(escalation_delay(10, &[]), Duration::ZERO);
    }

    #[test]
    fn countdown_of_zero_returns_immediately() {
        CountdownPacer.wait(Duration::ZERO);
    }
}
