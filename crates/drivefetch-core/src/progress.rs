//! Throttled single-line progress output for a transfer.

use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);
const MIB: f64 = 1_048_576.0;

/// Decides when to print and what. Fed from curl's progress callback.
#[derive(Debug)]
pub struct ProgressMeter {
    started: Instant,
    last_emit: Option<Instant>,
    interval: Duration,
}

impl Default for ProgressMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMeter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), PROGRESS_INTERVAL)
    }

    pub fn starting_at(started: Instant, interval: Duration) -> Self {
        Self {
            started,
            last_emit: None,
            interval,
        }
    }

    /// Returns a line to print if at least `interval` has passed since the last one.
    /// Nothing is reported before the first byte arrives.
    pub fn tick_at(&mut self, now: Instant, done: u64, total: u64) -> Option<String> {
        if done == 0 {
            return None;
        }
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_emit = Some(now);
        Some(format_line(done, total, now.duration_since(self.started)))
    }

    pub fn tick(&mut self, done: u64, total: u64) -> Option<String> {
        self.tick_at(Instant::now(), done, total)
    }

    /// Final line, printed once the transfer ends regardless of throttling.
    pub fn finish(&self, done: u64, total: u64) -> String {
        format_line(done, total, self.started.elapsed())
    }
}

/// `  12.0 / 48.0 MiB (25.0%)  3.00 MiB/s`, or without total when unknown.
pub fn format_line(done: u64, total: u64, elapsed: Duration) -> String {
    let done_mib = done as f64 / MIB;
    let secs = elapsed.as_secs_f64();
    let rate_mib = if secs > 0.0 { done_mib / secs } else { 0.0 };
    if total > 0 {
        let pct = (done as f64 / total as f64 * 100.0).min(100.0);
        format!(
            "  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s",
            done_mib,
            total as f64 / MIB,
            pct,
            rate_mib
        )
    } else {
        format!("  {:.1} MiB  {:.2} MiB/s", done_mib, rate_mib)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_with_known_total() {
        let line = format_line(12 * 1_048_576, 48 * 1_048_576, Duration::from_secs(4));
        assert_eq!(line, "  12.0 / 48.0 MiB (25.0%)  3.00 MiB/s");
    }

    #[test]
    fn format_with_unknown_total() {
        let line = format_line(1_048_576, 0, Duration::from_secs(2));
        assert_eq!(line, "  1.0 MiB  0.50 MiB/s");
    }

    #[test]
    fn format_at_zero_elapsed_has_zero_rate() {
        let line = format_line(1_048_576, 1_048_576, Duration::ZERO);
        assert_eq!(line, "  1.0 / 1.0 MiB (100.0%)  0.00 MiB/s");
    }

    #[test]
    fn tick_is_throttled() {
        let t0 = Instant::now();
        let mut m = ProgressMeter::starting_at(t0, Duration::from_millis(500));
        assert!(m.tick_at(t0, 0, 100).is_none(), "nothing before first byte");
        assert!(m.tick_at(t0 + Duration::from_millis(10), 10, 100).is_some());
        assert!(m.tick_at(t0 + Duration::from_millis(200), 20, 100).is_none());
        assert!(m.tick_at(t0 + Duration::from_millis(600), 30, 100).is_some());
    }
}
