use log::{log_enabled, Level};
use std::time::{Duration, Instant};

/// Scoped section timer.
///
/// Emits `trace!` records on entry and exit. With a budget, an exit that
/// overruns it is reported at debug level: a step section whose budget is the
/// simulated time step tells when the run falls behind real time.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
    budget: Option<Duration>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
            budget: None,
        }
    }

    pub fn with_budget(label: &'a str, budget: Duration) -> Self {
        let mut timer = Self::new(label);
        timer.budget = Some(budget);
        timer
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if log_enabled!(Level::Trace) {
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
        if let Some(budget) = self.budget.filter(|b| elapsed > *b) {
            log::debug!(
                "{} took {:.3} ms, over its {:.3} ms budget",
                self.label,
                elapsed.as_secs_f64() * 1e3,
                budget.as_secs_f64() * 1e3
            );
        }
    }
}
