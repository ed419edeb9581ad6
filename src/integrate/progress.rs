//! Progress notifications for long-running integrations.

use std::time::Instant;

/// Receiver of progress notifications.
///
/// Reports never influence the numerical results of a run.
pub trait ProgressReporter {
    /// Called with the completed percentage (`0..=100`) and the wall time in
    /// seconds since the run started.
    fn report(&self, label: &str, percent: f64, elapsed_secs: f64);
}

/// Discards all notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _label: &str, _percent: f64, _elapsed_secs: f64) {}
}

/// Forwards notifications to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, label: &str, percent: f64, elapsed_secs: f64) {
        log::info!(
            target: "ttsolvr::progress",
            "{}: {:5.1}% (elapsed {:.2}s)",
            label,
            percent,
            elapsed_secs
        );
    }
}

impl<F> ProgressReporter for F
where
    F: Fn(&str, f64, f64),
{
    fn report(&self, label: &str, percent: f64, elapsed_secs: f64) {
        self(label, percent, elapsed_secs)
    }
}

/// Start time and label of one run.
pub(crate) struct ProgressTimer<'a> {
    reporter: &'a dyn ProgressReporter,
    label: &'static str,
    start: Instant,
}

impl<'a> ProgressTimer<'a> {
    /// Start the clock and report 0%.
    pub fn start(reporter: &'a dyn ProgressReporter, label: &'static str) -> Self {
        let timer = Self {
            reporter,
            label,
            start: Instant::now(),
        };
        timer.reporter.report(label, 0.0, 0.0);
        timer
    }

    pub fn update(&self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        self.reporter
            .report(self.label, percent, self.start.elapsed().as_secs_f64());
    }
}
