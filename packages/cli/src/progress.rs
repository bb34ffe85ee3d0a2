//! Logger setup and `indicatif` progress bars.
//!
//! [`init_logger`] routes `log` output through a [`MultiProgress`] so log
//! lines are suspended while a bar redraws.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Initializes the global logger wrapped in `indicatif-log-bridge`.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // already set (e.g., in tests)

    log::set_max_level(level);

    multi
}

/// Progress over a job whose total is only known once it starts.
///
/// Starts as a spinner and becomes a bar on the first [`Self::update`].
pub struct JobProgress {
    bar: ProgressBar,
    bar_style: ProgressStyle,
    started: bool,
}

impl JobProgress {
    /// Adds a spinner labelled `message` to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let bar_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Self {
            bar,
            bar_style,
            started: false,
        }
    }

    /// Reports `done` of `total` items.
    pub fn update(&mut self, done: u64, total: u64) {
        if !self.started {
            self.bar.set_length(total);
            self.bar.set_style(self.bar_style.clone());
            self.started = true;
        }
        self.bar.set_position(done);
    }

    /// Finishes the bar with a final message.
    pub fn finish(&self, message: String) {
        self.bar.finish_with_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_to_bar_on_first_update() {
        let multi = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        let mut progress = JobProgress::new(&multi, "Reclassifying");
        assert!(!progress.started);

        progress.update(3, 10);
        assert!(progress.started);
        assert_eq!(progress.bar.length(), Some(10));
        assert_eq!(progress.bar.position(), 3);

        progress.update(10, 10);
        progress.finish("done".to_string());
        assert!(progress.bar.is_finished());
    }
}
