use std::time::Duration;

use indicatif::{ProgressBar, ProgressBarIter, ProgressDrawTarget, ProgressIterator, ProgressStyle};

/// Label shown next to the row progress bar
pub const PROGRESS_LABEL: &str = "Processing...";

/// Console progress bar advanced once per consumed row
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(total: u64, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(total)
        } else {
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden())
        };

        let style = ProgressStyle::with_template(
            "{msg} {spinner:.yellow} [{elapsed_precise}] [{wide_bar:.magenta}] {pos:>7.blue}/{len:<7.blue} ({per_sec:>10.blue}, {eta:>4.blue})",
        )
        .map(|style| style.progress_chars("█▉▊▋▌▍▎▏ "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(PROGRESS_LABEL);

        Self { bar }
    }

    /// Wrap `iter` so each `next` advances the bar
    pub fn track<I: Iterator>(&self, iter: I) -> ProgressBarIter<I> {
        iter.progress_with(self.bar.clone())
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

/// Render a duration as `H:MM:SS` with a `.ffffff` suffix when there are
/// sub-second microseconds.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let micros = elapsed.subsec_micros();

    if micros == 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}:{:02}.{:06}", hours, minutes, seconds, micros)
    }
}

/// One-line completion message printed after a conversion
pub fn summary_line(total: usize, elapsed: Duration) -> String {
    let noun = if total == 1 { "row" } else { "rows" };
    format!("Processed {} {} in {}.", total, noun, format_elapsed(elapsed))
}
