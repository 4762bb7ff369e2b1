//! Progress reporting for load runs.

use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress tracker for a directory load.
pub struct LoadProgress {
    bar: ProgressBar,
    start_time: Instant,
}

impl LoadProgress {
    /// Create a new progress tracker over a known file count.
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) | {msg}")
                .expect("Invalid progress template")
                .progress_chars("#>-"),
        );

        LoadProgress {
            bar,
            start_time: Instant::now(),
        }
    }

    /// Advance the bar past one processed file.
    pub fn inc(&self, file: &Path) {
        self.bar.inc(1);
        self.bar.set_message(format!("{}", file.display()));
    }

    /// Print a line above the bar without disturbing it.
    pub fn println(&self, msg: impl AsRef<str>) {
        self.bar.println(msg);
    }

    /// Finish and return elapsed time.
    pub fn finish(self) -> std::time::Duration {
        self.bar.finish_and_clear();
        self.start_time.elapsed()
    }

    /// Get elapsed time so far.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
