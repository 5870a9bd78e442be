//! Progress bar over input archives.

use indicatif::{ProgressBar, ProgressStyle};
use jarshade::ShadeListener;

/// Progress display advancing once per input archive
#[derive(Clone)]
pub struct ArchiveProgress {
    bar: ProgressBar,
}

impl ArchiveProgress {
    /// Creates a new progress display
    pub fn new(total_archives: u64, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total_archives);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} archives {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb
        };
        Self { bar }
    }

    /// Finishes the progress display
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Stops the display after a failure
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl ShadeListener for ArchiveProgress {
    fn on_archive_start(&mut self, index: usize, label: &str, _entries: usize) {
        self.bar.set_position(index as u64);

        // Truncate long names
        let display_name = if label.len() > 40 {
            let start = label
                .char_indices()
                .map(|(i, _)| i)
                .find(|&i| label.len() - i <= 37)
                .unwrap_or(0);
            format!("...{}", &label[start..])
        } else {
            label.to_string()
        };
        self.bar.set_message(display_name);
    }
}
