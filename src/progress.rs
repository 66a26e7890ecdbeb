//! # Progress Feedback Module
//!
//! Feedback visivo durante la scansione con `indicatif`.
//!
//! ## Responsabilità:
//! - Spinner con il file attualmente in elaborazione
//! - Contatore dei file visitati e tempo trascorso
//! - Versione nascosta per `--verbose`, `--json` e test
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] 42 files  photos/2021/beach.png
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {pos} files  {msg}";

/// Spinner showing the file currently being reduced
#[derive(Clone)]
pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    /// Create a ticking spinner on stderr
    pub fn spinner() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A progress that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Show `path` as the file in progress and count it
    pub fn start_file(&self, path: &Path) {
        self.bar.inc(1);
        self.bar.set_message(path.display().to_string());
    }

    /// Remove the spinner from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_counts_files() {
        let progress = ScanProgress::hidden();
        progress.start_file(Path::new("a.png"));
        progress.start_file(Path::new("b/c.jpg"));
        assert_eq!(progress.bar.position(), 2);
        progress.finish();
    }

    #[test]
    fn test_clones_share_the_bar() {
        let progress = ScanProgress::default();
        let clone = progress.clone();
        clone.start_file(Path::new("x.gif"));
        assert_eq!(progress.bar.position(), 1);
    }
}
