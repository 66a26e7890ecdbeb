//! # Run Statistics Module
//!
//! Accumulatore passivo dei contatori di una scansione.
//!
//! ## Statistiche tracciate:
//! - **files**: totale, ottimizzati, copiati, ignorati
//! - **dirs**: totale directory specchiate
//! - **data**: byte originali e byte prodotti (ottimizzati o copiati)
//!
//! ## Invarianti a fine scansione:
//! - `files.total == files.optimized + files.copied + files.ignored`
//! - `data.original` conta ogni file visitato una sola volta
//! - `data.optimized` conta ogni file ottimizzato o copiato una sola volta
//!
//! ## Report finale:
//! ```text
//! ############### SCAN COMPLETE ###############
//!
//! FILES
//!     * Scanned:    12
//!     * Optimized:  9
//! ...
//! ```

use crate::file_manager::FileManager;
use indicatif::HumanDuration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub total: u64,
    pub optimized: u64,
    pub copied: u64,
    pub ignored: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirStats {
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStats {
    pub original: u64,
    pub optimized: u64,
}

/// Aggregate counters of a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub files: FileStats,
    pub dirs: DirStats,
    pub data: DataStats,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file was reached by the walk
    pub fn add_scanned(&mut self, original_size: u64) {
        self.files.total += 1;
        self.data.original += original_size;
    }

    pub fn add_dir(&mut self) {
        self.dirs.total += 1;
    }

    pub fn add_ignored(&mut self) {
        self.files.ignored += 1;
    }

    pub fn add_optimized(&mut self, optimized_size: u64) {
        self.files.optimized += 1;
        self.data.optimized += optimized_size;
    }

    /// The original was kept; its size still counts as output
    pub fn add_copied(&mut self, original_size: u64) {
        self.files.copied += 1;
        self.data.optimized += original_size;
    }

    /// Every scanned file has exactly one outcome
    pub fn is_balanced(&self) -> bool {
        self.files.total == self.files.optimized + self.files.copied + self.files.ignored
    }

    /// Bytes saved; negative when the output grew
    pub fn bytes_saved(&self) -> i64 {
        self.data.original as i64 - self.data.optimized as i64
    }

    /// Output size as a percentage of the original
    pub fn size_percent(&self) -> f64 {
        if self.data.original == 0 {
            0.0
        } else {
            self.data.optimized as f64 / self.data.original as f64 * 100.0
        }
    }

    /// Original size divided by output size
    pub fn ratio(&self) -> f64 {
        if self.data.optimized == 0 {
            0.0
        } else {
            self.data.original as f64 / self.data.optimized as f64
        }
    }

    /// Megabytes of source data processed per second
    pub fn throughput_mb_s(&self, elapsed: Duration) -> f64 {
        let seconds = elapsed.as_secs_f64();
        if seconds <= 0.0 {
            0.0
        } else {
            self.data.original as f64 / seconds / 1024.0 / 1024.0
        }
    }

    pub fn format_report(&self, elapsed: Duration) -> String {
        let saved = self.bytes_saved();
        let saved_text = if saved < 0 {
            format!("-{}", FileManager::format_size(saved.unsigned_abs()))
        } else {
            FileManager::format_size(saved as u64)
        };

        format!(
            "\n############### SCAN COMPLETE ###############\n\n\
             FILES\n\
             \x20   * Scanned:    {}\n\
             \x20   * Optimized:  {}\n\
             \x20   * Copied:     {}\n\
             \x20   * Ignored:    {}\n\n\
             DATA\n\
             \x20   * Original:   {}\n\
             \x20   * Optimized:  {}\n\n\
             SAVING\n\
             \x20   * Bytes:      {}\n\
             \x20   * Size:       {:.2}% of original\n\
             \x20   * Ratio:      {:.2}:1\n\n\
             TIME\n\
             \x20   * Time taken: {}\n\
             \x20   * Processing: {:.2} MB/s\n",
            self.files.total,
            self.files.optimized,
            self.files.copied,
            self.files.ignored,
            FileManager::format_size(self.data.original),
            FileManager::format_size(self.data.optimized),
            saved_text,
            self.size_percent(),
            self.ratio(),
            HumanDuration(elapsed),
            self.throughput_mb_s(elapsed),
        )
    }
}
