//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file usate durante la riduzione.
//!
//! ## Responsabilità:
//! - Classificazione dei file per estensione (raster, SVG, non supportato)
//! - Copia verbatim dell'originale quando l'ottimizzazione non conviene
//! - Compressione gzip in streaming dei file SVG
//! - Utilità per dimensioni e percentuali
//!
//! ## Formati supportati:
//! - **Raster**: GIF, JPG, JPEG, PNG (ottimizzati dal motore di trasformazione)
//! - **Vettoriali**: SVG (solo gzip, `file.svg` -> `file.svg.gz`)
//!
//! ## Esempio:
//! ```rust
//! use image_reducer::file_manager::{FileKind, FileManager};
//!
//! assert_eq!(FileManager::classify("JPG"), FileKind::Raster);
//! assert_eq!(FileManager::classify("svg"), FileKind::Svg);
//! assert_eq!(FileManager::format_size(1536), "1.50 KB");
//! ```

use crate::error::{IoContext, Result};
use async_compression::tokio::write::GzipEncoder;
use async_compression::Level;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};

/// Suffix appended to compressed SVG files
pub const GZIP_SUFFIX: &str = "gz";

/// How a file is handled, decided from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Raster,
    Svg,
    Unsupported,
}

/// File operations and helpers
pub struct FileManager;

impl FileManager {
    /// Classify a file from its extension (case-insensitive, without the dot)
    pub fn classify(extension: &str) -> FileKind {
        match extension.to_lowercase().as_str() {
            "gif" | "jpg" | "jpeg" | "png" => FileKind::Raster,
            "svg" => FileKind::Svg,
            _ => FileKind::Unsupported,
        }
    }

    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> Result<u64> {
        Ok(fs::metadata(path).await.at(path)?.len())
    }

    /// Copy `source` to `target` byte for byte
    pub async fn copy_verbatim(source: &Path, target: &Path) -> Result<u64> {
        fs::copy(source, target).await.at(target)
    }

    pub async fn remove(path: &Path) -> Result<()> {
        fs::remove_file(path).await.at(path)
    }

    /// Path of the compressed sibling: `name.svg` -> `name.svg.gz`
    pub fn gzip_path(target: &Path) -> PathBuf {
        let mut name = target.as_os_str().to_os_string();
        name.push(".");
        name.push(GZIP_SUFFIX);
        PathBuf::from(name)
    }

    /// Stream `source` through gzip (best compression) into `target`.
    ///
    /// Returns the size of the written file.
    pub async fn gzip_file(source: &Path, target: &Path) -> Result<u64> {
        let input = fs::File::open(source).await.at(source)?;
        let output = fs::File::create(target).await.at(target)?;

        let mut reader = BufReader::new(input);
        let mut encoder = GzipEncoder::with_quality(output, Level::Best);
        tokio::io::copy(&mut reader, &mut encoder).await.at(source)?;
        encoder.shutdown().await.at(target)?;

        Self::file_size(target).await
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
