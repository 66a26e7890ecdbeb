//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore della libreria.
//!
//! ## Categorie di errori:
//! - `Config`: Configurazione non valida (rifiutata prima di iniziare la scansione)
//! - `Io`: Errori di I/O (mkdir, stat, copy, delete, stream gzip)
//! - `Walk`: Errori di listing/stat durante l'attraversamento dell'albero
//! - `Transform`: Errori del motore di trasformazione (probe o scrittura)
//! - `MissingDependency`: Tool esterno mancante (magick, convert, gm)
//!
//! Nessun errore viene ritentato: il primo errore interrompe l'intera scansione.
//!
//! ## Esempio:
//! ```rust
//! use image_reducer::error::{ReduceError, Result};
//!
//! fn check(quality: u8) -> Result<()> {
//!     if quality > 100 {
//!         return Err(ReduceError::Config("\"quality\" may not exceed 100".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

/// Errors that abort a reduction run
#[derive(thiserror::Error, Debug)]
pub enum ReduceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Transform failed for {}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),
}

impl ReduceError {
    /// Wrap an I/O error together with the path it happened on
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn transform(path: &Path, message: impl Into<String>) -> Self {
        Self::Transform {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReduceError>;

/// Attach a path to the error of an `io::Result`
pub trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| ReduceError::io(path, e))
    }
}
