//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione di una scansione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di riduzione
//! - Valida i parametri con una tabella dichiarativa di vincoli (range, minimo, valori ammessi)
//! - Rifiuta le combinazioni di opzioni incompatibili
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce il preset `--full-optimization`
//!
//! ## Parametri di configurazione:
//! - `source_path` / `dest_path`: Albero sorgente e albero di destinazione (obbligatori)
//! - `recursive`: Scende nelle sottodirectory (default: false)
//! - `max_width` / `max_height`: Limiti di geometria (>= 1)
//! - `min_size_reduction`: Riduzione minima garantita in percentuale (0-100)
//! - `quality`: Qualità di compressione (0-100)
//! - `jpeg_blur`: Sfocatura applicata prima della compressione JPEG (> 0)
//! - `direct_color_bit_depth`: Profondità per immagini a colori diretti (1, 4, 8, 15, 16, 18, 24, 32)
//! - `indexed_color_bit_depth`: Profondità per immagini a palette (1-8)
//! - `force_png_to_indexed` / `force_png_to_jpg`: Override della modalità colore per i PNG
//! - `force_direct_color_output_format` / `force_indexed_color_output_format`: Override del formato
//!
//! ## Esempio:
//! ```rust
//! use image_reducer::Config;
//!
//! let config = Config {
//!     max_width: Some(800),
//!     quality: Some(70),
//!     recursive: true,
//!     ..Config::new("/photos", "/photos-small")
//! };
//! ```

use crate::error::{ReduceError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bit depths accepted for direct-color images
pub const DIRECT_COLOR_BIT_DEPTHS: &[f64] = &[1.0, 4.0, 8.0, 15.0, 16.0, 18.0, 24.0, 32.0];

/// Output formats that can be forced on a color model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpg,
    Gif,
    Png,
    Webp,
}

impl OutputFormat {
    /// File extension written for this format, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Gif => "gif",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}

/// Configuration for a reduction run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the tree to scan
    pub source_path: PathBuf,
    /// Root of the mirrored tree
    pub dest_path: PathBuf,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Maximum output width in pixels
    pub max_width: Option<u32>,
    /// Maximum output height in pixels
    pub max_height: Option<u32>,
    /// Minimum reduction of the image dimensions, in percent
    pub min_size_reduction: Option<u8>,
    /// Compression quality (0-100)
    pub quality: Option<u8>,
    /// Blur applied before JPEG compression
    pub jpeg_blur: Option<f64>,
    /// Output format for direct-color sources
    pub force_direct_color_output_format: Option<OutputFormat>,
    /// Output format for indexed-color sources
    pub force_indexed_color_output_format: Option<OutputFormat>,
    /// Reduce every PNG to an indexed palette
    pub force_png_to_indexed: bool,
    /// Convert direct-color PNGs to JPEG
    pub force_png_to_jpg: bool,
    /// Bit depth for direct-color images
    pub direct_color_bit_depth: Option<u8>,
    /// Bit depth for indexed-color images
    pub indexed_color_bit_depth: Option<u8>,
    /// Log every per-file decision
    pub verbose: bool,
    /// Report as JSON instead of text
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_path: PathBuf::new(),
            dest_path: PathBuf::new(),
            recursive: false,
            max_width: None,
            max_height: None,
            min_size_reduction: None,
            quality: None,
            jpeg_blur: None,
            force_direct_color_output_format: None,
            force_indexed_color_output_format: None,
            force_png_to_indexed: false,
            force_png_to_jpg: false,
            direct_color_bit_depth: None,
            indexed_color_bit_depth: None,
            verbose: false,
            json_output: false,
        }
    }
}

/// A single constraint of the option schema
#[derive(Debug, Clone, Copy)]
enum Constraint {
    AtLeast(f64),
    Between(f64, f64),
    OneOf(&'static [f64]),
    Positive,
}

impl Constraint {
    fn check(&self, option: &str, value: f64) -> Result<()> {
        let message = match *self {
            Constraint::AtLeast(min) if value < min => {
                format!("\"{}\" may not be less than {}", option, min)
            }
            Constraint::Between(min, _) if value < min => {
                format!("\"{}\" may not be less than {}", option, min)
            }
            Constraint::Between(_, max) if value > max => {
                format!("\"{}\" may not exceed {}", option, max)
            }
            Constraint::OneOf(allowed) if !allowed.contains(&value) => {
                format!("Invalid value for \"{}\"", option)
            }
            Constraint::Positive if !value.is_finite() || value <= 0.0 => {
                format!("\"{}\" must be a positive number", option)
            }
            _ => return Ok(()),
        };
        Err(ReduceError::Config(message))
    }
}

impl Config {
    /// Configuration with every optional setting left unset
    pub fn new(source_path: impl Into<PathBuf>, dest_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            ..Default::default()
        }
    }

    /// Apply the aggressive preset used by `--full-optimization`
    pub fn full_optimization(self) -> Self {
        Self {
            max_width: Some(420),
            max_height: Some(600),
            min_size_reduction: Some(30),
            quality: Some(20),
            direct_color_bit_depth: Some(8),
            indexed_color_bit_depth: Some(5),
            force_png_to_indexed: true,
            jpeg_blur: Some(2.0),
            recursive: true,
            ..self
        }
    }

    /// Numeric options and the constraint each must satisfy when set
    fn option_rules(&self) -> [(&'static str, Option<f64>, Constraint); 7] {
        [
            ("max-width", self.max_width.map(f64::from), Constraint::AtLeast(1.0)),
            ("max-height", self.max_height.map(f64::from), Constraint::AtLeast(1.0)),
            (
                "min-size-reduction",
                self.min_size_reduction.map(f64::from),
                Constraint::Between(0.0, 100.0),
            ),
            ("quality", self.quality.map(f64::from), Constraint::Between(0.0, 100.0)),
            ("jpeg-blur", self.jpeg_blur, Constraint::Positive),
            (
                "direct-color-bit-depth",
                self.direct_color_bit_depth.map(f64::from),
                Constraint::OneOf(DIRECT_COLOR_BIT_DEPTHS),
            ),
            (
                "indexed-color-bit-depth",
                self.indexed_color_bit_depth.map(f64::from),
                Constraint::Between(1.0, 8.0),
            ),
        ]
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.source_path.as_os_str().is_empty() {
            return Err(ReduceError::Config("Required option missing: \"source-path\"".to_string()));
        }

        if self.dest_path.as_os_str().is_empty() {
            return Err(ReduceError::Config("Required option missing: \"dest-path\"".to_string()));
        }

        for (option, value, constraint) in self.option_rules() {
            if let Some(value) = value {
                constraint.check(option, value)?;
            }
        }

        self.validate_exclusive_options()?;

        if !self.source_path.is_dir() {
            return Err(ReduceError::Config(format!(
                "Source path is not a directory: {}",
                self.source_path.display()
            )));
        }

        let source = resolve_path(&self.source_path)
            .map_err(|e| ReduceError::Config(format!("Invalid source path: {}", e)))?;
        let dest = resolve_path(&self.dest_path)
            .map_err(|e| ReduceError::Config(format!("Invalid destination path: {}", e)))?;

        if dest.starts_with(&source) {
            return Err(ReduceError::Config(format!(
                "Destination path {} may not be inside the source path {}",
                self.dest_path.display(),
                self.source_path.display()
            )));
        }

        Ok(())
    }

    /// The PNG forcing flags and the direct-color format override all decide
    /// the output of direct-color PNGs, so at most one of them may be set.
    fn validate_exclusive_options(&self) -> Result<()> {
        let conflicts = [
            (
                self.force_png_to_indexed && self.force_png_to_jpg,
                "force-png-to-indexed",
                "force-png-to-jpg",
            ),
            (
                self.force_png_to_indexed && self.force_direct_color_output_format.is_some(),
                "force-png-to-indexed",
                "force-direct-color-output-format",
            ),
            (
                self.force_png_to_jpg && self.force_direct_color_output_format.is_some(),
                "force-png-to-jpg",
                "force-direct-color-output-format",
            ),
        ];

        match conflicts.iter().find(|(conflict, _, _)| *conflict) {
            Some((_, first, second)) => Err(ReduceError::Config(format!(
                "'{}' and '{}' options may not be used together",
                first, second
            ))),
            None => Ok(()),
        }
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ReduceError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            ReduceError::Config(format!("Invalid configuration file {}: {}", path.display(), e))
        })
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ReduceError::Config(format!("Cannot serialize configuration: {}", e)))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ReduceError::io(path, e))
    }
}

/// Absolute form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the missing components are re-appended.
fn resolve_path(path: &Path) -> std::io::Result<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut missing = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut resolved) => {
                for component in missing.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(e) => match (existing.file_name(), existing.parent()) {
                (Some(name), Some(parent)) => {
                    missing.push(name.to_os_string());
                    existing = if parent.as_os_str().is_empty() {
                        PathBuf::from(".")
                    } else {
                        parent.to_path_buf()
                    };
                }
                _ => return Err(e),
            },
        }
    }
}
