//! # Image Reducer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione, preset e validazione dichiarativa delle opzioni
//! - `error`: Tipo di errore unico `ReduceError`
//! - `walker`: Visita in profondità dell'albero sorgente con specchio delle directory
//! - `planner`: Calcolo puro del piano di trasformazione per ogni immagine
//! - `transform`: Trait del motore di trasformazione (probe + scrittura)
//! - `image_processor`: Motore ImageMagick / GraphicsMagick
//! - `file_manager`: Classificazione, copia, gzip e utilità sui file
//! - `reducer`: Orchestratore della scansione e verifica degli artefatti
//! - `stats`: Contatori della scansione e report finale
//! - `progress`: Spinner di avanzamento
//! - `json_output`: Output JSON per integrazioni
//! - `platform`, `utils`: Nomi dei comandi esterni e costruzione degli argomenti
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use image_reducer::{reducer, Config};
//!
//! # async fn example() -> image_reducer::Result<()> {
//! let mut config = Config::new("/photos", "/photos-small");
//! config.max_width = Some(1024);
//! let stats = reducer::run(config).await?;
//! println!("{}", stats.format_report(std::time::Duration::from_secs(1)));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod planner;
pub mod platform;
pub mod progress;
pub mod reducer;
pub mod stats;
pub mod transform;
pub mod utils;
pub mod walker;

pub use config::{Config, OutputFormat};
pub use error::{ReduceError, Result};
pub use image_processor::ImageMagickEngine;
pub use planner::TransformPlan;
pub use reducer::{FileOutcome, ImageReducer};
pub use stats::RunStats;
pub use transform::{ImageProbe, TransformEngine};
pub use walker::{Descend, TreeEntry, TreeVisitor, TreeWalker};
