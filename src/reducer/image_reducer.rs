//! # Image Reducer Orchestrator
//!
//! Orchestratore della scansione: valida la configurazione, prepara la
//! destinazione e visita l'albero sorgente file per file.
//!
//! ## Flusso di esecuzione:
//! 1. **Validazione**: `Config::validate`, prima di toccare il filesystem
//! 2. **Destinazione**: creazione ricorsiva di `dest_path`
//! 3. **Visita**: `TreeWalker` in profondità, una operazione alla volta
//! 4. **Per file**: classificazione per estensione
//!    - non supportato → ignorato
//!    - SVG → gzip in `nome.svg.gz`
//!    - raster → probe, piano, scrittura e verifica
//! 5. **Statistiche**: `RunStats` restituite solo se tutto è andato a buon fine
//!
//! ## Error handling:
//! - Il primo errore interrompe la visita e viene restituito così com'è
//! - I file già scritti restano nella destinazione
//!
//! ## Esempio:
//! ```rust,no_run
//! use image_reducer::{reducer, Config};
//!
//! # async fn example() -> image_reducer::Result<()> {
//! let config = Config::new("photos", "photos-small").full_optimization();
//! let stats = reducer::run(config).await?;
//! println!("{} files optimized", stats.files.optimized);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::{IoContext, Result};
use crate::file_manager::{FileKind, FileManager};
use crate::image_processor::ImageMagickEngine;
use crate::planner;
use crate::progress::ScanProgress;
use crate::reducer::verifier::{self, FileOutcome};
use crate::stats::RunStats;
use crate::transform::TransformEngine;
use crate::walker::{Descend, TreeEntry, TreeVisitor, TreeWalker};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reduce every supported image under `config.source_path` with ImageMagick.
pub async fn run(config: Config) -> Result<RunStats> {
    config.validate()?;
    let engine = ImageMagickEngine::detect().await?;
    ImageReducer::new(config, engine).run().await
}

/// Drives one scan with a given transform engine
pub struct ImageReducer<E: TransformEngine> {
    config: Config,
    engine: E,
    stats: RunStats,
    progress: ScanProgress,
    /// Destination files produced so far by this run
    written: HashSet<PathBuf>,
}

impl<E: TransformEngine> ImageReducer<E> {
    pub fn new(config: Config, engine: E) -> Self {
        Self {
            config,
            engine,
            stats: RunStats::new(),
            progress: ScanProgress::hidden(),
            written: HashSet::new(),
        }
    }

    pub fn with_progress(mut self, progress: ScanProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Validate, walk the whole tree and return the final counters.
    pub async fn run(mut self) -> Result<RunStats> {
        self.config.validate()?;

        let dest_path = self.config.dest_path.clone();
        tokio::fs::create_dir_all(&dest_path).await.at(&dest_path)?;

        info!(
            "Reducing {} into {}{}",
            self.config.source_path.display(),
            dest_path.display(),
            if self.config.recursive { " (recursive)" } else { "" }
        );

        let walker = TreeWalker::new(&self.config.source_path, &dest_path, self.config.recursive);
        let result = walker.walk(&mut self).await;
        self.progress.finish();
        let summary = result?;

        info!(
            "Scan complete: {} files in {} directories",
            summary.files, summary.dirs
        );
        Ok(self.stats)
    }

    async fn reduce_raster(&mut self, entry: &TreeEntry) -> Result<FileOutcome> {
        let probe = self.engine.probe(&entry.path).await?;
        let mut plan = planner::plan(&probe, entry, &self.config);
        if plan.destination != entry.mirror_path && self.is_taken(entry, &plan.destination).await? {
            debug!(
                "{} belongs to another file, keeping .{} for {}",
                plan.destination.display(),
                entry.extension,
                entry.path.display()
            );
            plan = planner::keep_source_format(plan, entry, &self.config);
        }
        debug!(
            "Plan for {}: {}x{} -> {}x{} as .{}",
            entry.path.display(),
            probe.width,
            probe.height,
            plan.width,
            plan.height,
            plan.extension
        );

        let outcome = verifier::apply(&self.engine, &plan, entry, &mut self.stats).await?;
        self.written.insert(match outcome {
            FileOutcome::Optimized => plan.destination,
            FileOutcome::Copied => entry.mirror_path.clone(),
        });
        Ok(outcome)
    }

    /// A retargeted destination is taken when this run already wrote it, or
    /// when a sibling source of that name will be mirrored there.
    async fn is_taken(&self, entry: &TreeEntry, destination: &Path) -> Result<bool> {
        if self.written.contains(destination) {
            return Ok(true);
        }

        let Some(name) = destination.file_name() else {
            return Ok(false);
        };
        let sibling = entry.path.with_file_name(name);
        tokio::fs::try_exists(&sibling).await.at(&sibling)
    }

    async fn compress_svg(&mut self, entry: &TreeEntry) -> Result<()> {
        let target = FileManager::gzip_path(&entry.mirror_path);
        let size = FileManager::gzip_file(&entry.path, &target).await?;
        debug!(
            "Compressed {} -> {} ({})",
            entry.path.display(),
            target.display(),
            FileManager::format_size(size)
        );
        self.stats.add_optimized(size);
        Ok(())
    }
}

#[async_trait]
impl<E: TransformEngine> TreeVisitor for ImageReducer<E> {
    async fn on_file(&mut self, entry: &TreeEntry) -> Result<()> {
        self.progress.start_file(&entry.path);
        self.stats.add_scanned(entry.size);

        match FileManager::classify(&entry.extension_lower) {
            FileKind::Unsupported => {
                debug!("Ignoring {}", entry.path.display());
                self.stats.add_ignored();
            }
            FileKind::Svg => self.compress_svg(entry).await?,
            FileKind::Raster => {
                self.reduce_raster(entry).await?;
            }
        }

        Ok(())
    }

    async fn on_directory(&mut self, entry: &TreeEntry) -> Result<Descend> {
        self.stats.add_dir();
        debug!("Mirroring {}", entry.mirror_path.display());
        Ok(Descend::Yes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReduceError;
    use crate::planner::TransformPlan;
    use crate::transform::ImageProbe;
    use std::path::Path;
    use tempfile::TempDir;

    /// Every image probes as 100x100 direct color; the artifact is half the source
    struct HalvingEngine;

    #[async_trait]
    impl TransformEngine for HalvingEngine {
        async fn probe(&self, _path: &Path) -> Result<ImageProbe> {
            Ok(ImageProbe {
                width: 100,
                height: 100,
                is_direct_color: true,
            })
        }

        async fn write(&self, source: &Path, plan: &TransformPlan) -> Result<()> {
            let len = std::fs::metadata(source).unwrap().len() as usize;
            std::fs::write(&plan.destination, vec![1u8; len / 2]).unwrap();
            Ok(())
        }
    }

    fn tree() -> (TempDir, Config) {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::write(src.join("a.png"), vec![0u8; 200]).unwrap();
        std::fs::write(src.join("notes.txt"), b"hello").unwrap();
        std::fs::write(src.join("nested").join("b.JPG"), vec![0u8; 100]).unwrap();

        let config = Config::new(src, temp_dir.path().join("out").join("dest"));
        (temp_dir, config)
    }

    #[tokio::test]
    async fn test_run_creates_dest_and_counts() {
        let (_tmp, mut config) = tree();
        config.recursive = true;
        let dest = config.dest_path.clone();

        let stats = ImageReducer::new(config, HalvingEngine).run().await.unwrap();

        assert!(stats.is_balanced());
        assert_eq!(stats.files.total, 3);
        assert_eq!(stats.files.optimized, 2);
        assert_eq!(stats.files.ignored, 1);
        assert_eq!(stats.dirs.total, 1);
        assert_eq!(stats.data.original, 305);
        assert_eq!(stats.data.optimized, 150);
        assert!(dest.join("a.png").exists());
        assert!(dest.join("nested").join("b.JPG").exists());
        assert!(!dest.join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_non_recursive_skips_nested_files() {
        let (_tmp, config) = tree();
        let dest = config.dest_path.clone();

        let stats = ImageReducer::new(config, HalvingEngine).run().await.unwrap();

        assert_eq!(stats.files.total, 2);
        assert_eq!(stats.dirs.total, 1);
        assert!(dest.join("nested").is_dir());
        assert!(!dest.join("nested").join("b.JPG").exists());
    }

    #[tokio::test]
    async fn test_invalid_config_touches_nothing() {
        let (_tmp, mut config) = tree();
        config.quality = Some(101);
        let dest = config.dest_path.clone();

        let err = ImageReducer::new(config, HalvingEngine).run().await.unwrap_err();

        assert!(matches!(err, ReduceError::Config(_)));
        assert!(!dest.exists());
    }
}
