//! # Artifact Verifier
//!
//! Esegue un piano di trasformazione e decide se tenere l'artefatto.
//!
//! ## Regola:
//! - Artefatto strettamente più piccolo della sorgente → `Optimized`
//! - Altrimenti l'artefatto viene cancellato e l'originale copiato
//!   byte per byte nel path specchiato (nome ed estensione originali) → `Copied`

use crate::error::Result;
use crate::file_manager::FileManager;
use crate::planner::TransformPlan;
use crate::stats::RunStats;
use crate::transform::TransformEngine;
use crate::walker::TreeEntry;
use tracing::debug;

/// What ended up in the destination tree for a raster file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Optimized,
    Copied,
}

/// Run `plan` for `entry` and keep whichever of artifact or original is smaller.
pub async fn apply<E>(
    engine: &E,
    plan: &TransformPlan,
    entry: &TreeEntry,
    stats: &mut RunStats,
) -> Result<FileOutcome>
where
    E: TransformEngine + ?Sized,
{
    engine.write(&entry.path, plan).await?;
    let artifact_size = FileManager::file_size(&plan.destination).await?;

    if artifact_size < entry.size {
        debug!(
            "Optimized {}: {} -> {} ({:.1}% saved)",
            entry.path.display(),
            FileManager::format_size(entry.size),
            FileManager::format_size(artifact_size),
            FileManager::calculate_reduction(entry.size, artifact_size)
        );
        stats.add_optimized(artifact_size);
        return Ok(FileOutcome::Optimized);
    }

    debug!(
        "Keeping original {}: artifact is {} for a {} source",
        entry.path.display(),
        FileManager::format_size(artifact_size),
        FileManager::format_size(entry.size)
    );
    FileManager::remove(&plan.destination).await?;
    FileManager::copy_verbatim(&entry.path, &entry.mirror_path).await?;
    stats.add_copied(entry.size);

    Ok(FileOutcome::Copied)
}
