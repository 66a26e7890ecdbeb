//! # Transform Engine Interface
//!
//! Confine tra la logica di decisione e il motore esterno che decodifica,
//! ridimensiona e ricodifica le immagini. L'implementazione di produzione è
//! [`crate::image_processor::ImageMagickEngine`]; i test usano un motore finto
//! con risultati programmati.

use crate::error::Result;
use crate::planner::TransformPlan;
use async_trait::async_trait;
use std::path::Path;

/// Metadata read from a source image before transforming it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProbe {
    pub width: u32,
    pub height: u32,
    /// True-color pixels; `false` means the image uses a palette
    pub is_direct_color: bool,
}

/// External engine performing the pixel-level work
#[async_trait]
pub trait TransformEngine: Send + Sync {
    /// Inspect a source image without transforming it.
    async fn probe(&self, path: &Path) -> Result<ImageProbe>;

    /// Transform `source` according to `plan` and write it to `plan.destination`.
    async fn write(&self, source: &Path, plan: &TransformPlan) -> Result<()>;
}
