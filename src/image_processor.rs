//! # Image Processing Module
//!
//! Implementazione di produzione di [`TransformEngine`]: tutta l'elaborazione dei
//! pixel è delegata a un tool esterno, nessuna immagine viene decodificata in memoria.
//!
//! ## Tool supportati (priorità decrescente):
//! 1. **magick** (ImageMagick 7.x): `magick identify` / `magick <input> ... <output>`
//! 2. **convert + identify** (ImageMagick 6.x)
//! 3. **gm** (GraphicsMagick): `gm identify` / `gm convert`
//! 4. **Errore**: `MissingDependency` se nessun tool è disponibile
//!
//! ## Probe
//! `identify -format "%w %h %r"` restituisce larghezza, altezza e classe
//! dell'immagine: `DirectClass` per colori diretti, `PseudoClass` per palette.
//!
//! ## Scrittura
//! Una sola invocazione di convert con tutti i parametri del piano:
//! ```text
//! magick in.png -type Optimize -colorspace sRGB -resize 420x315 \
//!     -depth 5 +dither -interlace None -colors 32 \
//!     -strip +profile * -flatten -quality 100 out.png
//! ```
//!
//! Da ImageMagick 6.7.7 `RGB` indica l'RGB lineare: per ImageMagick si usa
//! `sRGB`, mentre GraphicsMagick mantiene `RGB`.

use crate::error::{ReduceError, Result};
use crate::planner::{ColorDepth, TransformPlan};
use crate::platform::PlatformCommands;
use crate::transform::{ImageProbe, TransformEngine};
use crate::utils::to_string_vec;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Probe format: width, height and image class, one line per frame
const IDENTIFY_FORMAT: &str = "%w %h %r\n";

/// Which ImageMagick-compatible suite is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagickFlavor {
    ImageMagick7,
    ImageMagick6,
    GraphicsMagick,
}

impl MagickFlavor {
    /// Program and leading arguments for `identify`
    fn identify_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            MagickFlavor::ImageMagick7 => ("magick", &["identify"]),
            MagickFlavor::ImageMagick6 => ("identify", &[]),
            MagickFlavor::GraphicsMagick => ("gm", &["identify"]),
        }
    }

    /// Program and leading arguments for a conversion
    fn convert_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            MagickFlavor::ImageMagick7 => ("magick", &[]),
            MagickFlavor::ImageMagick6 => ("convert", &[]),
            MagickFlavor::GraphicsMagick => ("gm", &["convert"]),
        }
    }

    /// Gamma-encoded RGB colorspace name understood by this suite
    fn colorspace(&self) -> &'static str {
        match self {
            MagickFlavor::ImageMagick7 | MagickFlavor::ImageMagick6 => "sRGB",
            MagickFlavor::GraphicsMagick => "RGB",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MagickFlavor::ImageMagick7 => "ImageMagick 7.x (magick)",
            MagickFlavor::ImageMagick6 => "ImageMagick 6.x (convert/identify)",
            MagickFlavor::GraphicsMagick => "GraphicsMagick (gm)",
        }
    }
}

/// Transform engine backed by ImageMagick or GraphicsMagick
#[derive(Debug, Clone)]
pub struct ImageMagickEngine {
    flavor: MagickFlavor,
}

impl ImageMagickEngine {
    pub fn new(flavor: MagickFlavor) -> Self {
        Self { flavor }
    }

    /// Pick the first installed tool suite.
    ///
    /// # Errors
    /// Returns `MissingDependency` if neither ImageMagick nor GraphicsMagick is installed.
    pub async fn detect() -> Result<Self> {
        let platform = PlatformCommands::instance();

        let flavor = if platform.is_command_available("magick").await {
            MagickFlavor::ImageMagick7
        } else if platform.all_available(&["convert", "identify"]).await {
            MagickFlavor::ImageMagick6
        } else if platform.is_command_available("gm").await {
            MagickFlavor::GraphicsMagick
        } else {
            return Err(ReduceError::MissingDependency(
                "No image transform tool available. Please install ImageMagick or GraphicsMagick"
                    .to_string(),
            ));
        };

        info!("Transform engine: {}", flavor.description());
        Ok(Self::new(flavor))
    }

    pub fn flavor(&self) -> MagickFlavor {
        self.flavor
    }

    /// Arguments of the convert invocation for `plan`, program excluded
    pub fn build_convert_args(&self, input: &str, plan: &TransformPlan) -> Vec<String> {
        let (_, prefix) = self.flavor.convert_command();
        let mut args = to_string_vec(prefix.iter());
        args.push(input.to_string());

        args.extend(to_string_vec([
            "-type",
            "Optimize",
            "-colorspace",
            self.flavor.colorspace(),
            "-resize",
            &format!("{}x{}", plan.width, plan.height),
        ]));

        for depth in [plan.direct_color, plan.indexed_color].iter().flatten() {
            args.extend(color_depth_args(depth));
        }

        if plan.strip_metadata {
            args.extend(to_string_vec(["-strip", "+profile", "*"]));
        }

        if plan.flatten {
            args.push("-flatten".to_string());
        }

        let compression = &plan.compression;
        if let Some(blur) = compression.blur {
            args.extend(crate::args!["-blur", format!("{}x1", blur)]);
        }
        if let Some((horizontal, vertical)) = compression.sampling_factor {
            args.extend(crate::args!["-sampling-factor", format!("{}x{}", horizontal, vertical)]);
        }
        if let Some(quality) = compression.quality {
            args.extend(crate::args!["-quality", quality]);
        }

        args.push(plan.destination.to_string_lossy().into_owned());
        args
    }

    /// Arguments of the identify invocation, program excluded
    fn build_identify_args(&self, input: &str) -> Vec<String> {
        let (_, prefix) = self.flavor.identify_command();
        let mut args = to_string_vec(prefix.iter());
        args.extend(to_string_vec(["-format", IDENTIFY_FORMAT, input]));
        args
    }
}

fn color_depth_args(depth: &ColorDepth) -> Vec<String> {
    let mut args = crate::args!["-depth", depth.bit_depth];
    if !depth.dither {
        args.push("+dither".to_string());
    }
    if !depth.interlace {
        args.extend(to_string_vec(["-interlace", "None"]));
    }
    args.extend(crate::args!["-colors", depth.palette_size]);
    args
}

/// Parse the first line of `identify -format "%w %h %r"` output.
pub fn parse_identify_output(path: &Path, output: &str) -> Result<ImageProbe> {
    let line = output.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut parts = line.split_whitespace();

    let (width, height, class) = match (parts.next(), parts.next(), parts.next()) {
        (Some(w), Some(h), Some(class)) => (w, h, class),
        _ => {
            return Err(ReduceError::transform(
                path,
                format!("Unexpected identify output: {:?}", output.trim()),
            ))
        }
    };

    let parse = |value: &str| {
        value.parse::<u32>().map_err(|_| {
            ReduceError::transform(path, format!("Invalid image dimension: {:?}", value))
        })
    };

    let is_direct_color = match class {
        "DirectClass" => true,
        "PseudoClass" => false,
        other => {
            return Err(ReduceError::transform(
                path,
                format!("Unknown image class: {}", other),
            ))
        }
    };

    Ok(ImageProbe {
        width: parse(width)?,
        height: parse(height)?,
        is_direct_color,
    })
}

#[async_trait]
impl TransformEngine for ImageMagickEngine {
    async fn probe(&self, path: &Path) -> Result<ImageProbe> {
        let (program, _) = self.flavor.identify_command();
        let program = PlatformCommands::instance().get_command(program);
        let args = self.build_identify_args(&path.to_string_lossy());

        let output = Command::new(program)
            .args(&args)
            .output()
            .await
            .map_err(|e| ReduceError::transform(path, format!("Cannot run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed on {}", program, path.display());
            return Err(ReduceError::transform(
                path,
                format!("{} exited with {}: {}", program, output.status, stderr.trim()),
            ));
        }

        let probe = parse_identify_output(path, &String::from_utf8_lossy(&output.stdout))?;
        debug!(
            "Probed {}: {}x{} ({})",
            path.display(),
            probe.width,
            probe.height,
            if probe.is_direct_color { "direct color" } else { "indexed color" }
        );
        Ok(probe)
    }

    async fn write(&self, source: &Path, plan: &TransformPlan) -> Result<()> {
        let (program, _) = self.flavor.convert_command();
        let program = PlatformCommands::instance().get_command(program);
        let args = self.build_convert_args(&source.to_string_lossy(), plan);
        debug!("Command arguments: {:?}", args);

        let start_time = std::time::Instant::now();
        let output = Command::new(program)
            .args(&args)
            .output()
            .await
            .map_err(|e| ReduceError::transform(source, format!("Cannot run {}: {}", program, e)))?;
        let elapsed = start_time.elapsed();

        if output.status.success() {
            debug!("{} wrote {} in {:?}", program, plan.destination.display(), elapsed);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed after {:?} on {}", program, elapsed, source.display());
            Err(ReduceError::transform(
                source,
                format!("{} exited with {}: {}", program, output.status, stderr.trim()),
            ))
        }
    }
}
