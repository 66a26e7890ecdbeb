//! # Optimization Planner
//!
//! Calcolo puro (nessun I/O) dei parametri di trasformazione per una singola immagine.
//!
//! ## Decisioni:
//! - **Geometria**: limite di larghezza, poi limite di altezza, poi riduzione minima garantita
//! - **Profondità colore**: direttive separate per immagini a colori diretti e a palette
//! - **Formato**: estensione originale, salvo override (PNG -> JPEG, formati forzati)
//! - **Compressione**: blur + sampling factor per JPEG, qualità 100 per GIF/PNG
//! - **Normalizzazione**: strip dei metadati e flatten sempre attivi

use crate::config::Config;
use crate::transform::ImageProbe;
use crate::walker::TreeEntry;
use std::path::PathBuf;

/// Chroma subsampling applied to every JPEG target
pub const JPEG_SAMPLING_FACTOR: (u8, u8) = (4, 2);

/// Quality used for formats that are not lossy
pub const LOSSLESS_QUALITY: u8 = 100;

/// Bit depth and palette reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDepth {
    pub bit_depth: u8,
    pub palette_size: u32,
    pub dither: bool,
    pub interlace: bool,
}

impl ColorDepth {
    /// Direct-color reduction; the palette is the cube of the bit depth.
    fn direct(bit_depth: u8) -> Self {
        Self {
            bit_depth,
            palette_size: u32::from(bit_depth).pow(3),
            dither: false,
            interlace: false,
        }
    }

    fn indexed(bit_depth: u8) -> Self {
        Self {
            bit_depth,
            palette_size: 2u32.pow(u32::from(bit_depth)),
            dither: false,
            interlace: false,
        }
    }
}

/// Compression settings handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Compression {
    pub quality: Option<u8>,
    /// Blur radius applied before encoding (sigma is always 1)
    pub blur: Option<f64>,
    pub sampling_factor: Option<(u8, u8)>,
}

/// Fully resolved parameters for one file
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPlan {
    pub width: u32,
    pub height: u32,
    /// Extension of the output file, without the dot
    pub extension: String,
    pub direct_color: Option<ColorDepth>,
    pub indexed_color: Option<ColorDepth>,
    pub compression: Compression,
    pub strip_metadata: bool,
    pub flatten: bool,
    pub destination: PathBuf,
}

/// Build the transform plan for one image
pub fn plan(probe: &ImageProbe, entry: &TreeEntry, config: &Config) -> TransformPlan {
    let (width, height) = target_geometry(probe.width, probe.height, config);
    let extension = target_extension(probe, entry, config);
    let (direct_color, indexed_color) = color_depth(probe, entry, config);
    let compression = compression(&extension, config);

    TransformPlan {
        width,
        height,
        destination: entry.mirror_path_with_extension(&extension),
        extension,
        direct_color,
        indexed_color,
        compression,
        strip_metadata: true,
        flatten: true,
    }
}

/// Rewrite `plan` to keep the source's own format and mirrored path.
///
/// Used when the retargeted destination already belongs to another file.
pub fn keep_source_format(plan: TransformPlan, entry: &TreeEntry, config: &Config) -> TransformPlan {
    TransformPlan {
        compression: compression(&entry.extension, config),
        extension: entry.extension.clone(),
        destination: entry.mirror_path.clone(),
        ..plan
    }
}

/// Target dimensions for an image of natural size `width` x `height`.
///
/// The width limit is applied first and the height limit second, so the
/// height limit can shrink a width-limited image further but never the
/// reverse. If the result does not shrink the image by at least
/// `min_size_reduction` percent, both dimensions are derived from the
/// natural size instead.
pub fn target_geometry(width: u32, height: u32, config: &Config) -> (u32, u32) {
    let natural_width = f64::from(width);
    let natural_height = f64::from(height);
    let mut target_width = natural_width;
    let mut target_height = natural_height;

    if let Some(max_width) = config.max_width.map(f64::from) {
        if target_width > max_width {
            let scale = max_width / target_width;
            target_width = max_width;
            target_height *= scale;
        }
    }

    if let Some(max_height) = config.max_height.map(f64::from) {
        if target_height > max_height {
            let scale = max_height / target_height;
            target_height = max_height;
            target_width *= scale;
        }
    }

    if let Some(min_reduction) = config.min_size_reduction.map(f64::from) {
        let effective_scale = if natural_width > 0.0 {
            target_width / natural_width * 100.0
        } else {
            100.0
        };

        if 100.0 - effective_scale < min_reduction {
            let keep = (100.0 - min_reduction) / 100.0;
            target_width = natural_width * keep;
            target_height = natural_height * keep;
        }
    }

    (target_width.round() as u32, target_height.round() as u32)
}

fn is_forced_png(entry: &TreeEntry, config: &Config) -> bool {
    entry.extension_lower == "png" && config.force_png_to_indexed
}

fn color_depth(
    probe: &ImageProbe,
    entry: &TreeEntry,
    config: &Config,
) -> (Option<ColorDepth>, Option<ColorDepth>) {
    let forced_png = is_forced_png(entry, config);

    let direct = match config.direct_color_bit_depth {
        Some(bits) if probe.is_direct_color && !forced_png => Some(ColorDepth::direct(bits)),
        _ => None,
    };

    let indexed = match config.indexed_color_bit_depth {
        Some(bits) if !probe.is_direct_color || forced_png => Some(ColorDepth::indexed(bits)),
        _ => None,
    };

    (direct, indexed)
}

fn target_extension(probe: &ImageProbe, entry: &TreeEntry, config: &Config) -> String {
    if probe.is_direct_color && entry.extension_lower == "png" && config.force_png_to_jpg {
        return "jpg".to_string();
    }

    let forced = if probe.is_direct_color {
        config.force_direct_color_output_format
    } else {
        config.force_indexed_color_output_format
    };

    match forced {
        Some(format) => format.extension().to_string(),
        None => entry.extension.clone(),
    }
}

fn compression(extension: &str, config: &Config) -> Compression {
    // quality 0 leaves the encoder default in place
    let quality = config.quality.filter(|&quality| quality > 0);

    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => Compression {
            quality,
            blur: config.jpeg_blur,
            sampling_factor: Some(JPEG_SAMPLING_FACTOR),
        },
        "gif" | "png" => Compression {
            quality: Some(LOSSLESS_QUALITY),
            ..Default::default()
        },
        _ => Compression {
            quality,
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::path::Path;

    fn entry(name: &str) -> TreeEntry {
        TreeEntry {
            path: Path::new("/src/album").join(name),
            relative_dir: PathBuf::from("album"),
            file_name: name.to_string(),
            stem: Path::new(name).file_stem().unwrap().to_string_lossy().into_owned(),
            extension: Path::new(name).extension().unwrap().to_string_lossy().into_owned(),
            extension_lower: Path::new(name)
                .extension()
                .unwrap()
                .to_string_lossy()
                .to_lowercase(),
            size: 1000,
            mirror_path: Path::new("/dest/album").join(name),
        }
    }

    fn direct(width: u32, height: u32) -> ImageProbe {
        ImageProbe {
            width,
            height,
            is_direct_color: true,
        }
    }

    fn indexed() -> ImageProbe {
        ImageProbe {
            width: 100,
            height: 100,
            is_direct_color: false,
        }
    }

    fn config() -> Config {
        Config::new("/src", "/dest")
    }

    #[test]
    fn test_width_limit_only() {
        let config = Config {
            max_width: Some(400),
            max_height: Some(1000),
            min_size_reduction: Some(0),
            ..config()
        };
        assert_eq!(target_geometry(1000, 500, &config), (400, 200));
    }

    #[test]
    fn test_min_reduction_overrides_limits() {
        let config = Config {
            max_width: Some(990),
            min_size_reduction: Some(30),
            ..config()
        };
        assert_eq!(target_geometry(1000, 500, &config), (700, 350));
    }

    #[test]
    fn test_height_applied_after_width() {
        let config = Config {
            max_width: Some(800),
            max_height: Some(300),
            ..config()
        };
        // 1000x1000 -> 800x800 by width, then 300x300 by height
        assert_eq!(target_geometry(1000, 1000, &config), (300, 300));

        // Height limit alone also scales the width
        let config = Config {
            max_height: Some(250),
            ..self::config()
        };
        assert_eq!(target_geometry(1000, 500, &config), (500, 250));
    }

    #[test]
    fn test_small_image_untouched_without_min_reduction() {
        let config = Config {
            max_width: Some(2000),
            max_height: Some(2000),
            ..config()
        };
        assert_eq!(target_geometry(640, 480, &config), (640, 480));
    }

    #[test]
    fn test_enough_reduction_keeps_limit_geometry() {
        let config = Config {
            max_width: Some(500),
            min_size_reduction: Some(30),
            ..config()
        };
        assert_eq!(target_geometry(1000, 600, &config), (500, 300));
    }

    #[test]
    fn test_geometry_rounds_to_nearest() {
        let config = Config {
            max_width: Some(250),
            ..config()
        };
        // 502 * 0.25 = 125.5
        assert_eq!(target_geometry(1000, 502, &config), (250, 126));
    }

    #[test]
    fn test_zero_width_probe_does_not_panic() {
        let config = Config {
            min_size_reduction: Some(50),
            ..config()
        };
        assert_eq!(target_geometry(0, 0, &config), (0, 0));
    }

    #[test]
    fn test_direct_color_depth() {
        let config = Config {
            direct_color_bit_depth: Some(8),
            indexed_color_bit_depth: Some(5),
            ..config()
        };
        let plan = plan(&direct(10, 10), &entry("photo.jpg"), &config);

        assert_eq!(
            plan.direct_color,
            Some(ColorDepth {
                bit_depth: 8,
                palette_size: 512,
                dither: false,
                interlace: false,
            })
        );
        assert_eq!(plan.indexed_color, None);
    }

    #[test]
    fn test_indexed_color_depth() {
        let config = Config {
            direct_color_bit_depth: Some(8),
            indexed_color_bit_depth: Some(5),
            ..config()
        };
        let plan = plan(&indexed(), &entry("icon.gif"), &config);

        assert_eq!(plan.direct_color, None);
        assert_eq!(plan.indexed_color.map(|c| c.palette_size), Some(32));
        assert_eq!(plan.indexed_color.map(|c| c.bit_depth), Some(5));
    }

    #[test]
    fn test_forced_indexed_png_gets_only_indexed_directive() {
        let config = Config {
            direct_color_bit_depth: Some(8),
            indexed_color_bit_depth: Some(4),
            force_png_to_indexed: true,
            ..config()
        };

        let plan_png = plan(&direct(10, 10), &entry("shot.PNG"), &config);
        assert_eq!(plan_png.direct_color, None);
        assert_eq!(plan_png.indexed_color.map(|c| c.palette_size), Some(16));

        // The override only concerns PNGs
        let plan_jpg = plan(&direct(10, 10), &entry("shot.jpg"), &config);
        assert!(plan_jpg.direct_color.is_some());
        assert_eq!(plan_jpg.indexed_color, None);
    }

    #[test]
    fn test_no_directive_without_bit_depth() {
        let config = Config {
            force_png_to_indexed: true,
            ..config()
        };
        let plan = plan(&direct(10, 10), &entry("shot.png"), &config);
        assert_eq!(plan.direct_color, None);
        assert_eq!(plan.indexed_color, None);
    }

    #[test]
    fn test_png_to_jpg_only_for_direct_color() {
        let config = Config {
            force_png_to_jpg: true,
            quality: Some(60),
            ..config()
        };

        let plan_direct = plan(&direct(10, 10), &entry("screen.png"), &config);
        assert_eq!(plan_direct.extension, "jpg");
        assert_eq!(plan_direct.destination, PathBuf::from("/dest/album/screen.jpg"));
        assert_eq!(plan_direct.compression.sampling_factor, Some(JPEG_SAMPLING_FACTOR));
        assert_eq!(plan_direct.compression.quality, Some(60));

        let plan_indexed = plan(&indexed(), &entry("screen.png"), &config);
        assert_eq!(plan_indexed.extension, "png");
        assert_eq!(plan_indexed.compression.quality, Some(LOSSLESS_QUALITY));
    }

    #[test]
    fn test_forced_output_formats_follow_color_model() {
        let config = Config {
            force_direct_color_output_format: Some(OutputFormat::Webp),
            force_indexed_color_output_format: Some(OutputFormat::Gif),
            quality: Some(55),
            ..config()
        };

        let plan_direct = plan(&direct(10, 10), &entry("a.jpg"), &config);
        assert_eq!(plan_direct.extension, "webp");
        assert_eq!(plan_direct.compression.quality, Some(55));
        assert_eq!(plan_direct.compression.blur, None);

        let plan_indexed = plan(&indexed(), &entry("b.png"), &config);
        assert_eq!(plan_indexed.extension, "gif");
        assert_eq!(plan_indexed.destination, PathBuf::from("/dest/album/b.gif"));
    }

    #[test]
    fn test_extension_case_preserved() {
        let plan = plan(&direct(10, 10), &entry("IMG_0001.JPG"), &config());
        assert_eq!(plan.extension, "JPG");
        assert_eq!(plan.destination, PathBuf::from("/dest/album/IMG_0001.JPG"));
        assert_eq!(plan.compression.sampling_factor, Some(JPEG_SAMPLING_FACTOR));
    }

    #[test]
    fn test_jpeg_compression() {
        let config = Config {
            jpeg_blur: Some(2.0),
            quality: Some(20),
            ..config()
        };
        let plan = plan(&direct(10, 10), &entry("photo.jpeg"), &config);

        assert_eq!(
            plan.compression,
            Compression {
                quality: Some(20),
                blur: Some(2.0),
                sampling_factor: Some((4, 2)),
            }
        );
    }

    #[test]
    fn test_lossless_formats_pinned_to_max_quality() {
        let config = Config {
            quality: Some(20),
            jpeg_blur: Some(2.0),
            ..config()
        };
        for name in ["a.gif", "b.png"] {
            let plan = plan(&indexed(), &entry(name), &config);
            assert_eq!(plan.compression.quality, Some(100));
            assert_eq!(plan.compression.blur, None);
            assert_eq!(plan.compression.sampling_factor, None);
        }
    }

    #[test]
    fn test_no_quality_when_unset() {
        let config = Config {
            force_direct_color_output_format: Some(OutputFormat::Webp),
            ..config()
        };
        let plan = plan(&direct(10, 10), &entry("a.jpg"), &config);
        assert_eq!(plan.compression, Compression::default());
    }

    #[test]
    fn test_zero_quality_means_encoder_default() {
        let webp_config = Config {
            quality: Some(0),
            force_direct_color_output_format: Some(OutputFormat::Webp),
            ..config()
        };
        let webp = plan(&direct(10, 10), &entry("a.png"), &webp_config);
        assert_eq!(webp.compression.quality, None);

        let jpeg = plan(&direct(10, 10), &entry("b.jpg"), &Config { quality: Some(0), ..config() });
        assert_eq!(jpeg.compression.quality, None);
        assert_eq!(jpeg.compression.sampling_factor, Some((4, 2)));
    }

    #[test]
    fn test_keep_source_format_restores_mirror_path() {
        let config = Config {
            force_direct_color_output_format: Some(OutputFormat::Jpg),
            quality: Some(30),
            ..config()
        };
        let source = entry("logo.png");
        let retargeted = plan(&direct(10, 10), &source, &config);
        assert_eq!(retargeted.destination, Path::new("/dest/album/logo.jpg"));
        let geometry = (retargeted.width, retargeted.height);

        let kept = keep_source_format(retargeted, &source, &config);
        assert_eq!(kept.extension, "png");
        assert_eq!(kept.destination, source.mirror_path);
        assert_eq!(kept.compression.quality, Some(LOSSLESS_QUALITY));
        assert_eq!(kept.compression.sampling_factor, None);
        assert_eq!((kept.width, kept.height), geometry);
    }

    #[test]
    fn test_normalization_always_on() {
        let plan = plan(&direct(10, 10), &entry("a.jpg"), &config());
        assert!(plan.strip_metadata);
        assert!(plan.flatten);
    }

    #[test]
    fn test_resized_plan() {
        let config = Config {
            max_width: Some(1000),
            ..config()
        };
        let plan = plan(&direct(2000, 1000), &entry("wide.png"), &config);
        assert_eq!((plan.width, plan.height), (1000, 500));
        assert_eq!(plan.destination, PathBuf::from("/dest/album/wide.png"));
    }
}
