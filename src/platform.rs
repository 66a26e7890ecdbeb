//! # Platform-specific utilities
//!
//! Nomi eseguibili e ricerca nel PATH dei programmi usati dal motore di
//! trasformazione (ImageMagick 7/6, GraphicsMagick).
//!
//! ## Responsabilità:
//! - Tabella dei programmi noti con il suffisso eseguibile della piattaforma
//! - Verifica della presenza di un programma tramite `which` / `where`

use std::collections::HashMap;
use std::sync::OnceLock;

/// Programs the transform engine may invoke
pub const MAGICK_PROGRAMS: &[&str] = &["magick", "convert", "identify", "gm"];

/// Platform-specific command manager
pub struct PlatformCommands {
    executables: HashMap<&'static str, String>,
    which_command: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let executables = MAGICK_PROGRAMS
            .iter()
            .map(|&program| (program, format!("{}{}", program, std::env::consts::EXE_SUFFIX)))
            .collect();

        Self {
            executables,
            which_command: if cfg!(windows) { "where" } else { "which" },
        }
    }

    /// Executable name for `program`; unknown programs pass through untouched
    pub fn get_command<'a>(&'a self, program: &'a str) -> &'a str {
        self.executables
            .get(program)
            .map(String::as_str)
            .unwrap_or(program)
    }

    /// Check if a command is available on the system
    pub async fn is_command_available(&self, program: &str) -> bool {
        let result = tokio::process::Command::new(self.which_command)
            .arg(self.get_command(program))
            .output()
            .await;

        matches!(result, Ok(output) if output.status.success())
    }

    /// True when every program in `programs` is installed
    pub async fn all_available(&self, programs: &[&str]) -> bool {
        for program in programs {
            if !self.is_command_available(program).await {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_programs_get_platform_suffix() {
        let platform = PlatformCommands::instance();

        for program in MAGICK_PROGRAMS {
            let executable = platform.get_command(program);
            assert!(executable.starts_with(program));
            assert!(executable.ends_with(std::env::consts::EXE_SUFFIX));
        }

        assert_eq!(platform.get_command("pngquant"), "pngquant");
        assert!(!platform.which_command.is_empty());
    }

    #[tokio::test]
    async fn test_command_availability() {
        let platform = PlatformCommands::instance();

        // The tool may or may not be installed; only a missing one has a known answer
        let _ = platform.is_command_available("gm").await;
        let missing = "surely-not-an-installed-tool-4f1c";
        assert!(!platform.is_command_available(missing).await);
        assert!(!platform.all_available(&["gm", missing]).await);
        assert!(platform.all_available(&[]).await);
    }
}
