//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with validation
//! and conversion into bundler [`Settings`](crate::bundler::Settings).

use crate::bundler::{
    DmgSettings, Settings, SettingsBuilder,
    settings::{MAX_TITLE_LEN, Position, WindowSize},
};
use clap::Parser;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Package a macOS application into a drag-to-install disk image
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_dmg",
    version,
    about = "Package a macOS .app into a drag-to-install DMG",
    long_about = "Creates \"<name> <version>.dmg\" from a macOS application bundle.

The image shows the app next to an Applications link over a background
picture, uses the app icon composed onto a disk icon, carries an optional
license agreement and is code signed when an identity is available.

Usage:
  kodegen_bundler_dmg Build/Lungo.app
  kodegen_bundler_dmg Build/Lungo.app Build/Releases --overwrite
  kodegen_bundler_dmg Lungo.app --identity \"Developer ID Application: Example Inc (TEAM123456)\"

Exit code 0 = image created and signed.
Exit code 2 = image created but not code signed.
Exit code 1 = no image was created."
)]
pub struct Args {
    /// Path to the .app bundle
    #[arg(value_name = "APP")]
    pub app: PathBuf,

    /// Directory the image is written to
    #[arg(value_name = "DESTINATION", default_value = ".")]
    pub destination: PathBuf,

    /// Replace an existing image with the same name
    #[arg(long)]
    pub overwrite: bool,

    /// Code signing identity (defaults to the first Developer ID Application identity)
    #[arg(long, value_name = "IDENTITY", env = "DMG_SIGNING_IDENTITY")]
    pub identity: Option<String>,

    /// Volume title (defaults to the application name)
    #[arg(long, value_name = "TITLE")]
    pub dmg_title: Option<String>,

    /// Background picture for the Finder window
    #[arg(long, value_name = "PATH")]
    pub background: Option<PathBuf>,

    /// Finder window width
    #[arg(long, default_value_t = 660)]
    pub width: u32,

    /// Finder window height
    #[arg(long, default_value_t = 400)]
    pub height: u32,

    /// Horizontal position of the app icon
    #[arg(long, default_value_t = 180)]
    pub app_x: u32,

    /// Vertical position of the app icon
    #[arg(long, default_value_t = 170)]
    pub app_y: u32,

    /// Horizontal position of the Applications link
    #[arg(long, default_value_t = 480)]
    pub folder_x: u32,

    /// Vertical position of the Applications link
    #[arg(long, default_value_t = 170)]
    pub folder_y: u32,

    /// Icon the app icon is composed onto
    #[arg(long, value_name = "PATH")]
    pub base_icon: Option<PathBuf>,

    /// Show detailed progress
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "Window size must be positive, got {}x{}",
                self.width, self.height
            ));
        }

        if let Some(title) = &self.dmg_title {
            let len = title.chars().count();
            if title.trim().is_empty() {
                return Err("Title cannot be empty".to_string());
            }
            if len > MAX_TITLE_LEN {
                return Err(format!(
                    "The disk image title cannot exceed {MAX_TITLE_LEN} characters (got {len}): {title}"
                ));
            }
        }

        if let Some(background) = &self.background
            && !background.is_file()
        {
            return Err(format!(
                "Background picture not found: {}",
                background.display()
            ));
        }

        Ok(())
    }

    /// Builds pipeline settings from validated arguments.
    pub fn to_settings(&self) -> crate::bundler::Result<Settings> {
        let mut dmg = DmgSettings {
            title: self.dmg_title.clone(),
            background: self.background.as_deref().map(absolute).transpose()?,
            window_size: WindowSize {
                width: self.width,
                height: self.height,
            },
            app_position: Position::new(self.app_x, self.app_y),
            applications_position: Position::new(self.folder_x, self.folder_y),
            ..Default::default()
        };
        if let Some(base_icon) = &self.base_icon {
            dmg.base_disk_icon = absolute(base_icon)?;
        }

        SettingsBuilder::new()
            .app_path(absolute(&self.app)?)
            .destination(absolute(&self.destination)?)
            .overwrite(self.overwrite)
            .signing_identity(self.identity.clone())
            .dmg_settings(dmg)
            .build()
    }
}

fn absolute(path: &Path) -> crate::bundler::Result<PathBuf> {
    Ok(path.absolutize()?.into_owned())
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// `log` filter matching the requested verbosity, unless `RUST_LOG` is set.
    pub fn log_filter(&self) -> log::LevelFilter {
        if self.output.is_quiet() {
            log::LevelFilter::Error
        } else if self.output.is_verbose() {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("kodegen_bundler_dmg").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_match_standard_layout() {
        let args = parse(&["Lungo.app"]);
        assert_eq!(args.destination, PathBuf::from("."));
        assert_eq!((args.width, args.height), (660, 400));
        assert_eq!((args.app_x, args.app_y), (180, 170));
        assert_eq!((args.folder_x, args.folder_y), (480, 170));
        assert!(!args.overwrite);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn rejects_zero_window() {
        let args = parse(&["Lungo.app", "--width", "0"]);
        assert!(args.validate().unwrap_err().contains("0x400"));
    }

    #[test]
    fn rejects_long_title() {
        let args = parse(&["Lungo.app", "--dmg-title", "A Very Long Application Name"]);
        assert!(args.validate().unwrap_err().contains("27"));
    }

    #[test]
    fn rejects_missing_background() {
        let args = parse(&["Lungo.app", "--background", "/nonexistent/bg.png"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(
            Args::try_parse_from(["kodegen_bundler_dmg", "Lungo.app", "-v", "-q"]).is_err()
        );
    }

    #[test]
    fn settings_carry_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let args = parse(&[
            "Lungo.app",
            tmp.path().to_str().unwrap(),
            "--overwrite",
            "--identity",
            "Mac Developer",
            "--app-x",
            "100",
        ]);
        let settings = args.to_settings().unwrap();
        assert!(settings.app_path().is_absolute());
        assert_eq!(settings.destination(), tmp.path());
        assert!(settings.overwrite());
        assert_eq!(settings.signing_identity(), Some("Mac Developer"));
        assert_eq!(settings.dmg().app_position, Position::new(100, 170));
        assert_eq!(settings.dmg().title, None);
    }
}
