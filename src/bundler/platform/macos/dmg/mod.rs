//! macOS DMG disk image creator.
//!
//! Creates drag-to-install DMG files using the native hdiutil tool.
//! The DMG includes the .app bundle and an Applications symlink laid out
//! over a background picture.
//!
//! # Architecture
//!
//! This module is organized into logical submodules:
//! - `format` - Final codec selection (ULFO / UDZO)
//! - `creation` - Staging and read-write image creation using hdiutil
//! - `customization` - DMG appearance customization (background, window, icons)
//! - `conversion` - Format conversion (UDRW → final codec)
//! - `license` - Software license agreement resources
//! - `file_icon` - Custom Finder icon of the .dmg file

mod conversion;
mod creation;
mod customization;
mod file_icon;
mod format;
mod license;

use crate::bundler::{
    error::Result,
    settings::{DmgSettings, Position, WindowSize},
};
use std::path::Path;

pub use conversion::convert_dmg;
pub use creation::{Staging, create_rw_image, stage_contents};
pub use customization::{apply_dmg_customizations, layout_script};
pub use file_icon::set_file_icon;
pub use format::DmgFormat;
pub use license::{LicenseSource, add_license_agreement_if_needed, find_license};

pub(crate) const HDIUTIL: &str = "/usr/bin/hdiutil";

/// Resolved Finder window layout for one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DmgLayout {
    /// Volume title
    pub title: String,
    /// File name of the bundle inside the volume, e.g. `Lungo.app`
    pub app_name: String,
    pub window_position: Position,
    pub window_size: WindowSize,
    pub icon_size: u32,
    pub app_position: Position,
    pub applications_position: Position,
}

impl DmgLayout {
    /// Combines configured layout settings with the resolved title and bundle name.
    pub fn new(settings: &DmgSettings, title: String, app_name: String) -> Self {
        Self {
            title,
            app_name,
            window_position: settings.window_position,
            window_size: settings.window_size,
            icon_size: settings.icon_size,
            app_position: settings.app_position,
            applications_position: settings.applications_position,
        }
    }
}

/// Build the laid-out image at `dmg_path` in the final `format`.
///
/// # Process
/// 1. Stage the .app and an Applications symlink
/// 2. Create a read-write image sized for the contents and artwork
/// 3. Mount it and apply background, volume icon and window layout
/// 4. Convert to the compressed codec
///
/// Intermediate files live in `work_dir`. Returns whether the Finder window
/// layout was applied; the image is usable either way.
pub async fn build_image(
    app_bundle: &Path,
    dmg_path: &Path,
    layout: &DmgLayout,
    background: &Path,
    volume_icon: Option<&Path>,
    format: DmgFormat,
    work_dir: &Path,
) -> Result<bool> {
    let staging = stage_contents(app_bundle, work_dir).await?;

    let mut artwork_bytes = file_len(background).await;
    if let Some(icon) = volume_icon {
        artwork_bytes += file_len(icon).await;
    }

    let rw_path = work_dir.join("layout.dmg");
    create_rw_image(&staging, &layout.title, artwork_bytes, &rw_path).await?;
    drop(staging);

    let laid_out = apply_dmg_customizations(&rw_path, layout, background, volume_icon).await?;
    convert_dmg(&rw_path, dmg_path, format).await?;

    log::info!("✓ Created {} DMG: {}", format, dmg_path.display());
    Ok(laid_out)
}

async fn file_len(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_takes_geometry_from_settings() {
        let settings = DmgSettings {
            icon_size: 128,
            app_position: Position::new(10, 20),
            ..Default::default()
        };
        let layout = DmgLayout::new(&settings, "Lungo".into(), "Lungo.app".into());
        assert_eq!(layout.icon_size, 128);
        assert_eq!(layout.app_position, Position::new(10, 20));
        assert_eq!(layout.applications_position, Position::new(480, 170));
        assert_eq!(layout.title, "Lungo");
    }
}
