//! Core Settings struct and implementations.

use super::DmgSettings;
use std::path::{Path, PathBuf};

/// Main settings for the DMG pipeline.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder).
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_dmg::bundler::SettingsBuilder;
///
/// # fn example() -> kodegen_bundler_dmg::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .app_path("Build/Lungo.app")
///     .destination("Build/Releases")
///     .overwrite(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Path to the `.app` bundle.
    app_path: PathBuf,

    /// Directory the image is written to.
    destination: PathBuf,

    /// Replace an existing image with the same name.
    overwrite: bool,

    /// Requested code signing identity.
    ///
    /// None means pick a Developer ID or Mac Developer identity automatically.
    signing_identity: Option<String>,

    /// Directory searched for license agreement sources.
    license_dir: PathBuf,

    /// Window layout and icon configuration.
    dmg: DmgSettings,
}

impl Settings {
    /// Returns the application bundle path.
    pub fn app_path(&self) -> &Path {
        &self.app_path
    }

    /// Returns the output directory.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Whether an existing image may be replaced.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Returns the requested signing identity, if any.
    pub fn signing_identity(&self) -> Option<&str> {
        self.signing_identity.as_deref()
    }

    /// Returns the directory searched for `sla.r`, `license.rtf` or `license.txt`.
    pub fn license_dir(&self) -> &Path {
        &self.license_dir
    }

    /// Returns the disk image layout settings.
    pub fn dmg(&self) -> &DmgSettings {
        &self.dmg
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        app_path: PathBuf,
        destination: PathBuf,
        overwrite: bool,
        signing_identity: Option<String>,
        license_dir: PathBuf,
        dmg: DmgSettings,
    ) -> Self {
        Self {
            app_path,
            destination,
            overwrite,
            signing_identity,
            license_dir,
            dmg,
        }
    }
}
