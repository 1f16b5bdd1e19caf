//! Builder for constructing Settings.

use super::{DmgSettings, Settings};
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// Only the application path is required. The destination and license
/// directory fall back to the current working directory.
#[derive(Default)]
pub struct SettingsBuilder {
    app_path: Option<PathBuf>,
    destination: Option<PathBuf>,
    overwrite: bool,
    signing_identity: Option<String>,
    license_dir: Option<PathBuf>,
    dmg: DmgSettings,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the `.app` bundle to package.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn app_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.app_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output directory.
    ///
    /// Default: current working directory
    pub fn destination<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.destination = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace an existing image with the same file name.
    ///
    /// Default: false
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the code signing identity.
    ///
    /// Default: None (automatic selection)
    pub fn signing_identity(mut self, identity: Option<String>) -> Self {
        self.signing_identity = identity.filter(|i| !i.trim().is_empty());
        self
    }

    /// Sets the directory searched for license agreement sources.
    ///
    /// Default: current working directory
    pub fn license_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.license_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the disk image layout.
    ///
    /// Default: [`DmgSettings::default`]
    pub fn dmg_settings(mut self, dmg: DmgSettings) -> Self {
        self.dmg = dmg;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `app_path` is missing or the current directory
    /// cannot be determined when a default is needed.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::{Context, ErrorExt};

        let app_path = self.app_path.context("app_path is required")?;

        let cwd = match (&self.destination, &self.license_dir) {
            (Some(_), Some(_)) => None,
            _ => Some(std::env::current_dir().fs_context("reading current directory", ".")?),
        };

        let destination = match self.destination {
            Some(dest) => dest,
            None => cwd.clone().context("current directory unavailable")?,
        };
        let license_dir = match self.license_dir {
            Some(dir) => dir,
            None => cwd.context("current directory unavailable")?,
        };

        Ok(Settings::new(
            app_path,
            destination,
            self.overwrite,
            self.signing_identity,
            license_dir,
            self.dmg,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_path_is_required() {
        let err = SettingsBuilder::new().build().unwrap_err();
        assert_eq!(err.to_string(), "app_path is required");
    }

    #[test]
    fn destination_defaults_to_current_directory() {
        let settings = SettingsBuilder::new().app_path("Lungo.app").build().unwrap();
        assert_eq!(settings.destination(), std::env::current_dir().unwrap());
        assert_eq!(settings.license_dir(), std::env::current_dir().unwrap());
    }

    #[test]
    fn blank_identity_means_automatic() {
        let settings = SettingsBuilder::new()
            .app_path("Lungo.app")
            .destination("/tmp")
            .license_dir("/tmp")
            .signing_identity(Some("  ".into()))
            .build()
            .unwrap();
        assert_eq!(settings.signing_identity(), None);
    }
}
