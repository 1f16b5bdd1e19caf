//! Main bundler orchestration and coordination.
//!
//! This module provides the [`Bundler`] orchestrator that sequences the DMG
//! pipeline: metadata, drive icon, image layout, license agreement, icon
//! replacement and signing.

use crate::{
    bundler::{
        Error, Result, Settings,
        error::ErrorExt,
        platform::macos::dmg::{self, DmgFormat, DmgLayout},
        resources::{
            background,
            icons::{self, VolumeIcon},
        },
        settings::MAX_TITLE_LEN,
        utils::fs,
    },
    metadata::{self, AppInfo},
};
use std::path::{Path, PathBuf};

use super::{checksum::calculate_sha256, signing, signing::SigningStatus};

/// Pipeline stage reported to progress observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    ReadingMetadata,
    ComposingIcon,
    CreatingImage,
    AddingLicense,
    ReplacingIcon,
    Signing,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Step::ReadingMetadata => "Reading application metadata",
            Step::ComposingIcon => "Creating icon",
            Step::CreatingImage => "Creating DMG",
            Step::AddingLicense => "Adding license agreement",
            Step::ReplacingIcon => "Replacing DMG icon",
            Step::Signing => "Code signing DMG",
        };
        f.write_str(label)
    }
}

/// Event reported to progress observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// A pipeline stage is starting.
    Step(Step),
    /// A decision worth showing to the user.
    Info(String),
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Progress::Step(step) => write!(f, "{step}"),
            Progress::Info(message) => f.write_str(message),
        }
    }
}

type ProgressFn = Box<dyn Fn(Progress) + Send + Sync>;

/// Result of a successful pipeline run.
///
/// A report is also produced when signing failed: the image is still valid
/// and [`BundleReport::signing`] carries the reason.
#[derive(Clone, Debug)]
pub struct BundleReport {
    /// Absolute path of the created image
    pub dmg_path: PathBuf,
    /// `"{name} {version}.dmg"`
    pub filename: String,
    /// Codec of the final image
    pub format: DmgFormat,
    /// Size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the image
    pub checksum: String,
    /// Whether Finder applied the window layout
    pub layout_applied: bool,
    pub signing: SigningStatus,
}

impl BundleReport {
    /// Process exit code for this outcome: 0 when signed, 2 when unsigned.
    pub fn exit_code(&self) -> i32 {
        if self.signing.is_signed() { 0 } else { 2 }
    }
}

/// Main bundler orchestrator.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_dmg::bundler::{Bundler, Settings};
///
/// # async fn example(settings: Settings) -> kodegen_bundler_dmg::bundler::Result<()> {
/// let report = Bundler::new(settings)
///     .on_progress(|event| println!("{event}"))
///     .bundle()
///     .await?;
/// std::process::exit(report.exit_code());
/// # }
/// ```
pub struct Bundler {
    settings: Settings,
    progress: Option<ProgressFn>,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Bundler {
    /// Creates a new bundler with the given settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            progress: None,
        }
    }

    /// Registers a callback invoked at the start of each pipeline stage
    /// and for notable decisions.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    fn notify(&self, event: Progress) {
        log::debug!("{}", event);
        if let Some(progress) = &self.progress {
            progress(event);
        }
    }

    fn report(&self, step: Step) {
        self.notify(Progress::Step(step));
    }

    /// Runs the complete pipeline.
    ///
    /// # Errors
    ///
    /// Any failure before signing aborts the run. Signing failures are
    /// reported through [`BundleReport::signing`] instead, except a
    /// signature that cannot be verified, which is returned as
    /// [`Error::NotCodeSigned`].
    pub async fn bundle(&self) -> Result<BundleReport> {
        let app_path = self.settings.app_path();

        self.report(Step::ReadingMetadata);
        let info = metadata::load_app_info(app_path).await?;

        let title = resolve_title(self.settings.dmg().title.as_deref(), &info)?;

        let minimum = info.minimum_system_version_or_default();
        let format = DmgFormat::for_minimum_system_version(minimum);
        self.notify(Progress::Info(format!(
            "Minimum runtime {minimum} detected, using {format} format"
        )));

        let filename = info.dmg_filename();
        let dmg_path = self.settings.destination().join(&filename);
        self.prepare_target(&dmg_path).await?;

        let work_dir = tempfile::tempdir()?;
        let volume_icon = self.volume_icon(&info, work_dir.path()).await?;

        self.report(Step::CreatingImage);
        let background = self.background(work_dir.path()).await?;
        let layout = DmgLayout::new(self.settings.dmg(), title, bundle_file_name(app_path)?);
        let layout_applied = dmg::build_image(
            app_path,
            &dmg_path,
            &layout,
            &background,
            volume_icon.as_ref().map(|icon| icon.path()),
            format,
            work_dir.path(),
        )
        .await?;

        self.report(Step::AddingLicense);
        dmg::add_license_agreement_if_needed(
            &dmg_path,
            format,
            self.settings.license_dir(),
            work_dir.path(),
        )
        .await?;

        if let Some(icon) = &volume_icon {
            self.report(Step::ReplacingIcon);
            dmg::set_file_icon(&dmg_path, icon.path(), work_dir.path()).await?;
        }

        self.report(Step::Signing);
        let signing =
            signing::sign_and_verify(&dmg_path, self.settings.signing_identity()).await?;

        let size = tokio::fs::metadata(&dmg_path)
            .await
            .fs_context("reading image metadata", &dmg_path)?
            .len();
        let checksum = calculate_sha256(&dmg_path).await?;

        Ok(BundleReport {
            dmg_path,
            filename,
            format,
            size,
            checksum,
            layout_applied,
            signing,
        })
    }

    /// Drive icon for the image.
    ///
    /// An app icon that is declared but missing or unreadable falls back to
    /// the plain base disk icon.
    async fn volume_icon(&self, info: &AppInfo, work_dir: &Path) -> Result<Option<VolumeIcon>> {
        let Some(app_icon) = info.icon_path(self.settings.app_path()) else {
            log::info!("No app icon declared, keeping the default volume icon");
            return Ok(None);
        };

        self.report(Step::ComposingIcon);
        icons::compose_volume_icon(
            &app_icon,
            &self.settings.dmg().base_disk_icon,
            &work_dir.join("composed.icns"),
        )
        .await
    }

    /// Removes an existing target when overwriting, otherwise refuses it.
    async fn prepare_target(&self, dmg_path: &Path) -> Result<()> {
        if self.settings.overwrite() {
            if fs::remove_file_if_exists(dmg_path).await? {
                log::info!("Removed existing {}", dmg_path.display());
            }
            Ok(())
        } else if dmg_path.exists() {
            Err(Error::TargetExists(dmg_path.to_path_buf()))
        } else {
            Ok(())
        }
    }

    /// Configured background, or a generated one written into `work_dir`.
    async fn background(&self, work_dir: &Path) -> Result<PathBuf> {
        let dmg = self.settings.dmg();
        if let Some(path) = &dmg.background {
            return Ok(path.clone());
        }

        let path = work_dir.join("background.png");
        background::write_default(
            &path,
            dmg.window_size.width,
            dmg.window_size.height,
            dmg.app_position.x,
            dmg.applications_position.x,
            dmg.app_position.y,
        )
        .await?;
        Ok(path)
    }
}

/// Volume title: the configured one or the application name, at most
/// [`MAX_TITLE_LEN`] characters.
fn resolve_title(configured: Option<&str>, info: &AppInfo) -> Result<String> {
    let title = configured.unwrap_or(&info.name).to_string();
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(Error::TitleTooLong {
            title,
            len,
            max: MAX_TITLE_LEN,
        });
    }
    Ok(title)
}

fn bundle_file_name(app_path: &Path) -> Result<String> {
    app_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::AppNotFound(app_path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::SettingsBuilder;

    fn info(name: &str) -> AppInfo {
        AppInfo {
            name: name.into(),
            version: "1.0".into(),
            icon_file: None,
            minimum_system_version: None,
        }
    }

    #[test]
    fn title_defaults_to_app_name() {
        assert_eq!(resolve_title(None, &info("Lungo")).unwrap(), "Lungo");
        assert_eq!(
            resolve_title(Some("Lungo Installer"), &info("Lungo")).unwrap(),
            "Lungo Installer"
        );
    }

    #[test]
    fn title_longer_than_limit_is_rejected() {
        let name = "A Very Long Application Name";
        assert_eq!(name.chars().count(), 28);
        assert!(matches!(
            resolve_title(None, &info(name)),
            Err(Error::TitleTooLong { len: 28, max: 27, .. })
        ));
        assert!(resolve_title(Some(&name[..27]), &info(name)).is_ok());
    }

    #[test]
    fn exit_code_follows_signing() {
        let mut report = BundleReport {
            dmg_path: PathBuf::from("/tmp/Lungo 1.0.dmg"),
            filename: "Lungo 1.0.dmg".into(),
            format: DmgFormat::Ulfo,
            size: 0,
            checksum: String::new(),
            layout_applied: true,
            signing: SigningStatus::Signed {
                authority: "Developer ID Application: Example Inc (TEAM123456)".into(),
            },
        };
        assert_eq!(report.exit_code(), 0);
        report.signing = SigningStatus::Unsigned {
            reason: "No suitable code signing identity found".into(),
        };
        assert_eq!(report.exit_code(), 2);
    }

    #[tokio::test]
    async fn existing_target_requires_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("Lungo 1.0.dmg");
        std::fs::write(&target, b"old").unwrap();

        let settings = SettingsBuilder::new()
            .app_path(tmp.path().join("Lungo.app"))
            .destination(tmp.path())
            .build()
            .unwrap();
        assert!(matches!(
            Bundler::new(settings).prepare_target(&target).await,
            Err(Error::TargetExists(_))
        ));

        let settings = SettingsBuilder::new()
            .app_path(tmp.path().join("Lungo.app"))
            .destination(tmp.path())
            .overwrite(true)
            .build()
            .unwrap();
        Bundler::new(settings).prepare_target(&target).await.unwrap();
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn declared_but_missing_app_icon_uses_base_icon() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("Lungo.app");
        std::fs::create_dir_all(app.join("Contents/Resources")).unwrap();

        let base = tmp.path().join("Removable.icns");
        let image =
            icns::Image::from_data(icns::PixelFormat::RGBA, 128, 128, vec![255; 128 * 128 * 4])
                .unwrap();
        let mut family = icns::IconFamily::new();
        family
            .add_icon_with_type(&image, icns::IconType::RGBA32_128x128)
            .unwrap();
        family.write(std::fs::File::create(&base).unwrap()).unwrap();

        let settings = SettingsBuilder::new()
            .app_path(&app)
            .destination(tmp.path())
            .dmg_settings(crate::bundler::DmgSettings {
                base_disk_icon: base.clone(),
                ..Default::default()
            })
            .build()
            .unwrap();
        let mut app_info = info("Lungo");
        app_info.icon_file = Some("AppIcon".into());

        let icon = Bundler::new(settings)
            .volume_icon(&app_info, tmp.path())
            .await
            .unwrap();
        assert_eq!(icon, Some(VolumeIcon::Base(base)));
    }

    #[tokio::test]
    async fn undeclared_app_icon_keeps_default_volume_icon() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .app_path(tmp.path().join("Lungo.app"))
            .destination(tmp.path())
            .build()
            .unwrap();
        let icon = Bundler::new(settings)
            .volume_icon(&info("Lungo"), tmp.path())
            .await
            .unwrap();
        assert_eq!(icon, None);
    }

    #[tokio::test]
    async fn reports_selected_format_to_observers() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("Lungo.app");
        std::fs::create_dir_all(app.join("Contents")).unwrap();
        std::fs::write(
            app.join("Contents/Info.plist"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>CFBundleName</key>
    <string>Lungo</string>
    <key>CFBundleShortVersionString</key>
    <string>1.0</string>
    <key>LSMinimumSystemVersion</key>
    <string>10.15</string>
</dict>
</plist>
"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("Lungo 1.0.dmg"), b"old").unwrap();

        let settings = SettingsBuilder::new()
            .app_path(&app)
            .destination(tmp.path())
            .build()
            .unwrap();
        let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = events.clone();
        let result = Bundler::new(settings)
            .on_progress(move |event| seen.lock().unwrap().push(event))
            .bundle()
            .await;

        assert!(matches!(result, Err(Error::TargetExists(_))));
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                Progress::Step(Step::ReadingMetadata),
                Progress::Info("Minimum runtime 10.15 detected, using ULFO format".into()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_app_fails_before_any_work() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .app_path(tmp.path().join("Missing.app"))
            .destination(tmp.path())
            .build()
            .unwrap();
        assert!(matches!(
            Bundler::new(settings).bundle().await,
            Err(Error::AppNotFound(_))
        ));
    }
}
