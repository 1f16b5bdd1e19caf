//! Application metadata from the bundle's Info.plist.

use crate::bundler::{
    Error, Result,
    error::{Context, ErrorExt},
    utils::process,
};
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const PLUTIL: &str = "/usr/bin/plutil";

/// Minimum system version assumed when the bundle does not declare one.
pub const DEFAULT_MINIMUM_SYSTEM_VERSION: &str = "10.11";

/// Raw Info.plist keys the pipeline cares about.
#[derive(Debug, Default, Deserialize)]
struct InfoPlist {
    #[serde(rename = "CFBundleDisplayName")]
    display_name: Option<String>,
    #[serde(rename = "CFBundleName")]
    bundle_name: Option<String>,
    #[serde(rename = "CFBundleShortVersionString")]
    short_version: Option<String>,
    #[serde(rename = "CFBundleIconFile")]
    icon_file: Option<String>,
    #[serde(rename = "LSMinimumSystemVersion")]
    minimum_system_version: Option<String>,
}

/// Application metadata extracted from `Contents/Info.plist`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppInfo {
    /// Display name (`CFBundleDisplayName`, falling back to `CFBundleName`)
    pub name: String,

    /// Marketing version (`CFBundleShortVersionString`)
    pub version: String,

    /// Icon file name from `CFBundleIconFile`, if any
    pub icon_file: Option<String>,

    /// `LSMinimumSystemVersion`, if declared and non-empty
    pub minimum_system_version: Option<String>,
}

impl AppInfo {
    /// File name of the produced image: `"{name} {version}.dmg"`.
    pub fn dmg_filename(&self) -> String {
        format!("{} {}.dmg", self.name, self.version)
    }

    /// Minimum system version, defaulting to 10.11.
    pub fn minimum_system_version_or_default(&self) -> &str {
        self.minimum_system_version
            .as_deref()
            .unwrap_or(DEFAULT_MINIMUM_SYSTEM_VERSION)
    }

    /// Location of the app icon inside the bundle, if the app declares one.
    ///
    /// `CFBundleIconFile` may be given with or without the `.icns` extension.
    pub fn icon_path(&self, app_path: &Path) -> Option<PathBuf> {
        let icon = self.icon_file.as_deref()?;
        let stem = icon.strip_suffix(".icns").unwrap_or(icon);
        Some(
            app_path
                .join("Contents/Resources")
                .join(format!("{stem}.icns")),
        )
    }

    fn from_plist(info: InfoPlist) -> Result<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let name = non_empty(info.display_name)
            .or_else(|| non_empty(info.bundle_name))
            .ok_or_else(|| {
                Error::MissingMetadata(
                    "The app must have `CFBundleDisplayName` or `CFBundleName` defined in its `Info.plist`."
                        .into(),
                )
            })?;

        let version = non_empty(info.short_version).ok_or_else(|| {
            Error::MissingMetadata(
                "The app must have `CFBundleShortVersionString` defined in its `Info.plist`."
                    .into(),
            )
        })?;

        Ok(Self {
            name,
            version,
            icon_file: non_empty(info.icon_file),
            minimum_system_version: non_empty(info.minimum_system_version),
        })
    }
}

/// Path of the Info.plist inside an app bundle.
pub fn info_plist_path(app_path: &Path) -> PathBuf {
    app_path.join("Contents/Info.plist")
}

/// Parses Info.plist bytes (XML or binary).
pub fn parse_app_info(bytes: &[u8]) -> Result<AppInfo> {
    let info: InfoPlist = plist::from_bytes(bytes)?;
    AppInfo::from_plist(info)
}

/// Loads application metadata from `<app>/Contents/Info.plist`.
///
/// Plists the `plist` crate cannot read (for example OpenStep-style
/// files) are converted to XML with `plutil` and parsed again.
pub async fn load_app_info(app_path: &Path) -> Result<AppInfo> {
    let plist_path = info_plist_path(app_path);

    let bytes = match tokio::fs::read(&plist_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::AppNotFound(app_path.to_path_buf()));
        }
        Err(e) => return Err(e).fs_context("reading Info.plist", &plist_path),
    };

    match plist::from_bytes::<InfoPlist>(&bytes) {
        Ok(info) => AppInfo::from_plist(info),
        Err(e) => {
            log::debug!(
                "Falling back to plutil for {}: {}",
                plist_path.display(),
                e
            );
            let xml = process::run_stdout(
                PLUTIL,
                [
                    OsStr::new("-convert"),
                    OsStr::new("xml1"),
                    OsStr::new("-o"),
                    OsStr::new("-"),
                    plist_path.as_os_str(),
                ],
            )
            .await
            .context("converting Info.plist with plutil")?;
            parse_app_info(xml.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plist(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
{body}
</dict>
</plist>"#
        )
    }

    #[test]
    fn display_name_wins_over_bundle_name() {
        let info = parse_app_info(
            plist(
                "<key>CFBundleName</key><string>lungo</string>
                 <key>CFBundleDisplayName</key><string>Lungo</string>
                 <key>CFBundleShortVersionString</key><string>1.2.0</string>",
            )
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(info.name, "Lungo");
        assert_eq!(info.dmg_filename(), "Lungo 1.2.0.dmg");
    }

    #[test]
    fn bundle_name_is_used_without_display_name() {
        let info = parse_app_info(
            plist(
                "<key>CFBundleName</key><string>Lungo</string>
                 <key>CFBundleShortVersionString</key><string>3.0</string>",
            )
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(info.dmg_filename(), "Lungo 3.0.dmg");
        assert_eq!(info.icon_file, None);
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = parse_app_info(
            plist("<key>CFBundleShortVersionString</key><string>1.0</string>").as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingMetadata(ref m) if m.contains("CFBundleDisplayName")));
    }

    #[test]
    fn missing_version_is_rejected() {
        let err =
            parse_app_info(plist("<key>CFBundleName</key><string>Lungo</string>").as_bytes())
                .unwrap_err();
        assert!(matches!(err, Error::MissingMetadata(ref m) if m.contains("CFBundleShortVersionString")));
    }

    #[test]
    fn minimum_system_version_defaults_when_empty() {
        let info = parse_app_info(
            plist(
                "<key>CFBundleName</key><string>Lungo</string>
                 <key>CFBundleShortVersionString</key><string>1.0</string>
                 <key>LSMinimumSystemVersion</key><string></string>",
            )
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(info.minimum_system_version_or_default(), "10.11");
    }

    #[test]
    fn icon_path_accepts_name_with_or_without_extension() {
        let mut info = AppInfo {
            name: "Lungo".into(),
            version: "1.0".into(),
            icon_file: Some("AppIcon.icns".into()),
            minimum_system_version: None,
        };
        let app = Path::new("/Apps/Lungo.app");
        let expected = PathBuf::from("/Apps/Lungo.app/Contents/Resources/AppIcon.icns");
        assert_eq!(info.icon_path(app), Some(expected.clone()));

        info.icon_file = Some("AppIcon".into());
        assert_eq!(info.icon_path(app), Some(expected));
    }

    #[tokio::test]
    async fn missing_bundle_reports_app_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("Missing.app");
        let err = load_app_info(&app).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Could not find `{}`", app.display()));
    }

    #[tokio::test]
    async fn loads_xml_plist_from_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("Lungo.app");
        std::fs::create_dir_all(app.join("Contents")).unwrap();
        std::fs::write(
            info_plist_path(&app),
            plist(
                "<key>CFBundleName</key><string>Lungo</string>
                 <key>CFBundleShortVersionString</key><string>2.1.0</string>
                 <key>CFBundleIconFile</key><string>AppIcon</string>
                 <key>LSMinimumSystemVersion</key><string>10.13</string>",
            ),
        )
        .unwrap();

        let info = load_app_info(&app).await.unwrap();
        assert_eq!(info.version, "2.1.0");
        assert_eq!(info.minimum_system_version_or_default(), "10.13");
        assert_eq!(info.icon_file.as_deref(), Some("AppIcon"));
    }
}
