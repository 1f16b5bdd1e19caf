//! DMG appearance customization using AppleScript.
//!
//! Handles all DMG customization features including:
//! - Mounting the read-write image
//! - Copying the background image and volume icon
//! - Running AppleScript to set window geometry and icon positions
//! - Detaching the image after customization

use super::{DmgLayout, HDIUTIL};
use crate::{
    bail,
    bundler::{
        builder::tool_detection::SETFILE,
        error::{Context, Error, Result},
        utils::{fs, process},
    },
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

const OSASCRIPT: &str = "/usr/bin/osascript";

/// Folder holding the background picture inside the volume.
const BACKGROUND_DIR: &str = ".background";

/// A mounted read-write image.
pub struct Mounted {
    pub mount_point: PathBuf,
}

impl Mounted {
    /// Last component of the mount point, e.g. `Lungo 1` for `/Volumes/Lungo 1`.
    pub fn volume_name(&self) -> Result<&str> {
        self.mount_point
            .file_name()
            .and_then(|n| n.to_str())
            .context("mount point has no volume name")
    }
}

/// Name to address the volume by in Finder.
///
/// When another volume with the same title is already mounted, hdiutil
/// mounts this one at `/Volumes/<title> 1` while Finder still calls both
/// disks `<title>`. The disk cannot be addressed reliably then.
pub fn finder_disk_name<'a>(mount_name: &str, title: &'a str) -> Option<&'a str> {
    (mount_name == title).then_some(title)
}

/// Apply layout customizations to a read-write image.
///
/// # Process
/// 1. Mount DMG in read-write mode
/// 2. Copy background image to .background folder
/// 3. Install the volume icon (if any)
/// 4. Run AppleScript to customize window appearance
/// 5. Detach DMG
///
/// The image is detached even if a step in between fails. Returns whether
/// the Finder window layout was applied.
pub async fn apply_dmg_customizations(
    dmg_path: &Path,
    layout: &DmgLayout,
    background: &Path,
    volume_icon: Option<&Path>,
) -> Result<bool> {
    log::info!("Applying DMG customizations...");

    let mounted = mount_dmg_rw(dmg_path).await?;
    let result = customize_volume(&mounted, layout, background, volume_icon).await;
    let detached = detach_dmg(&mounted.mount_point).await;

    let laid_out = result?;
    detached?;

    log::info!("✓ DMG customizations applied");
    Ok(laid_out)
}

async fn customize_volume(
    mounted: &Mounted,
    layout: &DmgLayout,
    background: &Path,
    volume_icon: Option<&Path>,
) -> Result<bool> {
    let mount_point = &mounted.mount_point;

    let bg_filename = background
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid background image path")?;
    let dest_bg = mount_point.join(BACKGROUND_DIR).join(bg_filename);
    fs::copy_file(background, &dest_bg).await?;
    log::debug!("Copied background image to {}", dest_bg.display());

    if let Some(icon) = volume_icon {
        install_volume_icon(mount_point, icon).await?;
    }

    let Some(disk) = finder_disk_name(mounted.volume_name()?, &layout.title) else {
        log::warn!(
            "A volume named \"{}\" is already mounted, skipping the window layout",
            layout.title
        );
        return Ok(false);
    };
    let script = layout_script(layout, disk, bg_filename);
    run_applescript(&script).await
}

/// Copies the icon to `.VolumeIcon.icns` and flags the volume as having a custom icon.
async fn install_volume_icon(mount_point: &Path, icon: &Path) -> Result<()> {
    let dest = mount_point.join(".VolumeIcon.icns");
    fs::copy_file(icon, &dest).await?;

    match SETFILE.as_deref() {
        Some(setfile) => {
            process::run(
                &setfile.to_string_lossy(),
                [OsStr::new("-a"), OsStr::new("C"), mount_point.as_os_str()],
            )
            .await
            .context("marking volume icon")?;
        }
        None => log::warn!("SetFile not found, the volume icon may not be shown"),
    }

    Ok(())
}

/// Extracts the `/Volumes/...` mount point from `hdiutil attach` output.
///
/// Each line is `/dev/diskXsY <TAB> <type> <TAB> <mount point>`.
pub fn parse_mount_point(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .filter_map(|line| line.find("/Volumes/").map(|idx| line[idx..].trim_end()))
        .last()
        .map(PathBuf::from)
}

/// Mount DMG in read-write mode and return the mount point.
async fn mount_dmg_rw(dmg_path: &Path) -> Result<Mounted> {
    log::debug!("Mounting DMG for customization...");

    let stdout = process::run_stdout(
        HDIUTIL,
        [
            OsStr::new("attach"),
            dmg_path.as_os_str(),
            OsStr::new("-readwrite"),
            OsStr::new("-noverify"),
            OsStr::new("-noautoopen"),
        ],
    )
    .await
    .context("mounting DMG")?;

    let mount_point = parse_mount_point(&stdout)
        .ok_or_else(|| Error::GenericError("Could not find mount point in hdiutil output".into()))?;

    // Wait for mount to be ready
    let max_retries = 10;
    for _ in 0..max_retries {
        if mount_point.exists() {
            log::debug!("DMG mounted at {}", mount_point.display());
            return Ok(Mounted { mount_point });
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    bail!(
        "DMG mount point {} not found after {} retries",
        mount_point.display(),
        max_retries
    );
}

/// Escape special characters for AppleScript string literals
///
/// Escapes backslashes and double quotes to prevent script injection
/// and syntax errors when names contain special characters.
pub fn escape_applescript_string(s: &str) -> String {
    s.replace('\\', r"\\").replace('"', r#"\""#)
}

/// Builds the Finder script that lays out the installer window.
pub fn layout_script(layout: &DmgLayout, volume_name: &str, background_file: &str) -> String {
    let left = layout.window_position.x;
    let top = layout.window_position.y;

    format!(
        r#"
        tell application "Finder"
            tell disk "{volume_name}"
                open
                set current view of container window to icon view
                set toolbar visible of container window to false
                set statusbar visible of container window to false
                set bounds of container window to {{{left}, {top}, {right}, {bottom}}}
                set viewOptions to icon view options of container window
                set arrangement of viewOptions to not arranged
                set icon size of viewOptions to {icon_size}
                set background picture of viewOptions to file "{background_dir}:{background_file}"
                set position of item "{app_name}" to {{{app_x}, {app_y}}}
                set position of item "Applications" to {{{folder_x}, {folder_y}}}
                close
                open
                update without registering applications
                delay 2
            end tell
        end tell
        "#,
        volume_name = escape_applescript_string(volume_name),
        right = left + layout.window_size.width,
        bottom = top + layout.window_size.height,
        icon_size = layout.icon_size,
        background_dir = BACKGROUND_DIR,
        background_file = escape_applescript_string(background_file),
        app_name = escape_applescript_string(&layout.app_name),
        app_x = layout.app_position.x,
        app_y = layout.app_position.y,
        folder_x = layout.applications_position.x,
        folder_y = layout.applications_position.y,
    )
}

async fn run_applescript(script: &str) -> Result<bool> {
    log::debug!("Running AppleScript to customize DMG window...");

    match process::run(OSASCRIPT, [OsStr::new("-e"), OsStr::new(script)]).await {
        Ok(_) => Ok(true),
        Err(Error::ToolFailed { stderr, .. }) => {
            // Finder automation may be denied on headless hosts; the image stays usable.
            log::warn!("AppleScript execution had issues: {}", stderr);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Detach (unmount) DMG, forcing it when Finder still holds the volume.
async fn detach_dmg(mount_point: &Path) -> Result<()> {
    log::debug!("Detaching DMG...");

    // Wait for .DS_Store to be written
    tokio::time::sleep(Duration::from_secs(2)).await;

    let detach = process::run(HDIUTIL, [OsStr::new("detach"), mount_point.as_os_str()]).await;
    if let Err(e) = detach {
        log::warn!("DMG detach had issues: {}", e);
        for attempt in 1..=3 {
            tokio::time::sleep(Duration::from_millis(500 * attempt)).await;
            let forced = process::run(
                HDIUTIL,
                [
                    OsStr::new("detach"),
                    mount_point.as_os_str(),
                    OsStr::new("-force"),
                ],
            )
            .await;
            if forced.is_ok() {
                return Ok(());
            }
        }
        bail!("Failed to detach {}", mount_point.display());
    }

    Ok(())
}
