//! Custom Finder icon for the `.dmg` file itself.
//!
//! The icon lives in the file's resource fork: `sips -i` turns a copy of the
//! ICNS file into a resource-bearing file, `DeRez` extracts its `icns`
//! resource as Rez source, `Rez -append` writes it onto the image and
//! `SetFile -a C` sets the custom-icon Finder flag.

use crate::bundler::{
    builder::tool_detection::{DEREZ, REZ, SETFILE, SIPS},
    error::{Context, ErrorExt, Result},
    utils::process,
};
use std::ffi::OsStr;
use std::path::Path;

/// Replaces the Finder icon of `dmg_path` with `icon`.
///
/// Returns `false` without touching the image when the developer tools
/// needed for resource editing are not installed.
pub async fn set_file_icon(dmg_path: &Path, icon: &Path, work_dir: &Path) -> Result<bool> {
    let (Some(sips), Some(derez), Some(rez), Some(setfile)) = (
        SIPS.as_deref(),
        DEREZ.as_deref(),
        REZ.as_deref(),
        SETFILE.as_deref(),
    ) else {
        log::warn!("Xcode command line tools not found, keeping the default DMG file icon");
        return Ok(false);
    };

    let icon_copy = work_dir.join("dmg-icon.icns");
    tokio::fs::copy(icon, &icon_copy)
        .await
        .fs_context("copying icon", &icon_copy)?;

    process::run(
        &sips.to_string_lossy(),
        [OsStr::new("-i"), icon_copy.as_os_str()],
    )
    .await
    .context("adding icon resource")?;

    let resources = process::run_stdout(
        &derez.to_string_lossy(),
        [OsStr::new("-only"), OsStr::new("icns"), icon_copy.as_os_str()],
    )
    .await
    .context("extracting icon resource")?;

    let rez_source = work_dir.join("dmg-icon.r");
    tokio::fs::write(&rez_source, resources)
        .await
        .fs_context("writing icon resource", &rez_source)?;

    process::run(
        &rez.to_string_lossy(),
        [
            OsStr::new("-append"),
            rez_source.as_os_str(),
            OsStr::new("-o"),
            dmg_path.as_os_str(),
        ],
    )
    .await
    .context("appending icon resource to image")?;

    process::run(
        &setfile.to_string_lossy(),
        [OsStr::new("-a"), OsStr::new("C"), dmg_path.as_os_str()],
    )
    .await
    .context("setting custom icon flag")?;

    log::info!("✓ Replaced DMG file icon");
    Ok(true)
}
