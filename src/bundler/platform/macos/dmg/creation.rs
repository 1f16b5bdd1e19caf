//! Core DMG creation logic using hdiutil.
//!
//! Handles the fundamental DMG creation workflow including:
//! - Staging the .app bundle in a temporary directory
//! - Creating the Applications symlink
//! - Running hdiutil to generate a read-write image sized for customization

use super::HDIUTIL;
use crate::bundler::{
    error::{Context, Error, ErrorExt, Result},
    utils::{fs, process},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Headroom added to the staged size for the background, the volume icon
/// and Finder's `.DS_Store`.
const HEADROOM_BYTES: u64 = 20 * 1024 * 1024;

/// HFS+ allocation block size.
const BLOCK_SIZE: u64 = 4096;

/// Staging directory holding the image contents.
///
/// The directory is removed when this value is dropped.
pub struct Staging {
    dir: tempfile::TempDir,
    app_name: String,
}

impl Staging {
    /// Root of the image contents.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// File name of the staged bundle, e.g. `Lungo.app`.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

/// Copies the app and creates the `Applications -> /Applications` link.
pub async fn stage_contents(app_bundle: &Path, work_dir: &Path) -> Result<Staging> {
    let dir = tempfile::Builder::new()
        .prefix("dmg-contents")
        .tempdir_in(work_dir)
        .fs_context("creating staging directory", work_dir)?;

    let app_name = app_bundle
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid app bundle path")?
        .to_string();

    let staged_app = dir.path().join(&app_name);
    log::debug!("Copying .app to staging: {}", staged_app.display());
    fs::copy_dir(app_bundle, &staged_app)
        .await
        .with_context(|| {
            format!(
                "copying .app bundle to staging directory: {}",
                staged_app.display()
            )
        })?;

    // Create Applications symlink for drag-to-install UX
    let applications_link = dir.path().join("Applications");
    fs::symlink(Path::new("/Applications"), &applications_link)
        .fs_context("creating Applications symlink", &applications_link)?;

    Ok(Staging { dir, app_name })
}

/// Bytes the contents of `path` occupy on HFS+, without following symlinks.
///
/// Every file is rounded up to whole allocation blocks and every directory
/// and symlink takes one block.
pub async fn staged_size(path: &Path) -> Result<u64> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<u64> {
        let mut total = 0u64;
        for entry in walkdir::WalkDir::new(&path).follow_links(false) {
            let entry = entry?;
            total += if entry.file_type().is_file() {
                allocated_len(entry.metadata().map_err(Error::from)?.len())
            } else {
                BLOCK_SIZE
            };
        }
        Ok(total)
    })
    .await
    .map_err(|e| Error::GenericError(format!("Size calculation task panicked: {}", e)))?
}

/// Space a file of `len` bytes takes in whole allocation blocks.
fn allocated_len(len: u64) -> u64 {
    len.div_ceil(BLOCK_SIZE).max(1) * BLOCK_SIZE
}

/// Image size in megabytes for `hdiutil create -size`.
///
/// `content_bytes` is the allocated size from [`staged_size`]. A tenth of
/// it is added for catalog and journal overhead.
pub fn image_size_mb(content_bytes: u64, extra_bytes: u64) -> u64 {
    let bytes = content_bytes + content_bytes / 10 + extra_bytes + HEADROOM_BYTES;
    bytes.div_ceil(1024 * 1024)
}

/// Creates a read-write (UDRW) image from the staged contents.
///
/// Customization needs a writable image: changes made to a mounted
/// compressed image are discarded on detach.
pub async fn create_rw_image(
    staging: &Staging,
    volume_name: &str,
    extra_bytes: u64,
    output: &Path,
) -> Result<PathBuf> {
    let size_mb = image_size_mb(staged_size(staging.path()).await?, extra_bytes);
    let size_arg = format!("{}m", size_mb);

    log::info!("Creating read-write image ({} MB)...", size_mb);

    process::run(
        HDIUTIL,
        [
            OsStr::new("create"),
            OsStr::new("-volname"),
            OsStr::new(volume_name),
            OsStr::new("-srcfolder"),
            staging.path().as_os_str(),
            OsStr::new("-fs"),
            OsStr::new("HFS+"),
            OsStr::new("-size"),
            OsStr::new(&size_arg),
            OsStr::new("-ov"),
            OsStr::new("-format"),
            OsStr::new("UDRW"),
            output.as_os_str(),
        ],
    )
    .await
    .context("hdiutil create")?;

    log::debug!("Created UDRW image: {}", output.display());
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size_rounds_up_with_headroom() {
        assert_eq!(image_size_mb(0, 0), 20);
        assert_eq!(image_size_mb(1, 0), 21);
        // 5 MB content + 0.5 MB overhead + 1 MB artwork + 20 MB headroom
        assert_eq!(image_size_mb(5 * 1024 * 1024, 1024 * 1024), 27);
    }

    #[test]
    fn files_take_whole_blocks() {
        assert_eq!(allocated_len(0), 4096);
        assert_eq!(allocated_len(1), 4096);
        assert_eq!(allocated_len(4096), 4096);
        assert_eq!(allocated_len(4097), 8192);
    }

    #[tokio::test]
    async fn many_small_files_fit_the_image() {
        let tmp = tempfile::tempdir().unwrap();
        let resources = tmp.path().join("Many.app/Contents/Resources");
        std::fs::create_dir_all(&resources).unwrap();
        for i in 0..10_000 {
            std::fs::write(resources.join(format!("{i}.js")), b"x").unwrap();
        }

        let staged = staged_size(tmp.path()).await.unwrap();
        assert!(staged >= 10_000 * 4096);

        let needed_mb = (10_000 * 4096u64).div_ceil(1024 * 1024);
        assert!(image_size_mb(staged, 0) > needed_mb + 20);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stages_app_and_applications_link() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("Lungo.app");
        std::fs::create_dir_all(app.join("Contents/MacOS")).unwrap();
        std::fs::write(app.join("Contents/MacOS/Lungo"), vec![0u8; 2048]).unwrap();

        let staging = stage_contents(&app, tmp.path()).await.unwrap();
        assert_eq!(staging.app_name(), "Lungo.app");
        assert!(staging.path().join("Lungo.app/Contents/MacOS/Lungo").is_file());
        assert_eq!(
            std::fs::read_link(staging.path().join("Applications")).unwrap(),
            Path::new("/Applications")
        );
        // staging root, Applications, Lungo.app, Contents, MacOS and the binary
        assert_eq!(staged_size(staging.path()).await.unwrap(), 6 * 4096);
    }
}
