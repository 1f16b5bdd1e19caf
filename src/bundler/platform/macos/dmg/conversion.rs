//! DMG format conversion utilities.
//!
//! The image is built read-write (UDRW) so the layout can be customized,
//! then converted to the compressed codec picked for the app
//! ([`DmgFormat`]).

use super::{DmgFormat, HDIUTIL};
use crate::bundler::{
    error::{Context, Result},
    utils::process,
};
use std::ffi::OsStr;
use std::path::Path;

/// `hdiutil convert` arguments for converting `source` into `target`.
pub fn convert_args<'a>(source: &'a Path, target: &'a Path, format: &'a str) -> Vec<&'a OsStr> {
    let mut args = vec![
        OsStr::new("convert"),
        source.as_os_str(),
        OsStr::new("-ov"),
        OsStr::new("-format"),
        OsStr::new(format),
    ];
    if format == "UDZO" {
        args.extend([OsStr::new("-imagekey"), OsStr::new("zlib-level=9")]);
    }
    args.extend([OsStr::new("-o"), target.as_os_str()]);
    args
}

/// Convert an image to `format`, writing `target`.
///
/// This must be done AFTER customizations are applied and the image is detached.
pub async fn convert_dmg(source: &Path, target: &Path, format: DmgFormat) -> Result<()> {
    log::info!("Converting DMG to {} format...", format);

    process::run(HDIUTIL, convert_args(source, target, format.as_str()))
        .await
        .with_context(|| format!("converting {} to {}", source.display(), format))?;

    log::info!("✓ DMG converted to {} format", format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udzo_uses_maximum_zlib_level() {
        let args = convert_args(Path::new("rw.dmg"), Path::new("Lungo 1.0.dmg"), "UDZO");
        let args: Vec<_> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            [
                "convert",
                "rw.dmg",
                "-ov",
                "-format",
                "UDZO",
                "-imagekey",
                "zlib-level=9",
                "-o",
                "Lungo 1.0.dmg"
            ]
        );
    }

    #[test]
    fn ulfo_has_no_image_key() {
        let args = convert_args(Path::new("rw.dmg"), Path::new("out.dmg"), "ULFO");
        assert!(!args.contains(&OsStr::new("-imagekey")));
    }
}
