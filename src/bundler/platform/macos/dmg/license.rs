//! Software license agreement attached to the image.
//!
//! When the working directory contains `sla.r`, `license.rtf` or
//! `license.txt`, the license is embedded as classic resources (`LPic`,
//! `STR#` and `TEXT`/`RTF `) so Finder shows an Agree/Disagree dialog
//! before mounting.

use super::{DmgFormat, HDIUTIL};
use crate::bundler::{
    builder::tool_detection::REZ,
    error::{Context, Error, ErrorExt, Result},
    utils::process,
};
use handlebars::Handlebars;
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Candidate license sources, in priority order.
const LICENSE_FILES: [&str; 3] = ["sla.r", "license.rtf", "license.txt"];

const BUTTON_STRINGS: [&str; 6] = [
    "English",
    "Agree",
    "Disagree",
    "Print",
    "Save...",
    "If you agree with the terms of this license, press \"Agree\" to install the software.  If you do not agree, press \"Disagree\".",
];

const REZ_TEMPLATE: &str = r#"data 'LPic' (5000) {
    $"0000 0001 0000 0000 0000"
};

data 'STR#' (5000, "English") {
{{#each strings}}    $"{{this}}"
{{/each}}};

data '{{resource_type}}' (5000, "English") {
{{#each body}}    $"{{this}}"
{{/each}}};
"#;

/// License source found next to the invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LicenseSource {
    /// Ready-made Rez source.
    Rez(PathBuf),
    /// Rich text license.
    Rtf(PathBuf),
    /// Plain text license.
    Text(PathBuf),
}

impl LicenseSource {
    pub fn path(&self) -> &Path {
        match self {
            LicenseSource::Rez(p) | LicenseSource::Rtf(p) | LicenseSource::Text(p) => p,
        }
    }
}

#[derive(Serialize)]
struct RezData {
    strings: Vec<String>,
    resource_type: &'static str,
    body: Vec<String>,
}

/// Looks for a license source in `dir`.
pub fn find_license(dir: &Path) -> Option<LicenseSource> {
    LICENSE_FILES.iter().find_map(|name| {
        let path = dir.join(name);
        if !path.is_file() {
            return None;
        }
        Some(match *name {
            "sla.r" => LicenseSource::Rez(path),
            "license.rtf" => LicenseSource::Rtf(path),
            _ => LicenseSource::Text(path),
        })
    })
}

/// Formats bytes as Rez hex string lines, 16 bytes per line.
fn hex_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(16)
        .map(|chunk| {
            chunk
                .chunks(2)
                .map(|pair| pair.iter().map(|b| format!("{:02X}", b)).collect::<String>())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Encodes a `STR#` resource: a big-endian count followed by Pascal strings.
fn string_list(strings: &[&str]) -> Vec<u8> {
    let mut out = (strings.len() as u16).to_be_bytes().to_vec();
    for s in strings {
        let bytes = classic_text(s);
        let len = bytes.len().min(255);
        out.push(len as u8);
        out.extend_from_slice(&bytes[..len]);
    }
    out
}

/// Classic Mac text: CR line endings, ASCII only.
fn classic_text(text: &str) -> Vec<u8> {
    text.replace("\r\n", "\r")
        .replace('\n', "\r")
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

/// Renders the Rez source embedding a license text.
pub fn render_rez(text: &str, rtf: bool) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let body = if rtf {
        text.as_bytes().to_vec()
    } else {
        classic_text(text)
    };

    let data = RezData {
        strings: hex_lines(&string_list(&BUTTON_STRINGS)),
        resource_type: if rtf { "RTF " } else { "TEXT" },
        body: hex_lines(&body),
    };

    Ok(handlebars.render_template(REZ_TEMPLATE, &data)?)
}

/// Attaches a license agreement to `dmg_path` when a source is present in `search_dir`.
///
/// Returns the source used, or `None` when no license was found.
pub async fn add_license_agreement_if_needed(
    dmg_path: &Path,
    format: DmgFormat,
    search_dir: &Path,
    work_dir: &Path,
) -> Result<Option<LicenseSource>> {
    let Some(source) = find_license(search_dir) else {
        log::debug!("No license agreement found in {}", search_dir.display());
        return Ok(None);
    };

    log::info!("Adding license agreement from {}", source.path().display());

    let rez_source = match &source {
        LicenseSource::Rez(path) => path.clone(),
        LicenseSource::Rtf(path) | LicenseSource::Text(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .fs_context("reading license", path)?;
            let rendered = render_rez(&text, matches!(source, LicenseSource::Rtf(_)))?;
            let out = work_dir.join("sla.r");
            tokio::fs::write(&out, rendered)
                .await
                .fs_context("writing license resources", &out)?;
            out
        }
    };

    let rez = REZ
        .as_deref()
        .ok_or_else(|| Error::GenericError("Rez is required to add a license agreement".into()))?
        .to_string_lossy()
        .into_owned();

    let temp_dmg = work_dir.join("sla.dmg");

    // A UDCO image can be unflattened to receive resources.
    process::run(
        HDIUTIL,
        [
            OsStr::new("convert"),
            OsStr::new("-format"),
            OsStr::new("UDCO"),
            dmg_path.as_os_str(),
            OsStr::new("-ov"),
            OsStr::new("-o"),
            temp_dmg.as_os_str(),
        ],
    )
    .await
    .context("preparing image for license")?;

    process::run(HDIUTIL, [OsStr::new("unflatten"), temp_dmg.as_os_str()])
        .await
        .context("unflattening image")?;

    process::run(
        &rez,
        [
            OsStr::new("-a"),
            rez_source.as_os_str(),
            OsStr::new("-o"),
            temp_dmg.as_os_str(),
        ],
    )
    .await
    .context("adding license resources")?;

    process::run(HDIUTIL, [OsStr::new("flatten"), temp_dmg.as_os_str()])
        .await
        .context("flattening image")?;

    process::run(
        HDIUTIL,
        [
            OsStr::new("convert"),
            OsStr::new("-format"),
            OsStr::new(format.as_str()),
            temp_dmg.as_os_str(),
            OsStr::new("-o"),
            dmg_path.as_os_str(),
            OsStr::new("-ov"),
        ],
    )
    .await
    .with_context(|| format!("converting licensed image back to {}", format))?;

    log::info!("✓ License agreement added");
    Ok(Some(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rez_source_takes_priority() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(find_license(tmp.path()), None);

        std::fs::write(tmp.path().join("license.txt"), "terms").unwrap();
        assert_eq!(
            find_license(tmp.path()),
            Some(LicenseSource::Text(tmp.path().join("license.txt")))
        );

        std::fs::write(tmp.path().join("license.rtf"), "{\\rtf1 terms}").unwrap();
        assert!(matches!(find_license(tmp.path()), Some(LicenseSource::Rtf(_))));

        std::fs::write(tmp.path().join("sla.r"), "data 'TEXT' (5000) {};").unwrap();
        assert!(matches!(find_license(tmp.path()), Some(LicenseSource::Rez(_))));
    }

    #[test]
    fn string_list_is_counted_pascal_strings() {
        assert_eq!(string_list(&["Hi", "OK"]), vec![0, 2, 2, b'H', b'i', 2, b'O', b'K']);
    }

    #[test]
    fn classic_text_uses_carriage_returns() {
        assert_eq!(classic_text("a\nb\r\nc é"), b"a\rb\rc ?".to_vec());
    }

    #[test]
    fn renders_text_resources() {
        let rez = render_rez("Terms\n", false).unwrap();
        assert!(rez.contains("data 'LPic' (5000)"));
        assert!(rez.contains("data 'STR#' (5000, \"English\")"));
        assert!(rez.contains("data 'TEXT' (5000, \"English\")"));
        // "Terms\r"
        assert!(rez.contains("$\"5465 726D 730D\""));
    }

    #[test]
    fn renders_rtf_resources() {
        let rez = render_rez("{\\rtf1}", true).unwrap();
        assert!(rez.contains("data 'RTF ' (5000, \"English\")"));
    }

    #[tokio::test]
    async fn no_license_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let result = add_license_agreement_if_needed(
            &tmp.path().join("Lungo 1.0.dmg"),
            DmgFormat::Udzo,
            tmp.path(),
            tmp.path(),
        )
        .await
        .unwrap();
        assert_eq!(result, None);
    }
}
