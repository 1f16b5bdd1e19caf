//! Code signing of the finished disk image.
//!
//! Identities come from the login keychain via `security find-identity`.
//! Without an explicit identity the first Developer ID Application identity
//! is preferred, then Mac Developer. Signing problems are reported as
//! [`Error::Signing`] so callers can keep the unsigned image.

use crate::bundler::{Error, Result, utils::process};
use regex::Regex;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::LazyLock;

const SECURITY: &str = "/usr/bin/security";
const CODESIGN: &str = "/usr/bin/codesign";

const DEVELOPER_ID: &str = "Developer ID Application";
const MAC_DEVELOPER: &str = "Mac Developer";

static AUTHORITY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^Authority=(.*)$").ok());

/// Picks the signing identity from `security find-identity` output.
///
/// A requested identity must appear quoted in the listing. Without one,
/// `Developer ID Application` wins over `Mac Developer`.
pub fn select_identity(listing: &str, requested: Option<&str>) -> Option<String> {
    match requested {
        Some(identity) if listing.contains(&format!("\"{identity}\"")) => {
            Some(identity.to_string())
        }
        Some(_) => None,
        None if listing.contains(&format!("{DEVELOPER_ID}:")) => Some(DEVELOPER_ID.to_string()),
        None if listing.contains(&format!("{MAC_DEVELOPER}:")) => Some(MAC_DEVELOPER.to_string()),
        None => None,
    }
}

/// Extracts the first `Authority=` line of `codesign --display` output.
pub fn parse_authority(output: &str) -> Option<String> {
    AUTHORITY
        .as_ref()?
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Lists valid code signing identities.
pub async fn find_identities() -> Result<String> {
    process::run_stdout(SECURITY, ["find-identity", "-v", "-p", "codesigning"])
        .await
        .map_err(|e| Error::Signing(e.to_string()))
}

/// Resolves the identity to sign with.
pub async fn resolve_identity(requested: Option<&str>) -> Result<String> {
    let listing = find_identities().await?;
    select_identity(&listing, requested)
        .ok_or_else(|| Error::Signing("No suitable code signing identity found".into()))
}

/// Signs `dmg_path` with `identity`.
pub async fn sign_dmg(dmg_path: &Path, identity: &str) -> Result<()> {
    log::info!("Signing {} with \"{}\"", dmg_path.display(), identity);

    process::run(
        CODESIGN,
        [OsStr::new("--sign"), OsStr::new(identity), dmg_path.as_os_str()],
    )
    .await
    .map_err(|e| Error::Signing(e.to_string()))?;

    Ok(())
}

/// Reads back the signing authority of `dmg_path`.
///
/// Returns [`Error::NotCodeSigned`] when codesign reports no authority.
pub async fn verify_signature(dmg_path: &Path) -> Result<String> {
    let output = process::run(
        CODESIGN,
        [
            dmg_path.as_os_str(),
            OsStr::new("--display"),
            OsStr::new("--verbose=2"),
        ],
    )
    .await
    .map_err(|e| match e {
        Error::ToolFailed { .. } => Error::NotCodeSigned,
        other => other,
    })?;

    // codesign reports signature details on stderr
    let details = String::from_utf8_lossy(&output.stderr);
    parse_authority(&details).ok_or(Error::NotCodeSigned)
}
