//! Signing stage of the pipeline.
//!
//! Signing failures do not invalidate the image: they are captured as
//! [`SigningStatus::Unsigned`]. A signature that cannot be read back after
//! a successful `codesign --sign` is a hard failure.

use crate::bundler::{Error, Result, platform::macos::sign};
use std::path::Path;

/// Outcome of the signing stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigningStatus {
    /// The image is signed; `authority` is the leaf certificate name.
    Signed { authority: String },
    /// The image was produced but could not be signed.
    Unsigned { reason: String },
}

impl SigningStatus {
    pub fn is_signed(&self) -> bool {
        matches!(self, SigningStatus::Signed { .. })
    }
}

/// Signs and verifies `dmg_path`.
///
/// # Errors
///
/// Only [`Error::NotCodeSigned`] and unexpected errors are returned; identity
/// lookup and `codesign --sign` failures become [`SigningStatus::Unsigned`].
pub async fn sign_and_verify(dmg_path: &Path, requested: Option<&str>) -> Result<SigningStatus> {
    let signed = async {
        let identity = sign::resolve_identity(requested).await?;
        sign::sign_dmg(dmg_path, &identity).await
    }
    .await;

    if let Err(e) = signed {
        log::warn!("Code signing failed: {}", e);
        return unsigned_or_error(e);
    }

    let authority = sign::verify_signature(dmg_path).await?;
    log::info!("Code signing identity: {}", authority);
    Ok(SigningStatus::Signed { authority })
}

/// Unsigned status for a signing error, passing other errors through.
pub fn unsigned_or_error(error: Error) -> Result<SigningStatus> {
    if error.is_signing_failure() {
        Ok(SigningStatus::Unsigned {
            reason: error.to_string(),
        })
    } else {
        Err(error)
    }
}
