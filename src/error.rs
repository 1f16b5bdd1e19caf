//! Error types at the command line boundary.
//!
//! Pipeline failures are [`crate::bundler::Error`]; this module wraps them
//! together with argument and IO errors for the binary.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the command line tool
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("{0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pipeline errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// The host cannot build disk images
    #[error("macOS only")]
    UnsupportedPlatform,
}

impl BundlerError {
    /// Message shown to the user when the run fails.
    ///
    /// Failures while assembling the image are prefixed so they read as a
    /// build failure; errors naming their own cause are shown as is.
    pub fn user_message(&self) -> String {
        use crate::bundler::Error as E;
        match self {
            BundlerError::Bundler(
                e @ (E::AppNotFound(_)
                | E::MissingMetadata(_)
                | E::TitleTooLong { .. }
                | E::TargetExists(_)
                | E::NotCodeSigned),
            ) => e.to_string(),
            BundlerError::Bundler(e) => format!("Building the DMG failed. {e}"),
            other => other.to_string(),
        }
    }
}
