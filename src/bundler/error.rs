//! Error types for the DMG pipeline.
//!
//! Every step of the pipeline reports failures through [`Error`]. The
//! [`Context`] and [`ErrorExt`] traits attach human readable context to
//! lower level errors, and [`bail!`](crate::bail) returns early with a
//! formatted [`Error::GenericError`].

use std::{fmt::Display, io, path::PathBuf};

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while packaging an application into a disk image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The application bundle (or its Info.plist) does not exist.
    #[error("Could not find `{}`", .0.display())]
    AppNotFound(PathBuf),

    /// A required Info.plist key is missing.
    #[error("{0}")]
    MissingMetadata(String),

    /// The volume title is longer than Finder aliases allow.
    #[error(
        "The disk image title cannot exceed {max} characters (got {len}): {title}"
    )]
    TitleTooLong {
        /// Offending title
        title: String,
        /// Title length in characters
        len: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// Target image exists and overwriting was not requested.
    #[error("`{}` already exists, pass --overwrite to replace it", .0.display())]
    TargetExists(PathBuf),

    /// Unsupported disk image codec.
    #[error("unsupported disk image format `{0}` (expected ULFO or UDZO)")]
    InvalidFormat(String),

    /// A tool could not be spawned at all.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Program that failed to start
        command: String,
        /// Underlying spawn error
        error: io::Error,
    },

    /// A tool ran and exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    ToolFailed {
        /// Program and subcommand
        command: String,
        /// Trimmed stderr (or exit status when stderr is empty)
        stderr: String,
    },

    /// Code signing could not be performed. The image itself is intact.
    #[error("{0}")]
    Signing(String),

    /// Signing appeared to succeed but codesign reports no authority.
    #[error("Not code signed")]
    NotCodeSigned,

    /// Filesystem error with the operation and path that caused it.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// Operation being performed
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying IO error
        error: io::Error,
    },

    /// Error wrapped with additional context.
    #[error("{0}: {1}")]
    Context(String, Box<Error>),

    /// Catch-all error with a message.
    #[error("{0}")]
    GenericError(String),

    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error(transparent)]
    ImageError(#[from] image::ImageError),

    #[error(transparent)]
    PlistError(#[from] plist::Error),

    #[error(transparent)]
    WalkdirError(#[from] walkdir::Error),

    #[error(transparent)]
    StripPrefixError(#[from] std::path::StripPrefixError),

    #[error(transparent)]
    TemplateError(#[from] handlebars::RenderError),
}

impl Error {
    /// Whether this error belongs to the signing stage.
    ///
    /// Signing failures leave a usable, unsigned image behind.
    pub fn is_signing_failure(&self) -> bool {
        match self {
            Error::Signing(_) => true,
            Error::Context(_, inner) => inner.is_signing_failure(),
            _ => false,
        }
    }
}

/// Attach context to results and options.
pub trait Context<T> {
    /// Wrap the error value with additional context.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the error value with lazily evaluated context.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attach the failing operation and path to IO errors.
pub trait ErrorExt<T> {
    /// Convert an IO error into [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Return early with a formatted [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
