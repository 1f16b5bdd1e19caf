//! DMG bundler library for macOS applications
//!
//! This library packages a macOS `.app` bundle into a drag-to-install disk
//! image:
//! - reads the bundle's Info.plist
//! - composes the app icon onto a disk icon
//! - lays out the Finder window over a background picture
//! - attaches an optional license agreement
//! - signs and verifies the image
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
