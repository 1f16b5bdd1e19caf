//! Bundle orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that turns an
//! application bundle into a signed disk image.
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_dmg::bundler::{Bundler, SettingsBuilder};
//!
//! # async fn example() -> kodegen_bundler_dmg::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .app_path("Build/Lungo.app")
//!     .destination("Build/Releases")
//!     .build()?;
//!
//! let report = Bundler::new(settings).bundle().await?;
//! println!("Created {} ({} bytes)", report.filename, report.size);
//! println!("SHA256: {}", report.checksum);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`orchestrator`] - Main [`Bundler`] struct and pipeline sequencing
//! - [`signing`] - Signing stage and [`SigningStatus`]
//! - [`tool_detection`] - External tool availability checking

mod checksum;
mod orchestrator;
mod signing;
pub(crate) mod tool_detection;

pub use orchestrator::{BundleReport, Bundler, Progress, Step};
pub use signing::SigningStatus;
