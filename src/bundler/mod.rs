//! DMG bundling pipeline.
//!
//! Turns a macOS `.app` bundle into a drag-to-install disk image:
//!
//! 1. [`metadata`](crate::metadata) reads `Contents/Info.plist`
//! 2. [`DmgFormat`] picks the codec from the minimum system version
//! 3. [`resources::icons`] composes the drive icon
//! 4. [`platform::macos::dmg`] builds and lays out the image
//! 5. license agreement, icon replacement, signing and verification
//!
//! The [`Bundler`] orchestrator sequences these steps and returns a
//! [`BundleReport`].

pub mod builder;
pub mod error;
pub mod platform;
pub mod resources;
pub mod settings;
pub mod utils;

pub use builder::{BundleReport, Bundler, Progress, SigningStatus, Step};
pub use error::{Error, Result};
pub use platform::macos::dmg::DmgFormat;
pub use settings::{DmgSettings, Settings, SettingsBuilder};
