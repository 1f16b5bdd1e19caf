//! Configuration structures for the DMG pipeline.
//!
//! [`Settings`] is assembled through [`SettingsBuilder`] from the command
//! line and carries the [`DmgSettings`] layout used to build the image.

mod builder;
mod core;
mod dmg;

pub use builder::SettingsBuilder;
pub use core::Settings;
pub use dmg::{DmgSettings, MAX_TITLE_LEN, Position, SYSTEM_DISK_ICON, WindowSize};
