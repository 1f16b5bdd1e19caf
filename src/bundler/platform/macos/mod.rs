//! macOS packaging: disk images and code signing.

pub mod dmg;
pub mod sign;
