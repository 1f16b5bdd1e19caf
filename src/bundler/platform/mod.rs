//! Platform-specific packaging backends.

pub mod macos;
