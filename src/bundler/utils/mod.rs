//! Shared helpers for filesystem and external tool operations.

pub mod fs;
pub mod process;
