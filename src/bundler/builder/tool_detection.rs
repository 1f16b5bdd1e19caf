//! External tool detection and availability checking.
//!
//! Resource editing tools (`Rez`, `DeRez`, `SetFile`) ship with the Xcode
//! command line tools. On a bare system `/usr/bin` only holds shims that
//! prompt for installation, so availability is asked from `xcrun` first.

use std::path::PathBuf;
use std::sync::LazyLock;

/// `Rez` resource compiler.
pub static REZ: LazyLock<Option<PathBuf>> = LazyLock::new(|| find_developer_tool("Rez"));

/// `DeRez` resource decompiler.
pub static DEREZ: LazyLock<Option<PathBuf>> = LazyLock::new(|| find_developer_tool("DeRez"));

/// `SetFile` Finder attribute editor.
pub static SETFILE: LazyLock<Option<PathBuf>> = LazyLock::new(|| find_developer_tool("SetFile"));

/// `sips` image tool, part of the base system.
pub static SIPS: LazyLock<Option<PathBuf>> = LazyLock::new(|| find_system_tool("sips"));

/// Locate a developer tool through `xcrun --find`, falling back to PATH.
fn find_developer_tool(name: &str) -> Option<PathBuf> {
    if let Ok(xcrun) = which::which("xcrun") {
        match std::process::Command::new(&xcrun)
            .args(["--find", name])
            .output()
        {
            Ok(output) if output.status.success() => {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    log::debug!("Found {} at: {}", name, path);
                    return Some(PathBuf::from(path));
                }
            }
            Ok(output) => {
                log::debug!(
                    "xcrun could not find {} (exit code: {:?}): {}",
                    name,
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                return None;
            }
            Err(e) => log::debug!("Failed to execute xcrun: {}", e),
        }
    }

    find_system_tool(name)
}

fn find_system_tool(name: &str) -> Option<PathBuf> {
    match which::which(name) {
        Ok(path) => {
            log::debug!("Found {} at: {}", name, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", name, e);
            None
        }
    }
}
