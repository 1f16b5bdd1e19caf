//! Kodegen Bundler DMG - drag-to-install disk images for macOS applications.
//!
//! This binary packages a `.app` bundle into a laid-out, compressed and
//! code signed `.dmg` with proper error handling and artifact verification.

use kodegen_bundler_dmg::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
