//! Command line interface for the DMG bundler.
//!
//! Parses arguments, runs the [`Bundler`] pipeline and maps its outcome to
//! user feedback and a process exit code.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::{
    bundler::{BundleReport, Bundler, Progress, SigningStatus},
    error::{CliError, Result},
};

/// Main CLI entry point
///
/// Returns the process exit code: 0 when the image was created and signed,
/// 2 when it was created unsigned, 1 on any fatal error.
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let config = RuntimeConfig::from(&args);
    init_logging(config.log_filter());
    let output = config.output();

    match execute(&args, output).await {
        Ok(code) => Ok(code),
        Err(e) => {
            log::debug!("{:?}", e);
            output.fail(&e.user_message())?;
            Ok(1)
        }
    }
}

async fn execute(args: &Args, output: &OutputManager) -> Result<i32> {
    if !cfg!(target_os = "macos") {
        return Err(CliError::UnsupportedPlatform.into());
    }
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let settings = args.to_settings()?;
    output.verbose(&format!("Application: {}", settings.app_path().display()))?;
    output.verbose(&format!("Destination: {}", settings.destination().display()))?;

    let progress = *output;
    let report = Bundler::new(settings)
        .on_progress(move |event| {
            let _ = match event {
                Progress::Step(step) => progress.progress(&step.to_string()),
                Progress::Info(message) => progress.info(&message),
            };
        })
        .bundle()
        .await?;

    print_report(&report, output)?;
    Ok(report.exit_code())
}

fn print_report(report: &BundleReport, output: &OutputManager) -> std::io::Result<()> {
    output.success(&format!("Created “{}”", report.filename))?;
    output.verbose(&format!("Path: {}", report.dmg_path.display()))?;
    output.verbose(&format!("Format: {}", report.format))?;
    output.verbose(&format!("Size: {} bytes", report.size))?;
    output.verbose(&format!("SHA256: {}", report.checksum))?;

    if !report.layout_applied {
        output.warn("The Finder window layout could not be applied to the DMG")?;
    }

    match signing_summary(&report.signing) {
        Ok(line) => output.indent(&line),
        Err(line) => output.fail(&line),
    }
}

/// Line describing the signing outcome; `Err` when it is reported as a failure.
fn signing_summary(signing: &SigningStatus) -> std::result::Result<String, String> {
    match signing {
        SigningStatus::Signed { authority } => Ok(format!("Code signing identity: {authority}")),
        SigningStatus::Unsigned { reason } => Err(format!(
            "Code signing failed. The DMG is fine, just not code signed.\n{reason}"
        )),
    }
}

fn init_logging(level: log::LevelFilter) {
    let env = env_logger::Env::default().default_filter_or(level.as_str());
    // A logger may already be installed when embedded in tests.
    let _ = env_logger::Builder::from_env(env).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_image_is_reported_as_failure() {
        let line = signing_summary(&SigningStatus::Unsigned {
            reason: "No suitable code signing identity found".into(),
        })
        .unwrap_err();
        assert!(line.starts_with("Code signing failed. The DMG is fine, just not code signed."));
        assert!(line.ends_with("No suitable code signing identity found"));
    }

    #[test]
    fn signed_image_names_the_identity() {
        let line = signing_summary(&SigningStatus::Signed {
            authority: "Developer ID Application: Example Inc (TEAM123456)".into(),
        })
        .unwrap();
        assert_eq!(
            line,
            "Code signing identity: Developer ID Application: Example Inc (TEAM123456)"
        );
    }
}
