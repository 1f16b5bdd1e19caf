//! Terminal output with color and verbosity control.

use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Colored, verbosity-aware terminal printer.
///
/// Progress and results go to stdout, warnings and failures to stderr.
/// Quiet mode suppresses everything except failures.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    color: ColorChoice,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let color = if io::stdout().is_terminal() {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            verbose,
            quiet,
            color,
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn stdout(&self) -> StandardStream {
        StandardStream::stdout(self.color)
    }

    fn stderr(&self) -> StandardStream {
        StandardStream::stderr(self.color)
    }

    fn print_tagged(
        stream: &mut StandardStream,
        tag: &str,
        color: Color,
        message: &str,
    ) -> io::Result<()> {
        stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(stream, "{tag}")?;
        stream.reset()?;
        writeln!(stream, " {message}")
    }

    /// Pipeline step in progress.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::print_tagged(&mut self.stdout(), "▸", Color::Cyan, message)
    }

    /// Plain informational line.
    pub fn info(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.stdout(), "{message}")
    }

    /// Detail only shown with `--verbose`.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.is_verbose() {
            return Ok(());
        }
        let mut out = self.stdout();
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        writeln!(out, "  {message}")?;
        out.reset()
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::print_tagged(&mut self.stdout(), "✓", Color::Green, message)
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::print_tagged(&mut self.stderr(), "⚠", Color::Yellow, message)
    }

    /// Fatal error, printed even in quiet mode.
    pub fn fail(&self, message: &str) -> io::Result<()> {
        Self::print_tagged(&mut self.stderr(), "✗", Color::Red, message)
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.stdout(), "  {message}")
    }
}
