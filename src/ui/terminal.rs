//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use super::{
    NonInteractiveUI, OutputMode, ProgressSpinner, SpinnerHandle, TorchupTheme, UserInterface,
};

/// Styled output with live spinners, used when stdout is a terminal.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: TorchupTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme: TorchupTheme::detect(),
            mode,
        }
    }

    fn status_line(&mut self, line: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", line).ok();
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.status_line(msg);
    }

    fn success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.status_line(&line);
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        let line = format!("\n{}\n", self.theme.format_header(title));
        self.status_line(&line);
    }

    fn show_hint(&mut self, hint: &str) {
        let line = format!("  {}", self.theme.format_hint(hint));
        self.status_line(&line);
    }

    fn show_error_block(&mut self, command: &str, output: &str, hint: Option<&str>) {
        for line in self.theme.format_error_block(command, output, hint) {
            writeln!(self.err, "{}", line).ok();
        }
    }
}

/// Pick the terminal UI when `interactive` and stdout is a terminal,
/// otherwise the line-oriented one.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
