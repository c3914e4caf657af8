//! Visual theme and styling.

use console::Style;

/// torchup's visual theme.
#[derive(Debug, Clone)]
pub struct TorchupTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for headers (orange bold).
    pub header: Style,
    /// Style for commands shown in output (dim italic).
    pub command: Style,
    /// Style for box-drawing borders (dim).
    pub border: Style,
    /// Style for contextual hints (cyan).
    pub hint: Style,
}

impl Default for TorchupTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl TorchupTheme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().color256(208),
            command: Style::new().dim().italic(),
            border: Style::new().dim(),
            hint: Style::new().cyan(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            command: Style::new(),
            border: Style::new(),
            hint: Style::new(),
        }
    }

    /// Pick [`new`](Self::new) or [`plain`](Self::plain) from the environment.
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in orange).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a skipped message (icon + text in dim).
    pub fn format_skipped(&self, msg: &str) -> String {
        format!("{}", self.dim.apply_to(format!("○ {}", msg)))
    }

    /// Format a troubleshooting hint.
    pub fn format_hint(&self, hint: &str) -> String {
        format!("{} {}", self.hint.apply_to("Hint:"), self.hint.apply_to(hint))
    }

    /// Lines of the boxed block shown for a failed pip or uninstall command.
    ///
    /// Only the tail of the output is passed in; the hint, when present,
    /// names the variant tried next.
    pub fn format_error_block(
        &self,
        command: &str,
        output: &str,
        hint: Option<&str>,
    ) -> Vec<String> {
        let b = &self.border;
        let mut lines = vec![
            format!("    {}", b.apply_to("┌─ Command ──────────────────────────")),
            format!("    {} {}", b.apply_to("│"), self.command.apply_to(command)),
        ];
        if !output.is_empty() {
            lines.push(format!(
                "    {}",
                b.apply_to("├─ Output ───────────────────────────")
            ));
            lines.extend(
                output
                    .lines()
                    .map(|line| format!("    {} {}", b.apply_to("│"), line)),
            );
        }
        lines.push(format!(
            "    {}",
            b.apply_to("└────────────────────────────────────")
        ));
        if let Some(h) = hint {
            lines.push(format!("    {}", self.format_hint(h)));
        }
        lines
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("▲"),
            self.highlight.apply_to(title)
        )
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}
