/// Structured diagnostics and the terminal renderer.
///
/// Every semantic error and warning exists in two forms: the structured
/// `Diagnostic` record here, and a legacy one-line string (see `legacy()`)
/// kept for the driver's plain-text paths and the test suite.
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl Level {
    fn label(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Diagnostic {
            level: Level::Error,
            message: message.into(),
            line,
            column,
            length: 1,
            suggestion: None,
        }
    }

    pub fn warning(message: impl Into<String>, line: usize, column: usize) -> Self {
        Diagnostic {
            level: Level::Warning,
            message: message.into(),
            line,
            column,
            length: 1,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// The one-line form: `Error at line 3, column 5: message`.
    pub fn legacy(&self) -> String {
        let label = match self.level {
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Note => "Note",
        };
        format!(
            "{} at line {}, column {}: {}",
            label, self.line, self.column, self.message
        )
    }
}

/// Renders diagnostics with the offending source line and a caret underline.
pub struct Reporter<'a> {
    source: &'a str,
    filename: &'a str,
}

impl<'a> Reporter<'a> {
    pub fn new(source: &'a str, filename: &'a str) -> Self {
        Reporter { source, filename }
    }

    fn source_line(&self, line: usize) -> Option<&'a str> {
        if line < 1 {
            return None;
        }
        self.source.lines().nth(line - 1)
    }

    pub fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let label = match diag.level {
            Level::Error => diag.level.label().red().bold(),
            Level::Warning => diag.level.label().yellow().bold(),
            Level::Note => diag.level.label().cyan().bold(),
        };
        out.push_str(&format!("{}: {}\n", label, diag.message.bold()));

        if diag.line >= 1 {
            out.push_str(&format!(
                "{} {}:{}:{}\n",
                "  -->".blue().bold(),
                self.filename,
                diag.line,
                diag.column
            ));

            if let Some(source_line) = self.source_line(diag.line) {
                out.push_str(&format!(
                    "{} {}\n",
                    format!("{:>5} |", diag.line).blue().bold(),
                    source_line
                ));
                let spaces = " ".repeat(diag.column.saturating_sub(1));
                let carets = "^".repeat(diag.length.max(1));
                out.push_str(&format!(
                    "{} {}{}\n",
                    "      |".blue().bold(),
                    spaces,
                    carets.red().bold()
                ));
            }
        }

        if let Some(suggestion) = &diag.suggestion {
            out.push_str(&format!("{} {}\n", "  help:".cyan().bold(), suggestion));
        }

        out
    }

    /// Print all diagnostics to stderr followed by a count summary.
    pub fn print_all(&self, diagnostics: &[Diagnostic]) {
        if diagnostics.is_empty() {
            return;
        }

        for diag in diagnostics {
            eprintln!("{}", self.render(diag));
        }

        let errors = diagnostics
            .iter()
            .filter(|d| d.level == Level::Error)
            .count();
        let warnings = diagnostics
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count();

        let mut parts = Vec::new();
        if errors > 0 {
            let word = if errors == 1 { "error" } else { "errors" };
            parts.push(format!("{} {} {}", "✗".red().bold(), errors, word));
        }
        if warnings > 0 {
            let word = if warnings == 1 { "warning" } else { "warnings" };
            parts.push(format!("{} {} {}", "⚠".yellow().bold(), warnings, word));
        }
        if !parts.is_empty() {
            eprintln!("{} generated.", parts.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_form_includes_position() {
        let diag = Diagnostic::error("Undefined variable 'x'", 3, 5);
        assert_eq!(diag.legacy(), "Error at line 3, column 5: Undefined variable 'x'");
    }

    #[test]
    fn render_includes_source_line_and_suggestion() {
        let source = "fn main() -> i32:\n    x = 2\n    return 0\n";
        let reporter = Reporter::new(source, "demo.hash");
        let diag = Diagnostic::error("Cannot assign to immutable variable 'x'", 2, 5)
            .with_suggestion("Declare the variable as mutable");
        let rendered = reporter.render(&diag);
        assert!(rendered.contains("x = 2"));
        assert!(rendered.contains("demo.hash:2:5"));
        assert!(rendered.contains("Declare the variable as mutable"));
    }
}
