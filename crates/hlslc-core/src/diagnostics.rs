//! Compiler diagnostics.
//!
//! The type engine never aborts a whole compile on a type error: it reports
//! the problem through a [`DiagnosticSink`] and fails only the construction
//! call that hit it, so the driver can keep going and collect every problem
//! in one pass.
//!
//! ```
//! use hlslc_core::{DiagnosticSink, Diagnostics, Severity, Span};
//!
//! let mut diagnostics = Diagnostics::new();
//! diagnostics.report(Span::new(3, 7, 1), Severity::Warning, "implicit truncation of vector type");
//!
//! assert!(!diagnostics.has_errors());
//! assert_eq!(diagnostics.to_string(), "3:7: warning: implicit truncation of vector type\n");
//! ```

use std::fmt;

use crate::{CompilationError, Span};

/// The severity level of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Advisory; never blocks IR construction.
    Warning,
    /// The construction call that reported it has failed.
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where in the shader source the problem is.
    pub span: Span,
    pub severity: Severity,
    /// Formatted message text.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.severity.as_str(), self.message)
    }
}

/// Receiver for `(location, severity, message)` reports.
pub trait DiagnosticSink {
    fn report(&mut self, span: Span, severity: Severity, message: &str);

    /// Report a compilation error at its own span.
    fn report_error(&mut self, error: &CompilationError) {
        self.report(error.span(), Severity::Error, &error.message());
    }
}

/// A collecting sink that keeps every diagnostic in report order.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.has_errors = false;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, span: Span, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => tracing::warn!(%span, "{message}"),
            Severity::Error => tracing::debug!(%span, "error reported: {message}"),
        }
        self.add_diagnostic(Diagnostic {
            span,
            severity,
            message: message.to_string(),
        });
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_in_order() {
        let mut diags = Diagnostics::new();
        diags.report(Span::new(1, 1, 0), Severity::Warning, "first");
        diags.report(Span::new(2, 4, 0), Severity::Error, "second");
        diags.report(Span::new(3, 2, 0), Severity::Warning, "third");

        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["first", "second", "third"]);
        assert_eq!(diags.count(), 3);
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 2);
        assert!(diags.has_errors());
        assert!(diags.has_warnings());
    }

    #[test]
    fn report_error_uses_error_span() {
        let mut diags = Diagnostics::new();
        diags.report_error(&CompilationError::IncompatibleTypes {
            span: Span::new(9, 3, 5),
        });
        let diag = diags.errors().next().unwrap();
        assert_eq!(diag.span, Span::new(9, 3, 5));
        assert_eq!(diag.message, "expression data types are incompatible");
        assert_eq!(diag.to_string(), "9:3: error: expression data types are incompatible");
    }

    #[test]
    fn clear_resets_error_flag() {
        let mut diags = Diagnostics::new();
        diags.report(Span::default(), Severity::Error, "boom");
        assert!(diags.has_errors());
        diags.clear();
        assert!(!diags.has_errors());
        assert!(diags.is_empty());
    }
}
