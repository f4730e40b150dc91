use std::fmt;

use crate::span::Position;

/// The severity of a [`Diagnostic`], matching spec §7's three in-process
/// levels (linker failures are reported separately, directly from the
/// subprocess exit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// A single diagnostic produced anywhere in the pipeline: lexer, parser,
/// or IR emitter. Carries enough to render `file:line:col: level: message`
/// (spec §7) plus an `ariadne`-highlighted snippet.
///
/// Positioned by `(line, column)` rather than a byte `Span`: every stage
/// that raises a diagnostic (lexer, parser, codegen) already has the
/// `Token`'s one-based line/column in hand (spec §3 "Token"), and a
/// `Token` itself never carries a byte offset. The `saltc` driver, which
/// does hold the raw source text, derives a byte range for `ariadne`
/// snippets from this position via `LineIndex`.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub position: Position,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(position: Position, message: impl Into<String>) -> Self {
        Self { level: DiagnosticLevel::Warning, position, message: message.into() }
    }

    pub fn error(position: Position, message: impl Into<String>) -> Self {
        Self { level: DiagnosticLevel::Error, position, message: message.into() }
    }

    pub fn fatal(position: Position, message: impl Into<String>) -> Self {
        Self { level: DiagnosticLevel::Fatal, position, message: message.into() }
    }

    pub fn is_error_or_worse(&self) -> bool {
        matches!(self.level, DiagnosticLevel::Error | DiagnosticLevel::Fatal)
    }

    /// Render as the plain `file:line:col: level: message` line required by
    /// spec §7, independent of whether a richer `ariadne` report is also
    /// printed.
    pub fn render_plain(&self, file: &str) -> String {
        format!("{file}:{}:{}: {}: {}", self.position.line, self.position.column, self.level, self.message)
    }
}

/// An unrecoverable condition (spec §7 kind 3: IO failure, verifier
/// failure, internal invariant violation). The driver catches this at the
/// top of `main` and converts it to a non-zero exit, mirroring the
/// original's top-level `try { ... } catch (...)` with ordinary `?`
/// propagation instead of exceptions.
#[derive(Debug, Clone)]
pub struct FatalError(pub String);

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fatal: {}", self.0)
    }
}

impl std::error::Error for FatalError {}

impl From<String> for FatalError {
    fn from(s: String) -> Self {
        FatalError(s)
    }
}

impl From<&str> for FatalError {
    fn from(s: &str) -> Self {
        FatalError(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_plain_format() {
        let d = Diagnostic::error(Position::new(2, 2), "undefined identifier `bad`");
        let rendered = d.render_plain("f.sl");
        assert_eq!(rendered, "f.sl:2:2: error: undefined identifier `bad`");
    }

    #[test]
    fn is_error_or_worse() {
        assert!(!Diagnostic::warning(Position::START, "x").is_error_or_worse());
        assert!(Diagnostic::error(Position::START, "x").is_error_or_worse());
        assert!(Diagnostic::fatal(Position::START, "x").is_error_or_worse());
    }
}
