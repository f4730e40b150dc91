//! Shared types for the Salt compiler front end: byte spans and line/column
//! positions, diagnostics, and aggregated compiler options.

pub mod diagnostic;
pub mod options;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticLevel, FatalError};
pub use options::CompilerOptions;
pub use span::{LineIndex, Position, Span};
