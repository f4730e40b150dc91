//! Diagnostic reporting: the mandatory plain `file:line:col: level:
//! message` line (spec §7), plus an additive `ariadne` source-highlighted
//! snippet (SPEC_FULL §10), grounded in `snowc/src/main.rs::report_diagnostics`.

use ariadne::{Label, Report, ReportKind};
use salt_common::{Diagnostic, DiagnosticLevel};

/// Byte offset of a 1-based (line, column) position within `source`.
/// `LineIndex` only goes offset -> (line, col); diagnostics carry the
/// reverse, so walk lines directly (sources here are small single files).
fn offset_of(source: &str, line: u32, column: u32) -> usize {
    let mut offset = 0usize;
    for (i, text_line) in source.split('\n').enumerate() {
        if (i as u32) + 1 == line {
            return offset + (column.saturating_sub(1) as usize).min(text_line.len());
        }
        offset += text_line.len() + 1;
    }
    source.len()
}

/// Print one diagnostic: the required plain line always goes to stderr,
/// regardless of whether a terminal is attached, then an `ariadne` snippet
/// is printed additively (spec §7, SPEC_FULL §10).
pub fn report(file: &str, source: &str, diagnostic: &Diagnostic) {
    eprintln!("{}", diagnostic.render_plain(file));

    let kind = match diagnostic.level {
        DiagnosticLevel::Warning => ReportKind::Warning,
        DiagnosticLevel::Error | DiagnosticLevel::Fatal => ReportKind::Error,
    };

    let start = offset_of(source, diagnostic.position.line, diagnostic.position.column).min(source.len());
    let end = (start + 1).min(source.len()).max(start);
    let _ = Report::<std::ops::Range<usize>>::build(kind, start..end)
        .with_message(diagnostic.message.clone())
        .with_label(Label::new(start..end).with_message(&diagnostic.message))
        .finish()
        .eprint(ariadne::Source::from(source));
}
