//! Per-file compilation: prelude injection, tokenize, parse, codegen,
//! object emission (spec §4.H). Grounded in `original_source/src/frontend/
//! main.cpp`'s per-file loop, translated from its `Lexer`/`Parser`/
//! `IRGenerator` singletons into owned values threaded through one
//! function call.

use std::path::{Path, PathBuf};

use inkwell::context::Context;

use salt_codegen::Emitter;
use salt_common::{CompilerOptions, Diagnostic};
use salt_lexer::{Lexer, Token, TokenKind};

use crate::error::DriverError;
use crate::prelude;
use crate::report::report;

/// What came out of compiling one file.
pub struct FileOutcome {
    /// Path to the emitted object file, or `None` if this file had an
    /// error and emission was skipped (spec §7: "on any error, the object
    /// file is not emitted for that file, but subsequent files are still
    /// compiled").
    pub object_path: Option<PathBuf>,
    pub entry_point_seen: bool,
    pub had_error: bool,
}

/// Splice the prelude's token stream in front of the file's own, the way
/// `main.cpp` concatenates two independently-tokenized `Token` vectors:
/// trailing `Eof`s are dropped and two `Eol`s are inserted as a separator
/// before the real file's tokens begin.
fn build_token_stream(file_tokens: &[Token]) -> Vec<Token> {
    let prelude_lex = Lexer::tokenize(prelude::SOURCE).expect("the embedded prelude always lexes cleanly");
    debug_assert!(prelude_lex.diagnostics.is_empty(), "the embedded prelude must never raise a diagnostic");

    let mut tokens: Vec<Token> = prelude_lex.tokens;
    while matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
        tokens.pop();
    }
    tokens.push(Token::new(TokenKind::Eol, 0, 0));
    tokens.push(Token::new(TokenKind::Eol, 0, 0));
    tokens.extend_from_slice(file_tokens);
    tokens
}

/// Compile one `.sl` file to an object file named from `index` (spec
/// §4.H "a name derived from an incrementing counter").
pub fn compile_file(index: u32, path: &Path, options: &CompilerOptions) -> Result<FileOutcome, DriverError> {
    let display = path.display().to_string();
    tracing::debug!("compiling {display}");

    let source = std::fs::read_to_string(path)
        .map_err(|e| DriverError::User(format!("could not read '{display}': {e}")))?;

    let lex = Lexer::tokenize(&source).map_err(|e| DriverError::User(format!("{display}: {e}")))?;
    tracing::trace!("tokenized {display}: {} tokens, {} lex diagnostics", lex.tokens.len(), lex.diagnostics.len());

    let tokens = if options.no_std { lex.tokens.clone() } else { build_token_stream(&lex.tokens) };

    let (program, parse_diags) = salt_parser::parse(&tokens);
    tracing::trace!("parsed {display}: {} items, {} parse diagnostics", program.items.len(), parse_diags.len());

    let mut diagnostics: Vec<Diagnostic> = lex.diagnostics;
    diagnostics.extend(parse_diags);

    for d in &diagnostics {
        report(&display, &source, d);
    }

    if diagnostics.iter().any(Diagnostic::is_error_or_worse) {
        return Ok(FileOutcome { object_path: None, entry_point_seen: false, had_error: true });
    }

    let context = Context::create();
    let module_name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("module");
    let mut emitter = Emitter::new(&context, module_name, 0, None).map_err(|e| DriverError::Backend(e.to_string()))?;
    emitter.compile_program(&program).map_err(|e| DriverError::Backend(e.to_string()))?;

    for d in &emitter.diagnostics {
        report(&display, &source, d);
    }

    if emitter.diagnostics.iter().any(Diagnostic::is_error_or_worse) {
        return Ok(FileOutcome { object_path: None, entry_point_seen: emitter.entry_point_seen(), had_error: true });
    }

    let object_path = PathBuf::from(format!("__saltc_obj_{index}.o"));
    emitter.emit_object(&object_path).map_err(|e| DriverError::Backend(e.to_string()))?;
    tracing::debug!("emitted {}", object_path.display());

    Ok(FileOutcome { object_path: Some(object_path), entry_point_seen: emitter.entry_point_seen(), had_error: false })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prelude_splice_drops_the_prelude_eof_and_appends_the_files_own_tokens() {
        let file_lex = Lexer::tokenize("fn main() -> int:\n\treturn 0\n").unwrap();
        let spliced = build_token_stream(&file_lex.tokens);

        // No `Eof` is left anywhere except the one final token (the file's own).
        let eof_count = spliced.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eof_count, 1, "exactly one Eof (the file's) should survive the splice");
        assert_eq!(spliced.last().unwrap().kind, TokenKind::Eof);

        // The spliced stream's tail must be exactly the file's own tokens.
        assert_eq!(&spliced[spliced.len() - file_lex.tokens.len()..], file_lex.tokens.as_slice());

        // And it must contain the prelude's own externs ahead of that tail.
        assert!(spliced.len() > file_lex.tokens.len(), "the prelude must contribute tokens of its own");
        assert!(spliced.iter().any(|t| t.kind == TokenKind::Extern), "prelude externs must be present");
    }
}
