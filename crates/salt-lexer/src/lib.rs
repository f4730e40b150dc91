//! Tokenizer for the Salt programming language (spec §2 component D,
//! §4.D). Adapted from the teacher's `snow-lexer`: a byte [`Cursor`]
//! feeding a state-machine `Lexer`, but restructured around Salt's own
//! state set (`Normal` / `CharLiteral` / `StringLiteral` / `LineComment`)
//! and its post-hoc compound-token fusion pass, rather than the
//! teacher's direct per-character lookahead dispatch.

mod cursor;
mod token;

use cursor::Cursor;
use salt_common::{Diagnostic, FatalError};
pub use token::{Token, TokenKind};

/// What the lexer is currently doing (spec §4.D "States").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Normal,
    CharLiteral,
    StringLiteral,
    LineComment,
}

/// The outcome of tokenizing one source file: the token stream (always
/// terminated by `Eof`) plus any non-fatal diagnostics raised along the
/// way (spec §4.D "Failure": a bad byte is a diagnostic, not fatal).
#[derive(Debug, Clone)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The Salt lexer.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    state: LexState,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    /// Consecutive `WS` tokens since the last non-`WS` push; used to
    /// collapse runs of four into one `TAB` (spec §4.D "Whitespace has a
    /// counter").
    ws_streak: u32,
    /// Number of `TAB`s seen so far on the current line; stamped onto
    /// each `TAB` token as `count` (indentation nesting level) and reset
    /// at every `EOL`.
    line_tab_depth: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            state: LexState::Normal,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
            ws_streak: 0,
            line_tab_depth: 0,
        }
    }

    /// Tokenize an entire source file (spec §4.D contract).
    pub fn tokenize(source: &'src str) -> Result<LexOutput, FatalError> {
        let mut lexer = Lexer::new(source);
        lexer.run()?;
        Ok(LexOutput { tokens: lexer.tokens, diagnostics: lexer.diagnostics })
    }

    fn run(&mut self) -> Result<(), FatalError> {
        loop {
            match self.state {
                LexState::Normal => {
                    if self.step_normal()? {
                        break;
                    }
                }
                LexState::CharLiteral => self.scan_quoted(TokenKind::Char, '\'')?,
                LexState::StringLiteral => self.scan_quoted(TokenKind::String, '"')?,
                LexState::LineComment => self.scan_line_comment(),
            }
        }
        Ok(())
    }

    /// Advance the `Normal` state by one token. Returns `Ok(true)` once
    /// EOF has been emitted and lexing is complete.
    fn step_normal(&mut self) -> Result<bool, FatalError> {
        let line = self.cursor.line();
        let column = self.cursor.column();

        let Some(c) = self.cursor.peek() else {
            self.push(Token::new(TokenKind::Eof, line, column));
            return Ok(true);
        };

        match c {
            '\n' => {
                self.cursor.advance();
                self.push(Token::new(TokenKind::Eol, line, column));
                self.line_tab_depth = 0;
            }
            '\t' => {
                self.cursor.advance();
                self.line_tab_depth += 1;
                self.push(Token::with_count(TokenKind::Tab, self.line_tab_depth, line, column));
                self.ws_streak = 0;
            }
            ' ' => {
                self.cursor.advance();
                self.push(Token::new(TokenKind::Ws, line, column));
            }
            '\'' => {
                self.cursor.advance();
                self.state = LexState::CharLiteral;
            }
            '"' => {
                self.cursor.advance();
                self.state = LexState::StringLiteral;
            }
            '#' => {
                self.cursor.advance();
                self.state = LexState::LineComment;
            }
            c if c.is_ascii_digit() => self.scan_number(line, column),
            c if is_ident_start(c) => self.scan_ident_or_keyword(line, column),
            c => {
                if let Some(kind) = TokenKind::single_char_symbol(c) {
                    self.cursor.advance();
                    self.push(Token::new(kind, line, column));
                } else {
                    self.cursor.advance();
                    self.diagnostics.push(Diagnostic::error(
                        salt_common::Position::new(line, column),
                        format!("unexpected character {c:?}"),
                    ));
                }
            }
        }
        Ok(false)
    }

    fn scan_number(&mut self, line: u32, column: u32) {
        let start = self.cursor.pos();
        self.cursor.advance();
        self.cursor.eat_while(|c| c.is_ascii_alphanumeric() || c == '.');
        let end = self.cursor.pos();
        let text = self.cursor.slice(start, end).to_string();
        let is_float = text.contains('.')
            || ((text.contains('e') || text.contains('E'))
                && !text.starts_with("0x")
                && !text.starts_with("0X"));
        let count = if is_float { 1 } else { 0 };
        self.push(Token { kind: TokenKind::Number, data: Some(text), count, line, column });
    }

    fn scan_ident_or_keyword(&mut self, line: u32, column: u32) {
        let start = self.cursor.pos();
        self.cursor.eat_while(is_ident_continue);
        let end = self.cursor.pos();
        let text = self.cursor.slice(start, end);

        if let Some(kind) = TokenKind::keyword(text) {
            if kind.is_type_keyword() {
                self.push(Token::with_data(TokenKind::Type, text, line, column));
            } else {
                self.push(Token::new(kind, line, column));
            }
            return;
        }
        self.push(Token::with_data(TokenKind::Ident, text, line, column));
    }

    /// `CharLiteral` / `StringLiteral`: accumulate verbatim until the
    /// matching quote (escape sequences are not interpreted -- spec §4.D,
    /// SPEC_FULL Open Questions). EOF before the closing quote is fatal.
    fn scan_quoted(&mut self, kind: TokenKind, quote: char) -> Result<(), FatalError> {
        let line = self.cursor.line();
        let column = self.cursor.column();
        let start = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(FatalError::from(format!(
                        "{line}:{column}: unterminated {} literal",
                        if quote == '\'' { "char" } else { "string" }
                    )));
                }
                Some(c) if c == quote => {
                    let end = self.cursor.pos();
                    let text = self.cursor.slice(start, end).to_string();
                    self.cursor.advance();
                    self.push(Token { kind, data: Some(text), count: 0, line, column });
                    self.state = LexState::Normal;
                    return Ok(());
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn scan_line_comment(&mut self) {
        self.cursor.eat_while(|c| c != '\n');
        self.state = LexState::Normal;
    }

    /// Push a token, then attempt compound-token fusion with the
    /// previously pushed token (spec §4.D "Compound-token fusion").
    fn push(&mut self, token: Token) {
        if token.kind == TokenKind::Ws {
            self.ws_streak += 1;
        } else {
            self.ws_streak = 0;
        }
        self.tokens.push(token);
        self.try_collapse_ws_run();
        self.try_fuse();
    }

    /// Four consecutive `WS` tokens collapse into one `TAB` (spec §4.D).
    fn try_collapse_ws_run(&mut self) {
        if self.ws_streak != 4 {
            return;
        }
        let n = self.tokens.len();
        let first = self.tokens[n - 4].clone();
        self.tokens.truncate(n - 4);
        self.line_tab_depth += 1;
        self.tokens.push(Token::with_count(TokenKind::Tab, self.line_tab_depth, first.line, first.column));
        self.ws_streak = 0;
    }

    fn try_fuse(&mut self) {
        let len = self.tokens.len();
        if len < 2 {
            return;
        }
        let next = self.tokens[len - 1].clone();

        // `unsigned char/short/int/long`: the two keywords are separate
        // surface words, so skip any `WS` run between them (spec §4.D).
        if next.kind == TokenKind::Type
            && matches!(next.data.as_deref(), Some("char" | "short" | "int" | "long"))
        {
            if let Some(idx) = self.find_prev_non_ws(len - 1) {
                if self.tokens[idx].kind == TokenKind::Unsigned {
                    let unsigned_name = match next.data.as_deref().unwrap() {
                        "char" => "uchar",
                        "short" => "ushort",
                        "int" => "uint",
                        "long" => "ulong",
                        _ => unreachable!(),
                    };
                    let (line, column) = (self.tokens[idx].line, self.tokens[idx].column);
                    self.tokens.truncate(idx);
                    self.tokens.push(Token::with_data(TokenKind::Type, unsigned_name, line, column));
                    return;
                }
            }
        }

        let prev = self.tokens[len - 2].clone();

        // Type keyword followed directly by `*`: fold the star into the
        // type token's pointer-layer count instead of keeping a Mul token.
        if prev.kind == TokenKind::Type && next.kind == TokenKind::Mul {
            self.tokens.truncate(len - 1);
            self.tokens[len - 2].count += 1;
            return;
        }

        if let Some(fused) = fuse_pair(prev.kind, next.kind) {
            self.tokens.truncate(len - 2);
            self.tokens.push(Token::new(fused, prev.line, prev.column));
            return;
        }

        // `//` -- legacy line comment, with a warning (spec §4.D fusion
        // table, SPEC_FULL ambient diagnostics).
        if prev.kind == TokenKind::Div && next.kind == TokenKind::Div {
            self.tokens.truncate(len - 2);
            self.diagnostics.push(Diagnostic::warning(
                salt_common::Position::new(prev.line, prev.column),
                "`//` line comments are a legacy form; prefer `#`".to_string(),
            ));
            self.state = LexState::LineComment;
        }
    }

    /// Index of the nearest token before `before` that is not `Ws`, or
    /// `None` if only whitespace (or nothing) precedes it.
    fn find_prev_non_ws(&self, before: usize) -> Option<usize> {
        (0..before).rev().find(|&i| self.tokens[i].kind != TokenKind::Ws)
    }
}

/// Pure pairwise fusion lookup for the fixed two-token merges in the
/// spec's compound-token table (the `Type`/`unsigned`/`//` cases need
/// extra context and are handled separately in `try_fuse`).
fn fuse_pair(prev: TokenKind, next: TokenKind) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match (prev, next) {
        (Add, Add) => Increment,
        (Sub, Sub) => Decrement,
        (Div, Mul) => BlockCommentStart,
        (Mul, Div) => BlockCommentEnd,
        (LAngle, LAngle) => Shl,
        (RAngle, RAngle) => Shr,
        (Sub, RAngle) => Arrow,
        (Amp, Amp) => And,
        (Bar, Bar) => Or,
        (Excl, Assign) => Neq,
        (LAngle, Assign) => Le,
        (RAngle, Assign) => Ge,
        (Assign, Assign) => Eq,
        (Add, Assign) => AddAssign,
        (Sub, Assign) => SubAssign,
        (Mul, Assign) => MulAssign,
        (Div, Assign) => DivAssign,
        (Modulo, Assign) => ModAssign,
        (Amp, Assign) => AndAssign,
        (Bar, Assign) => OrAssign,
        (Tilde, Assign) => TildeAssign,
        (Carat, Assign) => XorAssign,
        (Shl, Assign) => ShlAssign,
        (Shr, Assign) => ShrAssign,
        _ => return None,
    })
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src).unwrap().tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn fuses_increment_and_decrement() {
        assert_eq!(kinds("++"), vec![TokenKind::Increment, TokenKind::Eof]);
        assert_eq!(kinds("--"), vec![TokenKind::Decrement, TokenKind::Eof]);
    }

    #[test]
    fn fuses_compound_assign_family() {
        assert_eq!(kinds("+="), vec![TokenKind::AddAssign, TokenKind::Eof]);
        assert_eq!(kinds("<<="), vec![TokenKind::ShlAssign, TokenKind::Eof]);
        assert_eq!(kinds(">>="), vec![TokenKind::ShrAssign, TokenKind::Eof]);
    }

    #[test]
    fn fuses_arrow_and_comparisons() {
        assert_eq!(kinds("->"), vec![TokenKind::Arrow, TokenKind::Eof]);
        assert_eq!(kinds("=="), vec![TokenKind::Eq, TokenKind::Eof]);
        assert_eq!(kinds("!="), vec![TokenKind::Neq, TokenKind::Eof]);
        assert_eq!(kinds("<="), vec![TokenKind::Le, TokenKind::Eof]);
        assert_eq!(kinds(">="), vec![TokenKind::Ge, TokenKind::Eof]);
    }

    #[test]
    fn four_spaces_collapse_to_one_tab() {
        assert_eq!(kinds("    "), vec![TokenKind::Tab, TokenKind::Eof]);
        assert_eq!(kinds("   "), vec![TokenKind::Ws, TokenKind::Ws, TokenKind::Ws, TokenKind::Eof]);
    }

    #[test]
    fn real_tab_is_one_tab_token() {
        assert_eq!(kinds("\t"), vec![TokenKind::Tab, TokenKind::Eof]);
    }

    #[test]
    fn unsigned_fuses_into_type() {
        let out = Lexer::tokenize("unsigned int").unwrap();
        assert_eq!(out.tokens[0].kind, TokenKind::Type);
        assert_eq!(out.tokens[0].data.as_deref(), Some("uint"));
    }

    #[test]
    fn pointer_stars_increment_type_count() {
        let out = Lexer::tokenize("int**").unwrap();
        assert_eq!(out.tokens[0].kind, TokenKind::Type);
        assert_eq!(out.tokens[0].data.as_deref(), Some("int"));
        assert_eq!(out.tokens[0].count, 2);
    }

    #[test]
    fn ident_vs_keyword() {
        assert_eq!(kinds("fn foo"), vec![TokenKind::Fn, TokenKind::Ws, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn number_literal_marks_float_via_count() {
        let out = Lexer::tokenize("3.14").unwrap();
        assert_eq!(out.tokens[0].kind, TokenKind::Number);
        assert_eq!(out.tokens[0].count, 1);
        let out = Lexer::tokenize("42").unwrap();
        assert_eq!(out.tokens[0].count, 0);
    }

    #[test]
    fn line_comment_consumes_to_newline() {
        assert_eq!(kinds("# hi\nfn"), vec![TokenKind::Eol, TokenKind::Fn, TokenKind::Eof]);
    }

    #[test]
    fn legacy_double_slash_enters_line_comment() {
        assert_eq!(kinds("// hi\nfn"), vec![TokenKind::Eol, TokenKind::Fn, TokenKind::Eof]);
    }

    #[test]
    fn block_comment_markers_are_separate_tokens() {
        assert_eq!(
            kinds("/* */"),
            vec![TokenKind::BlockCommentStart, TokenKind::Ws, TokenKind::BlockCommentEnd, TokenKind::Eof]
        );
    }

    #[test]
    fn string_and_char_literals() {
        let out = Lexer::tokenize(r#""hi" 'a'"#).unwrap();
        assert_eq!(out.tokens[0].kind, TokenKind::String);
        assert_eq!(out.tokens[0].data.as_deref(), Some("hi"));
        assert_eq!(out.tokens[2].kind, TokenKind::Char);
        assert_eq!(out.tokens[2].data.as_deref(), Some("a"));
    }

    #[test]
    fn unterminated_string_is_fatal() {
        assert!(Lexer::tokenize("\"abc").is_err());
    }

    #[test]
    fn unexpected_byte_is_a_diagnostic_not_fatal() {
        let out = Lexer::tokenize("@").unwrap();
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn fused_token_column_equals_first_char_column() {
        let out = Lexer::tokenize("  ++").unwrap();
        let increment = out.tokens.iter().find(|t| t.kind == TokenKind::Increment).unwrap();
        assert_eq!(increment.column, 3);
    }

    #[test]
    fn no_run_of_four_or_more_ws_tokens_survives() {
        let out = Lexer::tokenize("          ").unwrap(); // 10 spaces
        let ws_run = out
            .tokens
            .iter()
            .fold((0u32, 0u32), |(max, cur), t| {
                if t.kind == TokenKind::Ws {
                    (max.max(cur + 1), cur + 1)
                } else {
                    (max, 0)
                }
            })
            .0;
        assert!(ws_run < 4, "found a run of {ws_run} consecutive WS tokens");
    }
}
