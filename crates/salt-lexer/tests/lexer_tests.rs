use salt_lexer::{Lexer, TokenKind};

#[test]
fn tokenizes_a_small_function_declaration() {
    let src = "fn main() -> int:\n\treturn 0\n";
    let out = Lexer::tokenize(src).expect("should not be fatal");
    let kinds: Vec<_> = out.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Fn,
            TokenKind::Ws,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Ws,
            TokenKind::Arrow,
            TokenKind::Ws,
            TokenKind::Type,
            TokenKind::Colon,
            TokenKind::Eol,
            TokenKind::Tab,
            TokenKind::Return,
            TokenKind::Ws,
            TokenKind::Number,
            TokenKind::Eol,
            TokenKind::Eof,
        ]
    );
    assert!(out.diagnostics.is_empty());
}

#[test]
fn every_reported_position_is_one_based() {
    let src = "fn a()\nfn b()\n";
    let out = Lexer::tokenize(src).unwrap();
    for tok in &out.tokens {
        assert!(tok.line >= 1);
        assert!(tok.column >= 1);
    }
    // second `fn` starts at line 2 column 1.
    let second_fn = out.tokens.iter().filter(|t| t.kind == TokenKind::Fn).nth(1).unwrap();
    assert_eq!(second_fn.line, 2);
    assert_eq!(second_fn.column, 1);
}

#[test]
fn pointer_type_tokens_carry_layer_count_in_declarations() {
    let src = "fn f(int** p)";
    let out = Lexer::tokenize(src).unwrap();
    let ty = out.tokens.iter().find(|t| t.kind == TokenKind::Type).unwrap();
    assert_eq!(ty.data.as_deref(), Some("int"));
    assert_eq!(ty.count, 2);
}

#[test]
fn indentation_levels_increment_per_tab() {
    let src = "fn f():\n\t\tx\n";
    let out = Lexer::tokenize(src).unwrap();
    let tabs: Vec<_> = out.tokens.iter().filter(|t| t.kind == TokenKind::Tab).collect();
    assert_eq!(tabs.len(), 2);
    assert_eq!(tabs[0].count, 1);
    assert_eq!(tabs[1].count, 2);
}

#[test]
fn mixed_four_space_indent_behaves_like_a_tab() {
    let src = "fn f():\n    x\n";
    let out = Lexer::tokenize(src).unwrap();
    let tab = out.tokens.iter().find(|t| t.kind == TokenKind::Tab && t.line == 2);
    assert!(tab.is_some(), "four leading spaces should collapse to one TAB");
}

#[test]
fn reserved_constant_keywords_lex_as_distinct_kinds() {
    let src = "null true false inf nan";
    let kinds: Vec<_> = Lexer::tokenize(src).unwrap().tokens.into_iter().map(|t| t.kind).collect();
    assert!(kinds.contains(&TokenKind::Null));
    assert!(kinds.contains(&TokenKind::True));
    assert!(kinds.contains(&TokenKind::False));
    assert!(kinds.contains(&TokenKind::Inf));
    assert!(kinds.contains(&TokenKind::Nan));
}
