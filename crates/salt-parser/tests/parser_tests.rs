//! End-to-end parser scenarios from spec.md §8.

use salt_lexer::Lexer;
use salt_parser::{BinOp, Expr, Item, Literal};

fn parse_src(src: &str) -> (salt_parser::Program, Vec<salt_common::Diagnostic>) {
    let lex = Lexer::tokenize(src).expect("lexing should not be fatal");
    assert!(lex.diagnostics.is_empty(), "unexpected lex diagnostics: {:?}", lex.diagnostics);
    salt_parser::parse(&lex.tokens)
}

#[test]
fn scenario_1_triple_function() {
    let (program, diags) = parse_src("fn triple(int x) -> int:\n\treturn x * 3\n");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert_eq!(program.items.len(), 1);
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    assert_eq!(func.decl.name, "triple");
    assert_eq!(func.decl.params.len(), 1);
    assert_eq!(func.decl.params[0].name, "x");
    assert_eq!(func.body.len(), 1);
    match &func.body[0] {
        Expr::Return { value: Some(value), .. } => {
            assert!(matches!(value.as_ref(), Expr::Binary { op: BinOp::Mul, .. }));
        }
        other => panic!("expected a return statement, got {other:?}"),
    }
}

#[test]
fn scenario_2_pointer_dereference_and_arithmetic() {
    let (program, diags) = parse_src("fn ptrsum(int* p) -> int:\n\treturn *p + *(p + 1)\n");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    match &func.body[0] {
        Expr::Return { value: Some(value), .. } => match value.as_ref() {
            Expr::Binary { op: BinOp::Add, lhs, rhs, .. } => {
                assert!(matches!(lhs.as_ref(), Expr::Deref { .. }));
                assert!(matches!(rhs.as_ref(), Expr::Deref { .. }));
            }
            other => panic!("expected a top-level `+`, got {other:?}"),
        },
        other => panic!("expected a return statement, got {other:?}"),
    }
}

#[test]
fn scenario_3_empty_body_parses_with_no_statements() {
    let (program, diags) = parse_src("fn f() -> int:\n");
    assert!(diags.is_empty());
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    assert!(func.body.is_empty());
}

#[test]
fn scenario_5_undeclared_callee_is_an_error_naming_the_function() {
    let (_program, diags) = parse_src("fn f():\n\treturn g(1)\n");
    assert!(diags.iter().any(|d| d.message.contains("no function exists named g")), "diagnostics: {diags:?}");
}

#[test]
fn scenario_6_overflowing_literal_becomes_a_poison_with_a_diagnostic() {
    let (program, diags) = parse_src("fn f():\n\treturn 18446744073709551616\n");
    assert!(diags.iter().any(|d| d.message.contains("overflow")), "diagnostics: {diags:?}");
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    match &func.body[0] {
        Expr::Return { value: Some(value), .. } => {
            assert!(matches!(value.as_ref(), Expr::Value { literal: Literal::Int(0), .. }));
            assert!(value.ty().ty.name == "<error>");
        }
        other => panic!("expected a return statement, got {other:?}"),
    }
}

#[test]
fn precedence_mul_binds_tighter_than_add() {
    // `1 + 2 * 3` groups as `1 + (2 * 3)` (spec §8 scenario 4 / precedence law).
    let (program, diags) = parse_src("fn f() -> int:\n\treturn 1 + 2 * 3\n");
    assert!(diags.is_empty());
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    match &func.body[0] {
        Expr::Return { value: Some(value), .. } => match value.as_ref() {
            Expr::Binary { op: BinOp::Add, lhs, rhs, .. } => {
                assert!(matches!(lhs.as_ref(), Expr::Value { literal: Literal::Int(1), .. }));
                assert!(matches!(rhs.as_ref(), Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("expected a top-level `+`, got {other:?}"),
        },
        other => panic!("expected a return statement, got {other:?}"),
    }
}

#[test]
fn precedence_shift_binds_looser_than_additive() {
    // `a << b + c` groups as `a << (b + c)`: `+` (prec 80) outranks `<<` (70).
    let (program, diags) = parse_src("fn f(int a, int b, int c) -> int:\n\treturn a << b + c\n");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    match &func.body[0] {
        Expr::Return { value: Some(value), .. } => match value.as_ref() {
            Expr::Binary { op: BinOp::Shl, rhs, .. } => {
                assert!(matches!(rhs.as_ref(), Expr::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("expected a top-level `<<`, got {other:?}"),
        },
        other => panic!("expected a return statement, got {other:?}"),
    }
}

#[test]
fn let_binding_is_visible_to_later_statements() {
    let (program, diags) = parse_src("fn f() -> int:\n\tlet x = 5\n\treturn x\n");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    assert_eq!(func.body.len(), 2);
    assert!(matches!(func.body[0], Expr::NewVariable { .. }));
    match &func.body[1] {
        Expr::Return { value: Some(value), .. } => {
            assert!(matches!(value.as_ref(), Expr::Variable { .. }));
            assert_ne!(value.ty().ty.name, "<error>");
        }
        other => panic!("expected a return statement, got {other:?}"),
    }
}

#[test]
fn undefined_identifier_is_reported_and_typed_as_error() {
    let (_program, diags) = parse_src("fn f() -> int:\n\treturn y\n");
    assert!(diags.iter().any(|d| d.message.contains("undefined identifier")), "diagnostics: {diags:?}");
}

#[test]
fn redefining_a_function_is_reported() {
    let (_program, diags) = parse_src("fn f():\n\treturn 0\nfn f():\n\treturn 1\n");
    assert!(diags.iter().any(|d| d.message.contains("redefinition")), "diagnostics: {diags:?}");
}

#[test]
fn void_typed_parameter_is_reported() {
    let (_program, diags) = parse_src("fn f(void x):\n\treturn 0\n");
    assert!(diags.iter().any(|d| d.message.contains("void")), "diagnostics: {diags:?}");
}

#[test]
fn compound_assign_parses_as_a_dedicated_binop_at_assignment_precedence() {
    // `x += 2` must not collapse into a plain `Add` (codegen would then
    // have no way to tell it apart from a discarded `x + 2`).
    let (program, diags) = parse_src("fn f() -> int:\n\tlet x = 1\n\tx += 2\n\treturn x\n");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    assert_eq!(func.body.len(), 3);
    let stmt = &func.body[1];
    match stmt {
        Expr::Binary { op: BinOp::AddAssign, lhs, rhs, .. } => {
            assert!(matches!(lhs.as_ref(), Expr::Variable { name, .. } if name == "x"));
            assert!(matches!(rhs.as_ref(), Expr::Value { literal: Literal::Int(2), .. }));
            // Result type is the assignment target's type, same rule as plain `Assign`.
            assert_eq!(stmt.ty(), lhs.ty());
        }
        other => panic!("expected a top-level `+=`, got {other:?}"),
    }
}

#[test]
fn compound_assign_is_right_associative_like_plain_assignment() {
    // `x += y += 1` must group as `x += (y += 1)`, the same right-assoc
    // shape as the plain assignment family.
    let (program, diags) = parse_src("fn f() -> int:\n\tlet x = 1\n\tlet y = 1\n\tx += y += 1\n\treturn x\n");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let Item::Function(func) = &program.items[0] else { panic!("expected a function item") };
    match &func.body[2] {
        Expr::Binary { op: BinOp::AddAssign, rhs, .. } => {
            assert!(matches!(rhs.as_ref(), Expr::Binary { op: BinOp::AddAssign, .. }));
        }
        other => panic!("expected a top-level `+=`, got {other:?}"),
    }
}
