//! End-to-end codegen scenarios (spec.md §8), grounded in the same
//! `parse_src`/scenario-numbering style as `salt-parser/tests/parser_tests.rs`.

use inkwell::context::Context;
use salt_codegen::Emitter;
use salt_common::{Diagnostic, FatalError};
use salt_lexer::Lexer;
use salt_parser::Program;

fn parse_src(src: &str) -> Program {
    let lex = Lexer::tokenize(src).expect("lexing should not be fatal");
    assert!(lex.diagnostics.is_empty(), "unexpected lex diagnostics: {:?}", lex.diagnostics);
    let (program, diags) = salt_parser::parse(&lex.tokens);
    assert!(diags.is_empty(), "unexpected parse diagnostics: {diags:?}");
    program
}

fn compile(src: &str) -> Result<(String, Vec<Diagnostic>, bool), FatalError> {
    let program = parse_src(src);
    let context = Context::create();
    let mut emitter = Emitter::new(&context, "test", 0, None)?;
    emitter.compile_program(&program)?;
    let entry_seen = emitter.entry_point_seen();
    Ok((emitter.get_llvm_ir(), emitter.diagnostics, entry_seen))
}

#[test]
fn scenario_1_triple_function_emits_a_multiply() {
    let (ir, diags, _) = compile("fn triple(int x) -> int:\n\treturn x * 3\n").expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("define i32 @triple"), "ir:\n{ir}");
    assert!(ir.contains("mul"), "ir:\n{ir}");
    assert!(ir.contains("ret i32"), "ir:\n{ir}");
}

#[test]
fn scenario_2_pointer_dereference_and_arithmetic_uses_byte_gep() {
    let (ir, diags, _) = compile("fn ptrsum(int* p) -> int:\n\treturn *p + *(p + 1)\n").expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    // `p + 1` must scale by the pointee's size (4 bytes for `int`), not add 1 raw.
    assert!(ir.contains("getelementptr"), "ir:\n{ir}");
    assert!(ir.contains("i8, ptr"), "expected a byte-addressed GEP for pointer-offset scaling:\n{ir}");
    assert!(ir.contains("mul"), "offset should be scaled by a multiply:\n{ir}");
}

#[test]
fn main_function_marks_entry_point_seen() {
    let (_, _, entry_seen) = compile("fn main() -> int:\n\treturn 0\n").expect("should compile");
    assert!(entry_seen);
}

#[test]
fn non_main_function_does_not_mark_entry_point_seen() {
    let (_, _, entry_seen) = compile("fn helper() -> int:\n\treturn 0\n").expect("should compile");
    assert!(!entry_seen);
}

#[test]
fn division_by_literal_zero_warns_but_still_compiles() {
    let (ir, diags, _) = compile("fn f() -> int:\n\treturn 1 / 0\n").expect("should compile despite the warning");
    assert!(diags.iter().any(|d| d.message.contains("division by zero")), "diagnostics: {diags:?}");
    assert!(ir.contains("sdiv"), "ir:\n{ir}");
}

#[test]
fn falling_off_the_end_of_a_non_void_function_warns_and_emits_poison_return() {
    let (ir, diags, _) = compile("fn f() -> int:\n\tlet x = 1\n").expect("should still verify with a poison return");
    assert!(
        diags.iter().any(|d| d.message.contains("does not end with a return instruction")),
        "diagnostics: {diags:?}"
    );
    assert!(ir.contains("ret i32 0"), "ir:\n{ir}");
}

#[test]
fn void_function_falling_off_the_end_gets_a_silent_ret_void() {
    let (ir, diags, _) = compile("fn f() -> void:\n\tlet x = 1\n").expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("ret void"), "ir:\n{ir}");
}

#[test]
fn call_between_two_functions_converts_argument_types() {
    let src = "fn add_one(int x) -> int:\n\treturn x + 1\n\nfn main() -> int:\n\treturn add_one(41)\n";
    let (ir, diags, entry_seen) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(entry_seen);
    assert!(ir.contains("call i32 @add_one"), "ir:\n{ir}");
}

#[test]
fn bitwise_and_or_xor_lower_to_the_matching_llvm_instruction() {
    let src = "fn f(int a, int b) -> int:\n\treturn (a & b) | (a ^ b)\n";
    let (ir, diags, _) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains(" and "), "ir:\n{ir}");
    assert!(ir.contains(" or "), "ir:\n{ir}");
    assert!(ir.contains(" xor "), "ir:\n{ir}");
}

#[test]
fn logical_and_or_convert_operands_to_bool_before_combining() {
    let src = "fn f(int a, int b) -> bool:\n\treturn (a < b) && (b < 10)\n";
    let (ir, diags, _) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("icmp"), "ir:\n{ir}");
    assert!(ir.contains("and i1"), "ir:\n{ir}");
}

#[test]
fn right_shift_is_arithmetic_for_signed_and_logical_for_unsigned() {
    let (ir_signed, diags_signed, _) = compile("fn f(int a) -> int:\n\treturn a >> 1\n").expect("should compile");
    assert!(diags_signed.is_empty());
    assert!(ir_signed.contains("ashr"), "signed >> should be arithmetic:\n{ir_signed}");

    let (ir_unsigned, diags_unsigned, _) = compile("fn f(uint a, uint b) -> uint:\n\treturn a >> b\n").expect("should compile");
    assert!(diags_unsigned.is_empty());
    assert!(ir_unsigned.contains("lshr"), "unsigned >> should be logical:\n{ir_unsigned}");
}

#[test]
fn if_expression_joins_both_arms_with_a_phi() {
    let src = "fn f(int a, int b) -> int:\n\treturn if a < b then a else b\n";
    let (ir, diags, _) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("true:"), "ir:\n{ir}");
    assert!(ir.contains("false:"), "ir:\n{ir}");
    assert!(ir.contains("merge:"), "ir:\n{ir}");
    assert!(ir.contains("phi i32"), "ir:\n{ir}");
}

#[test]
fn repeat_loop_emits_a_phi_counter_and_a_conditional_backedge() {
    let src = "fn f(int n) -> int:\n\trepeat n: n\n\treturn n\n";
    let (ir, diags, _) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("loop:"), "ir:\n{ir}");
    assert!(ir.contains("phi i32"), "ir:\n{ir}");
    assert!(ir.contains("after_loop:"), "ir:\n{ir}");
}

#[test]
fn assignment_to_a_dereferenced_pointer_stores_through_it() {
    let src = "fn set(int* p) -> void:\n\t*p = 5\n";
    let (ir, diags, _) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("store i32 5"), "ir:\n{ir}");
}

#[test]
fn explicit_cast_narrows_with_a_truncate() {
    let src = "fn f(long a) -> int:\n\treturn a as int\n";
    let (ir, diags, _) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("trunc"), "ir:\n{ir}");
}

#[test]
fn compound_assign_reads_modifies_and_stores_the_variable() {
    // Before the fix, `x += 2` computed `x + 2` and discarded it -- no
    // diagnostic, no store, `x` left untouched. It must now load, add,
    // and store back through the same alloca `let x = 1` wrote into.
    let src = "fn f() -> int:\n\tlet x = 1\n\tx += 2\n\treturn x\n";
    let (ir, diags, _) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("add i32"), "compound assign should compute the underlying `+`:\n{ir}");
    let store_count = ir.matches("store i32").count();
    assert_eq!(store_count, 2, "expected one store for `let x = 1` and one for `x += 2`:\n{ir}");
}

#[test]
fn compound_assign_through_a_dereferenced_pointer_stores_through_it() {
    let src = "fn bump(int* p) -> void:\n\t*p += 1\n";
    let (ir, diags, _) = compile(src).expect("should compile");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    assert!(ir.contains("add i32"), "ir:\n{ir}");
    assert!(ir.contains("store i32"), "ir:\n{ir}");
}

#[test]
fn a_fully_typed_program_always_passes_the_llvm_verifier() {
    // `compile_program` itself calls `module.verify()` and turns failure
    // into a `FatalError`; reaching `Ok` here is the verifier passing.
    let src = "fn helper(int a, int b) -> int:\n\treturn if a < b then a else b\n\nfn main() -> int:\n\treturn helper(1, 2)\n";
    compile(src).expect("a fully-typed program must pass the LLVM verifier");
}
