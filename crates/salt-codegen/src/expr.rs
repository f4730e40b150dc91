//! Expression codegen (spec §4.G), grounded in the teacher's
//! `mesh-codegen/src/codegen/expr.rs` dispatch shape for the overall
//! structure, and in `original_source/src/frontend/ast.cpp`'s
//! `BinaryExprAST::code_gen` for the exact per-operator, per-bin-kind
//! lowering table (bin-kind `INT`/`UINT`/`FLOAT`/`PTR`/`INVALID`).

use inkwell::basic_block::BasicBlock;
use inkwell::values::{BasicValue, BasicValueEnum};
use inkwell::{FloatPredicate, IntPredicate};

use salt_common::{Diagnostic, FatalError, Position};
use salt_parser::{BinOp, Expr, Literal};
use salt_types::{PrimitiveKind, TypeInstance, BOOL, INT, SSIZE};

use crate::types::{is_signed, llvm_basic_type};
use crate::Emitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinKind {
    Int,
    Uint,
    Float,
    Invalid,
}

fn classify_bin(ty: TypeInstance) -> BinKind {
    if ty.is_pointer() {
        return BinKind::Invalid;
    }
    match ty.ty.kind {
        PrimitiveKind::Float | PrimitiveKind::Double => BinKind::Float,
        PrimitiveKind::Bool | PrimitiveKind::Char | PrimitiveKind::Short | PrimitiveKind::Int | PrimitiveKind::Long | PrimitiveKind::SSize => {
            BinKind::Int
        }
        PrimitiveKind::UChar | PrimitiveKind::UShort | PrimitiveKind::UInt | PrimitiveKind::ULong | PrimitiveKind::USize => BinKind::Uint,
        _ => BinKind::Invalid,
    }
}

fn is_zero_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Value { literal: Literal::Int(0), .. } => true,
        Expr::Value { literal: Literal::Float(f), .. } => *f == 0.0,
        _ => false,
    }
}

fn float_overflows_int(f: f64, target: TypeInstance) -> bool {
    let bits = (target.size_bytes() * 8) as i32;
    if is_signed(target) {
        let max = 2f64.powi(bits - 1) - 1.0;
        let min = -(2f64.powi(bits - 1));
        f < min || f > max
    } else {
        let max = 2f64.powi(bits) - 1.0;
        f < 0.0 || f > max
    }
}

impl<'ctx> Emitter<'ctx> {
    pub(crate) fn codegen_expr(&mut self, expr: &Expr) -> Result<BasicValueEnum<'ctx>, FatalError> {
        match expr {
            Expr::Value { literal, meta } => self.codegen_literal(literal, meta.ty),
            Expr::Variable { name, meta } => self.codegen_variable(name, meta.ty),
            Expr::Binary { op, lhs, rhs, meta } => self.codegen_binary(*op, lhs, rhs, meta.ty),
            Expr::If { cond, then_branch, else_branch, meta } => self.codegen_if(cond, then_branch, else_branch, meta.ty),
            Expr::Repeat { until, body, .. } => self.codegen_repeat(until, body),
            Expr::Call { callee, args, meta } => self.codegen_call(callee, args, meta.ty, meta.line, meta.column),
            Expr::Type { instance, .. } => Ok(self.poison_value(*instance)),
            Expr::Deref { inner, meta } => self.codegen_deref(inner, meta.ty),
            Expr::Return { value, meta } => self.codegen_return(value.as_deref(), meta.line, meta.column),
            Expr::NewVariable { name, value, meta } => self.codegen_new_variable(name, value, meta.ty),
        }
    }

    fn codegen_literal(&mut self, literal: &Literal, ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        Ok(match literal {
            Literal::Int(v) => llvm_basic_type(self.context, ty).into_int_type().const_int(*v, is_signed(ty)).into(),
            Literal::Float(v) => llvm_basic_type(self.context, ty).into_float_type().const_float(*v).into(),
            Literal::Bool(b) => self.context.bool_type().const_int(*b as u64, false).into(),
            Literal::Char(s) => {
                let byte = s.bytes().next().unwrap_or(0);
                self.context.i8_type().const_int(byte as u64, false).into()
            }
            Literal::Str(s) => self
                .builder
                .build_global_string_ptr(s, "strlit")
                .map_err(|e| FatalError::from(e.to_string()))?
                .as_pointer_value()
                .into(),
            Literal::Null => llvm_basic_type(self.context, ty).into_pointer_type().const_null().into(),
        })
    }

    fn codegen_variable(&mut self, name: &str, ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let Some(&slot) = self.locals.get(name) else {
            return Ok(self.poison_value(ty));
        };
        self.builder.build_load(llvm_basic_type(self.context, ty), slot, name).map_err(|e| FatalError::from(e.to_string()))
    }

    fn codegen_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, result_ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        match op {
            BinOp::As => self.codegen_cast(lhs, rhs, result_ty),
            BinOp::Assign => self.codegen_assign(lhs, rhs),
            _ if op.compound_underlying().is_some() => self.codegen_compound_assign(op, lhs, rhs),
            BinOp::LogicalAnd | BinOp::LogicalOr => self.codegen_logical(op, lhs, rhs),
            _ => {
                let lhs_ty = lhs.ty();
                let rhs_ty = rhs.ty();
                if lhs_ty.is_pointer() || rhs_ty.is_pointer() {
                    return self.codegen_ptr_binop(op, lhs, rhs, lhs_ty, rhs_ty, result_ty);
                }
                let lhs_val = self.codegen_expr(lhs)?;
                let rhs_val = self.codegen_expr(rhs)?;
                match classify_bin(result_ty) {
                    BinKind::Float => {
                        let l = self.convert_implicit(lhs_val, lhs_ty, result_ty)?.unwrap_or(lhs_val).into_float_value();
                        let r = self.convert_implicit(rhs_val, rhs_ty, result_ty)?.unwrap_or(rhs_val).into_float_value();
                        self.codegen_float_binop(op, l, r, rhs)
                    }
                    BinKind::Int | BinKind::Uint => {
                        let l = self.convert_implicit(lhs_val, lhs_ty, result_ty)?.unwrap_or(lhs_val).into_int_value();
                        let r = self.convert_implicit(rhs_val, rhs_ty, result_ty)?.unwrap_or(rhs_val).into_int_value();
                        self.codegen_int_binop(op, l, r, is_signed(result_ty), rhs)
                    }
                    BinKind::Invalid => {
                        self.diagnostics.push(Diagnostic::error(Position::new(lhs.line(), lhs.column()), format!("invalid operand types for `{op:?}`")));
                        Ok(self.poison_value(result_ty))
                    }
                }
            }
        }
    }

    fn codegen_int_binop(&mut self, op: BinOp, l: inkwell::values::IntValue<'ctx>, r: inkwell::values::IntValue<'ctx>, signed: bool, rhs_expr: &Expr) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let v = match op {
            BinOp::Add => self.builder.build_int_add(l, r, "addtmp"),
            BinOp::Sub => self.builder.build_int_sub(l, r, "subtmp"),
            BinOp::Mul => self.builder.build_int_mul(l, r, "multmp"),
            BinOp::Div => {
                if is_zero_literal(rhs_expr) {
                    self.diagnostics.push(Diagnostic::warning(Position::new(rhs_expr.line(), rhs_expr.column()), "division by zero"));
                }
                if signed {
                    self.builder.build_int_signed_div(l, r, "divtmp")
                } else {
                    self.builder.build_int_unsigned_div(l, r, "udivtmp")
                }
            }
            BinOp::Mod => {
                if is_zero_literal(rhs_expr) {
                    self.diagnostics.push(Diagnostic::warning(Position::new(rhs_expr.line(), rhs_expr.column()), "division by zero"));
                }
                if signed {
                    self.builder.build_int_signed_rem(l, r, "modtmp")
                } else {
                    self.builder.build_int_unsigned_rem(l, r, "umodtmp")
                }
            }
            BinOp::Shl => self.builder.build_left_shift(l, r, "shltmp"),
            BinOp::Shr => self.builder.build_right_shift(l, r, signed, "shrtmp"),
            BinOp::BitAnd => self.builder.build_and(l, r, "andtmp"),
            BinOp::BitOr => self.builder.build_or(l, r, "ortmp"),
            BinOp::Xor => self.builder.build_xor(l, r, "xortmp"),
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Neq => {
                let pred = int_predicate(op, signed);
                return self
                    .builder
                    .build_int_compare(pred, l, r, "cmptmp")
                    .map(Into::into)
                    .map_err(|e| FatalError::from(e.to_string()));
            }
            BinOp::As | BinOp::Assign | BinOp::LogicalAnd | BinOp::LogicalOr => unreachable!("handled by codegen_binary before reaching codegen_int_binop"),
            BinOp::AddAssign | BinOp::SubAssign | BinOp::MulAssign | BinOp::DivAssign | BinOp::ModAssign | BinOp::AndAssign | BinOp::OrAssign | BinOp::XorAssign | BinOp::ShlAssign | BinOp::ShrAssign => {
                unreachable!("compound-assign ops are desugared to their underlying op by codegen_compound_assign before reaching codegen_int_binop")
            }
        };
        v.map(Into::into).map_err(|e| FatalError::from(e.to_string()))
    }

    fn codegen_float_binop(&mut self, op: BinOp, l: inkwell::values::FloatValue<'ctx>, r: inkwell::values::FloatValue<'ctx>, rhs_expr: &Expr) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let result: Result<BasicValueEnum, FatalError> = match op {
            BinOp::Add => self.builder.build_float_add(l, r, "addtmp").map(Into::into).map_err(|e| FatalError::from(e.to_string())),
            BinOp::Sub => self.builder.build_float_sub(l, r, "subtmp").map(Into::into).map_err(|e| FatalError::from(e.to_string())),
            BinOp::Mul => self.builder.build_float_mul(l, r, "multmp").map(Into::into).map_err(|e| FatalError::from(e.to_string())),
            BinOp::Div => {
                if is_zero_literal(rhs_expr) {
                    self.diagnostics.push(Diagnostic::warning(Position::new(rhs_expr.line(), rhs_expr.column()), "division by zero"));
                }
                self.builder.build_float_div(l, r, "fdivtmp").map(Into::into).map_err(|e| FatalError::from(e.to_string()))
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Neq => {
                let pred = float_predicate(op);
                self.builder.build_float_compare(pred, l, r, "cmptmp").map(Into::into).map_err(|e| FatalError::from(e.to_string()))
            }
            _ => {
                self.diagnostics.push(Diagnostic::error(Position::new(rhs_expr.line(), rhs_expr.column()), format!("`{op:?}` is not defined on floating-point operands")));
                Ok(self.poison_value(TypeInstance::simple(&salt_types::DOUBLE)))
            }
        };
        result
    }

    fn codegen_logical(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let bool_ty = TypeInstance::simple(&BOOL);
        let lhs_val = self.codegen_expr(lhs)?;
        let lhs_bool = self.convert_implicit(lhs_val, lhs.ty(), bool_ty)?.unwrap_or(lhs_val).into_int_value();
        let rhs_val = self.codegen_expr(rhs)?;
        let rhs_bool = self.convert_implicit(rhs_val, rhs.ty(), bool_ty)?.unwrap_or(rhs_val).into_int_value();
        let result = match op {
            BinOp::LogicalAnd => self.builder.build_and(lhs_bool, rhs_bool, "andtmp"),
            BinOp::LogicalOr => self.builder.build_or(lhs_bool, rhs_bool, "ortmp"),
            _ => unreachable!(),
        };
        result.map(Into::into).map_err(|e| FatalError::from(e.to_string()))
    }

    fn codegen_ptr_binop(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, lhs_ty: TypeInstance, rhs_ty: TypeInstance, result_ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let both_ptr = lhs_ty.is_pointer() && rhs_ty.is_pointer();
        match op {
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Neq if both_ptr => {
                let lhs_val = self.codegen_expr(lhs)?;
                let rhs_val = self.codegen_expr(rhs)?;
                let word = self.context.ptr_sized_int_type(&self.target_machine.get_target_data(), None);
                let l = self.builder.build_ptr_to_int(lhs_val.into_pointer_value(), word, "ptr_word").map_err(|e| FatalError::from(e.to_string()))?;
                let r = self.builder.build_ptr_to_int(rhs_val.into_pointer_value(), word, "ptr_word").map_err(|e| FatalError::from(e.to_string()))?;
                let pred = int_predicate(op, false);
                self.builder.build_int_compare(pred, l, r, "ptrcmp").map(Into::into).map_err(|e| FatalError::from(e.to_string()))
            }
            BinOp::Add | BinOp::Sub if lhs_ty.is_pointer() != rhs_ty.is_pointer() => self.codegen_ptr_offset(op, lhs, rhs, lhs_ty, rhs_ty, result_ty),
            _ => {
                self.diagnostics.push(Diagnostic::error(Position::new(lhs.line(), lhs.column()), format!("invalid pointer operand for `{op:?}`")));
                Ok(self.poison_value(result_ty))
            }
        }
    }

    /// Pointer + integer offset (spec §4.G "Pointer-offset scaling"),
    /// grounded verbatim in `BinaryExprAST::code_gen`'s `TOK_ADD`/`TOK_SUB`
    /// `BIN_TYPE_PTR` arms: scale the offset by the pointee's size unless
    /// `ptr_layers > 1`, in which case by the pointer's own size.
    fn codegen_ptr_offset(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, lhs_ty: TypeInstance, rhs_ty: TypeInstance, result_ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let (ptr_expr, ptr_ty, offset_expr, offset_ty) = if lhs_ty.is_pointer() { (lhs, lhs_ty, rhs, rhs_ty) } else { (rhs, rhs_ty, lhs, lhs_ty) };
        if matches!(classify_bin(offset_ty), BinKind::Invalid | BinKind::Float) {
            self.diagnostics.push(Diagnostic::error(Position::new(offset_expr.line(), offset_expr.column()), "pointer offset must be an integer"));
            return Ok(self.poison_value(result_ty));
        }
        let ptr_val = self.codegen_expr(ptr_expr)?;
        let offset_val = self.codegen_expr(offset_expr)?;

        let pointee_bytes = if ptr_ty.ptr_layers > 1 {
            salt_types::POINTER.size_bytes
        } else {
            ptr_ty.pointee.expect("pointer TypeInstance must carry a pointee").size_bytes
        };
        let pointee_bytes = pointee_bytes.max(1);

        let ssize_ty = TypeInstance::simple(&SSIZE);
        let offset_ssize = self.convert_implicit(offset_val, offset_ty, ssize_ty)?.unwrap_or(offset_val).into_int_value();
        let scale = offset_ssize.get_type().const_int(pointee_bytes as u64, false);
        let mut scaled = self.builder.build_int_mul(offset_ssize, scale, "offsettmp").map_err(|e| FatalError::from(e.to_string()))?;
        if matches!(op, BinOp::Sub) {
            scaled = self.builder.build_int_neg(scaled, "negoffset").map_err(|e| FatalError::from(e.to_string()))?;
        }
        let name = if matches!(op, BinOp::Add) { "ptradd" } else { "ptrsub" };
        let byte_ptr = unsafe {
            self.builder
                .build_gep(self.context.i8_type(), ptr_val.into_pointer_value(), &[scaled], name)
                .map_err(|e| FatalError::from(e.to_string()))?
        };
        Ok(byte_ptr.into())
    }

    fn codegen_cast(&mut self, lhs: &Expr, rhs: &Expr, result_ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let Expr::Type { instance, .. } = rhs else {
            return Err(FatalError::from("`as` right-hand side must be a type expression"));
        };
        let lhs_val = self.codegen_expr(lhs)?;
        let lhs_ty = lhs.ty();
        self.maybe_warn_float_overflow(lhs, *instance);
        match self.convert_explicit(lhs_val, lhs_ty, *instance)? {
            Some(v) => Ok(v),
            None => {
                self.diagnostics.push(Diagnostic::error(Position::new(rhs.line(), rhs.column()), format!("cannot cast `{lhs_ty}` to `{instance}`")));
                Ok(self.poison_value(result_ty))
            }
        }
    }

    /// Assignment (spec §4.G "Assignment"): LHS must be a variable or a
    /// dereference; the expression's value is the converted RHS.
    fn codegen_assign(&mut self, lhs: &Expr, rhs: &Expr) -> Result<BasicValueEnum<'ctx>, FatalError> {
        match lhs {
            Expr::Variable { name, meta } => {
                let target_ty = meta.ty;
                let Some(&slot) = self.locals.get(name) else {
                    return Ok(self.poison_value(target_ty));
                };
                let rhs_val = self.codegen_expr(rhs)?;
                self.maybe_warn_float_overflow(rhs, target_ty);
                match self.convert_implicit(rhs_val, rhs.ty(), target_ty)? {
                    Some(converted) => {
                        self.builder.build_store(slot, converted).map_err(|e| FatalError::from(e.to_string()))?;
                        Ok(converted)
                    }
                    None => {
                        self.diagnostics.push(Diagnostic::error(Position::new(rhs.line(), rhs.column()), "wrong type for the right-hand side of an assignment"));
                        Ok(self.poison_value(target_ty))
                    }
                }
            }
            Expr::Deref { inner, meta } => {
                let target_ty = meta.ty;
                let ptr_val = self.codegen_expr(inner)?;
                let rhs_val = self.codegen_expr(rhs)?;
                self.maybe_warn_float_overflow(rhs, target_ty);
                match self.convert_implicit(rhs_val, rhs.ty(), target_ty)? {
                    Some(converted) => {
                        self.builder.build_store(ptr_val.into_pointer_value(), converted).map_err(|e| FatalError::from(e.to_string()))?;
                        Ok(converted)
                    }
                    None => {
                        self.diagnostics.push(Diagnostic::error(Position::new(rhs.line(), rhs.column()), "wrong type for the right-hand side of an assignment"));
                        Ok(self.poison_value(target_ty))
                    }
                }
            }
            _ => {
                self.diagnostics.push(Diagnostic::error(Position::new(lhs.line(), lhs.column()), "cannot assign to this expression"));
                Ok(self.poison_value(lhs.ty()))
            }
        }
    }

    /// Compound assignment (spec §4.F "assignment family"): `x += y`
    /// desugars to a read-modify-store, computing `x <underlying-op> y`
    /// through the same dispatch a plain binary expression uses and
    /// storing the result back through the variable/deref LHS, matching
    /// `codegen_assign`'s store paths. The original's `operators.cpp`
    /// never constructs a binop for these tokens at all (see DESIGN.md);
    /// this gives them real, not silently-discarded, semantics.
    fn codegen_compound_assign(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let underlying = op.compound_underlying().expect("codegen_compound_assign is only called for compound-assign BinOp variants");
        let target_ty = lhs.ty();
        let computed = self.codegen_binary(underlying, lhs, rhs, target_ty)?;
        match lhs {
            Expr::Variable { name, .. } => {
                let Some(&slot) = self.locals.get(name) else {
                    return Ok(self.poison_value(target_ty));
                };
                self.builder.build_store(slot, computed).map_err(|e| FatalError::from(e.to_string()))?;
                Ok(computed)
            }
            Expr::Deref { inner, .. } => {
                let ptr_val = self.codegen_expr(inner)?;
                self.builder.build_store(ptr_val.into_pointer_value(), computed).map_err(|e| FatalError::from(e.to_string()))?;
                Ok(computed)
            }
            _ => {
                self.diagnostics.push(Diagnostic::error(Position::new(lhs.line(), lhs.column()), "cannot assign to this expression"));
                Ok(self.poison_value(target_ty))
            }
        }
    }

    /// `if`/`then`/`else` codegen (spec §4.G "Control flow for `if`"):
    /// three basic blocks named `true`/`false`/`merge` and a two-incoming
    /// PHI, per the spec's literal wording -- a deliberate divergence from
    /// the teacher's alloca-based `codegen_if` (`mesh-codegen/src/codegen/
    /// expr.rs`), which stores each arm into a shared stack slot instead
    /// of PHI-ing. See DESIGN.md.
    fn codegen_if(&mut self, cond: &Expr, then_branch: &Expr, else_branch: &Expr, result_ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let fn_value = self.current_fn.expect("`if` only appears inside a function body");
        let cond_val = self.codegen_expr(cond)?;
        let cond_bool = self.convert_implicit(cond_val, cond.ty(), TypeInstance::simple(&BOOL))?.unwrap_or(cond_val).into_int_value();

        let true_bb = self.context.append_basic_block(fn_value, "true");
        let false_bb = self.context.append_basic_block(fn_value, "false");
        let merge_bb = self.context.append_basic_block(fn_value, "merge");
        self.builder.build_conditional_branch(cond_bool, true_bb, false_bb).map_err(|e| FatalError::from(e.to_string()))?;

        let mut incoming: Vec<(BasicValueEnum<'ctx>, BasicBlock<'ctx>)> = Vec::with_capacity(2);

        self.builder.position_at_end(true_bb);
        let then_val = self.codegen_expr(then_branch)?;
        let then_val = self.convert_implicit(then_val, then_branch.ty(), result_ty)?.unwrap_or(then_val);
        if self.builder.get_insert_block().and_then(|b| b.get_terminator()).is_none() {
            let bb = self.builder.get_insert_block().expect("builder has an active block");
            self.builder.build_unconditional_branch(merge_bb).map_err(|e| FatalError::from(e.to_string()))?;
            incoming.push((then_val, bb));
        }

        self.builder.position_at_end(false_bb);
        let else_val = self.codegen_expr(else_branch)?;
        let else_val = self.convert_implicit(else_val, else_branch.ty(), result_ty)?.unwrap_or(else_val);
        if self.builder.get_insert_block().and_then(|b| b.get_terminator()).is_none() {
            let bb = self.builder.get_insert_block().expect("builder has an active block");
            self.builder.build_unconditional_branch(merge_bb).map_err(|e| FatalError::from(e.to_string()))?;
            incoming.push((else_val, bb));
        }

        self.builder.position_at_end(merge_bb);

        let is_void = !result_ty.is_pointer() && matches!(result_ty.ty.kind, PrimitiveKind::Void);
        if is_void {
            return Ok(self.context.bool_type().const_zero().into());
        }
        if incoming.is_empty() {
            self.builder.build_unreachable().map_err(|e| FatalError::from(e.to_string()))?;
            return Ok(self.poison_value(result_ty));
        }
        let phi = self.builder.build_phi(llvm_basic_type(self.context, result_ty), "ifval").map_err(|e| FatalError::from(e.to_string()))?;
        let incoming_refs: Vec<(&dyn BasicValue<'ctx>, BasicBlock<'ctx>)> = incoming.iter().map(|(v, b)| (v as &dyn BasicValue<'ctx>, *b)).collect();
        phi.add_incoming(&incoming_refs);
        Ok(phi.as_basic_value())
    }

    /// `repeat UNTIL: BODY` codegen -- a byte-for-byte port of
    /// `original_source/src/frontend/ast.cpp`'s `RepeatAST::code_gen`,
    /// bug included: the end condition and the next-iteration value are
    /// computed from the loop's initial count, not from the `loop_ctr`
    /// PHI itself (see DESIGN.md's Open Question decision).
    fn codegen_repeat(&mut self, until: &Expr, body: &Expr) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let fn_value = self.current_fn.expect("`repeat` only appears inside a function body");
        let i32_ty = self.context.i32_type();
        let loop_ctr_init = i32_ty.const_int(0, true);
        let step = i32_ty.const_int(1, true);

        let until_val = self.codegen_expr(until)?;
        let until_i32 = self.convert_implicit(until_val, until.ty(), TypeInstance::simple(&INT))?.unwrap_or(until_val).into_int_value();

        let preheader_bb = self.builder.get_insert_block().expect("builder has an active insertion point");
        let loop_bb = self.context.append_basic_block(fn_value, "loop");
        self.builder.build_unconditional_branch(loop_bb).map_err(|e| FatalError::from(e.to_string()))?;
        self.builder.position_at_end(loop_bb);

        let phi = self.builder.build_phi(i32_ty, "loop_ctr").map_err(|e| FatalError::from(e.to_string()))?;
        phi.add_incoming(&[(&loop_ctr_init, preheader_bb)]);

        self.codegen_expr(body)?;

        let next_val = self.builder.build_int_add(loop_ctr_init, step, "loop_next_val").map_err(|e| FatalError::from(e.to_string()))?;
        let end_cond = self.builder.build_int_compare(IntPredicate::SGE, loop_ctr_init, until_i32, "loop_end_cond").map_err(|e| FatalError::from(e.to_string()))?;

        let loop_end_bb = self.builder.get_insert_block().expect("builder has an active insertion point");
        let after_bb = self.context.append_basic_block(fn_value, "after_loop");
        self.builder.build_conditional_branch(end_cond, loop_bb, after_bb).map_err(|e| FatalError::from(e.to_string()))?;
        self.builder.position_at_end(after_bb);
        phi.add_incoming(&[(&next_val, loop_end_bb)]);

        Ok(i32_ty.const_int(0, true).into())
    }

    fn codegen_call(&mut self, callee: &str, args: &[Expr], result_ty: TypeInstance, line: u32, column: u32) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let Some(decl) = self.declarations.get(callee).cloned() else {
            return Ok(self.poison_value(result_ty));
        };
        let fn_value = *self.functions.get(callee).expect("a declared function always has an LLVM FunctionValue");

        if decl.params.len() != args.len() {
            self.diagnostics.push(Diagnostic::error(
                Position::new(line, column),
                format!("`{callee}` expects {} argument(s), found {}", decl.params.len(), args.len()),
            ));
            return Ok(self.poison_value(result_ty));
        }

        let mut compiled_args = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(&decl.params) {
            let arg_val = self.codegen_expr(arg)?;
            self.maybe_warn_float_overflow(arg, param.ty);
            let converted = match self.convert_implicit(arg_val, arg.ty(), param.ty)? {
                Some(v) => v,
                None => {
                    self.diagnostics.push(Diagnostic::error(
                        Position::new(arg.line(), arg.column()),
                        format!("cannot convert argument to `{}`", param.ty),
                    ));
                    self.poison_value(param.ty)
                }
            };
            compiled_args.push(converted.into());
        }

        let is_void_return = !decl.return_type.is_pointer() && matches!(decl.return_type.ty.kind, PrimitiveKind::Void);
        let call_name = if is_void_return { "" } else { "calltmp" };
        let call = self.builder.build_call(fn_value, &compiled_args, call_name).map_err(|e| FatalError::from(e.to_string()))?;
        match call.try_as_basic_value().left() {
            Some(v) => Ok(v),
            None => Ok(self.poison_value(result_ty)),
        }
    }

    fn codegen_deref(&mut self, inner: &Expr, result_ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let ptr_val = self.codegen_expr(inner)?;
        if !inner.ty().is_pointer() {
            self.diagnostics.push(Diagnostic::error(Position::new(inner.line(), inner.column()), format!("type `{}` cannot be dereferenced", inner.ty())));
            return Ok(self.poison_value(result_ty));
        }
        self.builder.build_load(llvm_basic_type(self.context, result_ty), ptr_val.into_pointer_value(), "deref").map_err(|e| FatalError::from(e.to_string()))
    }

    /// `return` codegen (spec §4.G "`Return` codegen").
    fn codegen_return(&mut self, value: Option<&Expr>, line: u32, column: u32) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let expected = self.current_return_type;
        if !expected.is_pointer() && matches!(expected.ty.kind, PrimitiveKind::Return) {
            return Ok(self.context.bool_type().const_zero().into());
        }
        let is_void = !expected.is_pointer() && matches!(expected.ty.kind, PrimitiveKind::Void);

        match value {
            None => {
                if is_void {
                    self.builder.build_return(None).map_err(|e| FatalError::from(e.to_string()))?;
                    Ok(self.context.bool_type().const_zero().into())
                } else {
                    self.diagnostics.push(Diagnostic::error(Position::new(line, column), format!("expected a return value of type `{expected}`")));
                    let poison = self.poison_value(expected);
                    self.builder.build_return(Some(&poison)).map_err(|e| FatalError::from(e.to_string()))?;
                    Ok(poison)
                }
            }
            Some(expr) => {
                let val = self.codegen_expr(expr)?;
                self.maybe_warn_float_overflow(expr, expected);
                match self.convert_implicit(val, expr.ty(), expected)? {
                    Some(converted) => {
                        if is_void {
                            self.builder.build_return(None).map_err(|e| FatalError::from(e.to_string()))?;
                        } else {
                            self.builder.build_return(Some(&converted)).map_err(|e| FatalError::from(e.to_string()))?;
                        }
                        Ok(converted)
                    }
                    None => {
                        self.diagnostics.push(Diagnostic::error(Position::new(expr.line(), expr.column()), format!("cannot convert return value to `{expected}`")));
                        let poison = self.poison_value(expected);
                        self.builder.build_return(Some(&poison)).map_err(|e| FatalError::from(e.to_string()))?;
                        Ok(poison)
                    }
                }
            }
        }
    }

    /// `let NAME = value` codegen -- an entry-block alloca plus a store,
    /// the same pattern the teacher uses for `codegen_let`
    /// (`mesh-codegen/src/codegen/expr.rs`).
    fn codegen_new_variable(&mut self, name: &str, value: &Expr, ty: TypeInstance) -> Result<BasicValueEnum<'ctx>, FatalError> {
        let fn_value = self.current_fn.expect("`let` only appears inside a function body");
        let value_val = self.codegen_expr(value)?;
        let slot = self.build_entry_alloca(fn_value, name, ty)?;
        self.builder.build_store(slot, value_val).map_err(|e| FatalError::from(e.to_string()))?;
        self.locals.insert(name.to_string(), slot);
        self.local_types.insert(name.to_string(), ty);
        Ok(value_val)
    }

    /// "issue warning if a compile-time constant would overflow the
    /// target range" (spec §4.G implicit-conversion rules, float -> int
    /// case). Only literal float nodes are compile-time constants here;
    /// there is no constant-folding pass to widen this check further.
    fn maybe_warn_float_overflow(&mut self, source: &Expr, target: TypeInstance) {
        if target.is_pointer() || matches!(classify_bin(target), BinKind::Float | BinKind::Invalid) {
            return;
        }
        if let Expr::Value { literal: Literal::Float(f), meta } = source {
            if float_overflows_int(*f, target) {
                self.diagnostics.push(Diagnostic::warning(
                    Position::new(meta.line, meta.column),
                    format!("constant `{f}` overflows the range of `{target}`"),
                ));
            }
        }
    }
}

fn int_predicate(op: BinOp, signed: bool) -> IntPredicate {
    match (op, signed) {
        (BinOp::Lt, true) => IntPredicate::SLT,
        (BinOp::Lt, false) => IntPredicate::ULT,
        (BinOp::Gt, true) => IntPredicate::SGT,
        (BinOp::Gt, false) => IntPredicate::UGT,
        (BinOp::Le, true) => IntPredicate::SLE,
        (BinOp::Le, false) => IntPredicate::ULE,
        (BinOp::Ge, true) => IntPredicate::SGE,
        (BinOp::Ge, false) => IntPredicate::UGE,
        (BinOp::Eq, _) => IntPredicate::EQ,
        (BinOp::Neq, _) => IntPredicate::NE,
        _ => unreachable!("int_predicate is only called for relational/equality ops"),
    }
}

fn float_predicate(op: BinOp) -> FloatPredicate {
    match op {
        BinOp::Lt => FloatPredicate::OLT,
        BinOp::Gt => FloatPredicate::OGT,
        BinOp::Le => FloatPredicate::OLE,
        BinOp::Ge => FloatPredicate::OGE,
        BinOp::Eq => FloatPredicate::OEQ,
        BinOp::Neq => FloatPredicate::ONE,
        _ => unreachable!("float_predicate is only called for relational/equality ops"),
    }
}
