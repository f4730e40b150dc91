//! `TypeInstance` -> LLVM type mapping (spec §4.G), grounded in the
//! teacher's `mesh-codegen/src/codegen/types.rs` `llvm_type` match, but
//! over this language's fixed primitive table instead of MIR types.

use inkwell::context::Context;
use inkwell::types::{BasicTypeEnum, FunctionType};
use inkwell::AddressSpace;
use salt_types::{PrimitiveKind, TypeInstance};

/// The LLVM basic type backing a `TypeInstance` (spec §4.G: every
/// non-sentinel, non-`void` type has a concrete backend representation).
///
/// # Panics
/// On the sentinel kinds (`Error`/`Never`/`Return`) and on `Void`, which
/// never appear as the type of a materialized value -- `Void` only ever
/// appears as a function return type, handled separately by
/// [`llvm_fn_type`].
pub fn llvm_basic_type<'ctx>(context: &'ctx Context, ty: TypeInstance) -> BasicTypeEnum<'ctx> {
    if ty.is_pointer() {
        return context.ptr_type(AddressSpace::default()).into();
    }
    match ty.ty.kind {
        PrimitiveKind::Bool => context.bool_type().into(),
        PrimitiveKind::Char | PrimitiveKind::UChar => context.i8_type().into(),
        PrimitiveKind::Short | PrimitiveKind::UShort => context.i16_type().into(),
        PrimitiveKind::Int | PrimitiveKind::UInt => context.i32_type().into(),
        PrimitiveKind::Long | PrimitiveKind::ULong => context.i64_type().into(),
        PrimitiveKind::SSize | PrimitiveKind::USize => context.i64_type().into(),
        PrimitiveKind::Float => context.f32_type().into(),
        PrimitiveKind::Double => context.f64_type().into(),
        other => panic!("type {other:?} has no basic LLVM representation"),
    }
}

/// Whether the backend integer representation of `ty` is signed (used to
/// choose `sdiv`/`udiv`, `icmp s*`/`u*`, sign- vs zero-extension).
pub fn is_signed(ty: TypeInstance) -> bool {
    !ty.is_pointer() && ty.ty.is_signed
}

/// A function's LLVM type from its Salt parameter/return `TypeInstance`s
/// (spec §4.G function codegen step 1). `void` is the one case with no
/// basic-type representation, so it is handled here rather than in
/// [`llvm_basic_type`].
pub fn llvm_fn_type<'ctx>(
    context: &'ctx Context,
    params: &[TypeInstance],
    return_type: TypeInstance,
) -> FunctionType<'ctx> {
    let param_types: Vec<_> = params.iter().map(|&p| llvm_basic_type(context, p).into()).collect();
    if matches!(return_type.ty.kind, PrimitiveKind::Void) && !return_type.is_pointer() {
        context.void_type().fn_type(&param_types, false)
    } else {
        llvm_basic_type(context, return_type).fn_type(&param_types, false)
    }
}
