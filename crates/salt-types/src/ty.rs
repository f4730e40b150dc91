//! Canonical primitive type table (spec §3 "Type", §4.F binary-operator
//! promotion). Types are singletons: one `Type` value per `PrimitiveKind`,
//! reachable only through [`TypeTable`], never constructed ad hoc.
//!
//! Unlike the teacher's `Ty`/`TyCon` (Hindley-Milner constructors with
//! inference variables, `ena` unification), this language has no generics
//! and no inference: every expression's type is known at parse time, so
//! the whole "type system" is a fixed, rank-ordered table of primitives.

use std::fmt;

/// The fixed vocabulary of primitive type kinds (spec §3 sentinel list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Flag type for an already-diagnosed expression; never propagated
    /// past a user-visible diagnostic (spec §3 invariant).
    Error,
    /// The type of an expression that never produces a value.
    Never,
    /// Marker for "uninitialized return context" during codegen (spec §3).
    Return,
    Void,
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    SSize,
    USize,
    Float,
    Double,
    /// Opaque pointer (spec §3: "POINTER (opaque pointer)").
    Pointer,
}

/// A canonical primitive type. Equality is identity (spec §3): two `Type`
/// values are equal iff they are the same table entry, never by comparing
/// fields, so `PartialEq` compares pointers rather than the `kind`/`name`
/// fields directly.
#[derive(Debug)]
pub struct Type {
    pub kind: PrimitiveKind,
    pub name: &'static str,
    /// Ordering for implicit promotion (spec §4.G binary operator
    /// lowering); sentinels (`Error`/`Never`/`Return`/`Void`) rank 0.
    pub rank: u8,
    /// Meaningful only for integer kinds.
    pub is_signed: bool,
    /// Size in bytes, used for pointer-offset scaling (spec §4.G) and
    /// overflow checks. Zero for `Void`/`Error`/`Never`/`Return`.
    pub size_bytes: u32,
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

macro_rules! define_type {
    ($ident:ident, $kind:ident, $name:literal, $rank:expr, $signed:expr, $size:expr) => {
        pub static $ident: Type = Type {
            kind: PrimitiveKind::$kind,
            name: $name,
            rank: $rank,
            is_signed: $signed,
            size_bytes: $size,
        };
    };
}

define_type!(ERROR, Error, "<error>", 0, false, 0);
define_type!(NEVER, Never, "<never>", 0, false, 0);
define_type!(RETURN, Return, "<return>", 0, false, 0);
define_type!(VOID, Void, "void", 0, false, 0);
define_type!(BOOL, Bool, "bool", 1, false, 1);
define_type!(CHAR, Char, "char", 2, true, 1);
define_type!(UCHAR, UChar, "uchar", 3, false, 1);
define_type!(SHORT, Short, "short", 4, true, 2);
define_type!(USHORT, UShort, "ushort", 5, false, 2);
define_type!(INT, Int, "int", 6, true, 4);
define_type!(UINT, UInt, "uint", 7, false, 4);
define_type!(LONG, Long, "long", 8, true, 8);
define_type!(ULONG, ULong, "ulong", 9, false, 8);
define_type!(SSIZE, SSize, "ssize", 10, true, 8);
define_type!(USIZE, USize, "usize", 11, false, 8);
define_type!(FLOAT, Float, "float", 12, false, 4);
define_type!(DOUBLE, Double, "double", 13, false, 8);
define_type!(POINTER, Pointer, "void*", 14, false, 8);

/// Canonical registry of the primitive types, owned by the process
/// (spec §3: "Types are canonical singletons owned by a process-wide
/// table"). There is exactly one `TypeTable` concern in the whole
/// process; unlike the teacher's per-module `Ty` construction, nothing
/// here is ever rebuilt between files.
pub struct TypeTable;

impl TypeTable {
    /// Look up a primitive type by its surface-syntax name (used by the
    /// lexer to recognize type keywords and by the parser to resolve a
    /// `Type` token's payload into a `&'static Type`).
    pub fn lookup(name: &str) -> Option<&'static Type> {
        Some(match name {
            "void" => &VOID,
            "bool" => &BOOL,
            "char" => &CHAR,
            "uchar" => &UCHAR,
            "short" => &SHORT,
            "ushort" => &USHORT,
            "int" => &INT,
            "uint" => &UINT,
            "long" => &LONG,
            "ulong" => &ULONG,
            "ssize" => &SSIZE,
            "usize" => &USIZE,
            "float" => &FLOAT,
            "double" => &DOUBLE,
            _ => return None,
        })
    }

    /// The unsigned counterpart of a type keyword modified by `unsigned`
    /// (spec §4.D fusion table: `unsigned char/short/int/long`).
    pub fn unsigned_variant(name: &str) -> Option<&'static Type> {
        Some(match name {
            "char" => &UCHAR,
            "short" => &USHORT,
            "int" => &UINT,
            "long" => &ULONG,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_equality() {
        let a = TypeTable::lookup("int").unwrap();
        let b = TypeTable::lookup("int").unwrap();
        assert_eq!(a, b);
        assert!(std::ptr::eq(a, b));
        assert_ne!(TypeTable::lookup("int").unwrap(), TypeTable::lookup("uint").unwrap());
    }

    #[test]
    fn rank_ordering() {
        assert!(CHAR.rank < SHORT.rank);
        assert!(SHORT.rank < INT.rank);
        assert!(INT.rank < LONG.rank);
        assert!(CHAR.rank < UCHAR.rank);
        assert!(LONG.rank < FLOAT.rank);
        assert!(FLOAT.rank < DOUBLE.rank);
        assert!(DOUBLE.rank < POINTER.rank);
        assert_eq!(ERROR.rank, 0);
        assert_eq!(VOID.rank, 0);
    }

    #[test]
    fn unsigned_variant_lookup() {
        assert_eq!(TypeTable::unsigned_variant("int").unwrap(), &UINT);
        assert!(TypeTable::unsigned_variant("float").is_none());
    }
}
