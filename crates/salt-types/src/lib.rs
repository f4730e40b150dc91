//! Canonical type table and numeric literal parsing for the Salt compiler
//! (spec §2 components B and C).

pub mod instance;
pub mod numeric;
pub mod ty;

pub use instance::TypeInstance;
pub use numeric::{parse_number, NumberLiteral};
pub use ty::{PrimitiveKind, Type, TypeTable};
pub use ty::{BOOL, CHAR, DOUBLE, ERROR, FLOAT, INT, LONG, NEVER, POINTER, RETURN, SHORT, SSIZE, UCHAR, UINT, ULONG, USHORT, USIZE, VOID};
