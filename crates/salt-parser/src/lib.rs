//! Recursive-descent/Pratt parser and AST for the Salt programming
//! language (spec §2 components E and F).

pub mod ast;
mod parser;
pub mod symbols;

pub use ast::{BinOp, Declaration, Expr, ExprMeta, Function, Item, Literal, Param, Program};
pub use parser::parse;
pub use symbols::{FunctionTable, ScopeStack};
