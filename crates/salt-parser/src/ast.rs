//! AST node shapes (spec §3 "AST node (Expression)"), grounded in
//! `original_source/src/frontend/ast.h`'s `ExprAST` hierarchy but
//! expressed as a single Rust sum type instead of a virtual-dispatch
//! class tree, since every node's `code_gen` variant is known statically.

use salt_types::TypeInstance;

/// Shared position + resolved-type metadata every expression node carries
/// (spec §3: "each node holds position and a resolved type instance").
#[derive(Debug, Clone, PartialEq)]
pub struct ExprMeta {
    pub line: u32,
    pub column: u32,
    pub ty: TypeInstance,
}

impl ExprMeta {
    pub fn new(line: u32, column: u32, ty: TypeInstance) -> Self {
        Self { line, column, ty }
    }
}

/// The literal payload of a `Value` node (spec §3: "integer/float/
/// string/char literal with payload and `TypeInstance`").
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(u64),
    Float(f64),
    Str(String),
    Char(String),
    Bool(bool),
    /// The reserved `null` constant -- `void*` with value zero (spec §4.F
    /// "Reserved constants").
    Null,
}

/// A binary operator, carried verbatim from the fused lexer token kind
/// (spec §3: "Binary — left, right, operator token kind").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Neq,
    BitAnd,
    BitOr,
    Xor,
    LogicalAnd,
    LogicalOr,
    /// `as` -- an explicit cast; the RHS is always a `Type` node.
    As,
    Assign,
    /// Compound-assign forms (spec §4.F "assignment family", §6
    /// `ADD_ASSIGN`..`SHR_ASSIGN`): `x += y` desugars to a read-modify-store
    /// rather than to a plain `Add` whose result is discarded.
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
}

impl BinOp {
    /// True for every `BinOp` that stores into its left-hand side (spec
    /// §4.G "Assignment"): plain `Assign` and all ten compound forms.
    pub fn is_assignment(self) -> bool {
        matches!(self, BinOp::Assign) || self.compound_underlying().is_some()
    }

    /// The plain binary operator a compound-assign form computes before
    /// storing, e.g. `AddAssign` -> `Add`. `None` for every non-compound
    /// operator, including plain `Assign`.
    pub fn compound_underlying(self) -> Option<BinOp> {
        Some(match self {
            BinOp::AddAssign => BinOp::Add,
            BinOp::SubAssign => BinOp::Sub,
            BinOp::MulAssign => BinOp::Mul,
            BinOp::DivAssign => BinOp::Div,
            BinOp::ModAssign => BinOp::Mod,
            BinOp::AndAssign => BinOp::BitAnd,
            BinOp::OrAssign => BinOp::BitOr,
            BinOp::XorAssign => BinOp::Xor,
            BinOp::ShlAssign => BinOp::Shl,
            BinOp::ShrAssign => BinOp::Shr,
            _ => return None,
        })
    }
}

/// The AST's sum type. Every variant matches spec §3's list exactly:
/// `Value`, `Variable`, `Binary`, `If`, `Repeat`, `Call`, `Type`, `Deref`,
/// plus `Return` and `NewVariable` (spec §3 continuation / `let` surface
/// form, grounded in `original_source/src/frontend/ast.cpp`'s
/// `NewVariableAST`).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Value { literal: Literal, meta: ExprMeta },
    Variable { name: String, meta: ExprMeta },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr>, meta: ExprMeta },
    If { cond: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr>, meta: ExprMeta },
    Repeat { until: Box<Expr>, body: Box<Expr>, meta: ExprMeta },
    Call { callee: String, args: Vec<Expr>, meta: ExprMeta },
    /// A syntactic type used as the RHS of `as` (spec §3 "Type").
    Type { instance: TypeInstance, meta: ExprMeta },
    Deref { inner: Box<Expr>, meta: ExprMeta },
    Return { value: Option<Box<Expr>>, meta: ExprMeta },
    /// `let NAME = value` -- introduces a new binding in the active scope.
    NewVariable { name: String, value: Box<Expr>, meta: ExprMeta },
}

impl Expr {
    pub fn meta(&self) -> &ExprMeta {
        match self {
            Expr::Value { meta, .. }
            | Expr::Variable { meta, .. }
            | Expr::Binary { meta, .. }
            | Expr::If { meta, .. }
            | Expr::Repeat { meta, .. }
            | Expr::Call { meta, .. }
            | Expr::Type { meta, .. }
            | Expr::Deref { meta, .. }
            | Expr::Return { meta, .. }
            | Expr::NewVariable { meta, .. } => meta,
        }
    }

    pub fn ty(&self) -> TypeInstance {
        self.meta().ty
    }

    pub fn line(&self) -> u32 {
        self.meta().line
    }

    pub fn column(&self) -> u32 {
        self.meta().column
    }
}

/// A function/extern parameter (spec §4.F grammar: `TYPE IDENT`).
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeInstance,
}

/// `DeclarationAST` (spec §3, grounded in `ast.h`'s `DeclarationAST`):
/// name, parameter list, and return type, shared by `extern` and `fn`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeInstance,
    pub line: u32,
    pub column: u32,
}

/// A `fn` with a body (spec §4.F grammar rule `function`).
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub decl: Declaration,
    pub body: Vec<Expr>,
}

/// One top-level item (spec §4.F grammar rule `program`).
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Extern(Declaration),
    Function(Function),
}

/// The parsed output of one source file: an ordered list of top-level
/// declarations and functions (spec §4.F contract).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub items: Vec<Item>,
}
