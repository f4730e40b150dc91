//! Recursive-descent parser with Pratt-style precedence climbing for
//! binary operators (spec §4.F), grounded in the teacher's
//! `snow-parser/src/parser/expressions.rs` binding-power table pattern,
//! generalized from rowan-CST marker output to this crate's owned
//! [`crate::ast::Expr`] tree, and in
//! `original_source/src/frontend/parser.cpp` for statement-level shape.

use salt_common::{Diagnostic, Position};
use salt_lexer::{Token, TokenKind};
use salt_types::{numeric::NumberLiteral, parse_number, TypeInstance, TypeTable, BOOL, CHAR, DOUBLE, ERROR, LONG, VOID};

use crate::ast::{BinOp, Declaration, Expr, ExprMeta, Function, Item, Literal, Param, Program};
use crate::symbols::{FunctionTable, ScopeStack};

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    scopes: ScopeStack,
    functions: FunctionTable,
    diagnostics: Vec<Diagnostic>,
}

/// Parse a complete token stream into a [`Program`] (spec §4.F contract).
pub fn parse(tokens: &[Token]) -> (Program, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.diagnostics)
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, scopes: ScopeStack::new(), functions: FunctionTable::new(), diagnostics: Vec::new() }
    }

    // ── Token stream primitives ───────────────────────────────────────

    fn tok(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.tok().kind
    }

    fn is_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    fn bump(&mut self) -> Token {
        let t = self.tok().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn skip_ws(&mut self) {
        while self.kind() == TokenKind::Ws {
            self.bump();
        }
    }

    /// Skip whitespace and blank (empty) lines between statements/items.
    fn skip_trivia(&mut self) {
        loop {
            match self.kind() {
                TokenKind::Ws | TokenKind::Eol => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(Position::new(self.tok().line, self.tok().column), message));
    }

    /// Consume a token of the expected kind, or emit a diagnostic and
    /// recover by treating the current token as if it had been consumed
    /// (spec §7: "the parser recovers locally by skipping to the next
    /// plausible start").
    fn expect(&mut self, expected: TokenKind, what: &str) -> Token {
        self.skip_ws();
        if self.kind() == expected {
            self.bump()
        } else {
            self.error(format!("expected {what}, found a different token"));
            self.tok().clone()
        }
    }

    // ── Program / items ────────────────────────────────────────────────

    fn parse_program(&mut self) -> Program {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.is_eof() {
                break;
            }
            match self.kind() {
                TokenKind::Extern => items.push(Item::Extern(self.parse_extern())),
                TokenKind::Fn => items.push(Item::Function(self.parse_function())),
                _ => {
                    self.error("expected `extern` or `fn` at the top level");
                    self.bump();
                }
            }
        }
        Program { items }
    }

    fn parse_extern(&mut self) -> Declaration {
        self.bump(); // `extern`
        self.skip_ws();
        let decl = self.parse_declaration();
        if let Some(prev) = self.functions.define(decl.clone()) {
            self.error(format!("redefinition of function `{}` (previously declared at {}:{})", decl.name, prev.line, prev.column));
        }
        decl
    }

    fn parse_declaration(&mut self) -> Declaration {
        let fn_tok = self.expect(TokenKind::Fn, "`fn`");
        self.skip_ws();
        let name_tok = self.expect(TokenKind::Ident, "a function name");
        let name = name_tok.data.clone().unwrap_or_default();
        self.skip_ws();
        self.expect(TokenKind::LParen, "`(`");
        let mut params = Vec::new();
        self.skip_ws();
        if self.kind() != TokenKind::RParen {
            loop {
                self.skip_ws();
                let ty = self.parse_type_instance();
                self.skip_ws();
                let param_name_tok = self.expect(TokenKind::Ident, "a parameter name");
                let param_name = param_name_tok.data.clone().unwrap_or_default();
                if matches!(ty.ty.kind, salt_types::PrimitiveKind::Void) && !ty.is_pointer() {
                    self.error(format!("parameter `{param_name}` cannot have type `void`"));
                }
                params.push(Param { name: param_name, ty });
                self.skip_ws();
                if self.kind() == TokenKind::Comma {
                    self.bump();
                    continue;
                }
                break;
            }
        }
        self.skip_ws();
        self.expect(TokenKind::RParen, "`)`");
        self.skip_ws();
        let return_type = if self.kind() == TokenKind::Arrow {
            self.bump();
            self.skip_ws();
            self.parse_type_instance()
        } else {
            TypeInstance::simple(&VOID)
        };
        Declaration { name, params, return_type, line: fn_tok.line, column: fn_tok.column }
    }

    /// Resolve a `TYPE` token into a [`TypeInstance`] (spec §4.D: the
    /// token's payload is the type name, its `count` is `ptr_layers`).
    fn parse_type_instance(&mut self) -> TypeInstance {
        let tok = self.expect(TokenKind::Type, "a type");
        let name = tok.data.as_deref().unwrap_or("<error>");
        let Some(ty) = TypeTable::lookup(name) else {
            self.error(format!("unknown type `{name}`"));
            return TypeInstance::simple(&ERROR);
        };
        if tok.count > 0 {
            TypeInstance::pointer(ty, tok.count)
        } else {
            TypeInstance::simple(ty)
        }
    }

    fn parse_function(&mut self) -> Function {
        let decl = self.parse_declaration();
        if let Some(prev) = self.functions.define(decl.clone()) {
            self.error(format!("redefinition of function `{}` (previously declared at {}:{})", decl.name, prev.line, prev.column));
        }
        self.skip_ws();
        self.expect(TokenKind::Colon, "`:`");
        self.skip_ws();
        self.expect(TokenKind::Eol, "a newline after the function header");

        self.scopes.clear();
        for param in &decl.params {
            self.scopes.define(param.name.clone(), param.ty);
        }

        let body = self.parse_body();
        Function { decl, body }
    }

    /// `body := (expression newline)+` at indent level 1 (spec §4.F).
    fn parse_body(&mut self) -> Vec<Expr> {
        let mut body = Vec::new();
        loop {
            // Blank lines between statements are permitted.
            while self.kind() == TokenKind::Eol {
                self.bump();
            }
            if self.is_eof() {
                break;
            }
            if self.kind() != TokenKind::Tab {
                break; // dedent back to top level: the body is closed.
            }
            self.bump(); // the single leading TAB (indent level 1)
            self.skip_ws();
            let stmt = self.parse_statement();
            body.push(stmt);
            self.skip_ws();
            if self.kind() == TokenKind::Eol {
                self.bump();
            } else if !self.is_eof() {
                self.error("expected a newline after a statement");
            }
        }
        body
    }

    fn parse_statement(&mut self) -> Expr {
        if self.kind() == TokenKind::Let {
            return self.parse_let();
        }
        self.parse_expression()
    }

    /// `let IDENT = expression` (SPEC_FULL §9a, grounded in
    /// `original_source/src/frontend/ast.cpp`'s `NewVariableAST`).
    fn parse_let(&mut self) -> Expr {
        let let_tok = self.bump();
        self.skip_ws();
        let name_tok = self.expect(TokenKind::Ident, "a variable name");
        let name = name_tok.data.clone().unwrap_or_default();
        self.skip_ws();
        self.expect(TokenKind::Assign, "`=`");
        self.skip_ws();
        let value = self.parse_expression();
        self.scopes.define(name.clone(), value.ty());
        let meta = ExprMeta::new(let_tok.line, let_tok.column, value.ty());
        Expr::NewVariable { name, value: Box::new(value), meta }
    }

    // ── Expressions: Pratt precedence climbing ────────────────────────

    fn parse_expression(&mut self) -> Expr {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_unary();

        loop {
            self.skip_ws();
            if self.kind() == TokenKind::As {
                self.bump();
                self.skip_ws();
                let tok_line = self.tok().line;
                let tok_col = self.tok().column;
                let target = self.parse_type_instance();
                let rhs = Expr::Type { instance: target, meta: ExprMeta::new(tok_line, tok_col, target) };
                let meta = ExprMeta::new(lhs.line(), lhs.column(), target);
                lhs = Expr::Binary { op: BinOp::As, lhs: Box::new(lhs), rhs: Box::new(rhs), meta };
                continue;
            }

            let Some((op, l_bp, r_bp)) = infix_binding_power(self.kind()) else { break };
            if l_bp < min_bp {
                break;
            }
            self.bump();
            self.skip_ws();
            let rhs = self.parse_expr_bp(r_bp);
            let ty = binary_result_type(op, &lhs, &rhs);
            let meta = ExprMeta::new(lhs.line(), lhs.column(), ty);
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), meta };
        }

        lhs
    }

    /// Unary prefixes: `-NUMBER` (a signed literal, spec §4.F failures:
    /// "`-` preceding non-number") and `*expr` (pointer dereference,
    /// spec §4.F grammar: `"*" primary`).
    fn parse_unary(&mut self) -> Expr {
        self.skip_ws();
        match self.kind() {
            TokenKind::Sub => {
                let minus = self.bump();
                self.skip_ws();
                if self.kind() == TokenKind::Number {
                    let mut value = self.parse_primary();
                    negate_literal(&mut value);
                    value
                } else {
                    self.error("`-` must be followed by a numeric literal");
                    Expr::Value {
                        literal: Literal::Int(0),
                        meta: ExprMeta::new(minus.line, minus.column, TypeInstance::simple(&ERROR)),
                    }
                }
            }
            TokenKind::Mul => {
                let star = self.bump();
                self.skip_ws();
                let inner = self.parse_unary();
                let ty = if inner.ty().is_pointer() {
                    inner.ty().deref_once()
                } else {
                    self.error(format!("cannot dereference non-pointer type `{}`", inner.ty()));
                    TypeInstance::simple(&ERROR)
                };
                Expr::Deref { inner: Box::new(inner), meta: ExprMeta::new(star.line, star.column, ty) }
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Expr {
        self.skip_ws();
        let tok = self.tok().clone();
        match tok.kind {
            TokenKind::Number => {
                self.bump();
                self.literal_number(&tok)
            }
            TokenKind::String => {
                self.bump();
                Expr::Value {
                    literal: Literal::Str(tok.data.clone().unwrap_or_default()),
                    meta: ExprMeta::new(tok.line, tok.column, TypeInstance::pointer(&CHAR, 1)),
                }
            }
            TokenKind::Char => {
                self.bump();
                Expr::Value {
                    literal: Literal::Char(tok.data.clone().unwrap_or_default()),
                    meta: ExprMeta::new(tok.line, tok.column, TypeInstance::simple(&CHAR)),
                }
            }
            TokenKind::True | TokenKind::False => {
                self.bump();
                Expr::Value {
                    literal: Literal::Bool(tok.kind == TokenKind::True),
                    meta: ExprMeta::new(tok.line, tok.column, TypeInstance::simple(&BOOL)),
                }
            }
            TokenKind::Null => {
                self.bump();
                Expr::Value { literal: Literal::Null, meta: ExprMeta::new(tok.line, tok.column, TypeInstance::pointer(&VOID, 1)) }
            }
            TokenKind::Inf => {
                self.bump();
                Expr::Value {
                    literal: Literal::Float(f64::INFINITY),
                    meta: ExprMeta::new(tok.line, tok.column, TypeInstance::simple(&DOUBLE)),
                }
            }
            TokenKind::Nan => {
                self.bump();
                Expr::Value { literal: Literal::Float(f64::NAN), meta: ExprMeta::new(tok.line, tok.column, TypeInstance::simple(&DOUBLE)) }
            }
            TokenKind::Type => {
                self.bump();
                let instance = if tok.count > 0 {
                    TypeTable::lookup(tok.data.as_deref().unwrap_or("")).map(|t| TypeInstance::pointer(t, tok.count))
                } else {
                    TypeTable::lookup(tok.data.as_deref().unwrap_or("")).map(TypeInstance::simple)
                }
                .unwrap_or(TypeInstance::simple(&ERROR));
                Expr::Type { instance, meta: ExprMeta::new(tok.line, tok.column, instance) }
            }
            TokenKind::Ident => {
                self.bump();
                self.parse_ident_primary(&tok)
            }
            TokenKind::LParen => {
                self.bump();
                self.skip_ws();
                let inner = self.parse_expression();
                self.skip_ws();
                self.expect(TokenKind::RParen, "`)`");
                inner
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::Return => self.parse_return(),
            _ => {
                self.error("expected an expression");
                self.bump();
                Expr::Value { literal: Literal::Int(0), meta: ExprMeta::new(tok.line, tok.column, TypeInstance::simple(&ERROR)) }
            }
        }
    }

    fn literal_number(&mut self, tok: &Token) -> Expr {
        let text = tok.data.as_deref().unwrap_or("0");
        match parse_number(text) {
            NumberLiteral::Int(v) => {
                Expr::Value { literal: Literal::Int(v), meta: ExprMeta::new(tok.line, tok.column, TypeInstance::simple(&LONG)) }
            }
            NumberLiteral::Float(v) => {
                Expr::Value { literal: Literal::Float(v), meta: ExprMeta::new(tok.line, tok.column, TypeInstance::simple(&DOUBLE)) }
            }
            NumberLiteral::Error => {
                self.error(format!("numeric literal `{text}` overflows its representable range"));
                Expr::Value { literal: Literal::Int(0), meta: ExprMeta::new(tok.line, tok.column, TypeInstance::simple(&ERROR)) }
            }
        }
    }

    fn parse_ident_primary(&mut self, tok: &Token) -> Expr {
        let name = tok.data.clone().unwrap_or_default();
        self.skip_ws();
        if self.kind() == TokenKind::LParen {
            self.bump();
            let mut args = Vec::new();
            self.skip_ws();
            if self.kind() != TokenKind::RParen {
                loop {
                    self.skip_ws();
                    args.push(self.parse_expression());
                    self.skip_ws();
                    if self.kind() == TokenKind::Comma {
                        self.bump();
                        continue;
                    }
                    break;
                }
            }
            self.skip_ws();
            self.expect(TokenKind::RParen, "`)`");

            let return_type = match self.functions.lookup(&name) {
                Some(decl) => decl.return_type,
                None => {
                    self.error(format!("no function exists named {name}"));
                    TypeInstance::simple(&ERROR)
                }
            };
            return Expr::Call { callee: name, args, meta: ExprMeta::new(tok.line, tok.column, return_type) };
        }

        let ty = match self.scopes.lookup(&name) {
            Some(ty) => ty,
            None => {
                self.error(format!("undefined identifier `{name}`"));
                TypeInstance::simple(&ERROR)
            }
        };
        Expr::Variable { name, meta: ExprMeta::new(tok.line, tok.column, ty) }
    }

    fn parse_if(&mut self) -> Expr {
        let if_tok = self.bump();
        self.skip_ws();
        let cond = self.parse_expression();
        self.skip_ws();
        self.expect(TokenKind::Then, "`then`");
        self.skip_ws();
        let then_branch = self.parse_expression();
        self.skip_ws();
        self.expect(TokenKind::Else, "`else`");
        self.skip_ws();
        let else_branch = self.parse_expression();
        let ty = higher_rank(then_branch.ty(), else_branch.ty());
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            meta: ExprMeta::new(if_tok.line, if_tok.column, ty),
        }
    }

    fn parse_repeat(&mut self) -> Expr {
        let repeat_tok = self.bump();
        self.skip_ws();
        let until = self.parse_expression();
        self.skip_ws();
        self.expect(TokenKind::Colon, "`:`");
        self.skip_ws();
        let body = self.parse_expression();
        Expr::Repeat {
            until: Box::new(until),
            body: Box::new(body),
            meta: ExprMeta::new(repeat_tok.line, repeat_tok.column, TypeInstance::simple(&VOID)),
        }
    }

    fn parse_return(&mut self) -> Expr {
        let return_tok = self.bump();
        self.skip_ws();
        let has_value = !matches!(self.kind(), TokenKind::Eol | TokenKind::Eof);
        let value = if has_value { Some(Box::new(self.parse_expression())) } else { None };
        let ty = value.as_ref().map(|v| v.ty()).unwrap_or(TypeInstance::simple(&VOID));
        Expr::Return { value, meta: ExprMeta::new(return_tok.line, return_tok.column, ty) }
    }
}

/// Negate a just-parsed numeric literal in place (spec §4.F: unary `-`
/// only ever precedes a number, folded directly into its value).
fn negate_literal(expr: &mut Expr) {
    if let Expr::Value { literal, .. } = expr {
        match literal {
            Literal::Int(v) => *literal = Literal::Int((-(*v as i64)) as u64),
            Literal::Float(v) => *literal = Literal::Float(-*v),
            _ => {}
        }
    }
}

fn higher_rank(a: TypeInstance, b: TypeInstance) -> TypeInstance {
    if a.is_pointer() {
        a
    } else if b.is_pointer() {
        b
    } else if a.ty.rank >= b.ty.rank {
        a
    } else {
        b
    }
}

/// spec §4.F: "A binary expression's result type is computed immediately:
/// `as` takes the RHS's type; otherwise the higher-ranked operand wins,
/// with pointer operations preserving the pointer's `TypeInstance`."
fn binary_result_type(op: BinOp, lhs: &Expr, rhs: &Expr) -> TypeInstance {
    match op {
        BinOp::As => rhs.ty(),
        _ if op.is_assignment() => lhs.ty(),
        _ => higher_rank(lhs.ty(), rhs.ty()),
    }
}

/// `(op, left_bp, right_bp)` for every infix operator kind, following the
/// precedence table in spec §4.F: `as` (handled separately, highest) >
/// `* /` > `+ -` > `<< >>` > relational > `== !=` > `&` > `^` > `|` >
/// `&&` > `||` > assignment family (lowest, right-associative).
fn infix_binding_power(kind: TokenKind) -> Option<(BinOp, u8, u8)> {
    use TokenKind::*;
    Some(match kind {
        Mul => (BinOp::Mul, 90, 91),
        Div => (BinOp::Div, 90, 91),
        Modulo => (BinOp::Mod, 90, 91),
        Add => (BinOp::Add, 80, 81),
        Sub => (BinOp::Sub, 80, 81),
        Shl => (BinOp::Shl, 70, 71),
        Shr => (BinOp::Shr, 70, 71),
        LAngle => (BinOp::Lt, 60, 61),
        RAngle => (BinOp::Gt, 60, 61),
        Le => (BinOp::Le, 60, 61),
        Ge => (BinOp::Ge, 60, 61),
        Eq => (BinOp::Eq, 50, 51),
        Neq => (BinOp::Neq, 50, 51),
        Amp => (BinOp::BitAnd, 40, 41),
        Carat => (BinOp::Xor, 30, 31),
        Bar => (BinOp::BitOr, 20, 21),
        And => (BinOp::LogicalAnd, 10, 11),
        Or => (BinOp::LogicalOr, 5, 6),
        Assign => (BinOp::Assign, 2, 1),
        AddAssign => (BinOp::AddAssign, 2, 1),
        SubAssign => (BinOp::SubAssign, 2, 1),
        MulAssign => (BinOp::MulAssign, 2, 1),
        DivAssign => (BinOp::DivAssign, 2, 1),
        ModAssign => (BinOp::ModAssign, 2, 1),
        AndAssign => (BinOp::AndAssign, 2, 1),
        OrAssign => (BinOp::OrAssign, 2, 1),
        XorAssign => (BinOp::XorAssign, 2, 1),
        // `~=` (TildeAssign) is lexically fused (spec §4.D fusion table)
        // but has no corresponding binary operator: `~` is only ever a
        // unary bitwise-complement prefix, never a binop. Left
        // unhandled here; see DESIGN.md Open Questions.
        ShlAssign => (BinOp::ShlAssign, 2, 1),
        ShrAssign => (BinOp::ShrAssign, 2, 1),
        _ => return None,
    })
}
