//! Variable scope stack and function table (spec §4.F "Maintain the
//! variable scope stack and the function table"), grounded in
//! `original_source/src/frontend/irgenerator.cpp`'s `named_values`
//! stack-of-maps and flat `named_functions` table.

use rustc_hash::FxHashMap;
use salt_types::TypeInstance;

use crate::ast::Declaration;

/// Innermost-first stack of variable scopes. Lookup walks from the top
/// (innermost) scope outward, matching the original's `named_values`
/// shadowing behavior.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<FxHashMap<String, TypeInstance>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: vec![FxHashMap::default()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        if self.scopes.is_empty() {
            self.scopes.push(FxHashMap::default());
        }
    }

    /// Clear down to a single empty scope (spec §4.G function codegen
    /// step 2: "Clear the innermost scope of `named_values`" at the start
    /// of each function).
    pub fn clear(&mut self) {
        self.scopes.clear();
        self.scopes.push(FxHashMap::default());
    }

    pub fn define(&mut self, name: impl Into<String>, ty: TypeInstance) {
        self.scopes.last_mut().expect("scope stack is never empty").insert(name.into(), ty);
    }

    /// Innermost-first lookup (spec §4.F "An identifier's `TypeInstance`
    /// is looked up in the active scope stack").
    pub fn lookup(&self, name: &str) -> Option<TypeInstance> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }
}

/// Flat function table, keyed by name (spec §4.F: "Function identifiers
/// used as callees are looked up in the function table" -- unlike
/// variables, functions are not scoped).
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: FxHashMap<String, Declaration>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a function/extern declaration. Returns the previous
    /// declaration if `name` was already defined (redefinition, spec
    /// §4.F "Failures": "redefinition").
    pub fn define(&mut self, decl: Declaration) -> Option<Declaration> {
        self.functions.insert(decl.name.clone(), decl)
    }

    pub fn lookup(&self, name: &str) -> Option<&Declaration> {
        self.functions.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salt_types::INT;

    #[test]
    fn innermost_scope_shadows_outer() {
        let mut scopes = ScopeStack::new();
        scopes.define("x", TypeInstance::simple(&INT));
        scopes.push_scope();
        scopes.define("x", TypeInstance::pointer(&INT, 1));
        assert!(scopes.lookup("x").unwrap().is_pointer());
        scopes.pop_scope();
        assert!(!scopes.lookup("x").unwrap().is_pointer());
    }

    #[test]
    fn clear_resets_to_single_empty_scope() {
        let mut scopes = ScopeStack::new();
        scopes.define("x", TypeInstance::simple(&INT));
        scopes.push_scope();
        scopes.push_scope();
        scopes.clear();
        assert_eq!(scopes.lookup("x"), None);
    }

    #[test]
    fn function_table_flat_and_detects_redefinition() {
        let mut funcs = FunctionTable::new();
        let decl = Declaration { name: "f".into(), params: vec![], return_type: TypeInstance::simple(&salt_types::VOID), line: 1, column: 1 };
        assert!(funcs.define(decl.clone()).is_none());
        assert!(funcs.define(decl).is_some());
    }
}
