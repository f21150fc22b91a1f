//! Symbol table: a stack of lexical scopes.
//!
//! Scopes are created once by symbol collection and re-entered by the
//! later passes in the same order, so handles stay valid across passes.

use crate::sem::types::{TypeId, TypeRegistry};

pub const GLOBAL_SCOPE_NAME: &str = "$global";

/// Handle to a scope; stable for the lifetime of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    LocalVar,
    Parameter,
    Function,
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeId,
}

#[derive(Debug)]
struct Scope {
    name: String,
    entries: Vec<SymbolEntry>,
}

pub struct SymTable {
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
}

impl SymTable {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            stack: Vec::new(),
        }
    }

    // ── Scope stack ──────────────────────────────────────────────────

    pub fn push_new_scope(&mut self, name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.to_string(),
            entries: Vec::new(),
        });
        self.stack.push(id);
        id
    }

    /// Re-enter a scope created in an earlier pass.
    pub fn push_this_scope(&mut self, id: ScopeId) {
        self.stack.push(id);
    }

    pub fn pop_scope(&mut self) {
        self.stack.pop();
    }

    // ── Bindings ─────────────────────────────────────────────────────
    // Callers check `find_in_current_scope` first; on a duplicate the
    // first binding wins and the caller reports the diagnostic.

    pub fn add_local_var(&mut self, name: &str, ty: TypeId) {
        self.add(name, SymbolKind::LocalVar, ty);
    }

    pub fn add_parameter(&mut self, name: &str, ty: TypeId) {
        self.add(name, SymbolKind::Parameter, ty);
    }

    pub fn add_function(&mut self, name: &str, ty: TypeId) {
        self.add(name, SymbolKind::Function, ty);
    }

    fn add(&mut self, name: &str, kind: SymbolKind, ty: TypeId) {
        if let Some(&ScopeId(top)) = self.stack.last() {
            self.scopes[top].entries.push(SymbolEntry {
                name: name.to_string(),
                kind,
                ty,
            });
        }
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn find_in_current_scope(&self, name: &str) -> Option<&SymbolEntry> {
        let &ScopeId(top) = self.stack.last()?;
        self.scopes[top].entries.iter().find(|e| e.name == name)
    }

    /// Innermost binding visible from the current scope stack.
    pub fn find_in_stack(&self, name: &str) -> Option<&SymbolEntry> {
        for &ScopeId(idx) in self.stack.iter().rev() {
            if let Some(entry) = self.scopes[idx].entries.iter().find(|e| e.name == name) {
                return Some(entry);
            }
        }
        None
    }

    pub fn get_type(&self, name: &str) -> Option<TypeId> {
        self.find_in_stack(name).map(|e| e.ty)
    }

    pub fn is_function_class(&self, name: &str) -> bool {
        matches!(
            self.find_in_stack(name),
            Some(SymbolEntry {
                kind: SymbolKind::Function,
                ..
            })
        )
    }

    pub fn is_parameter_class(&self, name: &str) -> bool {
        matches!(
            self.find_in_stack(name),
            Some(SymbolEntry {
                kind: SymbolKind::Parameter,
                ..
            })
        )
    }

    pub fn is_local_var_class(&self, name: &str) -> bool {
        matches!(
            self.find_in_stack(name),
            Some(SymbolEntry {
                kind: SymbolKind::LocalVar,
                ..
            })
        )
    }

    // ── Whole-program queries ────────────────────────────────────────

    fn global_scope(&self) -> Option<&Scope> {
        self.scopes.iter().find(|s| s.name == GLOBAL_SCOPE_NAME)
    }

    /// Signature of a function recorded in the global scope.
    pub fn get_global_function_type(&self, name: &str) -> Option<TypeId> {
        self.global_scope()?
            .entries
            .iter()
            .find(|e| e.name == name && e.kind == SymbolKind::Function)
            .map(|e| e.ty)
    }

    /// Type of a parameter or local inside the scope of `func`.
    pub fn get_local_symbol_type(&self, func: &str, name: &str) -> Option<TypeId> {
        self.scopes
            .iter()
            .find(|s| s.name == func)?
            .entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.ty)
    }

    /// True when the program lacks a `main` with no parameters and no
    /// return value.
    pub fn no_main_properly_declared(&self, types: &TypeRegistry) -> bool {
        match self.get_global_function_type("main") {
            Some(ty) => types.get_num_of_parameters(ty) != 0 || !types.is_void_function(ty),
            None => true,
        }
    }
}

impl Default for SymTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_binding_wins() {
        let mut types = TypeRegistry::new();
        let int = types.create_integer_ty();
        let float = types.create_float_ty();
        let void = types.create_void_ty();
        let func_ty = types.create_function_ty(vec![], void);

        let mut symbols = SymTable::new();
        symbols.push_new_scope(GLOBAL_SCOPE_NAME);
        symbols.add_function("f", func_ty);
        symbols.push_new_scope("f");
        symbols.add_parameter("x", int);
        symbols.add_local_var("f", float);

        // Local `f` shadows the global function of the same name.
        assert!(symbols.is_local_var_class("f"));
        assert_eq!(symbols.get_type("f"), Some(float));
        assert!(symbols.is_parameter_class("x"));

        symbols.pop_scope();
        assert!(symbols.is_function_class("f"));
    }

    #[test]
    fn main_requires_zero_params_and_void() {
        let mut types = TypeRegistry::new();
        let int = types.create_integer_ty();
        let void = types.create_void_ty();

        let mut symbols = SymTable::new();
        symbols.push_new_scope(GLOBAL_SCOPE_NAME);
        assert!(symbols.no_main_properly_declared(&types));

        let bad = types.create_function_ty(vec![int], void);
        symbols.add_function("main", bad);
        assert!(symbols.no_main_properly_declared(&types));

        let mut symbols = SymTable::new();
        symbols.push_new_scope(GLOBAL_SCOPE_NAME);
        let good = types.create_function_ty(vec![], void);
        symbols.add_function("main", good);
        assert!(!symbols.no_main_properly_declared(&types));
    }

    #[test]
    fn scope_reentry_sees_earlier_bindings() {
        let types = TypeRegistry::new();
        let int = types.create_integer_ty();

        let mut symbols = SymTable::new();
        symbols.push_new_scope(GLOBAL_SCOPE_NAME);
        let fscope = symbols.push_new_scope("f");
        symbols.add_local_var("x", int);
        symbols.pop_scope();
        symbols.pop_scope();

        symbols.push_this_scope(fscope);
        assert_eq!(symbols.get_type("x"), Some(int));
        symbols.pop_scope();
    }
}
