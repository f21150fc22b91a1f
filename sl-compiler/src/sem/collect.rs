//! Symbol collection: first pass over the tree.
//!
//! Builds one scope per function plus the global scope, registers
//! parameters, locals and function signatures, and decorates type
//! expressions and function nodes with their types.

use crate::ast::*;
use crate::sem::decor::Decorations;
use crate::sem::errors::SemErrors;
use crate::sem::symbols::{SymTable, GLOBAL_SCOPE_NAME};
use crate::sem::types::{TypeId, TypeRegistry};

pub fn run(
    program: &Program,
    types: &mut TypeRegistry,
    symbols: &mut SymTable,
    decor: &mut Decorations,
    errors: &mut SemErrors,
) {
    let mut collector = SymbolCollector {
        types,
        symbols,
        decor,
        errors,
    };
    collector.visit_program(program);
}

struct SymbolCollector<'a> {
    types: &'a mut TypeRegistry,
    symbols: &'a mut SymTable,
    decor: &'a mut Decorations,
    errors: &'a mut SemErrors,
}

impl SymbolCollector<'_> {
    fn visit_program(&mut self, program: &Program) {
        let scope = self.symbols.push_new_scope(GLOBAL_SCOPE_NAME);
        self.decor.put_scope(program.id, scope);
        for func in &program.functions {
            self.visit_function(func);
        }
        self.symbols.pop_scope();
    }

    fn visit_function(&mut self, func: &Function) {
        let scope = self.symbols.push_new_scope(&func.name);
        self.decor.put_scope(func.id, scope);

        let mut param_types = Vec::new();
        for param in &func.params {
            let ty = self.visit_type_expr(&param.ty);
            if self.symbols.find_in_current_scope(&param.name).is_some() {
                self.errors.declared_ident(param.span, &param.name);
            } else {
                self.symbols.add_parameter(&param.name, ty);
                param_types.push(ty);
            }
        }

        let ret = match &func.ret {
            Some(node) => self.visit_basic_type(node),
            None => self.types.create_void_ty(),
        };
        self.decor.put_type(func.id, ret);

        for decl in &func.decls {
            self.visit_variable_decl(decl);
        }
        self.symbols.pop_scope();

        if self.symbols.find_in_current_scope(&func.name).is_some() {
            self.errors.declared_ident(func.name_span, &func.name);
        } else {
            let func_ty = self.types.create_function_ty(param_types, ret);
            self.symbols.add_function(&func.name, func_ty);
        }
    }

    fn visit_variable_decl(&mut self, decl: &VarDecl) {
        let ty = self.visit_type_expr(&decl.ty);
        for (name, span) in &decl.names {
            if self.symbols.find_in_current_scope(name).is_some() {
                self.errors.declared_ident(*span, name);
            } else {
                self.symbols.add_local_var(name, ty);
            }
        }
    }

    fn visit_type_expr(&mut self, ty: &TypeExpr) -> TypeId {
        let tid = match &ty.kind {
            TypeExprKind::Basic(basic) => self.basic_type_id(*basic),
            TypeExprKind::Array { size, elem } => {
                let elem_ty = self.basic_type_id(*elem);
                self.types.create_array_ty(*size, elem_ty)
            }
        };
        self.decor.put_type(ty.id, tid);
        tid
    }

    fn visit_basic_type(&mut self, node: &BasicTypeNode) -> TypeId {
        let tid = self.basic_type_id(node.ty);
        self.decor.put_type(node.id, tid);
        tid
    }

    fn basic_type_id(&mut self, basic: BasicType) -> TypeId {
        match basic {
            BasicType::Int => self.types.create_integer_ty(),
            BasicType::Float => self.types.create_float_ty(),
            BasicType::Bool => self.types.create_boolean_ty(),
            BasicType::Char => self.types.create_character_ty(),
        }
    }
}
