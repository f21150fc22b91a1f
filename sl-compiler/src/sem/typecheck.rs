//! Type checking: second pass over the tree.
//!
//! Re-enters the scopes recorded by symbol collection, decorates every
//! expression with a type and an l-value flag, and reports violations.
//! Operands already typed as error are skipped to avoid cascades.

use crate::ast::*;
use crate::sem::decor::Decorations;
use crate::sem::errors::SemErrors;
use crate::sem::symbols::SymTable;
use crate::sem::types::{TypeId, TypeRegistry};

pub fn run(
    program: &Program,
    types: &mut TypeRegistry,
    symbols: &mut SymTable,
    decor: &mut Decorations,
    errors: &mut SemErrors,
) {
    let void = types.create_void_ty();
    let mut checker = TypeChecker {
        types,
        symbols,
        decor,
        errors,
        current_ret: void,
    };
    checker.visit_program(program);
}

struct TypeChecker<'a> {
    types: &'a mut TypeRegistry,
    symbols: &'a mut SymTable,
    decor: &'a mut Decorations,
    errors: &'a mut SemErrors,
    /// Return type of the function currently being checked.
    current_ret: TypeId,
}

impl TypeChecker<'_> {
    fn visit_program(&mut self, program: &Program) {
        let scope = self
            .decor
            .get_scope(program.id)
            .expect("global scope recorded by symbol collection");
        self.symbols.push_this_scope(scope);
        for func in &program.functions {
            self.visit_function(func);
        }
        if self.symbols.no_main_properly_declared(self.types) {
            self.errors.no_main_properly_declared();
        }
        self.symbols.pop_scope();
    }

    fn visit_function(&mut self, func: &Function) {
        let scope = self
            .decor
            .get_scope(func.id)
            .expect("function scope recorded by symbol collection");
        self.symbols.push_this_scope(scope);
        self.current_ret = self.decor.get_type(func.id);
        for stmt in &func.body {
            self.visit_stmt(stmt);
        }
        self.symbols.pop_scope();
    }

    // ── Statements ───────────────────────────────────────────────────

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign {
                target,
                assign_span,
                value,
                ..
            } => {
                self.visit_left_expr(target);
                self.visit_expr(value);
                let t1 = self.decor.get_type(target.id());
                let t2 = self.decor.get_type(value.id());
                if !self.types.is_error_ty(t1)
                    && !self.types.is_error_ty(t2)
                    && !self.types.is_void_ty(t2)
                    && !self.types.copyable_types(t1, t2)
                {
                    self.errors.incompatible_assignment(*assign_span);
                }
                if !self.types.is_error_ty(t1) && !self.decor.get_is_lvalue(target.id()) {
                    self.errors.non_referenceable_left_expr(target.span());
                }
            }
            Stmt::If {
                span,
                cond,
                then_stmts,
                else_stmts,
                ..
            } => {
                self.visit_expr(cond);
                let t = self.decor.get_type(cond.id());
                if !self.types.is_error_ty(t) && !self.types.is_boolean_ty(t) {
                    self.errors.boolean_required(*span);
                }
                for stmt in then_stmts {
                    self.visit_stmt(stmt);
                }
                if let Some(else_stmts) = else_stmts {
                    for stmt in else_stmts {
                        self.visit_stmt(stmt);
                    }
                }
            }
            Stmt::While {
                span, cond, body, ..
            } => {
                self.visit_expr(cond);
                let t = self.decor.get_type(cond.id());
                if !self.types.is_error_ty(t) && !self.types.is_boolean_ty(t) {
                    self.errors.boolean_required(*span);
                }
                for stmt in body {
                    self.visit_stmt(stmt);
                }
            }
            Stmt::ProcCall {
                id, callee, args, ..
            } => {
                self.check_call(*id, callee, args, false);
            }
            Stmt::Read { span, target, .. } => {
                self.visit_left_expr(target);
                let t = self.decor.get_type(target.id());
                if !self.types.is_error_ty(t)
                    && !self.types.is_primitive_ty(t)
                    && !self.types.is_function_ty(t)
                {
                    self.errors.read_write_require_basic(*span);
                }
                if !self.types.is_error_ty(t) && !self.decor.get_is_lvalue(target.id()) {
                    self.errors.non_referenceable_expression(*span);
                }
            }
            Stmt::WriteExpr { span, expr, .. } => {
                self.visit_expr(expr);
                let t = self.decor.get_type(expr.id());
                if !self.types.is_error_ty(t) && !self.types.is_primitive_ty(t) {
                    self.errors.read_write_require_basic(*span);
                }
            }
            Stmt::WriteString { .. } => {}
            Stmt::Return { span, expr, .. } => {
                if let Some(expr) = expr {
                    self.visit_expr(expr);
                    let t = self.decor.get_type(expr.id());
                    let ret = self.current_ret;
                    if !self.types.is_error_ty(t) && self.types.is_void_ty(ret) {
                        self.errors.incompatible_return(*span);
                    } else if !self.types.is_error_ty(t)
                        && !self.types.equal_types(ret, t)
                        && !(self.types.is_float_ty(ret) && self.types.is_integer_ty(t))
                    {
                        self.errors.incompatible_return(*span);
                    }
                } else if !self.types.is_void_ty(self.current_ret) {
                    self.errors.incompatible_return(*span);
                }
            }
        }
    }

    // ── Left expressions ─────────────────────────────────────────────

    fn visit_left_expr(&mut self, target: &LeftExpr) {
        match target {
            LeftExpr::Ident { id, ident } => {
                self.visit_ident(ident);
                let t = self.decor.get_type(ident.id);
                self.decor.put_type(*id, t);
                let lvalue = self.decor.get_is_lvalue(ident.id);
                self.decor.put_is_lvalue(*id, lvalue);
            }
            LeftExpr::Index { id, ident, index } => {
                self.visit_ident(ident);
                self.visit_expr(index);

                let t_index = self.decor.get_type(index.id());
                let t = self.decor.get_type(ident.id);
                let mut lvalue = self.decor.get_is_lvalue(ident.id);
                let mut is_array = !self.types.is_error_ty(t);
                let mut decoration = t;

                if !self.types.is_error_ty(t) && !self.types.is_array_ty(t) {
                    decoration = self.types.create_error_ty();
                    lvalue = false;
                    is_array = false;
                    self.errors.non_array_in_array_access(ident.span);
                }
                if !self.types.is_error_ty(t_index) && !self.types.is_integer_ty(t_index) {
                    self.errors.non_integer_index_in_array_access(index.span());
                }
                if is_array {
                    decoration = self.types.get_array_elem_type(t);
                }

                self.decor.put_type(*id, decoration);
                self.decor.put_is_lvalue(*id, lvalue);
            }
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Paren { id, inner } => {
                self.visit_expr(inner);
                let t = self.decor.get_type(inner.id());
                self.decor.put_type(*id, t);
                self.decor.put_is_lvalue(*id, false);
            }
            Expr::Index { id, ident, index } => {
                self.visit_ident(ident);
                self.visit_expr(index);

                let t_index = self.decor.get_type(index.id());
                let t = self.decor.get_type(ident.id);

                if !self.types.is_error_ty(t_index) && !self.types.is_integer_ty(t_index) {
                    self.errors.non_integer_index_in_array_access(index.span());
                }
                if !self.types.is_error_ty(t) && !self.types.is_array_ty(t) {
                    self.errors.non_array_in_array_access(ident.span);
                    let err = self.types.create_error_ty();
                    self.decor.put_type(*id, err);
                }
                if self.types.is_array_ty(t) {
                    let elem = self.types.get_array_elem_type(t);
                    self.decor.put_type(*id, elem);
                }

                let lvalue = self.decor.get_is_lvalue(ident.id);
                self.decor.put_is_lvalue(*id, lvalue);
            }
            Expr::Call { id, callee, args } => {
                self.check_call(*id, callee, args, true);
            }
            Expr::Ident { id, ident } => {
                self.visit_ident(ident);
                let t = self.decor.get_type(ident.id);
                self.decor.put_type(*id, t);
                let lvalue = self.decor.get_is_lvalue(ident.id);
                self.decor.put_is_lvalue(*id, lvalue);
            }
            Expr::Binary {
                id,
                op,
                op_span,
                lhs,
                rhs,
            } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
                let t1 = self.decor.get_type(lhs.id());
                let t2 = self.decor.get_type(rhs.id());

                let result = if *op == BinOp::Mod {
                    if (!self.types.is_error_ty(t1) && !self.types.is_integer_ty(t1))
                        || (!self.types.is_error_ty(t2) && !self.types.is_integer_ty(t2))
                    {
                        self.errors.incompatible_operator(*op_span, op.symbol());
                    }
                    self.types.create_integer_ty()
                } else if op.is_arith() {
                    if (!self.types.is_error_ty(t1) && !self.types.is_numeric_ty(t1))
                        || (!self.types.is_error_ty(t2) && !self.types.is_numeric_ty(t2))
                    {
                        self.errors.incompatible_operator(*op_span, op.symbol());
                    }
                    if self.types.is_float_ty(t1) || self.types.is_float_ty(t2) {
                        self.types.create_float_ty()
                    } else {
                        self.types.create_integer_ty()
                    }
                } else if op.is_rel() {
                    if !self.types.is_error_ty(t1)
                        && !self.types.is_error_ty(t2)
                        && !self.types.comparable_types(t1, t2, op.symbol())
                    {
                        self.errors.incompatible_operator(*op_span, op.symbol());
                    }
                    self.types.create_boolean_ty()
                } else {
                    // and / or
                    if (!self.types.is_error_ty(t1) && !self.types.is_boolean_ty(t1))
                        || (!self.types.is_error_ty(t2) && !self.types.is_boolean_ty(t2))
                    {
                        self.errors.incompatible_operator(*op_span, op.symbol());
                    }
                    self.types.create_boolean_ty()
                };

                self.decor.put_type(*id, result);
                self.decor.put_is_lvalue(*id, false);
            }
            Expr::Unary {
                id,
                op,
                op_span,
                operand,
            } => {
                self.visit_expr(operand);
                let t = self.decor.get_type(operand.id());

                if !self.types.is_error_ty(t) {
                    match op {
                        UnOp::Plus | UnOp::Neg if !self.types.is_numeric_ty(t) => {
                            self.errors.incompatible_operator(*op_span, op.symbol());
                        }
                        UnOp::Not if !self.types.is_boolean_ty(t) => {
                            self.errors.incompatible_operator(*op_span, op.symbol());
                        }
                        _ => {}
                    }
                }

                let result = match op {
                    UnOp::Not => self.types.create_boolean_ty(),
                    UnOp::Plus | UnOp::Neg if self.types.is_float_ty(t) => {
                        self.types.create_float_ty()
                    }
                    _ => self.types.create_integer_ty(),
                };
                self.decor.put_type(*id, result);
                self.decor.put_is_lvalue(*id, false);
            }
            Expr::Literal { id, value, .. } => {
                let t = match value {
                    Lit::Int(_) => self.types.create_integer_ty(),
                    Lit::Float(_) => self.types.create_float_ty(),
                    Lit::Bool(_) => self.types.create_boolean_ty(),
                    Lit::Char(_) => self.types.create_character_ty(),
                };
                self.decor.put_type(*id, t);
                self.decor.put_is_lvalue(*id, false);
            }
        }
    }

    /// Shared checks for calls in statement and expression position.
    /// Expression calls must additionally return a value.
    fn check_call(&mut self, node: NodeId, callee: &Ident, args: &[Expr], as_expr: bool) {
        self.visit_ident(callee);
        let t = self.decor.get_type(callee.id);

        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            self.visit_expr(arg);
            arg_types.push(self.decor.get_type(arg.id()));
        }

        if self.types.is_error_ty(t) {
            let err = self.types.create_error_ty();
            self.decor.put_type(node, err);
        } else if !self.types.is_function_ty(t) {
            self.errors.is_not_callable(callee.span);
        } else {
            let ret = self.types.get_func_return_type(t);
            self.decor.put_type(node, ret);

            if arg_types.len() != self.types.get_num_of_parameters(t) {
                self.errors.number_of_parameters(callee.span, &callee.name);
                self.decor.put_is_lvalue(node, false);
                return;
            }

            let param_types = self.types.get_func_params_types(t);
            for (i, (&t_arg, &t_param)) in arg_types.iter().zip(&param_types).enumerate() {
                if !self.types.equal_types(t_arg, t_param)
                    && !self.types.is_error_ty(t_arg)
                    && !(self.types.is_integer_ty(t_arg) && self.types.is_float_ty(t_param))
                {
                    self.errors
                        .incompatible_parameter(args[i].span(), i + 1, &callee.name);
                }
            }

            if as_expr && self.types.is_void_function(t) {
                self.errors.is_not_function(callee.span);
            }
        }

        self.decor.put_is_lvalue(node, false);
    }

    /// A bare name: resolves through the scope stack. Undeclared names
    /// type as error but stay referenceable so one diagnostic suffices.
    fn visit_ident(&mut self, ident: &Ident) {
        match self.symbols.get_type(&ident.name) {
            None => {
                self.errors.undeclared_ident(ident.span, &ident.name);
                let err = self.types.create_error_ty();
                self.decor.put_type(ident.id, err);
                self.decor.put_is_lvalue(ident.id, true);
            }
            Some(t) => {
                self.decor.put_type(ident.id, t);
                let lvalue = !self.symbols.is_function_class(&ident.name);
                self.decor.put_is_lvalue(ident.id, lvalue);
            }
        }
    }
}
