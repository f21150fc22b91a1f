//! Lowering of the decorated tree into three-address code.
//!
//! Every expression visitor yields a `CodeAttribs`: the address holding
//! the value (identifier or fresh temporary), an optional array offset
//! (only for left-expressions of the form `a[i]`), and the instruction
//! list computing it. Temporary and label counters restart per function.

use crate::ast::*;
use crate::sem::decor::Decorations;
use crate::sem::symbols::SymTable;
use crate::sem::types::{TypeId, TypeRegistry};
use crate::tcode::code::*;

pub fn build(
    program: &Program,
    types: &TypeRegistry,
    symbols: &mut SymTable,
    decor: &Decorations,
) -> TcodeProgram {
    let mut builder = TcodeBuilder {
        types,
        symbols,
        decor,
        counters: CodeCounters::default(),
    };
    builder.visit_program(program)
}

/// Intermediate result of lowering one expression.
struct CodeAttribs {
    addr: String,
    offs: String,
    code: Vec<Instr>,
}

impl CodeAttribs {
    fn new(addr: impl Into<String>, offs: impl Into<String>, code: Vec<Instr>) -> Self {
        Self {
            addr: addr.into(),
            offs: offs.into(),
            code,
        }
    }
}

struct TcodeBuilder<'a> {
    types: &'a TypeRegistry,
    symbols: &'a mut SymTable,
    decor: &'a Decorations,
    counters: CodeCounters,
}

impl TcodeBuilder<'_> {
    fn visit_program(&mut self, program: &Program) -> TcodeProgram {
        let scope = self
            .decor
            .get_scope(program.id)
            .expect("global scope recorded by symbol collection");
        self.symbols.push_this_scope(scope);
        let mut out = TcodeProgram::new();
        for func in &program.functions {
            out.add_subroutine(self.visit_function(func));
        }
        self.symbols.pop_scope();
        out
    }

    fn visit_function(&mut self, func: &Function) -> Subroutine {
        let scope = self
            .decor
            .get_scope(func.id)
            .expect("function scope recorded by symbol collection");
        self.symbols.push_this_scope(scope);
        let mut subr = Subroutine::new(&func.name);
        self.counters.reset();

        for decl in &func.decls {
            self.add_local_vars(&mut subr, decl);
        }

        // Functions returning a value get a synthetic slot the body
        // stores into before returning.
        if let Some(ret) = &func.ret {
            let t = self.decor.get_type(ret.id);
            subr.add_param("_result", basic_llvm_str(self.types, t), false);
        }

        for param in &func.params {
            let t = self.decor.get_type(param.ty.id);
            if self.types.is_array_ty(t) {
                let elem = self.types.get_array_elem_type(t);
                subr.add_param(&param.name, basic_llvm_str(self.types, elem), true);
            } else {
                subr.add_param(&param.name, basic_llvm_str(self.types, t), false);
            }
        }

        let mut code = self.visit_statements(&func.body);
        code.push(Instr::ret());
        subr.set_instructions(code);
        self.symbols.pop_scope();
        subr
    }

    fn add_local_vars(&mut self, subr: &mut Subroutine, decl: &VarDecl) {
        let t = self.decor.get_type(decl.ty.id);
        let size = self.types.get_size_of_type(t);
        for (name, _) in &decl.names {
            if self.types.is_array_ty(t) {
                let elem = self.types.get_array_elem_type(t);
                subr.add_var(name, basic_llvm_str(self.types, elem), size);
            } else {
                subr.add_var(name, basic_llvm_str(self.types, t), size);
            }
        }
    }

    fn visit_statements(&mut self, stmts: &[Stmt]) -> Vec<Instr> {
        let mut code = Vec::new();
        for stmt in stmts {
            code.extend(self.visit_stmt(stmt));
        }
        code
    }

    // ── Statements ───────────────────────────────────────────────────

    fn visit_stmt(&mut self, stmt: &Stmt) -> Vec<Instr> {
        match stmt {
            Stmt::Assign { target, value, .. } => self.visit_assign(target, value),
            Stmt::If {
                cond,
                then_stmts,
                else_stmts,
                ..
            } => self.visit_if(cond, then_stmts, else_stmts.as_deref()),
            Stmt::While { cond, body, .. } => self.visit_while(cond, body),
            Stmt::ProcCall { callee, args, .. } => self.visit_proc_call(callee, args),
            Stmt::Read { target, .. } => self.visit_read(target),
            Stmt::WriteExpr { expr, .. } => self.visit_write_expr(expr),
            Stmt::WriteString { value, .. } => vec![Instr::writes(value.clone())],
            Stmt::Return { expr, .. } => self.visit_return(expr.as_ref()),
        }
    }

    fn visit_assign(&mut self, target: &LeftExpr, value: &Expr) -> Vec<Instr> {
        let lhs = self.visit_left_expr(target);
        let t1 = self.decor.get_type(target.id());
        let rhs = self.visit_expr(value);
        let t2 = self.decor.get_type(value.id());

        let mut addr1 = lhs.addr;
        let offs1 = lhs.offs;
        let mut addr2 = rhs.addr;
        let mut code = lhs.code;
        code.extend(rhs.code);

        if self.types.is_array_ty(t1) && self.types.is_array_ty(t2) {
            // In-place element copy, iterating size-1 down to 0.
            let label_start = format!("ArrayCpy{}", self.counters.new_while_label());
            let label_end = format!("End{}", label_start);

            // Arrays that are not plain locals arrive as pointers and
            // must be dereferenced first.
            if !self.symbols.is_local_var_class(&addr1) {
                let tmp = self.counters.new_temp();
                code.push(Instr::load(&tmp, &addr1));
                addr1 = tmp;
            }
            if !self.symbols.is_local_var_class(&addr2) {
                let tmp = self.counters.new_temp();
                code.push(Instr::load(&tmp, &addr2));
                addr2 = tmp;
            }

            // Size equality between both sides was already enforced.
            let num_elements = (self.types.get_array_size(t1) - 1).to_string();
            let one = self.counters.new_temp();
            let zero = self.counters.new_temp();
            let index = self.counters.new_temp();
            let cond = self.counters.new_temp();
            let elem = self.counters.new_temp();

            code.push(Instr::load(&index, num_elements));
            code.push(Instr::iload(&zero, "0"));
            code.push(Instr::iload(&one, "1"));
            code.push(Instr::label(&label_start));
            code.push(Instr::le(&cond, &zero, &index));
            code.push(Instr::fjump(&cond, &label_end));
            code.push(Instr::loadx(&elem, &addr2, &index));
            code.push(Instr::xload(&addr1, &index, &elem));
            code.push(Instr::sub(&index, &index, &one));
            code.push(Instr::ujump(&label_start));
            code.push(Instr::label(&label_end));
        } else {
            if self.types.is_float_ty(t1) && self.types.is_integer_ty(t2) {
                let tmp = self.counters.new_temp();
                code.push(Instr::float(&tmp, &addr2));
                addr2 = tmp;
            }
            if !offs1.is_empty() {
                code.push(Instr::xload(addr1, offs1, addr2));
            } else {
                code.push(Instr::load(addr1, addr2));
            }
        }
        code
    }

    fn visit_if(&mut self, cond: &Expr, then_stmts: &[Stmt], else_stmts: Option<&[Stmt]>) -> Vec<Instr> {
        let cond_at = self.visit_expr(cond);
        let mut code = cond_at.code;

        match else_stmts {
            None => {
                let then_code = self.visit_statements(then_stmts);
                let label_end = format!("Endif{}", self.counters.new_if_label());
                code.push(Instr::fjump(cond_at.addr, &label_end));
                code.extend(then_code);
                code.push(Instr::label(label_end));
            }
            Some(else_stmts) => {
                let then_code = self.visit_statements(then_stmts);
                let else_code = self.visit_statements(else_stmts);
                let label = self.counters.new_if_label();
                let label_else = format!("If{}", label);
                let label_join = format!("Else{}", label);
                code.push(Instr::fjump(cond_at.addr, &label_else));
                code.extend(then_code);
                code.push(Instr::ujump(&label_join));
                code.push(Instr::label(label_else));
                code.extend(else_code);
                code.push(Instr::label(label_join));
            }
        }
        code
    }

    fn visit_while(&mut self, cond: &Expr, body: &[Stmt]) -> Vec<Instr> {
        let cond_at = self.visit_expr(cond);
        let body_code = self.visit_statements(body);
        let label = self.counters.new_while_label();
        let label_start = format!("While{}", label);
        let label_end = format!("EndWhile{}", label);

        let mut code = vec![Instr::label(&label_start)];
        code.extend(cond_at.code);
        code.push(Instr::fjump(cond_at.addr, &label_end));
        code.extend(body_code);
        code.push(Instr::ujump(&label_start));
        code.push(Instr::label(&label_end));
        code
    }

    fn visit_read(&mut self, target: &LeftExpr) -> Vec<Instr> {
        let at = self.visit_left_expr(target);
        let t = self.decor.get_type(target.id());
        let mut code = at.code;

        if !at.offs.is_empty() {
            // Array element target: read into a fresh temporary first.
            let tmp = self.counters.new_temp();
            code.push(self.read_instr(t, &tmp));
            code.push(Instr::xload(at.addr, at.offs, tmp));
        } else {
            code.push(self.read_instr(t, &at.addr));
        }
        code
    }

    fn read_instr(&self, t: TypeId, dst: &str) -> Instr {
        if self.types.is_integer_ty(t) || self.types.is_boolean_ty(t) {
            Instr::readi(dst)
        } else if self.types.is_float_ty(t) {
            Instr::readf(dst)
        } else {
            Instr::readc(dst)
        }
    }

    fn visit_write_expr(&mut self, expr: &Expr) -> Vec<Instr> {
        let at = self.visit_expr(expr);
        let t = self.decor.get_type(expr.id());
        let mut code = at.code;
        if self.types.is_integer_ty(t) || self.types.is_boolean_ty(t) {
            code.push(Instr::writei(at.addr));
        } else if self.types.is_float_ty(t) {
            code.push(Instr::writef(at.addr));
        } else if self.types.is_character_ty(t) {
            code.push(Instr::writec(at.addr));
        }
        code
    }

    fn visit_return(&mut self, expr: Option<&Expr>) -> Vec<Instr> {
        match expr {
            None => vec![Instr::ret()],
            Some(expr) => {
                let at = self.visit_expr(expr);
                let mut code = at.code;
                code.push(Instr::load("_result", at.addr));
                code.push(Instr::ret());
                code
            }
        }
    }

    /// Call protocol: reserve a result slot for value-returning
    /// callees, push coerced arguments, call, pop arguments, pop the
    /// result.
    fn visit_proc_call(&mut self, callee: &Ident, args: &[Expr]) -> Vec<Instr> {
        let t = self.decor.get_type(callee.id);
        let param_types = self.types.get_func_params_types(t);
        let mut code = Vec::new();

        if !self.types.is_void_function(t) {
            code.push(Instr::push_slot());
        }
        self.push_arguments(&mut code, args, &param_types);
        code.push(Instr::call(&callee.name));
        for _ in args {
            code.push(Instr::pop_discard());
        }
        if !self.types.is_void_function(t) {
            code.push(Instr::pop_discard());
        }
        code
    }

    fn visit_call_expr(&mut self, callee: &Ident, args: &[Expr]) -> CodeAttribs {
        let result = self.counters.new_temp();
        let t = self.decor.get_type(callee.id);
        let param_types = self.types.get_func_params_types(t);

        let mut code = vec![Instr::push_slot()];
        self.push_arguments(&mut code, args, &param_types);
        code.push(Instr::call(&callee.name));
        for _ in args {
            code.push(Instr::pop_discard());
        }
        code.push(Instr::pop(&result));
        CodeAttribs::new(result, "", code)
    }

    fn push_arguments(&mut self, code: &mut Vec<Instr>, args: &[Expr], param_types: &[TypeId]) {
        for (i, arg) in args.iter().enumerate() {
            let at = self.visit_expr(arg);
            let mut addr = at.addr;
            let mut arg_code = at.code;
            let t_arg = self.decor.get_type(arg.id());

            let coerce_float = param_types
                .get(i)
                .map(|&p| self.types.is_float_ty(p) && self.types.is_integer_ty(t_arg))
                .unwrap_or(false);
            if coerce_float {
                let tmp = self.counters.new_temp();
                arg_code.push(Instr::float(&tmp, &addr));
                addr = tmp;
            } else if self.types.is_array_ty(t_arg) && !self.symbols.is_parameter_class(&addr) {
                // Local arrays are passed by address; parameter arrays
                // already are pointers.
                let tmp = self.counters.new_temp();
                arg_code.push(Instr::aload(&tmp, &addr));
                addr = tmp;
            }

            code.extend(arg_code);
            code.push(Instr::push(addr));
        }
    }

    // ── Left expressions ─────────────────────────────────────────────

    fn visit_left_expr(&mut self, target: &LeftExpr) -> CodeAttribs {
        match target {
            LeftExpr::Ident { ident, .. } => CodeAttribs::new(ident.name.clone(), "", Vec::new()),
            LeftExpr::Index { ident, index, .. } => {
                let mut addr = ident.name.clone();
                let idx = self.visit_expr(index);
                let offs = idx.addr;
                let mut code = idx.code;
                if self.symbols.is_parameter_class(&ident.name) {
                    let tmp = self.counters.new_temp();
                    code.push(Instr::load(&tmp, &addr));
                    addr = tmp;
                }
                CodeAttribs::new(addr, offs, code)
            }
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn visit_expr(&mut self, expr: &Expr) -> CodeAttribs {
        match expr {
            Expr::Paren { inner, .. } => self.visit_expr(inner),
            Expr::Ident { ident, .. } => CodeAttribs::new(ident.name.clone(), "", Vec::new()),
            Expr::Index { ident, index, .. } => self.visit_index_expr(ident, index),
            Expr::Call { callee, args, .. } => self.visit_call_expr(callee, args),
            Expr::Unary { op, operand, .. } => self.visit_unary(*op, operand),
            Expr::Binary {
                id, op, lhs, rhs, ..
            } => {
                if op.is_arith() {
                    self.visit_arithmetic(*id, *op, lhs, rhs)
                } else if op.is_rel() {
                    self.visit_relational(*op, lhs, rhs)
                } else {
                    self.visit_logic(*op, lhs, rhs)
                }
            }
            Expr::Literal { value, .. } => self.visit_literal(value),
        }
    }

    fn visit_index_expr(&mut self, ident: &Ident, index: &Expr) -> CodeAttribs {
        let addr_base = ident.name.clone();
        let idx = self.visit_expr(index);
        let mut code = idx.code;
        let value = self.counters.new_temp();

        if self.symbols.is_parameter_class(&ident.name) {
            let tmp = self.counters.new_temp();
            code.push(Instr::load(&tmp, &addr_base));
            code.push(Instr::loadx(&value, &tmp, &idx.addr));
        } else {
            code.push(Instr::loadx(&value, &addr_base, &idx.addr));
        }
        CodeAttribs::new(value, "", code)
    }

    fn visit_unary(&mut self, op: UnOp, operand: &Expr) -> CodeAttribs {
        let at = self.visit_expr(operand);
        if op == UnOp::Plus {
            return at;
        }

        let mut code = at.code;
        let t = self.decor.get_type(operand.id());
        let temp = self.counters.new_temp();
        match op {
            UnOp::Not => code.push(Instr::not(&temp, &at.addr)),
            UnOp::Neg if self.types.is_integer_ty(t) => code.push(Instr::neg(&temp, &at.addr)),
            UnOp::Neg => code.push(Instr::fneg(&temp, &at.addr)),
            UnOp::Plus => {}
        }
        CodeAttribs::new(temp, "", code)
    }

    fn visit_arithmetic(&mut self, id: NodeId, op: BinOp, lhs: &Expr, rhs: &Expr) -> CodeAttribs {
        let a1 = self.visit_expr(lhs);
        let a2 = self.visit_expr(rhs);
        let mut addr1 = a1.addr;
        let mut addr2 = a2.addr;
        let mut code = a1.code;
        code.extend(a2.code);

        let t1 = self.decor.get_type(lhs.id());
        let t2 = self.decor.get_type(rhs.id());
        let t = self.decor.get_type(id);

        if op == BinOp::Mod {
            // a % b expands to a - (a / b) * b.
            let quot = self.counters.new_temp();
            let prod = self.counters.new_temp();
            let temp = self.counters.new_temp();
            code.push(Instr::div(&quot, &addr1, &addr2));
            code.push(Instr::mul(&prod, &quot, &addr2));
            code.push(Instr::sub(&temp, &addr1, &prod));
            return CodeAttribs::new(temp, "", code);
        }

        let is_float = self.types.is_float_ty(t);
        if is_float {
            if !self.types.is_float_ty(t1) {
                let tmp = self.counters.new_temp();
                code.push(Instr::float(&tmp, &addr1));
                addr1 = tmp;
            }
            if !self.types.is_float_ty(t2) {
                let tmp = self.counters.new_temp();
                code.push(Instr::float(&tmp, &addr2));
                addr2 = tmp;
            }
        }

        let temp = self.counters.new_temp();
        let instr = match (op, is_float) {
            (BinOp::Add, false) => Instr::add(&temp, &addr1, &addr2),
            (BinOp::Add, true) => Instr::fadd(&temp, &addr1, &addr2),
            (BinOp::Sub, false) => Instr::sub(&temp, &addr1, &addr2),
            (BinOp::Sub, true) => Instr::fsub(&temp, &addr1, &addr2),
            (BinOp::Mul, false) => Instr::mul(&temp, &addr1, &addr2),
            (BinOp::Mul, true) => Instr::fmul(&temp, &addr1, &addr2),
            (BinOp::Div, false) => Instr::div(&temp, &addr1, &addr2),
            _ => Instr::fdiv(&temp, &addr1, &addr2),
        };
        code.push(instr);
        CodeAttribs::new(temp, "", code)
    }

    fn visit_relational(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> CodeAttribs {
        let a1 = self.visit_expr(lhs);
        let a2 = self.visit_expr(rhs);
        let addr1 = a1.addr;
        let addr2 = a2.addr;
        let mut code = a1.code;
        code.extend(a2.code);

        let t1 = self.decor.get_type(lhs.id());
        let t2 = self.decor.get_type(rhs.id());

        let temp1 = self.counters.new_temp();
        let temp2 = self.counters.new_temp();

        if !self.types.is_float_ty(t1) && !self.types.is_float_ty(t2) {
            match op {
                BinOp::Eq => code.push(Instr::eq(&temp1, &addr1, &addr2)),
                BinOp::Neq => {
                    code.push(Instr::eq(&temp2, &addr1, &addr2));
                    code.push(Instr::not(&temp1, &temp2));
                }
                BinOp::Ge => {
                    code.push(Instr::lt(&temp2, &addr1, &addr2));
                    code.push(Instr::not(&temp1, &temp2));
                }
                BinOp::Gt => {
                    code.push(Instr::le(&temp2, &addr1, &addr2));
                    code.push(Instr::not(&temp1, &temp2));
                }
                BinOp::Le => code.push(Instr::le(&temp1, &addr1, &addr2)),
                _ => code.push(Instr::lt(&temp1, &addr1, &addr2)),
            }
        } else {
            let mut f1 = addr1.clone();
            let mut f2 = addr2.clone();
            if !self.types.is_float_ty(t1) {
                f1 = self.counters.new_temp();
                code.push(Instr::float(&f1, &addr1));
            }
            if !self.types.is_float_ty(t2) {
                f2 = self.counters.new_temp();
                code.push(Instr::float(&f2, &addr2));
            }
            match op {
                BinOp::Eq => code.push(Instr::feq(&temp1, &f1, &f2)),
                BinOp::Neq => {
                    code.push(Instr::feq(&temp2, &f1, &f2));
                    code.push(Instr::not(&temp1, &temp2));
                }
                BinOp::Ge => {
                    code.push(Instr::flt(&temp2, &f1, &f2));
                    code.push(Instr::not(&temp1, &temp2));
                }
                BinOp::Gt => {
                    code.push(Instr::fle(&temp2, &f1, &f2));
                    code.push(Instr::not(&temp1, &temp2));
                }
                BinOp::Le => code.push(Instr::fle(&temp1, &f1, &f2)),
                _ => code.push(Instr::flt(&temp1, &f1, &f2)),
            }
        }
        CodeAttribs::new(temp1, "", code)
    }

    fn visit_logic(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> CodeAttribs {
        let a1 = self.visit_expr(lhs);
        let a2 = self.visit_expr(rhs);
        let mut code = a1.code;
        code.extend(a2.code);

        let temp = self.counters.new_temp();
        if op == BinOp::And {
            code.push(Instr::and(&temp, &a1.addr, &a2.addr));
        } else {
            code.push(Instr::or(&temp, &a1.addr, &a2.addr));
        }
        CodeAttribs::new(temp, "", code)
    }

    fn visit_literal(&mut self, value: &Lit) -> CodeAttribs {
        let temp = self.counters.new_temp();
        let instr = match value {
            Lit::Int(text) => Instr::iload(&temp, text.clone()),
            Lit::Float(text) => Instr::fload(&temp, text.clone()),
            Lit::Char(text) => Instr::chload(&temp, text.clone()),
            Lit::Bool(true) => Instr::iload(&temp, "1"),
            Lit::Bool(false) => Instr::iload(&temp, "0"),
        };
        CodeAttribs::new(temp, "", vec![instr])
    }
}

/// Primitive type as it appears in subroutine declarations.
fn basic_llvm_str(types: &TypeRegistry, t: TypeId) -> &'static str {
    if types.is_integer_ty(t) {
        "i32"
    } else if types.is_float_ty(t) {
        "float"
    } else if types.is_boolean_ty(t) {
        "i1"
    } else if types.is_character_ty(t) {
        "i8"
    } else {
        "void"
    }
}
