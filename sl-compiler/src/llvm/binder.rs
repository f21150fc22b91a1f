//! SSA precondition check and per-function type inference.
//!
//! The inference sweep walks each subroutine once, seeding the value
//! map from declared parameters and locals and propagating through the
//! instruction table. Values still bound to a sentinel afterwards are
//! reported as an error naming the function.

use super::*;
use crate::sem::types::TypeId;
use crate::tcode::{is_identifier, is_temporary, Instr, Opcode, Subroutine, TcodeProgram};

/// Every temporary may be defined at most once per function. Opcodes
/// that do not define their first operand are exempt.
pub(crate) fn check_ssa(tcode: &TcodeProgram) -> Result<(), CompileError> {
    for subr in &tcode.subroutines {
        let mut def_counts: HashMap<&str, usize> = HashMap::new();
        for instr in &subr.instrs {
            match instr.op {
                Opcode::Label
                | Opcode::Ujump
                | Opcode::Fjump
                | Opcode::Halt
                | Opcode::Push
                | Opcode::Return
                | Opcode::Xload
                | Opcode::Cload
                | Opcode::Writei
                | Opcode::Writef
                | Opcode::Writec
                | Opcode::Writes
                | Opcode::Writeln
                | Opcode::Noop => {}
                _ => {
                    if is_temporary(&instr.arg1) {
                        *def_counts.entry(instr.arg1.as_str()).or_insert(0) += 1;
                    }
                }
            }
        }
        for (temp, count) in def_counts {
            if count > 1 {
                return Err(CompileError::MultiplyDefinedTemp {
                    function: subr.name.clone(),
                    temp: temp.to_string(),
                });
            }
        }
    }
    Ok(())
}

impl LlvmGen<'_> {
    // ── Function signature lookups ───────────────────────────────────

    pub(crate) fn func_return_llvm_type(&self, func: &str) -> String {
        match self.symbols.get_global_function_type(func) {
            Some(tid) => {
                let ret = self.types.get_func_return_type(tid);
                self.type_id_to_llvm(ret, false)
            }
            None => TY_ERR.to_string(),
        }
    }

    pub(crate) fn func_num_of_params(&self, func: &str) -> usize {
        match self.symbols.get_global_function_type(func) {
            Some(tid) => self.types.get_num_of_parameters(tid),
            None => 0,
        }
    }

    pub(crate) fn func_params_llvm_types(&self, func: &str) -> Vec<String> {
        match self.symbols.get_global_function_type(func) {
            Some(tid) => self
                .types
                .get_func_params_types(tid)
                .iter()
                .map(|&p| self.type_id_to_llvm(p, true))
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn local_symbol_llvm_type(&self, func: &str, name: &str, is_param: bool) -> String {
        match self.symbols.get_local_symbol_type(func, name) {
            Some(tid) => self.type_id_to_llvm(tid, is_param),
            None => TY_ERR.to_string(),
        }
    }

    /// Array parameters are pointers to the element type; array locals
    /// are in-place `[n x T]` aggregates.
    pub(crate) fn type_id_to_llvm(&self, tid: TypeId, is_param: bool) -> String {
        if self.types.is_integer_ty(tid) {
            LLVM_INT.to_string()
        } else if self.types.is_float_ty(tid) {
            LLVM_FLOAT.to_string()
        } else if self.types.is_boolean_ty(tid) {
            LLVM_BOOL.to_string()
        } else if self.types.is_character_ty(tid) {
            LLVM_CHAR.to_string()
        } else if self.types.is_void_ty(tid) {
            LLVM_VOID.to_string()
        } else if self.types.is_array_ty(tid) {
            let elem = self.type_id_to_llvm(self.types.get_array_elem_type(tid), false);
            if is_param {
                self.ptr_to(&elem)
            } else {
                format!("[{} x {}]", self.types.get_array_size(tid), elem)
            }
        } else {
            TY_ERR.to_string()
        }
    }

    // ── Value binding ────────────────────────────────────────────────

    pub(crate) fn bind_llvm_value(&mut self, llvm_value: &str, ty: &str) {
        if !self.local_types.contains_key(llvm_value) {
            self.local_order.push(llvm_value.to_string());
            self.counts.insert(llvm_value.to_string(), 0);
        }
        self.local_types
            .insert(llvm_value.to_string(), ty.to_string());
    }

    /// Bind a t-code operand to an LLVM type, narrowing previously
    /// ambiguous bindings and demoting contradictions to `tErr`.
    pub(crate) fn bind_value(&mut self, tcode_arg: &str, ty: &str) {
        if !is_identifier(tcode_arg) && !is_temporary(tcode_arg) {
            return;
        }
        let llvm_value = self.llvm_value(tcode_arg);

        let current = match self.local_types.get(&llvm_value).cloned() {
            None => {
                self.local_order.push(llvm_value.clone());
                self.counts.insert(llvm_value.clone(), 0);
                self.local_types.insert(llvm_value, ty.to_string());
                return;
            }
            Some(current) => current,
        };

        if current == TY_ERR || ty == TY_MISS {
            return;
        }
        let new = if current == TY_INT_BOOL {
            if ty == LLVM_INT || ty == LLVM_BOOL || ty == TY_INT_BOOL {
                ty.to_string()
            } else {
                TY_ERR.to_string()
            }
        } else if ty == TY_INT_BOOL {
            if current == TY_MISS {
                ty.to_string()
            } else if current != LLVM_INT && current != LLVM_BOOL {
                TY_ERR.to_string()
            } else {
                current
            }
        } else if current == TY_MISS {
            ty.to_string()
        } else if current != ty {
            TY_ERR.to_string()
        } else {
            current
        };
        let key = self.llvm_value(tcode_arg);
        self.local_types.insert(key, new);
    }

    /// Unify the types of two operands of a copy or comparison,
    /// preferring the more specific binding.
    pub(crate) fn bind_pair(&mut self, a: &str, b: &str) {
        let va = self.llvm_value(a);
        let vb = self.llvm_value(b);
        let ta = self.local_types.get(&va).cloned();
        let tb = self.local_types.get(&vb).cloned();

        match (ta, tb) {
            (None, None) => {
                self.bind_value(a, TY_MISS);
                self.bind_value(b, TY_MISS);
            }
            (Some(ta), None) => {
                if ta == TY_ERR {
                    self.bind_value(b, TY_MISS);
                } else {
                    self.bind_value(b, &ta);
                }
            }
            (None, Some(tb)) => {
                if tb == TY_ERR {
                    self.bind_value(a, TY_MISS);
                } else {
                    self.bind_value(a, &tb);
                }
            }
            (Some(ta), Some(tb)) => {
                if ta == TY_ERR || tb == TY_ERR {
                    return;
                }
                if ta != TY_MISS && tb == TY_MISS {
                    self.local_types.insert(vb, ta);
                } else if ta == TY_MISS && tb != TY_MISS {
                    self.local_types.insert(va, tb);
                } else if (ta == LLVM_INT || ta == LLVM_BOOL) && tb == TY_INT_BOOL {
                    self.local_types.insert(vb, ta);
                } else if ta == TY_INT_BOOL && (tb == LLVM_INT || tb == LLVM_BOOL) {
                    self.local_types.insert(va, tb);
                } else if ta != TY_MISS && tb != TY_MISS && ta != tb {
                    self.local_types.insert(va, TY_ERR.to_string());
                    self.local_types.insert(vb, TY_ERR.to_string());
                }
            }
        }
    }

    // The scratch words are always typed; whether each one is emitted
    // is decided by the usage flags when the preamble is built.
    pub(crate) fn bind_globals(&mut self) {
        self.global_types
            .insert(GLOBAL_INT_ADDR.to_string(), self.ptr_to(LLVM_INT));
        self.global_types
            .insert(GLOBAL_FLOAT_ADDR.to_string(), self.ptr_to(LLVM_FLOAT));
        self.global_types
            .insert(GLOBAL_CHAR_ADDR.to_string(), self.ptr_to(LLVM_CHAR));
    }

    // ── Per-function inference sweep ─────────────────────────────────

    pub(crate) fn bind_local_symbols(&mut self, subr: &Subroutine) -> Result<(), CompileError> {
        self.local_types.clear();
        self.local_order.clear();
        self.counts.clear();

        for param in &subr.params {
            let ty = if param.name == "_result" {
                self.func_return_llvm_type(&subr.name)
            } else {
                self.local_symbol_llvm_type(&subr.name, &param.name, true)
            };
            self.bind_value(&param.name.clone(), &ty);
        }
        for var in &subr.vars {
            let ty = self.local_symbol_llvm_type(&subr.name, &var.name, false);
            self.bind_value(&var.name.clone(), &ty);
        }

        for instr in &subr.instrs {
            self.bind_instr(instr);
        }

        // Sentinels surviving the sweep are fatal for the function.
        let unresolved: Vec<String> = self
            .local_order
            .iter()
            .filter(|v| {
                let ty = &self.local_types[*v];
                ty == TY_ERR || ty == TY_MISS
            })
            .cloned()
            .collect();
        if !unresolved.is_empty() {
            return Err(CompileError::UnresolvedType {
                function: subr.name.clone(),
                values: unresolved,
            });
        }

        // Never-narrowed literal 0/1 temporaries default to i32.
        for v in &self.local_order {
            if self.local_types[v] == TY_INT_BOOL {
                self.local_types.insert(v.clone(), LLVM_INT.to_string());
            }
        }
        Ok(())
    }

    fn bind_instr(&mut self, instr: &Instr) {
        let arg1 = instr.arg1.clone();
        let arg2 = instr.arg2.clone();
        let arg3 = instr.arg3.clone();

        match instr.op {
            Opcode::Label | Opcode::Ujump => {
                self.bind_value(&arg1, LLVM_LABEL);
            }
            Opcode::Fjump => {
                self.bind_value(&arg1, LLVM_BOOL);
                self.bind_value(&arg2, LLVM_LABEL);
            }
            Opcode::Halt | Opcode::Noop | Opcode::Writes | Opcode::Writeln | Opcode::Return => {}
            Opcode::Load => {
                if is_identifier(&arg1) && is_temporary(&arg2) {
                    let ty = self.type_of_value(&self.llvm_value(&arg1));
                    self.bind_value(&arg2, &ty);
                } else if is_temporary(&arg1) && is_identifier(&arg2) {
                    let ty = self.type_of_value(&self.llvm_value(&arg2));
                    self.bind_value(&arg1, &ty);
                } else if is_temporary(&arg1) && is_temporary(&arg2) {
                    self.bind_pair(&arg1, &arg2);
                }
            }
            Opcode::Iload => {
                // 0 and 1 also spell the boolean literals.
                if arg2 == "0" || arg2 == "1" {
                    self.bind_value(&arg1, TY_INT_BOOL);
                } else {
                    self.bind_value(&arg1, LLVM_INT);
                }
            }
            Opcode::Fload => {
                self.bind_value(&arg1, LLVM_FLOAT);
            }
            Opcode::Chload => {
                self.bind_value(&arg1, LLVM_CHAR);
            }
            Opcode::Push => {
                if !arg1.is_empty() {
                    self.bind_value(&arg1, TY_MISS);
                    self.param_stack.push(arg1);
                }
            }
            Opcode::Pop => {
                if !arg1.is_empty() {
                    let ty = self.pending_ret_type.clone();
                    self.bind_value(&arg1, &ty);
                }
            }
            Opcode::Call => {
                let param_types = self.func_params_llvm_types(&arg1);
                for i in (0..self.func_num_of_params(&arg1)).rev() {
                    if let Some(pushed) = self.param_stack.pop() {
                        self.bind_value(&pushed, &param_types[i]);
                    }
                }
                let ret = self.func_return_llvm_type(&arg1);
                if ret != LLVM_VOID {
                    self.pending_ret_type = ret;
                }
            }
            Opcode::Aload => {
                let ty2 = self.type_of_value(&self.llvm_value(&arg2));
                let ptr = if self.is_array_type(&ty2) {
                    self.array_type_as_pointer(&ty2)
                } else {
                    ty2
                };
                self.bind_value(&arg1, &ptr);
            }
            Opcode::Xload => {
                let ty1 = self.type_of_value(&self.llvm_value(&arg1));
                let elem = self.elem_of_base_type(&ty1);
                self.bind_value(&arg2, LLVM_INT);
                self.bind_value(&arg3, &elem);
            }
            Opcode::Loadx => {
                let ty2 = self.type_of_value(&self.llvm_value(&arg2));
                let elem = self.elem_of_base_type(&ty2);
                self.bind_value(&arg1, &elem);
                self.bind_value(&arg3, LLVM_INT);
            }
            Opcode::Loadc => {
                let ty1 = self.type_of_value(&self.llvm_value(&arg1));
                let ptr = self.ptr_to(&ty1);
                self.bind_value(&arg2, &ptr);
            }
            Opcode::Cload => {
                let ty2 = self.type_of_value(&self.llvm_value(&arg2));
                let ptr = self.ptr_to(&ty2);
                self.bind_value(&arg1, &ptr);
            }
            Opcode::Writei | Opcode::Readi => {
                self.bind_value(&arg1, TY_INT_BOOL);
            }
            Opcode::Writef | Opcode::Readf => {
                self.bind_value(&arg1, LLVM_FLOAT);
            }
            Opcode::Writec | Opcode::Readc => {
                self.bind_value(&arg1, LLVM_CHAR);
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                self.bind_value(&arg1, LLVM_INT);
                self.bind_value(&arg2, LLVM_INT);
                self.bind_value(&arg3, LLVM_INT);
            }
            Opcode::Neg => {
                self.bind_value(&arg1, LLVM_INT);
                self.bind_value(&arg2, LLVM_INT);
            }
            Opcode::Eq | Opcode::Lt | Opcode::Le => {
                self.bind_value(&arg1, LLVM_BOOL);
                if is_identifier(&arg2) && is_temporary(&arg3) {
                    let ty = self.type_of_value(&self.llvm_value(&arg2));
                    self.bind_value(&arg3, &ty);
                } else if is_temporary(&arg2) && is_identifier(&arg3) {
                    let ty = self.type_of_value(&self.llvm_value(&arg3));
                    self.bind_value(&arg2, &ty);
                } else if is_temporary(&arg2) && is_temporary(&arg3) {
                    self.bind_pair(&arg2, &arg3);
                }
            }
            Opcode::Feq | Opcode::Flt | Opcode::Fle => {
                self.bind_value(&arg1, LLVM_BOOL);
                self.bind_value(&arg2, LLVM_FLOAT);
                self.bind_value(&arg3, LLVM_FLOAT);
            }
            Opcode::Fadd | Opcode::Fsub | Opcode::Fmul | Opcode::Fdiv => {
                self.bind_value(&arg1, LLVM_FLOAT);
                self.bind_value(&arg2, LLVM_FLOAT);
                self.bind_value(&arg3, LLVM_FLOAT);
            }
            Opcode::Fneg => {
                self.bind_value(&arg1, LLVM_FLOAT);
                self.bind_value(&arg2, LLVM_FLOAT);
            }
            Opcode::Float => {
                self.bind_value(&arg1, LLVM_FLOAT);
                self.bind_value(&arg2, LLVM_INT);
            }
            Opcode::And | Opcode::Or => {
                self.bind_value(&arg1, LLVM_BOOL);
                self.bind_value(&arg2, LLVM_BOOL);
                self.bind_value(&arg3, LLVM_BOOL);
            }
            Opcode::Not => {
                self.bind_value(&arg1, LLVM_BOOL);
                self.bind_value(&arg2, LLVM_BOOL);
            }
        }
    }

    /// Element type behind an array or pointer base.
    fn elem_of_base_type(&self, ty: &str) -> String {
        if self.is_array_type(ty) {
            self.array_elem_type(ty)
        } else if self.is_pointer_type(ty) {
            self.pointed_type(ty)
        } else {
            TY_ERR.to_string()
        }
    }
}
