//! Textual IR emission.
//!
//! Identifiers live in stack slots (`%name.addr`): every use loads into
//! a freshly numbered value and every definition stores back, leaving
//! mem2reg to clean up. Temporaries are used directly; the builder
//! already guarantees single assignment for them.

use super::*;
use crate::tcode::{is_identifier, is_temporary, Instr, Opcode, Subroutine};

impl LlvmGen<'_> {
    pub(crate) fn dump(&mut self) -> Result<String, CompileError> {
        let tcode = self.tcode;
        self.compute_read_write_halt_info();
        self.bind_globals();

        // The body is emitted first: reading a boolean identifier also
        // claims the integer scratch word, which the preamble must see.
        let mut body = String::new();
        for subr in &tcode.subroutines {
            self.bind_local_symbols(subr)?;
            self.start_new_function(&subr.name);
            body.push_str(&self.dump_subroutine(subr));
        }
        let (begin, end) = self.preamble_postamble();
        Ok(format!("{}{}{}", begin, body, end))
    }

    // ── Module preamble / postamble ──────────────────────────────────

    fn compute_read_write_halt_info(&mut self) {
        let tcode = self.tcode;
        for subr in &tcode.subroutines {
            for instr in &subr.instrs {
                match instr.op {
                    Opcode::Writei => self.write_i = true,
                    Opcode::Writef => self.write_f = true,
                    Opcode::Writec => self.write_c = true,
                    Opcode::Writeln => self.write_ln = true,
                    Opcode::Writes => {
                        if !self.writes_literals.contains(&instr.arg1) {
                            self.writes_literals.push(instr.arg1.clone());
                        }
                        self.write_s = true;
                    }
                    Opcode::Readi => {
                        self.read_i = true;
                        if is_temporary(&instr.arg1) {
                            self.global_i = true;
                        }
                    }
                    Opcode::Readf => {
                        self.read_f = true;
                        if is_temporary(&instr.arg1) {
                            self.global_f = true;
                        }
                    }
                    Opcode::Readc => {
                        self.read_c = true;
                        if is_temporary(&instr.arg1) {
                            self.global_c = true;
                        }
                    }
                    Opcode::Halt => self.halt_and_exit = true,
                    _ => {}
                }
            }
        }
        for literal in &self.writes_literals.clone() {
            let (decoded, size) = decode_string_literal(literal);
            self.writes_decoded.push(decoded);
            self.writes_sizes.push(size + 1);
        }
    }

    fn preamble_postamble(&mut self) -> (String, String) {
        let mut begin = String::new();
        let mut end = String::new();

        let any_fmt = self.write_i
            || self.read_i
            || self.write_f
            || self.read_f
            || self.write_c
            || self.read_c;
        if any_fmt || self.write_s || self.write_ln {
            begin.push('\n');
        }
        if self.write_i || self.read_i {
            begin.push_str("@.str.i = constant [3 x i8] c\"%d\\00\"\n");
        }
        if self.write_f || self.read_f {
            begin.push_str("@.str.f = constant [3 x i8] c\"%g\\00\"\n");
        }
        if self.write_c || self.read_c {
            begin.push_str("@.str.c = constant [3 x i8] c\"%c\\00\"\n");
        }
        for (i, decoded) in self.writes_decoded.iter().enumerate() {
            begin.push_str(&format!(
                "@.str.s.{} = constant [{} x i8] c\"{}\\00\"\n",
                i + 1,
                self.writes_sizes[i],
                decoded
            ));
        }
        if any_fmt {
            begin.push_str("\n\n");
        }
        if self.global_i {
            begin.push_str("@.global.i.addr = common dso_local global i32 0\n");
        }
        if self.global_f {
            begin.push_str("@.global.f.addr = common dso_local global float 0.000000e+00\n");
        }
        if self.global_c {
            begin.push_str("@.global.c.addr = common dso_local global i8 0\n");
        }
        if any_fmt {
            begin.push_str("\n\n");
        }

        if any_fmt || self.write_s || self.write_ln || self.halt_and_exit {
            end.push('\n');
        }
        if self.write_i || self.write_f || self.write_s {
            end.push_str("declare dso_local i32 @printf(i8*, ...)\n");
        }
        if self.write_c || self.write_ln {
            end.push_str("declare dso_local i32 @putchar(i32)\n");
        }
        if self.read_i || self.read_f || self.read_c {
            end.push_str("declare dso_local i32 @__isoc99_scanf(i8*, ...)\n");
        }
        if self.halt_and_exit {
            end.push_str("declare dso_local void @exit(i32) noreturn nounwind\n");
        }
        if any_fmt || self.write_s || self.write_ln || self.halt_and_exit {
            end.push('\n');
        }
        (begin, end)
    }

    // ── Subroutine layout ────────────────────────────────────────────

    fn dump_subroutine(&mut self, subr: &Subroutine) -> String {
        let mut out = String::new();
        out.push_str(&self.dump_header(subr));
        out.push_str("{\n");
        out.push_str(&self.create_label(ENTRY_LABEL));
        out.push_str(&self.dump_alloca_params(subr));
        out.push_str(&self.dump_alloca_local_vars(subr));
        out.push_str(&self.dump_store_params(subr));
        out.push_str(&self.dump_instruction_list(subr));
        out.push_str("}\n\n");
        out
    }

    fn dump_header(&mut self, subr: &Subroutine) -> String {
        let mut out = String::from("define dso_local ");
        if self.is_main {
            out.push_str(&format!("{} @main() ", LLVM_INT));
        } else {
            out.push_str(&format!(
                "{} @{}(",
                self.func_return_llvm_type(&subr.name),
                subr.name
            ));
            let mut first = true;
            for p in &subr.params {
                if p.name == "_result" {
                    continue;
                }
                let value = self.llvm_value(&p.name);
                let ty = self.local_symbol_llvm_type(&subr.name, &p.name, true);
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(&format!("{} {}", ty, value));
            }
            out.push_str(") ");
        }
        out
    }

    fn dump_alloca_params(&mut self, subr: &Subroutine) -> String {
        let mut out = String::new();
        for p in &subr.params {
            let value = self.llvm_value(&p.name);
            let ty = if p.name == "_result" {
                self.func_return_llvm_type(&subr.name)
            } else {
                self.local_symbol_llvm_type(&subr.name, &p.name, true)
            };
            let addr = self.value_addr(&value);
            let ptr = self.ptr_to(&ty);
            self.bind_llvm_value(&addr, &ptr);
            out.push_str(&self.create_alloca(&addr, &ty));
        }
        out
    }

    fn dump_alloca_local_vars(&mut self, subr: &Subroutine) -> String {
        let mut out = String::new();
        for v in &subr.vars {
            let value = self.llvm_value(&v.name);
            let ty = self.local_symbol_llvm_type(&subr.name, &v.name, false);
            let addr = self.value_addr(&value);
            let ptr = self.ptr_to(&ty);
            self.bind_llvm_value(&addr, &ptr);
            out.push_str(&self.create_alloca(&addr, &ty));
        }
        out
    }

    fn dump_store_params(&mut self, subr: &Subroutine) -> String {
        let mut out = String::new();
        for p in &subr.params {
            if p.name != "_result" {
                let value = self.llvm_value(&p.name);
                let addr = self.value_addr(&value);
                out.push_str(&self.create_store(&value, &addr));
            }
        }
        out
    }

    fn dump_instruction_list(&mut self, subr: &Subroutine) -> String {
        let mut out = String::new();
        for (i, instr) in subr.instrs.iter().enumerate() {
            out.push_str(&self.dump_instruction(instr, subr.instrs.get(i + 1)));
        }
        out
    }

    // ── Instruction translation ──────────────────────────────────────

    fn dump_instruction(&mut self, instr: &Instr, next: Option<&Instr>) -> String {
        let arg1 = instr.arg1.clone();
        let arg2 = instr.arg2.clone();
        let arg3 = instr.arg3.clone();
        let next_is_label = matches!(next, Some(n) if n.op == Opcode::Label);
        let mut out = String::new();

        match instr.op {
            Opcode::Label => {
                let label_value = self.llvm_value(&arg1);
                if !self.prev_is_terminator {
                    out.push_str(&self.create_br(&label_value));
                }
                out.push_str(&self.create_label(&arg1));
            }
            Opcode::Ujump => {
                let label_value = self.llvm_value(&arg1);
                out.push_str(&self.create_br(&label_value));
                if next.is_some() && !next_is_label {
                    let dead = self.new_prefixed_value("%.dead.cont", LLVM_LABEL);
                    out.push_str(&self.create_label(&dead[1..]));
                }
            }
            Opcode::Fjump => {
                let (value, access) = self.access_value(&arg1);
                out.push_str(&access);
                let target = self.llvm_value(&arg2);
                if next_is_label {
                    let cont = next
                        .map(|n| self.llvm_value(&n.arg1))
                        .unwrap_or_default();
                    out.push_str(&self.create_br_cond(&value, &cont, &target));
                } else {
                    let cont = self.new_prefixed_value("%.br.cont", LLVM_LABEL);
                    out.push_str(&self.create_br_cond(&value, &cont, &target));
                    out.push_str(&self.create_label(&cont[1..]));
                }
            }
            Opcode::Halt => {
                out.push_str(&format!("{}call void @exit(i32 1)\n", INDENT_INSTR));
            }
            Opcode::Load => {
                let value1 = self.llvm_value(&arg1);
                let value2 = self.llvm_value(&arg2);
                if is_identifier(&arg1) {
                    // a = %4  or  a = b
                    let (value2, access) = self.access_value(&arg2);
                    let addr1 = self.value_addr(&value1);
                    out.push_str(&access);
                    out.push_str(&self.create_store(&value2, &addr1));
                } else if is_identifier(&arg2) {
                    // %4 = a
                    let addr2 = self.value_addr(&value2);
                    out.push_str(&self.create_load(&value1, &addr2));
                } else {
                    // %4 = %6 (or a literal source): widen one step and
                    // truncate back, keeping the original emitter's shape.
                    let ty = if is_temporary(&arg2) {
                        self.type_of_value(&value2)
                    } else {
                        self.type_of_value(&value1)
                    };
                    if self.is_any_integer_type(&ty) {
                        let up = self.one_int_up(&ty).to_string();
                        let prefix = format!("%.temp.{}.{}", &arg1[1..], up);
                        let widened = self.new_prefixed_value(&prefix, &up);
                        out.push_str(&self.create_conversion("zext", &widened, &value2, &ty));
                        out.push_str(&self.create_conversion("trunc", &value1, &widened, &up));
                    } else {
                        let prefix = format!("%.temp.{}.double", &arg1[1..]);
                        let widened = self.new_prefixed_value(&prefix, LLVM_DOUBLE);
                        out.push_str(&self.create_conversion("fpext", &widened, &value2, &ty));
                        out.push_str(&self.create_conversion(
                            "fptrunc",
                            &value1,
                            &widened,
                            LLVM_DOUBLE,
                        ));
                    }
                }
            }
            Opcode::Iload => {
                let value1 = self.llvm_value(&arg1);
                if is_temporary(&arg1) {
                    out.push_str(&self.create_conversion("trunc", &value1, &arg2, LLVM_INT64));
                } else {
                    let addr1 = self.value_addr(&value1);
                    out.push_str(&self.create_store(&arg2, &addr1));
                }
            }
            Opcode::Fload => {
                let value1 = self.llvm_value(&arg1);
                if is_temporary(&arg1) {
                    out.push_str(&self.create_conversion("fptrunc", &value1, &arg2, LLVM_DOUBLE));
                } else {
                    let addr1 = self.value_addr(&value1);
                    out.push_str(&self.create_store(&arg2, &addr1));
                }
            }
            Opcode::Chload => {
                let value1 = self.llvm_value(&arg1);
                let code = ascii_code(&arg2).to_string();
                if is_temporary(&arg1) {
                    out.push_str(&self.create_conversion("trunc", &value1, &code, LLVM_INT));
                } else {
                    let addr1 = self.value_addr(&value1);
                    out.push_str(&self.create_store(&code, &addr1));
                }
            }
            Opcode::Push => {
                if arg1.is_empty() {
                    self.param_stack.push(String::new());
                } else {
                    let (value, access) = self.access_value(&arg1);
                    out.push_str(&access);
                    self.param_stack.push(value);
                }
            }
            Opcode::Pop => {
                let param = self.param_stack.pop().unwrap_or_default();
                if !param.is_empty() {
                    self.pending_args.push(param);
                }
                if !arg1.is_empty() {
                    let (value, modify) = self.modify_value(&arg1);
                    let func = self.pending_func.clone();
                    let args = self.pending_args.clone();
                    out.push_str(&self.create_call_result(&func, &value, &args));
                    out.push_str(&modify);
                } else if self.param_stack.is_empty() {
                    let func = self.pending_func.clone();
                    let args = self.pending_args.clone();
                    out.push_str(&self.create_call_void(&func, &args));
                }
            }
            Opcode::Call => {
                self.pending_func = arg1;
                self.pending_args.clear();
                if self.param_stack.is_empty() {
                    let func = self.pending_func.clone();
                    out.push_str(&self.create_call_void(&func, &[]));
                }
            }
            Opcode::Return => {
                let ret_ty = self.func_return_llvm_type(&self.current_function.clone());
                if ret_ty == LLVM_VOID {
                    if self.is_main {
                        out.push_str(&format!("{}ret i32 0\n", INDENT_INSTR));
                    } else {
                        out.push_str(&format!("{}ret void\n", INDENT_INSTR));
                    }
                } else {
                    let (value, access) = self.access_value("_result");
                    out.push_str(&access);
                    let ty = self.type_of_value(&value);
                    out.push_str(&format!("{}ret {} {}\n", INDENT_INSTR, ty, value));
                }
                if next.is_some() && !next_is_label {
                    let dead = self.new_prefixed_value("%.dead.code", LLVM_LABEL);
                    out.push_str(&self.create_label(&dead[1..]));
                }
            }
            Opcode::Xload => {
                let value1 = self.llvm_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                let (value3, access3) = self.access_value(&arg3);
                let base_ty = self.type_of_value(&value1);
                let elem = self.elem_of_indexed_type(&base_ty);
                let elem_ptr = self.ptr_to(&elem);
                let idx64 = self.new_prefixed_value("%.idx64", LLVM_INT64);
                let arr_ptr = self.new_prefixed_value("%.arrPtr", &elem_ptr);
                let addr1 = if is_identifier(&arg1) {
                    self.value_addr(&value1)
                } else {
                    value1
                };
                out.push_str(&access2);
                out.push_str(&access3);
                out.push_str(&self.create_conversion("sext", &idx64, &value2, LLVM_INT));
                out.push_str(&self.create_getelementptr(&arr_ptr, &addr1, &idx64));
                out.push_str(&self.create_store(&value3, &arr_ptr));
            }
            Opcode::Loadx => {
                let (value1, modify1) = self.modify_value(&arg1);
                let value2 = self.llvm_value(&arg2);
                let (value3, access3) = self.access_value(&arg3);
                let base_ty = self.type_of_value(&value2);
                let elem = self.elem_of_indexed_type(&base_ty);
                let elem_ptr = self.ptr_to(&elem);
                let idx64 = self.new_prefixed_value("%.idx64", LLVM_INT64);
                let arr_ptr = self.new_prefixed_value("%.arrPtr", &elem_ptr);
                let addr2 = if is_identifier(&arg2) {
                    self.value_addr(&value2)
                } else {
                    value2
                };
                out.push_str(&access3);
                out.push_str(&self.create_conversion("sext", &idx64, &value3, LLVM_INT));
                out.push_str(&self.create_getelementptr(&arr_ptr, &addr2, &idx64));
                out.push_str(&self.create_load(&value1, &arr_ptr));
                out.push_str(&modify1);
            }
            Opcode::Aload => {
                let value1 = self.llvm_value(&arg1);
                let value2 = self.llvm_value(&arg2);
                let ty2 = self.type_of_value(&value2);
                let addr2 = self.value_addr(&value2);
                if self.is_array_type(&ty2) {
                    out.push_str(&self.create_getelementptr(&value1, &addr2, "0"));
                } else if self.is_pointer_type(&ty2) {
                    out.push_str(&self.create_load(&value1, &addr2));
                }
            }
            Opcode::Writei => {
                let (value, access) = self.access_value(&arg1);
                let ty = self.type_of_value(&value);
                out.push_str(&access);
                let printed = if ty == LLVM_BOOL {
                    let widened = self.new_prefixed_value("%.wrti.i32", LLVM_INT);
                    out.push_str(&self.create_conversion("zext", &widened, &value, LLVM_BOOL));
                    widened
                } else {
                    value
                };
                out.push_str(&self.create_printf(&printed, LLVM_INT));
            }
            Opcode::Writef => {
                let (value, access) = self.access_value(&arg1);
                out.push_str(&access);
                let widened = self.new_prefixed_value("%.wrtf.double", LLVM_DOUBLE);
                out.push_str(&self.create_conversion("fpext", &widened, &value, LLVM_FLOAT));
                out.push_str(&self.create_printf(&widened, LLVM_DOUBLE));
            }
            Opcode::Writec => {
                let (value, access) = self.access_value(&arg1);
                out.push_str(&access);
                let widened = self.new_prefixed_value("%.wrtc.i32", LLVM_INT);
                out.push_str(&self.create_conversion("zext", &widened, &value, LLVM_CHAR));
                out.push_str(&self.create_putchar(&widened));
            }
            Opcode::Writes => {
                let index = self
                    .writes_literals
                    .iter()
                    .position(|s| *s == arg1)
                    .unwrap_or(0);
                let format_name = format!("@.str.s.{}", index + 1);
                let size = self.writes_sizes.get(index).copied().unwrap_or(1);
                out.push_str(&self.create_prints(&format_name, size));
            }
            Opcode::Writeln => {
                out.push_str(&self.create_putchar("10"));
            }
            Opcode::Readi => {
                out.push_str(&self.dump_readi(&arg1));
            }
            Opcode::Readf => {
                let value1 = self.llvm_value(&arg1);
                if !is_temporary(&arg1) {
                    let addr1 = self.value_addr(&value1);
                    out.push_str(&self.create_scanf(&addr1));
                } else {
                    out.push_str(&self.create_scanf(GLOBAL_FLOAT_ADDR));
                    out.push_str(&self.create_load(&value1, GLOBAL_FLOAT_ADDR));
                }
            }
            Opcode::Readc => {
                let value1 = self.llvm_value(&arg1);
                if !is_temporary(&arg1) {
                    let addr1 = self.value_addr(&value1);
                    out.push_str(&self.create_scanf(&addr1));
                } else {
                    out.push_str(&self.create_scanf(GLOBAL_CHAR_ADDR));
                    out.push_str(&self.create_load(&value1, GLOBAL_CHAR_ADDR));
                }
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                let (value3, access3) = self.access_value(&arg3);
                out.push_str(&access2);
                out.push_str(&access3);
                out.push_str(&self.create_binary(instr.op, &value1, &value2, &value3, LLVM_INT));
                out.push_str(&modify1);
            }
            Opcode::Neg => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                out.push_str(&access2);
                out.push_str(&self.create_binary(Opcode::Sub, &value1, "0", &value2, LLVM_INT));
                out.push_str(&modify1);
            }
            Opcode::Eq | Opcode::Lt | Opcode::Le => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                let (value3, access3) = self.access_value(&arg3);
                // Comparison operand type comes from whichever side is
                // a typed value; two constants compare as i32.
                let ty23 = if is_identifier(&arg2) || is_temporary(&arg2) {
                    self.type_of_value(&self.llvm_value(&arg2))
                } else if is_identifier(&arg3) || is_temporary(&arg3) {
                    self.type_of_value(&self.llvm_value(&arg3))
                } else {
                    LLVM_INT.to_string()
                };
                out.push_str(&access2);
                out.push_str(&access3);
                out.push_str(&self.create_binary(instr.op, &value1, &value2, &value3, &ty23));
                out.push_str(&modify1);
            }
            Opcode::Feq | Opcode::Flt | Opcode::Fle => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                let (value3, access3) = self.access_value(&arg3);
                out.push_str(&access2);
                out.push_str(&access3);
                out.push_str(&self.create_binary(instr.op, &value1, &value2, &value3, LLVM_FLOAT));
                out.push_str(&modify1);
            }
            Opcode::Fadd | Opcode::Fsub | Opcode::Fmul | Opcode::Fdiv => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                let (value3, access3) = self.access_value(&arg3);
                out.push_str(&access2);
                out.push_str(&access3);
                out.push_str(&self.create_binary(instr.op, &value1, &value2, &value3, LLVM_FLOAT));
                out.push_str(&modify1);
            }
            Opcode::Fneg => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                out.push_str(&access2);
                out.push_str(&format!(
                    "{}{} = fneg {} {}\n",
                    INDENT_INSTR, value1, LLVM_FLOAT, value2
                ));
                out.push_str(&modify1);
            }
            Opcode::Float => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                out.push_str(&access2);
                let ty1 = self.type_of_value(&value1);
                out.push_str(&format!(
                    "{}{} = sitofp {} {} to {}\n",
                    INDENT_INSTR, value1, LLVM_INT, value2, ty1
                ));
                out.push_str(&modify1);
            }
            Opcode::And | Opcode::Or => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                let (value3, access3) = self.access_value(&arg3);
                out.push_str(&access2);
                out.push_str(&access3);
                out.push_str(&self.create_binary(instr.op, &value1, &value2, &value3, LLVM_BOOL));
                out.push_str(&modify1);
            }
            Opcode::Not => {
                let (value1, modify1) = self.modify_value(&arg1);
                let (value2, access2) = self.access_value(&arg2);
                out.push_str(&access2);
                out.push_str(&self.create_not(&value1, &value2));
                out.push_str(&modify1);
            }
            Opcode::Noop => {
                out.push_str(";   noop\n");
            }
            // Accepted by the instruction set but with no producer yet.
            Opcode::Loadc | Opcode::Cload => {
                out.push_str(";   UNKNOWN\n");
            }
        }

        self.prev_is_terminator = matches!(
            instr.op,
            Opcode::Ujump | Opcode::Fjump | Opcode::Return
        );
        out
    }

    fn dump_readi(&mut self, arg1: &str) -> String {
        let mut out = String::new();
        let value1 = self.llvm_value(arg1);
        let ty1 = self.type_of_value(&value1);
        if !is_temporary(arg1) {
            let addr1 = self.value_addr(&value1);
            if ty1 == LLVM_BOOL {
                // Booleans scan through the integer scratch word and
                // map nonzero to true.
                self.global_i = true;
                let scratch = self.new_prefixed_value("%.readi.global.i", LLVM_INT);
                let cmp = self.new_prefixed_value("%.readi.i1.cmp1", LLVM_BOOL);
                let negated = self.new_prefixed_value("%.readi.i1.not", LLVM_BOOL);
                out.push_str(&self.create_scanf(GLOBAL_INT_ADDR));
                out.push_str(&self.create_load(&scratch, GLOBAL_INT_ADDR));
                out.push_str(&self.create_binary(Opcode::Eq, &cmp, &scratch, "0", LLVM_INT));
                out.push_str(&self.create_not(&negated, &cmp));
                out.push_str(&self.create_store(&negated, &addr1));
            } else {
                out.push_str(&self.create_scanf(&addr1));
            }
        } else if ty1 == LLVM_BOOL {
            let scratch = self.new_prefixed_value("%.readi.global.i", LLVM_INT);
            let cmp = self.new_prefixed_value("%.readi.i1.cmp1", LLVM_BOOL);
            out.push_str(&self.create_scanf(GLOBAL_INT_ADDR));
            out.push_str(&self.create_load(&scratch, GLOBAL_INT_ADDR));
            out.push_str(&self.create_binary(Opcode::Eq, &cmp, &scratch, "0", LLVM_INT));
            out.push_str(&self.create_not(&value1, &cmp));
        } else {
            out.push_str(&self.create_scanf(GLOBAL_INT_ADDR));
            out.push_str(&self.create_load(&value1, GLOBAL_INT_ADDR));
        }
        out
    }

    fn elem_of_indexed_type(&self, ty: &str) -> String {
        if self.is_array_type(ty) {
            self.array_elem_type(ty)
        } else {
            self.pointed_type(ty)
        }
    }

    // ── Identifier access ────────────────────────────────────────────

    /// Use of an operand: identifiers load from their stack slot into a
    /// fresh value, temporaries and constants pass through.
    fn access_value(&mut self, tcode_arg: &str) -> (String, String) {
        if is_identifier(tcode_arg) {
            let value = self.llvm_value(tcode_arg);
            let ty = self.type_of_value(&value);
            let addr = self.value_addr(&value);
            let fresh = self.new_prefixed_value(&value, &ty);
            let code = self.create_load(&fresh, &addr);
            (fresh, code)
        } else {
            (self.llvm_value(tcode_arg), String::new())
        }
    }

    /// Definition of an operand: identifiers get a fresh value and a
    /// trailing store back into their slot.
    fn modify_value(&mut self, tcode_arg: &str) -> (String, String) {
        if is_identifier(tcode_arg) {
            let value = self.llvm_value(tcode_arg);
            let ty = self.type_of_value(&value);
            let addr = self.value_addr(&value);
            let fresh = self.new_prefixed_value(&value, &ty);
            let code = self.create_store(&fresh, &addr);
            (fresh, code)
        } else {
            (self.llvm_value(tcode_arg), String::new())
        }
    }

    /// Fresh `prefix.N` value bound to `ty`.
    fn new_prefixed_value(&mut self, prefix: &str, ty: &str) -> String {
        let count = self.counts.entry(prefix.to_string()).or_insert(0);
        *count += 1;
        let value = format!("{}.{}", prefix, count);
        self.bind_llvm_value(&value, ty);
        value
    }

    // ── Single-instruction emitters ──────────────────────────────────

    fn create_alloca(&self, addr: &str, ty: &str) -> String {
        format!("{}{} = alloca {}\n", INDENT_INSTR, addr, ty)
    }

    fn create_store(&self, value: &str, addr: &str) -> String {
        let ptr_ty = self.type_of_value(addr);
        let ty = self.pointed_type(&ptr_ty);
        format!(
            "{}store {} {}, {} {}\n",
            INDENT_INSTR, ty, value, ptr_ty, addr
        )
    }

    fn create_load(&self, dst: &str, addr: &str) -> String {
        let ptr_ty = self.type_of_value(addr);
        let ty = self.pointed_type(&ptr_ty);
        format!(
            "{}{} = load {}, {} {}\n",
            INDENT_INSTR, dst, ty, ptr_ty, addr
        )
    }

    fn create_label(&self, label: &str) -> String {
        format!("{}{}:\n", INDENT_LABEL, label)
    }

    fn create_conversion(&self, op: &str, dst: &str, src: &str, src_ty: &str) -> String {
        let dst_ty = self.type_of_value(dst);
        format!(
            "{}{} = {} {} {} to {}\n",
            INDENT_INSTR, dst, op, src_ty, src, dst_ty
        )
    }

    fn create_binary(&self, op: Opcode, dst: &str, a: &str, b: &str, operand_ty: &str) -> String {
        format!(
            "{}{} = {} {} {}, {}\n",
            INDENT_INSTR,
            dst,
            llvm_instr_name(op),
            operand_ty,
            a,
            b
        )
    }

    fn create_not(&self, dst: &str, src: &str) -> String {
        format!("{}{} = xor {} {}, 1\n", INDENT_INSTR, dst, LLVM_BOOL, src)
    }

    fn create_printf(&self, value: &str, ty: &str) -> String {
        let format_name = if ty == LLVM_DOUBLE {
            "@.str.f"
        } else {
            "@.str.i"
        };
        format!(
            "{}call i32 (i8*, ...) @printf(i8* getelementptr inbounds ([3 x i8], [3 x i8]* {}, i64 0, i64 0), {} {})\n",
            INDENT_INSTR, format_name, ty, value
        )
    }

    fn create_prints(&self, format_name: &str, size: usize) -> String {
        format!(
            "{}call i32 (i8*, ...) @printf(i8* getelementptr inbounds ([{} x i8], [{} x i8]* {}, i64 0, i64 0))\n",
            INDENT_INSTR, size, size, format_name
        )
    }

    fn create_putchar(&self, value: &str) -> String {
        format!("{}call i32 @putchar(i32 {})\n", INDENT_INSTR, value)
    }

    fn create_scanf(&self, addr: &str) -> String {
        let ptr_ty = self.type_of_value(addr);
        let ty = self.pointed_type(&ptr_ty);
        let format_name = if ty == LLVM_FLOAT {
            "@.str.f"
        } else if ty == LLVM_CHAR {
            "@.str.c"
        } else {
            "@.str.i"
        };
        format!(
            "{}call i32 (i8*, ...) @__isoc99_scanf(i8* getelementptr inbounds ([3 x i8], [3 x i8]* {}, i64 0, i64 0), {} {})\n",
            INDENT_INSTR, format_name, ptr_ty, addr
        )
    }

    fn create_br(&self, label_value: &str) -> String {
        format!("{}br label {}\n", INDENT_INSTR, label_value)
    }

    fn create_br_cond(&self, cond: &str, label_cont: &str, label_jump: &str) -> String {
        format!(
            "{}br i1 {}, label {}, label {}\n",
            INDENT_INSTR, cond, label_cont, label_jump
        )
    }

    /// Arguments were collected in pop order (last pushed first), so
    /// they are emitted back to front.
    fn call_args_list(&self, args: &[String]) -> String {
        let mut out = String::new();
        for (n, arg) in args.iter().enumerate().rev() {
            if n != args.len() - 1 {
                out.push_str(", ");
            }
            out.push_str(&format!("{} {}", self.type_of_value(arg), arg));
        }
        out
    }

    fn create_call_result(&self, func: &str, dst: &str, args: &[String]) -> String {
        format!(
            "{}{} = call {} @{}({})\n",
            INDENT_INSTR,
            dst,
            self.func_return_llvm_type(func),
            func,
            self.call_args_list(args)
        )
    }

    fn create_call_void(&self, func: &str, args: &[String]) -> String {
        format!(
            "{}call {} @{}({})\n",
            INDENT_INSTR,
            self.func_return_llvm_type(func),
            func,
            self.call_args_list(args)
        )
    }

    fn create_getelementptr(&self, dst: &str, base: &str, index: &str) -> String {
        let base_ptr_ty = self.type_of_value(base);
        let pointed = self.pointed_type(&base_ptr_ty);
        if self.is_array_type(&pointed) {
            format!(
                "{}{} = getelementptr inbounds {}, {} {}, i64 0, i64 {}\n",
                INDENT_INSTR, dst, pointed, base_ptr_ty, base, index
            )
        } else {
            format!(
                "{}{} = getelementptr inbounds {}, {} {}, i64 {}\n",
                INDENT_INSTR, dst, pointed, base_ptr_ty, base, index
            )
        }
    }
}

fn llvm_instr_name(op: Opcode) -> &'static str {
    match op {
        Opcode::Add => "add",
        Opcode::Sub => "sub",
        Opcode::Mul => "mul",
        Opcode::Div => "sdiv",
        Opcode::Fadd => "fadd",
        Opcode::Fsub => "fsub",
        Opcode::Fmul => "fmul",
        Opcode::Fdiv => "fdiv",
        Opcode::Eq => "icmp eq",
        Opcode::Lt => "icmp slt",
        Opcode::Le => "icmp sle",
        Opcode::Feq => "fcmp oeq",
        Opcode::Flt => "fcmp olt",
        Opcode::Fle => "fcmp ole",
        Opcode::And => "and",
        Opcode::Or => "or",
        _ => "unreachable",
    }
}

/// Strip the quotes from a t-code string literal and translate its
/// escapes to LLVM form, returning the logical byte count (without the
/// trailing null).
fn decode_string_literal(literal: &str) -> (String, usize) {
    let inner = &literal[1..literal.len().saturating_sub(1)];
    let mut out = String::new();
    let mut size = 0;
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some('n') => {
                    chars.next();
                    out.push_str("\\0A");
                    size += 1;
                    continue;
                }
                Some('t') => {
                    chars.next();
                    out.push_str("\\09");
                    size += 1;
                    continue;
                }
                Some('\\') => {
                    chars.next();
                    out.push_str("\\\\");
                    size += 1;
                    continue;
                }
                _ => {}
            }
        }
        out.push(ch);
        size += ch.len_utf8();
    }
    (out, size)
}

/// ASCII code of a char-literal body (escapes still in source form).
fn ascii_code(text: &str) -> u32 {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c as u32,
        _ => match text {
            "\\n" => '\n' as u32,
            "\\t" => '\t' as u32,
            "\\\\" => '\\' as u32,
            "\\\"" => '"' as u32,
            "\\'" => '\'' as u32,
            _ => text.chars().nth(1).map(|c| c as u32).unwrap_or(0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_decoding() {
        let (s, n) = decode_string_literal("\"hello\"");
        assert_eq!(s, "hello");
        assert_eq!(n, 5);

        let (s, n) = decode_string_literal("\"a\\nb\"");
        assert_eq!(s, "a\\0Ab");
        assert_eq!(n, 3);

        let (s, n) = decode_string_literal("\"t\\tx\\\\\"");
        assert_eq!(s, "t\\09x\\\\");
        assert_eq!(n, 4);
    }

    #[test]
    fn char_literal_ascii_codes() {
        assert_eq!(ascii_code("a"), 97);
        assert_eq!(ascii_code("\\n"), 10);
        assert_eq!(ascii_code("\\t"), 9);
        assert_eq!(ascii_code("\\\\"), 92);
    }
}
