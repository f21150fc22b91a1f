//! Three-address code: a linear, label-and-temporary form with one
//! subroutine per function.
//!
//! Operands are plain strings in three syntactic classes: identifiers
//! (letter or underscore first), temporaries (`%` followed by a digit)
//! and literal constants. The serialized text form is one instruction
//! per line, opcode followed by its operands.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Label,
    Ujump,
    Fjump,
    Halt,
    Noop,
    Load,
    Iload,
    Fload,
    Chload,
    Push,
    Pop,
    Call,
    Return,
    Xload,
    Loadx,
    Aload,
    Loadc,
    Cload,
    Writei,
    Writef,
    Writec,
    Writes,
    Writeln,
    Readi,
    Readf,
    Readc,
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Fadd,
    Fsub,
    Fmul,
    Fdiv,
    Fneg,
    Float,
    Eq,
    Lt,
    Le,
    Feq,
    Flt,
    Fle,
    And,
    Or,
    Not,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Opcode::Label => "LABEL",
            Opcode::Ujump => "UJUMP",
            Opcode::Fjump => "FJUMP",
            Opcode::Halt => "HALT",
            Opcode::Noop => "NOOP",
            Opcode::Load => "LOAD",
            Opcode::Iload => "ILOAD",
            Opcode::Fload => "FLOAD",
            Opcode::Chload => "CHLOAD",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Xload => "XLOAD",
            Opcode::Loadx => "LOADX",
            Opcode::Aload => "ALOAD",
            Opcode::Loadc => "LOADC",
            Opcode::Cload => "CLOAD",
            Opcode::Writei => "WRITEI",
            Opcode::Writef => "WRITEF",
            Opcode::Writec => "WRITEC",
            Opcode::Writes => "WRITES",
            Opcode::Writeln => "WRITELN",
            Opcode::Readi => "READI",
            Opcode::Readf => "READF",
            Opcode::Readc => "READC",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Neg => "NEG",
            Opcode::Fadd => "FADD",
            Opcode::Fsub => "FSUB",
            Opcode::Fmul => "FMUL",
            Opcode::Fdiv => "FDIV",
            Opcode::Fneg => "FNEG",
            Opcode::Float => "FLOAT",
            Opcode::Eq => "EQ",
            Opcode::Lt => "LT",
            Opcode::Le => "LE",
            Opcode::Feq => "FEQ",
            Opcode::Flt => "FLT",
            Opcode::Fle => "FLE",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct Instr {
    pub op: Opcode,
    pub arg1: String,
    pub arg2: String,
    pub arg3: String,
}

impl Instr {
    fn new(op: Opcode, arg1: impl Into<String>, arg2: impl Into<String>, arg3: impl Into<String>) -> Self {
        Self {
            op,
            arg1: arg1.into(),
            arg2: arg2.into(),
            arg3: arg3.into(),
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        Self::new(Opcode::Label, name, "", "")
    }

    pub fn ujump(label: impl Into<String>) -> Self {
        Self::new(Opcode::Ujump, label, "", "")
    }

    /// Jump to `label` when `cond` is false.
    pub fn fjump(cond: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(Opcode::Fjump, cond, label, "")
    }

    pub fn halt() -> Self {
        Self::new(Opcode::Halt, "", "", "")
    }

    pub fn noop() -> Self {
        Self::new(Opcode::Noop, "", "", "")
    }

    pub fn load(dst: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(Opcode::Load, dst, src, "")
    }

    pub fn iload(dst: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(Opcode::Iload, dst, literal, "")
    }

    pub fn fload(dst: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(Opcode::Fload, dst, literal, "")
    }

    pub fn chload(dst: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(Opcode::Chload, dst, literal, "")
    }

    /// Reserve a stack slot (no operand) for a call result.
    pub fn push_slot() -> Self {
        Self::new(Opcode::Push, "", "", "")
    }

    pub fn push(value: impl Into<String>) -> Self {
        Self::new(Opcode::Push, value, "", "")
    }

    /// Discard the top of the parameter stack.
    pub fn pop_discard() -> Self {
        Self::new(Opcode::Pop, "", "", "")
    }

    pub fn pop(dst: impl Into<String>) -> Self {
        Self::new(Opcode::Pop, dst, "", "")
    }

    pub fn call(name: impl Into<String>) -> Self {
        Self::new(Opcode::Call, name, "", "")
    }

    pub fn ret() -> Self {
        Self::new(Opcode::Return, "", "", "")
    }

    /// `base[index] <- value`
    pub fn xload(
        base: impl Into<String>,
        index: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(Opcode::Xload, base, index, value)
    }

    /// `dst <- base[index]`
    pub fn loadx(
        dst: impl Into<String>,
        base: impl Into<String>,
        index: impl Into<String>,
    ) -> Self {
        Self::new(Opcode::Loadx, dst, base, index)
    }

    /// `dst <- address of array`
    pub fn aload(dst: impl Into<String>, array: impl Into<String>) -> Self {
        Self::new(Opcode::Aload, dst, array, "")
    }

    pub fn writei(value: impl Into<String>) -> Self {
        Self::new(Opcode::Writei, value, "", "")
    }

    pub fn writef(value: impl Into<String>) -> Self {
        Self::new(Opcode::Writef, value, "", "")
    }

    pub fn writec(value: impl Into<String>) -> Self {
        Self::new(Opcode::Writec, value, "", "")
    }

    /// The operand keeps its surrounding quotes; the LLVM stage strips
    /// them when building the string constant.
    pub fn writes(literal: impl Into<String>) -> Self {
        Self::new(Opcode::Writes, literal, "", "")
    }

    pub fn writeln() -> Self {
        Self::new(Opcode::Writeln, "", "", "")
    }

    pub fn readi(dst: impl Into<String>) -> Self {
        Self::new(Opcode::Readi, dst, "", "")
    }

    pub fn readf(dst: impl Into<String>) -> Self {
        Self::new(Opcode::Readf, dst, "", "")
    }

    pub fn readc(dst: impl Into<String>) -> Self {
        Self::new(Opcode::Readc, dst, "", "")
    }

    pub fn add(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Add, dst, a, b)
    }

    pub fn sub(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Sub, dst, a, b)
    }

    pub fn mul(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Mul, dst, a, b)
    }

    pub fn div(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Div, dst, a, b)
    }

    pub fn neg(dst: impl Into<String>, a: impl Into<String>) -> Self {
        Self::new(Opcode::Neg, dst, a, "")
    }

    pub fn fadd(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Fadd, dst, a, b)
    }

    pub fn fsub(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Fsub, dst, a, b)
    }

    pub fn fmul(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Fmul, dst, a, b)
    }

    pub fn fdiv(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Fdiv, dst, a, b)
    }

    pub fn fneg(dst: impl Into<String>, a: impl Into<String>) -> Self {
        Self::new(Opcode::Fneg, dst, a, "")
    }

    /// Integer to float coercion.
    pub fn float(dst: impl Into<String>, a: impl Into<String>) -> Self {
        Self::new(Opcode::Float, dst, a, "")
    }

    pub fn eq(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Eq, dst, a, b)
    }

    pub fn lt(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Lt, dst, a, b)
    }

    pub fn le(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Le, dst, a, b)
    }

    pub fn feq(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Feq, dst, a, b)
    }

    pub fn flt(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Flt, dst, a, b)
    }

    pub fn fle(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Fle, dst, a, b)
    }

    pub fn and(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::And, dst, a, b)
    }

    pub fn or(dst: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(Opcode::Or, dst, a, b)
    }

    pub fn not(dst: impl Into<String>, a: impl Into<String>) -> Self {
        Self::new(Opcode::Not, dst, a, "")
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        for arg in [&self.arg1, &self.arg2, &self.arg3] {
            if !arg.is_empty() {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Operand classification used by the LLVM stage.
pub fn is_temporary(arg: &str) -> bool {
    let mut chars = arg.chars();
    chars.next() == Some('%') && chars.next().map(|c| c.is_ascii_digit()).unwrap_or(false)
}

pub fn is_identifier(arg: &str) -> bool {
    match arg.chars().next() {
        Some(c) => c == '_' || c.is_ascii_alphabetic(),
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct TcodeParam {
    pub name: String,
    pub ty: String,
    pub is_array: bool,
}

#[derive(Debug, Clone)]
pub struct TcodeVar {
    pub name: String,
    pub ty: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct Subroutine {
    pub name: String,
    pub params: Vec<TcodeParam>,
    pub vars: Vec<TcodeVar>,
    pub instrs: Vec<Instr>,
}

impl Subroutine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            vars: Vec::new(),
            instrs: Vec::new(),
        }
    }

    pub fn add_param(&mut self, name: impl Into<String>, ty: impl Into<String>, is_array: bool) {
        self.params.push(TcodeParam {
            name: name.into(),
            ty: ty.into(),
            is_array,
        });
    }

    pub fn add_var(&mut self, name: impl Into<String>, ty: impl Into<String>, size: usize) {
        self.vars.push(TcodeVar {
            name: name.into(),
            ty: ty.into(),
            size,
        });
    }

    pub fn set_instructions(&mut self, instrs: Vec<Instr>) {
        self.instrs = instrs;
    }
}

impl fmt::Display for Subroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "subroutine {}", self.name)?;
        for p in &self.params {
            if p.is_array {
                writeln!(f, "  param {} : {} array", p.name, p.ty)?;
            } else {
                writeln!(f, "  param {} : {}", p.name, p.ty)?;
            }
        }
        for v in &self.vars {
            if v.size > 1 {
                writeln!(f, "  var {} : {} [{}]", v.name, v.ty, v.size)?;
            } else {
                writeln!(f, "  var {} : {}", v.name, v.ty)?;
            }
        }
        for instr in &self.instrs {
            writeln!(f, "  {}", instr)?;
        }
        Ok(())
    }
}

/// A whole program in three-address form.
#[derive(Debug, Clone, Default)]
pub struct TcodeProgram {
    pub subroutines: Vec<Subroutine>,
}

impl TcodeProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subroutine(&mut self, subr: Subroutine) {
        self.subroutines.push(subr);
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.to_string().lines().map(|l| l.to_string()).collect()
    }
}

impl fmt::Display for TcodeProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for subr in &self.subroutines {
            write!(f, "{}", subr)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Per-function counters behind the fresh temporary and label names.
#[derive(Debug, Default)]
pub struct CodeCounters {
    temp: usize,
    label_if: usize,
    label_while: usize,
}

impl CodeCounters {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fresh temporary: `%1`, `%2`, …
    pub fn new_temp(&mut self) -> String {
        self.temp += 1;
        format!("%{}", self.temp)
    }

    /// Number for an `If`/`Else`/`Endif` label group.
    pub fn new_if_label(&mut self) -> String {
        self.label_if += 1;
        self.label_if.to_string()
    }

    /// Number for a `While`/`EndWhile`/`ArrayCpy` label group.
    pub fn new_while_label(&mut self) -> String {
        self.label_while += 1;
        self.label_while.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_classes() {
        assert!(is_temporary("%1"));
        assert!(is_temporary("%12"));
        assert!(!is_temporary("%x"));
        assert!(!is_temporary("x"));
        assert!(is_identifier("x"));
        assert!(is_identifier("_result"));
        assert!(!is_identifier("%1"));
        assert!(!is_identifier("42"));
    }

    #[test]
    fn instruction_text_form() {
        assert_eq!(Instr::iload("%1", "5").to_string(), "ILOAD %1 5");
        assert_eq!(Instr::add("%3", "%1", "%2").to_string(), "ADD %3 %1 %2");
        assert_eq!(Instr::ret().to_string(), "RETURN");
        assert_eq!(Instr::label("While1").to_string(), "LABEL While1");
    }

    #[test]
    fn counters_restart_per_function() {
        let mut counters = CodeCounters::default();
        assert_eq!(counters.new_temp(), "%1");
        assert_eq!(counters.new_temp(), "%2");
        assert_eq!(counters.new_if_label(), "1");
        assert_eq!(counters.new_while_label(), "1");
        counters.reset();
        assert_eq!(counters.new_temp(), "%1");
    }
}
