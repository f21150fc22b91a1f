//! Lowering of three-address code into textual LLVM IR.
//!
//! Works in two stages per subroutine: first an inference sweep binds
//! every identifier and temporary to an LLVM type (`binder`), then the
//! instruction list is emitted (`emit`). Both stages reject malformed
//! input with an error value instead of panicking.

mod binder;
mod emit;

use crate::sem::symbols::SymTable;
use crate::sem::types::TypeRegistry;
use crate::tcode::TcodeProgram;
use crate::CompileError;
use std::collections::HashMap;

pub(crate) const INDENT_INSTR: &str = "    ";
pub(crate) const INDENT_LABEL: &str = "  ";

pub(crate) const LLVM_INT: &str = "i32";
pub(crate) const LLVM_FLOAT: &str = "float";
pub(crate) const LLVM_CHAR: &str = "i8";
pub(crate) const LLVM_BOOL: &str = "i1";
pub(crate) const LLVM_VOID: &str = "void";
pub(crate) const LLVM_LABEL: &str = "label";
pub(crate) const LLVM_INT64: &str = "i64";
pub(crate) const LLVM_DOUBLE: &str = "double";

// Inference sentinels: `TY_INT_BOOL` marks values that may still be
// either i32 or i1 (integer literals 0 and 1); `TY_MISS` marks values
// not yet typed. Both must be gone by the end of the sweep.
pub(crate) const TY_ERR: &str = "tErr";
pub(crate) const TY_MISS: &str = "tMiss";
pub(crate) const TY_INT_BOOL: &str = "tIntBool";

pub(crate) const GLOBAL_INT_ADDR: &str = "@.global.i.addr";
pub(crate) const GLOBAL_FLOAT_ADDR: &str = "@.global.f.addr";
pub(crate) const GLOBAL_CHAR_ADDR: &str = "@.global.c.addr";

pub(crate) const ENTRY_LABEL: &str = ".entry";

/// Translate a whole t-code program. Fails when a temporary is defined
/// more than once or when type inference leaves a value unresolved.
pub fn lower(
    types: &TypeRegistry,
    symbols: &SymTable,
    tcode: &TcodeProgram,
) -> Result<String, CompileError> {
    binder::check_ssa(tcode)?;
    let mut gen = LlvmGen::new(types, symbols, tcode);
    gen.dump()
}

pub(crate) struct LlvmGen<'a> {
    pub(crate) types: &'a TypeRegistry,
    pub(crate) symbols: &'a SymTable,
    pub(crate) tcode: &'a TcodeProgram,

    // Which runtime facilities the program actually uses; drives the
    // preamble constants and the trailing declare lines.
    pub(crate) write_i: bool,
    pub(crate) write_f: bool,
    pub(crate) write_c: bool,
    pub(crate) write_s: bool,
    pub(crate) write_ln: bool,
    pub(crate) read_i: bool,
    pub(crate) read_f: bool,
    pub(crate) read_c: bool,
    pub(crate) halt_and_exit: bool,
    pub(crate) global_i: bool,
    pub(crate) global_f: bool,
    pub(crate) global_c: bool,
    pub(crate) writes_literals: Vec<String>,
    pub(crate) writes_decoded: Vec<String>,
    pub(crate) writes_sizes: Vec<usize>,

    // Per-function state, reset by `start_new_function`.
    pub(crate) current_function: String,
    pub(crate) is_main: bool,
    pub(crate) prev_is_terminator: bool,
    pub(crate) local_types: HashMap<String, String>,
    pub(crate) local_order: Vec<String>,
    pub(crate) counts: HashMap<String, usize>,
    pub(crate) global_types: HashMap<String, String>,

    // Call protocol state shared by PUSH/POP/CALL handling.
    pub(crate) param_stack: Vec<String>,
    pub(crate) pending_ret_type: String,
    pub(crate) pending_func: String,
    pub(crate) pending_args: Vec<String>,
}

impl<'a> LlvmGen<'a> {
    fn new(types: &'a TypeRegistry, symbols: &'a SymTable, tcode: &'a TcodeProgram) -> Self {
        Self {
            types,
            symbols,
            tcode,
            write_i: false,
            write_f: false,
            write_c: false,
            write_s: false,
            write_ln: false,
            read_i: false,
            read_f: false,
            read_c: false,
            halt_and_exit: false,
            global_i: false,
            global_f: false,
            global_c: false,
            writes_literals: Vec::new(),
            writes_decoded: Vec::new(),
            writes_sizes: Vec::new(),
            current_function: String::new(),
            is_main: false,
            prev_is_terminator: false,
            local_types: HashMap::new(),
            local_order: Vec::new(),
            counts: HashMap::new(),
            global_types: HashMap::new(),
            param_stack: Vec::new(),
            pending_ret_type: TY_MISS.to_string(),
            pending_func: String::new(),
            pending_args: Vec::new(),
        }
    }

    fn start_new_function(&mut self, name: &str) {
        self.current_function = name.to_string();
        self.is_main = name == "main";
        self.prev_is_terminator = false;
    }

    // ── Value naming ─────────────────────────────────────────────────

    /// t-code operand to LLVM value name: `%N` temporaries become
    /// `%.temp.N`, identifiers get a `%` prefix, constants pass through.
    pub(crate) fn llvm_value(&self, tcode_arg: &str) -> String {
        match tcode_arg.chars().next() {
            None => String::new(),
            Some('%') => format!("%.temp.{}", &tcode_arg[1..]),
            Some(c) if c.is_ascii_digit() => tcode_arg.to_string(),
            _ => format!("%{}", tcode_arg),
        }
    }

    pub(crate) fn value_addr(&self, llvm_value: &str) -> String {
        format!("{}.addr", llvm_value)
    }

    /// Bound LLVM type of a value; constants read as i32 (the only
    /// literal class reaching here).
    pub(crate) fn type_of_value(&self, llvm_value: &str) -> String {
        match llvm_value.chars().next() {
            Some('%') => self
                .local_types
                .get(llvm_value)
                .cloned()
                .unwrap_or_else(|| TY_ERR.to_string()),
            Some('@') => self
                .global_types
                .get(llvm_value)
                .cloned()
                .unwrap_or_else(|| TY_ERR.to_string()),
            _ => LLVM_INT.to_string(),
        }
    }

    // ── LLVM type-string helpers ─────────────────────────────────────

    pub(crate) fn is_any_integer_type(&self, ty: &str) -> bool {
        ty == LLVM_INT || ty == LLVM_CHAR || ty == LLVM_BOOL
    }

    pub(crate) fn one_int_up(&self, ty: &str) -> &'static str {
        if ty == LLVM_INT {
            LLVM_INT64
        } else if ty == LLVM_CHAR {
            LLVM_INT
        } else if ty == LLVM_BOOL {
            LLVM_CHAR
        } else {
            TY_ERR
        }
    }

    pub(crate) fn is_array_type(&self, ty: &str) -> bool {
        ty.contains(" x ")
    }

    pub(crate) fn array_elem_type(&self, ty: &str) -> String {
        match ty.find(" x ") {
            Some(pos) => ty[pos + 3..ty.len() - 1].to_string(),
            None => TY_ERR.to_string(),
        }
    }

    pub(crate) fn array_type_as_pointer(&self, ty: &str) -> String {
        self.ptr_to(&self.array_elem_type(ty))
    }

    pub(crate) fn is_pointer_type(&self, ty: &str) -> bool {
        ty.ends_with('*')
    }

    pub(crate) fn ptr_to(&self, ty: &str) -> String {
        format!("{}*", ty)
    }

    pub(crate) fn pointed_type(&self, ty: &str) -> String {
        ty.strip_suffix('*').unwrap_or(ty).to_string()
    }
}
