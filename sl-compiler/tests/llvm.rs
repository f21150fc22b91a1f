use sl_compiler::llvm;
use sl_compiler::sem::symbols::SymTable;
use sl_compiler::sem::types::TypeRegistry;
use sl_compiler::tcode::{Instr, Subroutine, TcodeProgram};
use sl_compiler::{compile_to_llvm, CompileError};

// ── IR structure ─────────────────────────────────────────────────────────

fn llvm_text(source: &str) -> String {
    compile_to_llvm(source).expect("program should lower to LLVM IR")
}

#[test]
fn empty_main_defines_i32_and_returns_zero() {
    let ir = llvm_text("func main() var a, b : int endfunc");
    assert!(ir.contains("define dso_local i32 @main() {"), "{}", ir);
    assert!(ir.contains("%a.addr = alloca i32"), "{}", ir);
    assert!(ir.contains("%b.addr = alloca i32"), "{}", ir);
    assert!(ir.contains("ret i32 0"), "{}", ir);
    // Nothing is read or written, so no runtime declarations appear.
    assert!(!ir.contains("declare"), "{}", ir);
}

#[test]
fn literal_addition_prints_through_printf() {
    let ir = llvm_text(
        r#"
        func main()
            var x : int
            x = 1 + 2
            write x
        endfunc
    "#,
    );
    assert!(ir.contains("@.str.i = constant [3 x i8] c\"%d\\00\""), "{}", ir);
    // Literals materialize through the canonical widen-then-truncate.
    assert!(ir.contains("%.temp.1 = trunc i64 1 to i32"), "{}", ir);
    assert!(ir.contains("%.temp.2 = trunc i64 2 to i32"), "{}", ir);
    assert!(ir.contains("%.temp.3 = add i32 %.temp.1, %.temp.2"), "{}", ir);
    assert!(ir.contains("store i32 %.temp.3, i32* %x.addr"), "{}", ir);
    assert!(ir.contains("%x.1 = load i32, i32* %x.addr"), "{}", ir);
    assert!(ir.contains("declare dso_local i32 @printf(i8*, ...)"), "{}", ir);
}

#[test]
fn function_call_passes_arguments_in_order() {
    let ir = llvm_text(
        r#"
        func add(a : int, b : int) : int
            return a + b
        endfunc
        func main()
            write add(2, 3)
        endfunc
    "#,
    );
    assert!(ir.contains("define dso_local i32 @add(i32 %a, i32 %b) {"), "{}", ir);
    assert!(ir.contains("store i32 %a, i32* %a.addr"), "{}", ir);
    assert!(ir.contains("store i32 %.temp.1, i32* %_result.addr"), "{}", ir);
    assert!(ir.contains("%_result.1 = load i32, i32* %_result.addr"), "{}", ir);
    assert!(ir.contains("ret i32 %_result.1"), "{}", ir);
    assert!(
        ir.contains("%.temp.1 = call i32 @add(i32 %.temp.2, i32 %.temp.3)"),
        "{}",
        ir
    );
}

#[test]
fn while_loop_branches_and_labels() {
    let ir = llvm_text(
        r#"
        func main()
            var i : int
            i = 0
            while i < 3 do
                i = i + 1
            endwhile
        endfunc
    "#,
    );
    assert!(ir.contains("br label %While1"), "{}", ir);
    assert!(ir.contains("  While1:"), "{}", ir);
    assert!(
        ir.contains("br i1 %.temp.3, label %.br.cont.1, label %EndWhile1"),
        "{}",
        ir
    );
    assert!(ir.contains("  .br.cont.1:"), "{}", ir);
    assert!(ir.contains("  EndWhile1:"), "{}", ir);
    assert!(ir.contains("icmp slt i32"), "{}", ir);
}

#[test]
fn string_writes_become_global_constants() {
    let ir = llvm_text(
        r#"
        func main()
            var x : int
            read x
            if x == 0 then
                write "zero"
            else
                write "a\nb"
            endif
        endfunc
    "#,
    );
    assert!(ir.contains("@.str.s.1 = constant [5 x i8] c\"zero\\00\""), "{}", ir);
    assert!(ir.contains("@.str.s.2 = constant [4 x i8] c\"a\\0Ab\\00\""), "{}", ir);
    assert!(
        ir.contains("call i32 (i8*, ...) @__isoc99_scanf(i8* getelementptr inbounds ([3 x i8], [3 x i8]* @.str.i, i64 0, i64 0), i32* %x.addr)"),
        "{}",
        ir
    );
    assert!(ir.contains("declare dso_local i32 @__isoc99_scanf(i8*, ...)"), "{}", ir);
}

#[test]
fn array_local_indexes_through_its_alloca() {
    let ir = llvm_text(
        r#"
        func main()
            var a : array 3 of int
            a[0] = 5
            write a[1]
        endfunc
    "#,
    );
    assert!(ir.contains("%a.addr = alloca [3 x i32]"), "{}", ir);
    assert!(
        ir.contains("getelementptr inbounds [3 x i32], [3 x i32]* %a.addr, i64 0, i64 %.idx64."),
        "{}",
        ir
    );
    assert!(ir.contains("sext i32"), "{}", ir);
}

#[test]
fn array_parameter_dereferences_before_indexing() {
    let ir = llvm_text(
        r#"
        func first(v : array 3 of int) : int
            return v[0]
        endfunc
        func main()
            var a : array 3 of int
            var r : int
            r = first(a)
            write r
        endfunc
    "#,
    );
    assert!(ir.contains("define dso_local i32 @first(i32* %v) {"), "{}", ir);
    assert!(ir.contains("%v.addr = alloca i32*"), "{}", ir);
    assert!(ir.contains("store i32* %v, i32** %v.addr"), "{}", ir);
    // The pointer loads out of its slot before the single-index gep.
    assert!(ir.contains("%.temp.3 = load i32*, i32** %v.addr"), "{}", ir);
    assert!(
        ir.contains("getelementptr inbounds i32, i32* %.temp.3, i64 %.idx64."),
        "{}",
        ir
    );
    // The caller takes the local array's address for the call.
    assert!(
        ir.contains("%.temp.2 = getelementptr inbounds [3 x i32], [3 x i32]* %a.addr, i64 0, i64 0"),
        "{}",
        ir
    );
    assert!(ir.contains("call i32 @first(i32* %.temp.2)"), "{}", ir);
}

#[test]
fn boolean_write_widens_to_i32() {
    let ir = llvm_text(
        r#"
        func main()
            var b : bool
            b = true
            write b
        endfunc
    "#,
    );
    assert!(ir.contains("%.temp.1 = trunc i64 1 to i1"), "{}", ir);
    assert!(ir.contains("store i1 %.temp.1, i1* %b.addr"), "{}", ir);
    assert!(ir.contains("zext i1 %b.1 to i32"), "{}", ir);
}

#[test]
fn boolean_read_compares_against_zero() {
    let ir = llvm_text(
        r#"
        func main()
            var b : bool
            read b
        endfunc
    "#,
    );
    assert!(ir.contains("icmp eq i32 %.readi.global.i.1, 0"), "{}", ir);
    assert!(ir.contains("xor i1 %.readi.i1.cmp1.1, 1"), "{}", ir);
    assert!(ir.contains("@.global.i.addr = common dso_local global i32 0"), "{}", ir);
}

#[test]
fn read_into_array_element_uses_the_scratch_global() {
    let ir = llvm_text(
        r#"
        func main()
            var a : array 3 of int
            read a[1]
        endfunc
    "#,
    );
    // The read target is a temporary, so input goes through the global
    // scratch word first.
    assert!(ir.contains("@.global.i.addr = common dso_local global i32 0"), "{}", ir);
    assert!(
        ir.contains("%.temp.2 = load i32, i32* @.global.i.addr"),
        "{}",
        ir
    );
}

#[test]
fn float_arithmetic_and_coercion() {
    let ir = llvm_text(
        r#"
        func main()
            var f : float
            f = 1
            f = f * 2.5
            write f
        endfunc
    "#,
    );
    assert!(ir.contains("sitofp i32 %.temp.1 to float"), "{}", ir);
    assert!(ir.contains("fmul float"), "{}", ir);
    assert!(ir.contains("fpext float"), "{}", ir);
    assert!(ir.contains("@.str.f = constant [3 x i8] c\"%g\\00\""), "{}", ir);
}

#[test]
fn char_write_goes_through_putchar() {
    let ir = llvm_text(
        r#"
        func main()
            var c : char
            c = 'a'
            write c
        endfunc
    "#,
    );
    assert!(ir.contains("store i8 %.temp.1, i8* %c.addr"), "{}", ir);
    assert!(ir.contains("%.temp.1 = trunc i32 97 to i8"), "{}", ir);
    assert!(ir.contains("call i32 @putchar(i32 %.wrtc.i32.1)"), "{}", ir);
    assert!(ir.contains("declare dso_local i32 @putchar(i32)"), "{}", ir);
}

#[test]
fn return_mid_function_opens_a_dead_block() {
    let ir = llvm_text(
        r#"
        func f() : int
            return 1
        endfunc
        func main()
        endfunc
    "#,
    );
    // The body RETURN is followed by the synthetic trailing RETURN.
    assert!(ir.contains("  .dead.code.1:"), "{}", ir);
}

// ── Lowering preconditions ───────────────────────────────────────────────

#[test]
fn array_copy_violates_the_ssa_precondition() {
    // The element-copy loop mutates its index temporary, which the
    // LLVM stage rejects by design.
    let source = r#"
        func main()
            var a, b : array 3 of int
            a = b
        endfunc
    "#;
    match compile_to_llvm(source) {
        Err(CompileError::MultiplyDefinedTemp { function, temp }) => {
            assert_eq!(function, "main");
            assert_eq!(temp, "%3");
        }
        other => panic!("expected an SSA violation, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn multiply_defined_temporary_is_rejected() {
    let mut subr = Subroutine::new("f");
    subr.set_instructions(vec![
        Instr::iload("%1", "5"),
        Instr::iload("%1", "6"),
        Instr::ret(),
    ]);
    let mut program = TcodeProgram::new();
    program.add_subroutine(subr);

    let types = TypeRegistry::new();
    let symbols = SymTable::new();
    match llvm::lower(&types, &symbols, &program) {
        Err(CompileError::MultiplyDefinedTemp { function, temp }) => {
            assert_eq!(function, "f");
            assert_eq!(temp, "%1");
        }
        other => panic!("expected an SSA violation, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn untypable_temporaries_are_rejected() {
    // A copy between two otherwise-unused temporaries never resolves.
    let mut subr = Subroutine::new("g");
    subr.set_instructions(vec![Instr::load("%1", "%2"), Instr::ret()]);
    let mut program = TcodeProgram::new();
    program.add_subroutine(subr);

    let types = TypeRegistry::new();
    let symbols = SymTable::new();
    match llvm::lower(&types, &symbols, &program) {
        Err(CompileError::UnresolvedType { function, values }) => {
            assert_eq!(function, "g");
            assert!(values.contains(&"%.temp.1".to_string()), "{:?}", values);
        }
        other => panic!("expected unresolved types, got {:?}", other.map(|_| ())),
    }
}
