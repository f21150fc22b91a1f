use sl_compiler::compile_to_tcode;

// ── Three-address code shape ─────────────────────────────────────────────
// These tests pin down the instruction sequences the builder emits,
// including temporary numbering (per-function, starting at %1).

fn tcode_text(source: &str) -> String {
    let (_, code) = compile_to_tcode(source).expect("program should compile");
    code.to_string()
}

/// Assert that `needles` occur in `haystack` in the given order.
fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match haystack[from..].find(needle) {
            Some(pos) => from += pos + needle.len(),
            None => panic!(
                "expected '{}' (in order) in:\n{}",
                needle, haystack
            ),
        }
    }
}

#[test]
fn empty_main_is_a_bare_return() {
    let text = tcode_text("func main() var a, b : int endfunc");
    assert_in_order(
        &text,
        &["subroutine main", "var a : i32", "var b : i32", "RETURN"],
    );
    assert!(!text.contains("LOAD"), "no code expected:\n{}", text);
}

#[test]
fn literal_addition_and_write() {
    let text = tcode_text(
        r#"
        func main()
            var x : int
            x = 1 + 2
            write x
        endfunc
    "#,
    );
    assert_in_order(
        &text,
        &[
            "ILOAD %1 1",
            "ILOAD %2 2",
            "ADD %3 %1 %2",
            "LOAD x %3",
            "WRITEI x",
            "RETURN",
        ],
    );
}

#[test]
fn call_pushes_result_slot_and_arguments() {
    let text = tcode_text(
        r#"
        func add(a : int, b : int) : int
            return a + b
        endfunc
        func main()
            write add(2, 3)
        endfunc
    "#,
    );
    // Callee stores into the synthetic result parameter.
    assert_in_order(
        &text,
        &[
            "subroutine add",
            "param _result : i32",
            "param a : i32",
            "param b : i32",
            "ADD %1 a b",
            "LOAD _result %1",
            "RETURN",
        ],
    );
    // Caller protocol: slot, arguments, call, pops, result pop.
    assert_in_order(
        &text,
        &[
            "subroutine main",
            "PUSH\n",
            "ILOAD %2 2",
            "PUSH %2",
            "ILOAD %3 3",
            "PUSH %3",
            "CALL add",
            "POP\n",
            "POP\n",
            "POP %1",
            "WRITEI %1",
        ],
    );
}

#[test]
fn array_assignment_copies_elementwise_downwards() {
    let text = tcode_text(
        r#"
        func main()
            var a, b : array 3 of int
            a = b
        endfunc
    "#,
    );
    // Index runs 2, 1, 0; loop exits when 0 <= i turns false.
    assert_in_order(
        &text,
        &[
            "LOAD %3 2",
            "ILOAD %2 0",
            "ILOAD %1 1",
            "LABEL ArrayCpy1",
            "LE %4 %2 %3",
            "FJUMP %4 EndArrayCpy1",
            "LOADX %5 b %3",
            "XLOAD a %3 %5",
            "SUB %3 %3 %1",
            "UJUMP ArrayCpy1",
            "LABEL EndArrayCpy1",
        ],
    );
}

#[test]
fn mixed_comparison_coerces_the_integer_side() {
    let text = tcode_text(
        r#"
        func main()
            var x : int
            if x < 1.0 then
                write 1
            endif
        endfunc
    "#,
    );
    assert_in_order(
        &text,
        &[
            "FLOAD %1 1.0",
            "FLOAT %4 x",
            "FLT %2 %4 %1",
            "FJUMP %2 Endif1",
            "ILOAD %5 1",
            "WRITEI %5",
            "LABEL Endif1",
        ],
    );
}

#[test]
fn assignment_coerces_int_to_float() {
    let text = tcode_text(
        r#"
        func main()
            var f : float
            f = 1
        endfunc
    "#,
    );
    assert_in_order(&text, &["ILOAD %1 1", "FLOAT %2 %1", "LOAD f %2"]);
}

#[test]
fn while_loop_label_shape() {
    let text = tcode_text(
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
    assert_in_order(
        &text,
        &[
            "LABEL While1",
            "ILOAD %2 3",
            "LT %3 i %2",
            "FJUMP %3 EndWhile1",
            "ILOAD %5 1",
            "ADD %6 i %5",
            "LOAD i %6",
            "UJUMP While1",
            "LABEL EndWhile1",
        ],
    );
}

#[test]
fn if_else_label_shape() {
    let text = tcode_text(
        r#"
        func main()
            var x : int
            read x
            if x == 0 then
                write "zero"
            else
                write "other"
            endif
        endfunc
    "#,
    );
    assert_in_order(
        &text,
        &[
            "READI x",
            "ILOAD %1 0",
            "EQ %2 x %1",
            "FJUMP %2 If1",
            "WRITES \"zero\"",
            "UJUMP Else1",
            "LABEL If1",
            "WRITES \"other\"",
            "LABEL Else1",
        ],
    );
}

#[test]
fn derived_relational_operators_negate() {
    let text = tcode_text(
        r#"
        func main()
            var b : bool
            var x : int
            b = x != 3
        endfunc
    "#,
    );
    // != is EQ into the second temp, then NOT into the first.
    assert_in_order(&text, &["EQ %3 x %1", "NOT %2 %3", "LOAD b %2"]);
}

#[test]
fn modulo_expands_to_div_mul_sub() {
    let text = tcode_text(
        r#"
        func main()
            var x : int
            x = 7 % 3
        endfunc
    "#,
    );
    assert_in_order(
        &text,
        &[
            "ILOAD %1 7",
            "ILOAD %2 3",
            "DIV %3 %1 %2",
            "MUL %4 %3 %2",
            "SUB %5 %1 %4",
            "LOAD x %5",
        ],
    );
}

#[test]
fn unary_operators_pick_the_domain() {
    let text = tcode_text(
        r#"
        func main()
            var x : int
            var f : float
            var b : bool
            x = -x
            f = -f
            b = not b
        endfunc
    "#,
    );
    assert_in_order(&text, &["NEG %1 x", "FNEG %2 f", "NOT %3 b"]);
}

#[test]
fn read_into_array_element_goes_through_a_temp() {
    let text = tcode_text(
        r#"
        func main()
            var a : array 3 of int
            read a[1]
        endfunc
    "#,
    );
    assert_in_order(&text, &["ILOAD %1 1", "READI %2", "XLOAD a %1 %2"]);
}

#[test]
fn array_parameters_are_dereferenced_and_locals_take_addresses() {
    let text = tcode_text(
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
    // Inside the callee the parameter is a pointer: dereference first.
    assert_in_order(
        &text,
        &[
            "subroutine first",
            "param v : i32 array",
            "ILOAD %1 0",
            "LOAD %3 v",
            "LOADX %2 %3 %1",
        ],
    );
    // The caller passes a local array by address.
    assert_in_order(&text, &["subroutine main", "ALOAD %2 a", "PUSH %2", "CALL first"]);
}

#[test]
fn boolean_literals_load_as_integers() {
    let text = tcode_text(
        r#"
        func main()
            var b : bool
            b = true
            b = false
        endfunc
    "#,
    );
    assert_in_order(&text, &["ILOAD %1 1", "LOAD b %1", "ILOAD %2 0", "LOAD b %2"]);
}

#[test]
fn char_literal_keeps_its_escape_spelling() {
    let text = tcode_text(
        r#"
        func main()
            var c : char
            c = '\n'
            write c
        endfunc
    "#,
    );
    assert_in_order(&text, &["CHLOAD %1 \\n", "LOAD c %1", "WRITEC c"]);
}

#[test]
fn procedure_call_without_result_slot() {
    let text = tcode_text(
        r#"
        func greet()
            write "hi"
        endfunc
        func main()
            greet()
        endfunc
    "#,
    );
    // Void callee with no arguments: just CALL, no PUSH/POP protocol.
    assert_in_order(&text, &["subroutine main", "CALL greet", "RETURN"]);
    assert!(
        !text[text.find("subroutine main").unwrap()..].contains("PUSH"),
        "void zero-arg call must not touch the stack:\n{}",
        text
    );
}
