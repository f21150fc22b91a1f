use sl_compiler::{compile_to_tcode, CompileError, SemErrorKind};

// ── Semantic error detection ─────────────────────────────────────────────
// Each test verifies that an invalid program produces exactly one
// diagnostic of the expected kind, with no cascaded follow-ups.

#[test]
fn duplicate_variable_declaration() {
    let source = r#"
        func main()
            var a : int
            var a : int
            a = 3
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::DeclaredIdent);
}

#[test]
fn duplicate_function_declaration() {
    let source = r#"
        func f() endfunc
        func f() endfunc
        func main() endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::DeclaredIdent);
}

#[test]
fn undeclared_identifier() {
    let source = r#"
        func main()
            x = 1
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::UndeclaredIdent);
}

#[test]
fn undeclared_identifier_does_not_cascade() {
    // `y` types as error; the arithmetic and the assignment must not
    // pile further diagnostics on top.
    let source = r#"
        func main()
            var x : int
            x = y + 1
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::UndeclaredIdent);
}

#[test]
fn argument_count_mismatch() {
    let source = r#"
        func add(a : int, b : int) : int
            return a + b
        endfunc
        func main()
            add(2)
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::NumberOfParameters);
}

#[test]
fn incompatible_parameter_type() {
    let source = r#"
        func f(a : float)
        endfunc
        func main()
            f(true)
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::IncompatibleParameter);
}

#[test]
fn int_argument_coerces_to_float_parameter() {
    let source = r#"
        func f(a : float)
        endfunc
        func main()
            f(1)
        endfunc
    "#;
    assert!(compile_to_tcode(source).is_ok());
}

#[test]
fn calling_a_variable() {
    let source = r#"
        func main()
            var x : int
            x(1)
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::IsNotCallable);
}

#[test]
fn procedure_used_as_expression() {
    let source = r#"
        func p()
        endfunc
        func main()
            var x : int
            x = p()
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::IsNotFunction);
}

#[test]
fn indexing_a_scalar() {
    let source = r#"
        func main()
            var x : int
            x[1] = 2
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::NonArrayInArrayAccess);
}

#[test]
fn non_integer_array_index() {
    let source = r#"
        func main()
            var a : array 3 of int
            var x : int
            x = a[true]
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::NonIntegerIndexInArrayAccess);
}

#[test]
fn non_boolean_condition() {
    let source = r#"
        func main()
            if 1 then
            endif
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::BooleanRequired);
}

#[test]
fn incompatible_assignment() {
    let source = r#"
        func main()
            var x : int
            x = true
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::IncompatibleAssignment);
}

#[test]
fn incompatible_operator() {
    let source = r#"
        func main()
            var b : bool
            b = 1 and 2
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::IncompatibleOperator);
}

#[test]
fn return_value_from_procedure() {
    let source = r#"
        func main()
            return 1
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::IncompatibleReturn);
}

#[test]
fn missing_return_value() {
    let source = r#"
        func f() : int
            return
        endfunc
        func main()
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::IncompatibleReturn);
}

#[test]
fn return_coerces_int_to_float() {
    let source = r#"
        func f() : float
            return 1
        endfunc
        func main()
        endfunc
    "#;
    assert!(compile_to_tcode(source).is_ok());
}

#[test]
fn write_of_array() {
    let source = r#"
        func main()
            var a : array 3 of int
            write a
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::ReadWriteRequireBasic);
}

#[test]
fn read_into_function_name() {
    let source = r#"
        func f() : int
            return 1
        endfunc
        func main()
            read f
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::NonReferenceableExpression);
}

#[test]
fn missing_main() {
    let source = r#"
        func f()
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::NoMainProperlyDeclared);
}

#[test]
fn main_with_parameters() {
    let source = r#"
        func main(x : int)
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::NoMainProperlyDeclared);
}

#[test]
fn main_with_return_type() {
    let source = r#"
        func main() : int
            return 0
        endfunc
    "#;
    assert_semantic_error(source, SemErrorKind::NoMainProperlyDeclared);
}

// ── Error location accuracy ─────────────────────────────────────────────

#[test]
fn error_location_multiline() {
    let source = "func main()\n    var x : int\n    x = nope\nendfunc\n";
    match compile_to_tcode(source) {
        Err(CompileError::Semantic { errors }) => {
            assert_eq!(errors[0].line, 3, "error should be on line 3: {:?}", errors);
            assert!(errors[0].col > 1);
        }
        other => panic!("expected a semantic error, got {:?}", other.map(|_| ())),
    }
}

// ── Helper ───────────────────────────────────────────────────────────────

fn assert_semantic_error(source: &str, expected: SemErrorKind) {
    match compile_to_tcode(source) {
        Ok(_) => panic!("expected {:?}, but compilation succeeded", expected),
        Err(CompileError::Semantic { errors }) => {
            assert_eq!(
                errors.len(),
                1,
                "expected exactly one diagnostic, got: {:?}",
                errors
            );
            assert_eq!(errors[0].kind, expected, "diagnostics: {:?}", errors);
        }
        Err(other) => panic!("expected {:?}, got: {:?}", expected, other),
    }
}
