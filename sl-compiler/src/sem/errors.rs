//! Accumulating sink for semantic diagnostics.
//!
//! The passes keep going after reporting; operands already typed as
//! error suppress follow-up checks so one mistake yields one message.

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemErrorKind {
    DeclaredIdent,
    UndeclaredIdent,
    IncompatibleOperator,
    IncompatibleAssignment,
    IncompatibleParameter,
    IncompatibleReturn,
    NumberOfParameters,
    IsNotCallable,
    IsNotFunction,
    NonArrayInArrayAccess,
    NonIntegerIndexInArrayAccess,
    NonReferenceableLeftExpr,
    NonReferenceableExpression,
    BooleanRequired,
    ReadWriteRequireBasic,
    NoMainProperlyDeclared,
}

#[derive(Debug, Clone)]
pub struct SemError {
    pub kind: SemErrorKind,
    pub span: Span,
    pub message: String,
}

#[derive(Default)]
pub struct SemErrors {
    errors: Vec<SemError>,
}

impl SemErrors {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: SemErrorKind, span: Span, message: String) {
        self.errors.push(SemError {
            kind,
            span,
            message,
        });
    }

    pub fn declared_ident(&mut self, span: Span, ident: &str) {
        self.push(
            SemErrorKind::DeclaredIdent,
            span,
            format!("identifier '{}' is already declared", ident),
        );
    }

    pub fn undeclared_ident(&mut self, span: Span, ident: &str) {
        self.push(
            SemErrorKind::UndeclaredIdent,
            span,
            format!("identifier '{}' is undeclared", ident),
        );
    }

    pub fn incompatible_operator(&mut self, span: Span, op: &str) {
        self.push(
            SemErrorKind::IncompatibleOperator,
            span,
            format!("operator '{}' has incompatible operand types", op),
        );
    }

    pub fn incompatible_assignment(&mut self, span: Span) {
        self.push(
            SemErrorKind::IncompatibleAssignment,
            span,
            "assignment with incompatible types".to_string(),
        );
    }

    pub fn incompatible_parameter(&mut self, span: Span, n: usize, callee: &str) {
        self.push(
            SemErrorKind::IncompatibleParameter,
            span,
            format!("parameter #{} in call to '{}' has an incompatible type", n, callee),
        );
    }

    pub fn incompatible_return(&mut self, span: Span) {
        self.push(
            SemErrorKind::IncompatibleReturn,
            span,
            "return with incompatible type".to_string(),
        );
    }

    pub fn number_of_parameters(&mut self, span: Span, callee: &str) {
        self.push(
            SemErrorKind::NumberOfParameters,
            span,
            format!("call to '{}' with an incorrect number of parameters", callee),
        );
    }

    pub fn is_not_callable(&mut self, span: Span) {
        self.push(
            SemErrorKind::IsNotCallable,
            span,
            "identifier in call does not name a function".to_string(),
        );
    }

    pub fn is_not_function(&mut self, span: Span) {
        self.push(
            SemErrorKind::IsNotFunction,
            span,
            "procedure call cannot be used as an expression".to_string(),
        );
    }

    pub fn non_array_in_array_access(&mut self, span: Span) {
        self.push(
            SemErrorKind::NonArrayInArrayAccess,
            span,
            "indexed identifier does not name an array".to_string(),
        );
    }

    pub fn non_integer_index_in_array_access(&mut self, span: Span) {
        self.push(
            SemErrorKind::NonIntegerIndexInArrayAccess,
            span,
            "array index is not an integer".to_string(),
        );
    }

    pub fn non_referenceable_left_expr(&mut self, span: Span) {
        self.push(
            SemErrorKind::NonReferenceableLeftExpr,
            span,
            "left side of assignment is not referenceable".to_string(),
        );
    }

    pub fn non_referenceable_expression(&mut self, span: Span) {
        self.push(
            SemErrorKind::NonReferenceableExpression,
            span,
            "expression is not referenceable".to_string(),
        );
    }

    pub fn boolean_required(&mut self, span: Span) {
        self.push(
            SemErrorKind::BooleanRequired,
            span,
            "condition must be a boolean expression".to_string(),
        );
    }

    pub fn read_write_require_basic(&mut self, span: Span) {
        self.push(
            SemErrorKind::ReadWriteRequireBasic,
            span,
            "read/write require an expression of basic type".to_string(),
        );
    }

    pub fn no_main_properly_declared(&mut self) {
        self.push(
            SemErrorKind::NoMainProperlyDeclared,
            Span::new(0, 0),
            "there is no 'main' function with zero parameters and no return value".to_string(),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SemError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<SemError> {
        self.errors
    }
}
