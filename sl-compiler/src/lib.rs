//! Compiler for SL, a small imperative language with functions,
//! primitive types, one-dimensional arrays and structured control flow.
//!
//! The pipeline: parse → symbol collection → type checking →
//! three-address code → LLVM IR text. Semantic diagnostics accumulate
//! and surface together; the lowering stage reports invariant
//! violations as errors rather than panicking.

pub mod ast;
pub mod frontend;
pub mod llvm;
pub mod sem;
pub mod tcode;

use sem::decor::Decorations;
use sem::errors::{SemError, SemErrors};
use sem::symbols::SymTable;
use sem::types::TypeRegistry;
use std::fmt;
use thiserror::Error;

pub use frontend::lexer::LexicalError;
pub use sem::errors::SemErrorKind;
pub use tcode::TcodeProgram;

/// A reported semantic error with its resolved source position.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: SemErrorKind,
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error at line {}:{}: {}",
            self.line, self.col, self.message
        )
    }
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{0}")]
    Lexical(#[from] LexicalError),

    #[error("parse error at line {line}, column {col}: {message}")]
    Parse {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("{} semantic error(s)", .errors.len())]
    Semantic { errors: Vec<Diagnostic> },

    #[error("temporary '{temp}' is assigned more than once in function '{function}'")]
    MultiplyDefinedTemp { function: String, temp: String },

    #[error("no type could be inferred in function '{function}' for: {}", .values.join(", "))]
    UnresolvedType {
        function: String,
        values: Vec<String>,
    },
}

/// Decorated tree plus the tables the later stages read.
pub struct Analysis {
    pub program: ast::Program,
    pub types: TypeRegistry,
    pub symbols: SymTable,
    pub decor: Decorations,
}

/// Parse and run both semantic passes. Any recorded diagnostic turns
/// into `CompileError::Semantic`.
pub fn analyze(source: &str) -> Result<Analysis, CompileError> {
    let program = frontend::parse(source)?;

    let mut types = TypeRegistry::new();
    let mut symbols = SymTable::new();
    let mut decor = Decorations::new();
    let mut errors = SemErrors::new();

    sem::collect::run(&program, &mut types, &mut symbols, &mut decor, &mut errors);
    sem::typecheck::run(&program, &mut types, &mut symbols, &mut decor, &mut errors);

    if !errors.is_empty() {
        return Err(CompileError::Semantic {
            errors: errors
                .into_vec()
                .into_iter()
                .map(|e| resolve_diagnostic(source, e))
                .collect(),
        });
    }

    Ok(Analysis {
        program,
        types,
        symbols,
        decor,
    })
}

fn resolve_diagnostic(source: &str, error: SemError) -> Diagnostic {
    let (line, col) = frontend::lexer::position_to_line_col(source, error.span.start);
    Diagnostic {
        kind: error.kind,
        line,
        col,
        message: error.message,
    }
}

/// Compile source text to three-address code.
pub fn compile_to_tcode(source: &str) -> Result<(Analysis, TcodeProgram), CompileError> {
    let mut analysis = analyze(source)?;
    let code = tcode::build(
        &analysis.program,
        &analysis.types,
        &mut analysis.symbols,
        &analysis.decor,
    );
    Ok((analysis, code))
}

/// Compile source text all the way to LLVM IR text.
pub fn compile_to_llvm(source: &str) -> Result<String, CompileError> {
    let (analysis, code) = compile_to_tcode(source)?;
    llvm::lower(&analysis.types, &analysis.symbols, &code)
}
