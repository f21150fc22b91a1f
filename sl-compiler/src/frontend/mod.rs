pub mod lexer;
pub mod parser;

use crate::ast::Program;
use crate::CompileError;

/// Lex and parse a full SL source file.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let tokens = lexer::lex(source)?;
    parser::parse(tokens, source.len()).map_err(|e| {
        let (line, col) = lexer::position_to_line_col(source, e.location);
        CompileError::Parse {
            line,
            col,
            message: e.message,
        }
    })
}
