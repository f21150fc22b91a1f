use crate::ast::Span;
use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n]+")] // Whitespace
#[logos(skip r"//[^\n]*")] // Line comments
pub enum Token {
    // --- Keywords ---
    #[token("func")]
    Func,
    #[token("endfunc")]
    Endfunc,
    #[token("var")]
    Var,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("endif")]
    Endif,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("endwhile")]
    Endwhile,
    #[token("read")]
    Read,
    #[token("write")]
    Write,
    #[token("return")]
    Return,
    #[token("array")]
    Array,
    #[token("of")]
    Of,

    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("bool")]
    Bool,
    #[token("char")]
    Char,

    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // --- Identifiers and literals ---
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Literal spellings are kept verbatim; the code generator emits them
    // unchanged.
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().to_string())]
    FloatVal(String),

    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    IntVal(String),

    // Char literal without the surrounding quotes; escapes stay as written.
    #[regex(r"'(\\.|[^\\'])'", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    CharVal(String),

    // String literal including the surrounding quotes.
    #[regex(r#""(\\.|[^"\\])*""#, |lex| lex.slice().to_string())]
    StringVal(String),

    // --- Operators ---
    #[token("==")]
    EqEq,
    #[token("!=")]
    Neq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // --- Punctuation ---
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Func => write!(f, "'func'"),
            Token::Endfunc => write!(f, "'endfunc'"),
            Token::Var => write!(f, "'var'"),
            Token::If => write!(f, "'if'"),
            Token::Then => write!(f, "'then'"),
            Token::Else => write!(f, "'else'"),
            Token::Endif => write!(f, "'endif'"),
            Token::While => write!(f, "'while'"),
            Token::Do => write!(f, "'do'"),
            Token::Endwhile => write!(f, "'endwhile'"),
            Token::Read => write!(f, "'read'"),
            Token::Write => write!(f, "'write'"),
            Token::Return => write!(f, "'return'"),
            Token::Array => write!(f, "'array'"),
            Token::Of => write!(f, "'of'"),
            Token::Int => write!(f, "'int'"),
            Token::Float => write!(f, "'float'"),
            Token::Bool => write!(f, "'bool'"),
            Token::Char => write!(f, "'char'"),
            Token::And => write!(f, "'and'"),
            Token::Or => write!(f, "'or'"),
            Token::Not => write!(f, "'not'"),
            Token::True => write!(f, "'true'"),
            Token::False => write!(f, "'false'"),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::FloatVal(s) => write!(f, "float literal {}", s),
            Token::IntVal(s) => write!(f, "integer literal {}", s),
            Token::CharVal(s) => write!(f, "char literal '{}'", s),
            Token::StringVal(s) => write!(f, "string literal {}", s),
            Token::EqEq => write!(f, "'=='"),
            Token::Neq => write!(f, "'!='"),
            Token::Le => write!(f, "'<='"),
            Token::Ge => write!(f, "'>='"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            Token::Assign => write!(f, "'='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::Semicolon => write!(f, "';'"),
        }
    }
}

/// Custom error type for lexical errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalError {
    pub location: usize,
    pub line: usize,
    pub column: usize,
    pub unexpected_char: char,
    pub context: String,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unexpected character '{}' at line {}, column {} (position {})\n  Context: {}",
            self.unexpected_char, self.line, self.column, self.location, self.context
        )
    }
}

impl std::error::Error for LexicalError {}

/// Convert a byte position to line and column numbers (1-based)
pub fn position_to_line_col(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= position {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Get context around an error position (the line containing the error)
pub fn get_error_context(source: &str, position: usize) -> String {
    let line_start = source[..position]
        .rfind('\n')
        .map(|pos| pos + 1)
        .unwrap_or(0);

    let line_end = source[position..]
        .find('\n')
        .map(|pos| position + pos)
        .unwrap_or(source.len());

    source[line_start..line_end].trim().to_string()
}

fn create_lexical_error(source: &str, position: usize) -> LexicalError {
    let (line, column) = position_to_line_col(source, position);
    let unexpected_char = source[position..].chars().next().unwrap_or('\0');
    let context = get_error_context(source, position);

    LexicalError {
        location: position,
        line,
        column,
        unexpected_char,
        context,
    }
}

/// Tokenize the whole source up front; the parser works on the vector.
pub fn lex(source: &str) -> Result<Vec<(Token, Span)>, LexicalError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, Span::new(span.start, span.end))),
            Err(_) => return Err(create_lexical_error(source, span.start)),
        }
    }

    Ok(tokens)
}
