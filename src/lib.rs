/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into a syntax tree.
pub mod parser;

pub mod ast;
pub mod observer;
pub mod token;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

use crate::{ast::Node, lexer::Lexer, observer::Observer, parser::Parser, token::Spanned};

/// An error from any stage of the front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    Lex(Spanned<lexer::Error>),
    Parse(Spanned<parser::Error>),
}

impl From<Spanned<lexer::Error>> for CompileError {
    fn from(error: Spanned<lexer::Error>) -> Self {
        CompileError::Lex(error)
    }
}

impl From<Spanned<parser::Error>> for CompileError {
    fn from(error: Spanned<parser::Error>) -> Self {
        CompileError::Parse(error)
    }
}

/// Lexes and parses `src` into a program tree.
pub fn compile(src: &str) -> Result<Node, CompileError> {
    compile_with(src, &mut ())
}

/// Same as [`compile`], reporting every token and node to `observer`.
pub fn compile_with(src: &str, observer: &mut dyn Observer) -> Result<Node, CompileError> {
    let tokens = Lexer::with_observer(src, &mut *observer).tokenize()?;
    let program = Parser::with_observer(&tokens, observer).parse()?;
    Ok(program)
}
