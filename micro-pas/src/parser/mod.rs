pub mod lexer;
pub mod parser;
pub mod token;

use crate::error::CompileError;

/// Runs the whole front end: tokenizer, parser and type checker in one pass.
pub fn check(source: &str) -> Result<(), CompileError> {
    let lexer = lexer::Lexer::new(source.chars());
    parser::Parser::new(lexer)?.parse()
}
