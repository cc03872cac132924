//! Front end for a small Pascal-like teaching language.
//!
//! A source text is accepted when it is lexically, syntactically and
//! semantically valid; otherwise the first error found is returned. There is
//! no syntax tree and no code generation.

use std::fs;
use std::path::Path;

pub mod error;
pub mod parser;
pub mod semantic;

pub use error::CompileError;
pub use parser::check;

/// Reads `path` and checks its contents.
pub fn check_file<P: AsRef<Path>>(path: P) -> Result<(), CompileError> {
    let source = fs::read_to_string(path)?;
    check(&source)
}
