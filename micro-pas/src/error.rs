use std::fmt;

use thiserror::Error;

use crate::semantic::Type;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexical error at line {line}: {kind}")]
    Lexical { line: usize, kind: LexicalErrorKind },

    #[error("Syntax error at line {line}: {message} (found: {found})")]
    Syntax { line: usize, message: String, found: String },

    #[error("Semantic error at line {line}: {kind}")]
    Semantic { line: usize, kind: SemanticErrorKind },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Source line the error was reported at, if it came from the pipeline.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Lexical { line, .. } | Self::Syntax { line, .. } | Self::Semantic { line, .. } => {
                Some(*line)
            }
            Self::Io { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexicalErrorKind {
    UnterminatedBlockComment,
    MalformedCharConst,
    UnterminatedString,
    FloatWithoutDigits,
}

impl fmt::Display for LexicalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LexicalErrorKind::*;
        match self {
            UnterminatedBlockComment => write!(f, "unterminated block comment"),
            MalformedCharConst => write!(f, "malformed character constant"),
            UnterminatedString => write!(f, "unterminated string literal"),
            FloatWithoutDigits => write!(f, "decimal point without digits in float constant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SemanticErrorKind {
    AlreadyDeclared(String),
    Undeclared(String),
    /// `target = expr` where the expression type differs from the declaration.
    AssignMismatch { target: String, declared: Type, found: Type },
    IncompatibleComparison(Type, Type),
    IncompatibleArithmetic(Type, Type),
    /// Operator symbol (`||`, `&&`) applied to non-boolean operands.
    BooleanOperands(&'static str),
    NotBoolean { what: &'static str, found: Type },
    NotNumericOrChar { what: &'static str, found: Type },
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SemanticErrorKind::*;
        match self {
            AlreadyDeclared(name) => write!(f, "identifier '{name}' already declared in this block"),
            Undeclared(name) => write!(f, "identifier '{name}' not declared"),
            AssignMismatch { target, declared, found } => write!(
                f,
                "expression type ({found}) incompatible with '{target}' ({declared})"
            ),
            IncompatibleComparison(a, b) => {
                write!(f, "incompatible types in relational operator ({a} x {b})")
            }
            IncompatibleArithmetic(a, b) => {
                write!(f, "incompatible types in arithmetic operation ({a} x {b})")
            }
            BooleanOperands(op) => write!(f, "'{op}' requires boolean operands"),
            NotBoolean { what, found } => write!(f, "{what} must be Bool (found: {found})"),
            NotNumericOrChar { what, found } => {
                write!(f, "{what} must be numeric or Char (found: {found})")
            }
        }
    }
}
