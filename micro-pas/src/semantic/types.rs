use std::fmt;

/// Type of a declared variable or of an expression value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Char,
    Bool,
    /// Sentinel for a value whose type could not be determined.
    Error,
}

impl Type {
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Result type of `a <op> b` for `+ - * /`, or `None` when the pair
    /// cannot be combined.
    pub fn arithmetic_result(a: Type, b: Type) -> Option<Type> {
        use Type::*;
        match (a, b) {
            (Float, Int | Float) | (Int, Float) => Some(Float),
            (Int, Int) => Some(Int),
            (Char, Int) | (Int, Char) => Some(Int),
            _ => None,
        }
    }

    /// Relational operators accept exactly the pairs arithmetic accepts.
    pub fn comparable(a: Type, b: Type) -> bool {
        Self::arithmetic_result(a, b).is_some()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "Int",
            Type::Float => "Float",
            Type::Char => "Char",
            Type::Bool => "Bool",
            Type::Error => "Error",
        };
        f.write_str(name)
    }
}
