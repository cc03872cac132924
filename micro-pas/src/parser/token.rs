use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Program,
    Begin,
    End,
    Type,
    Int,
    Float,
    Char,
    Bool,
    If,
    Then,
    Else,
    While,
    Do,
    Repeat,
    Until,
    In,
    Out,
}

impl Keyword {
    pub const ALL: [Keyword; 17] = [
        Keyword::If,
        Keyword::Program,
        Keyword::Begin,
        Keyword::End,
        Keyword::Type,
        Keyword::Int,
        Keyword::Float,
        Keyword::Char,
        Keyword::Bool,
        Keyword::Then,
        Keyword::Else,
        Keyword::While,
        Keyword::Do,
        Keyword::Repeat,
        Keyword::Until,
        Keyword::In,
        Keyword::Out,
    ];

    pub fn lexeme(self) -> &'static str {
        match self {
            Keyword::Program => "program",
            Keyword::Begin => "begin",
            Keyword::End => "end",
            Keyword::Type => "type",
            Keyword::Int => "int",
            Keyword::Float => "float",
            Keyword::Char => "char",
            Keyword::Bool => "bool",
            Keyword::If => "if",
            Keyword::Then => "then",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Do => "do",
            Keyword::Repeat => "repeat",
            Keyword::Until => "until",
            Keyword::In => "in",
            Keyword::Out => "out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,        // ==
    NotEqual,     // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    Assign,       // =
    Plus,         // +
    Minus,        // -
    Times,        // *
    Divide,       // /
    And,          // &&
    Or,           // ||
    Not,          // !
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Assign => "=",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Times => "*",
            Operator::Divide => "/",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
        }
    }

    pub fn is_relop(self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::Less
                | Operator::LessEqual
                | Operator::Greater
                | Operator::GreaterEqual
        )
    }

    pub fn is_addop(self) -> bool {
        matches!(self, Operator::Plus | Operator::Minus | Operator::Or)
    }

    pub fn is_mulop(self) -> bool {
        matches!(self, Operator::Times | Operator::Divide | Operator::And)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Semicolon, // ;
    Colon,     // :
    Comma,     // ,
    LParen,    // (
    RParen,    // )
}

impl Delimiter {
    pub fn symbol(self) -> &'static str {
        match self {
            Delimiter::Semicolon => ";",
            Delimiter::Colon => ":",
            Delimiter::Comma => ",",
            Delimiter::LParen => "(",
            Delimiter::RParen => ")",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Reserved(Keyword),
    Operator(Operator),
    Delimiter(Delimiter),
    // Literals
    Num(i64),
    Real(f64),
    CharConst(char),
    Literal(String),
    // Identifiers are stored case-folded
    Id(String),
    /// Any character the lexer has no rule for, left to the parser to reject.
    Other(char),
}

impl Token {
    /// Short description used in "expected ..." diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Num(_) => "NUM".to_string(),
            Token::Real(_) => "REAL".to_string(),
            Token::CharConst(_) => "CHAR_CONST".to_string(),
            Token::Literal(_) => "LITERAL".to_string(),
            Token::Id(_) => "ID".to_string(),
            other => format!("'{other}'"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Reserved(kw) => f.write_str(kw.lexeme()),
            Token::Operator(op) => f.write_str(op.symbol()),
            Token::Delimiter(delim) => f.write_str(delim.symbol()),
            Token::Num(value) => write!(f, "{value}"),
            Token::Real(value) => write!(f, "{value}"),
            Token::CharConst(ch) | Token::Other(ch) => write!(f, "{ch}"),
            Token::Literal(text) | Token::Id(text) => f.write_str(text),
        }
    }
}
