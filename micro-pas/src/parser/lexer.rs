use std::collections::HashMap;

use tracing::trace;

use super::token::{Delimiter, Keyword, Operator, Token};
use crate::error::{CompileError, LexicalErrorKind};

/// Pull-based tokenizer over any character source.
///
/// Each call to [`Lexer::next_token`] yields the next token, `Ok(None)` once the
/// input is exhausted. Reserved words and identifiers share one intern table
/// keyed by the lowercased lexeme.
pub struct Lexer<I: Iterator<Item = char>> {
    chars: I,
    /// Current character, `None` at end of input.
    ch: Option<char>,
    line: usize,
    words: HashMap<String, Token>,
    failed: bool,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(mut chars: I) -> Self {
        let ch = chars.next();
        let words = Keyword::ALL
            .iter()
            .map(|&kw| (kw.lexeme().to_string(), Token::Reserved(kw)))
            .collect();

        Self { chars, ch, line: 1, words, failed: false }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, CompileError> {
        loop {
            self.skip_whitespace();
            match self.ch {
                Some('{') => self.skip_block_comment()?,
                Some('%') => self.skip_line_comment(),
                _ => break,
            }
        }

        let Some(ch) = self.ch else {
            return Ok(None);
        };

        let token = match ch {
            '&' => self.pair('&', Token::Operator(Operator::And), Token::Other('&')),
            '|' => self.pair('|', Token::Operator(Operator::Or), Token::Other('|')),
            '=' => self.pair('=', Token::Operator(Operator::Equal), Token::Operator(Operator::Assign)),
            '!' => self.pair('=', Token::Operator(Operator::NotEqual), Token::Operator(Operator::Not)),
            '<' => self.pair('=', Token::Operator(Operator::LessEqual), Token::Operator(Operator::Less)),
            '>' => self.pair(
                '=',
                Token::Operator(Operator::GreaterEqual),
                Token::Operator(Operator::Greater),
            ),
            '+' => self.single(Token::Operator(Operator::Plus)),
            '-' => self.single(Token::Operator(Operator::Minus)),
            '*' => self.single(Token::Operator(Operator::Times)),
            '/' => self.single(Token::Operator(Operator::Divide)),
            ';' => self.single(Token::Delimiter(Delimiter::Semicolon)),
            ':' => self.single(Token::Delimiter(Delimiter::Colon)),
            ',' => self.single(Token::Delimiter(Delimiter::Comma)),
            '(' => self.single(Token::Delimiter(Delimiter::LParen)),
            ')' => self.single(Token::Delimiter(Delimiter::RParen)),
            '\'' => self.read_char_const()?,
            '"' => self.read_literal()?,
            c if c.is_ascii_digit() => self.read_number()?,
            c if c.is_alphabetic() || c == '_' => self.read_word(),
            c => self.single(Token::Other(c)),
        };

        trace!(line = self.line, token = %token, "scan");
        Ok(Some(token))
    }

    fn bump(&mut self) {
        self.ch = self.chars.next();
    }

    fn error(&self, kind: LexicalErrorKind) -> CompileError {
        CompileError::Lexical { line: self.line, kind }
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    /// Two-character operator when the next character is `second`,
    /// otherwise the one-character fallback.
    fn pair(&mut self, second: char, matched: Token, unmatched: Token) -> Token {
        self.bump();
        if self.ch == Some(second) {
            self.bump();
            matched
        } else {
            unmatched
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.ch {
            match ch {
                ' ' | '\t' | '\r' | '\u{8}' => {}
                '\n' => self.line += 1,
                _ => break,
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), CompileError> {
        self.bump(); // consume '{'
        loop {
            match self.ch {
                None => return Err(self.error(LexicalErrorKind::UnterminatedBlockComment)),
                Some('}') => break,
                Some('\n') => self.line += 1,
                Some(_) => {}
            }
            self.bump();
        }
        self.bump(); // consume '}'
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while !matches!(self.ch, Some('\n') | None) {
            self.bump();
        }
        // the terminating newline is counted even when the comment ends the file
        self.line += 1;
        self.bump();
    }

    fn read_char_const(&mut self) -> Result<Token, CompileError> {
        self.bump(); // consume opening '
        let value = self.ch;
        if value == Some('\n') {
            self.line += 1;
        }
        self.bump();
        match (value, self.ch) {
            (Some(value), Some('\'')) => {
                self.bump();
                Ok(Token::CharConst(value))
            }
            _ => Err(self.error(LexicalErrorKind::MalformedCharConst)),
        }
    }

    fn read_literal(&mut self) -> Result<Token, CompileError> {
        self.bump(); // consume opening "
        let mut text = String::new();
        loop {
            match self.ch {
                Some('"') => {
                    self.bump();
                    return Ok(Token::Literal(text));
                }
                Some('\n') | None => return Err(self.error(LexicalErrorKind::UnterminatedString)),
                Some(ch) => {
                    text.push(ch);
                    self.bump();
                }
            }
        }
    }

    fn digit(&self) -> Option<u32> {
        self.ch.and_then(|ch| ch.to_digit(10))
    }

    fn read_number(&mut self) -> Result<Token, CompileError> {
        let mut value: i64 = 0;
        while let Some(digit) = self.digit() {
            value = value.wrapping_mul(10).wrapping_add(i64::from(digit));
            self.bump();
        }

        if self.ch != Some('.') {
            return Ok(Token::Num(value));
        }
        self.bump(); // consume '.'

        if self.digit().is_none() {
            return Err(self.error(LexicalErrorKind::FloatWithoutDigits));
        }

        // Fraction digits are added one at a time with a growing divisor.
        let mut x = value as f64;
        let mut divisor = 10.0;
        while let Some(digit) = self.digit() {
            x += f64::from(digit) / divisor;
            divisor *= 10.0;
            self.bump();
        }
        Ok(Token::Real(x))
    }

    fn read_word(&mut self) -> Token {
        let mut lexeme = String::new();
        while let Some(ch) = self.ch {
            if !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            lexeme.extend(ch.to_lowercase());
            self.bump();
        }

        self.words
            .entry(lexeme)
            .or_insert_with_key(|lexeme| Token::Id(lexeme.clone()))
            .clone()
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Result<Token, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Scans the whole source up front, stopping at the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source.chars()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_one(input: &str) -> Token {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 1, "expected a single token for {input:?}: {tokens:?}");
        tokens.into_iter().next().unwrap()
    }

    fn lex_error(input: &str) -> (usize, LexicalErrorKind) {
        match tokenize(input) {
            Err(CompileError::Lexical { line, kind }) => (line, kind),
            other => panic!("expected lexical error for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        for kw in Keyword::ALL {
            assert_eq!(lex_one(kw.lexeme()), Token::Reserved(kw));
            assert_eq!(lex_one(&kw.lexeme().to_uppercase()), Token::Reserved(kw));
        }
        assert_eq!(lex_one("ProGram"), Token::Reserved(Keyword::Program));
    }

    #[test]
    fn test_identifiers_are_folded_and_interned() {
        let tokens = tokenize("Total total_2 TOTAL _x").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Id("total".to_string()),
                Token::Id("total_2".to_string()),
                Token::Id("total".to_string()),
                Token::Id("_x".to_string()),
            ]
        );
    }

    #[test]
    fn test_integer_literals() {
        for digits in ["0", "7", "42", "000123", "9876543210"] {
            assert_eq!(lex_one(digits), Token::Num(digits.parse().unwrap()));
        }
    }

    #[test]
    fn test_float_literals_use_incremental_fraction() {
        for (whole, frac) in [("3", "14"), ("0", "5"), ("12", "0625"), ("1", "1")] {
            let mut expected = whole.parse::<i64>().unwrap() as f64;
            let mut divisor = 10.0;
            for d in frac.chars() {
                expected += f64::from(d.to_digit(10).unwrap()) / divisor;
                divisor *= 10.0;
            }
            match lex_one(&format!("{whole}.{frac}")) {
                Token::Real(value) => assert_eq!(value.to_bits(), expected.to_bits()),
                other => panic!("expected REAL, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_minus_is_never_part_of_a_literal() {
        assert_eq!(
            tokenize("-5").unwrap(),
            vec![Token::Operator(Operator::Minus), Token::Num(5)]
        );
    }

    #[test]
    fn test_single_char_tokens_round_trip() {
        for symbol in ["+", "-", "*", "/", ";", ":", ",", "(", ")", "<", ">", "=", "!"] {
            let token = lex_one(symbol);
            assert_eq!(token.to_string(), symbol);
            assert_eq!(lex_one(&token.to_string()), token);
        }
    }

    #[test]
    fn test_two_char_operators() {
        let tokens = tokenize("&& || == != <= >=").unwrap();
        let expected = [
            Operator::And,
            Operator::Or,
            Operator::Equal,
            Operator::NotEqual,
            Operator::LessEqual,
            Operator::GreaterEqual,
        ];
        assert_eq!(tokens, expected.map(Token::Operator).to_vec());
    }

    #[test]
    fn test_lone_punctuation_falls_back() {
        assert_eq!(
            tokenize("& | # @").unwrap(),
            vec![Token::Other('&'), Token::Other('|'), Token::Other('#'), Token::Other('@')]
        );
    }

    #[test]
    fn test_char_and_string_literals() {
        assert_eq!(lex_one("'a'"), Token::CharConst('a'));
        assert_eq!(lex_one("' '"), Token::CharConst(' '));
        assert_eq!(lex_one("\"hello, world\""), Token::Literal("hello, world".to_string()));
        assert_eq!(lex_one("\"\""), Token::Literal(String::new()));
    }

    #[test]
    fn test_comments_are_skipped_and_lines_counted() {
        let mut lexer = Lexer::new("{ block\n comment }\nx % trailing\n\ny".chars());
        assert_eq!(lexer.next_token().unwrap(), Some(Token::Id("x".to_string())));
        assert_eq!(lexer.line(), 3);
        assert_eq!(lexer.next_token().unwrap(), Some(Token::Id("y".to_string())));
        assert_eq!(lexer.line(), 5);
        assert_eq!(lexer.next_token().unwrap(), None);
    }

    #[test]
    fn test_newline_char_const_counts_a_line() {
        let mut lexer = Lexer::new("'\n' x".chars());
        assert_eq!(lexer.next_token().unwrap(), Some(Token::CharConst('\n')));
        assert_eq!(lexer.line(), 2);
        assert_eq!(lexer.next_token().unwrap(), Some(Token::Id("x".to_string())));
        assert_eq!(lexer.line(), 2);

        // malformed constant spanning a newline reports the next line
        assert_eq!(lex_error("'\nab'"), (2, LexicalErrorKind::MalformedCharConst));
    }

    #[test]
    fn test_line_comment_at_end_of_input() {
        let mut lexer = Lexer::new("x % done".chars());
        assert!(lexer.next_token().unwrap().is_some());
        assert_eq!(lexer.next_token().unwrap(), None);
        assert_eq!(lexer.line(), 2);
    }

    #[test]
    fn test_lexical_errors() {
        assert_eq!(lex_error("{ comment never closed"), (1, LexicalErrorKind::UnterminatedBlockComment));
        assert_eq!(lex_error("\n'ab'"), (2, LexicalErrorKind::MalformedCharConst));
        assert_eq!(lex_error("''"), (1, LexicalErrorKind::MalformedCharConst));
        assert_eq!(lex_error("'a"), (1, LexicalErrorKind::MalformedCharConst));
        assert_eq!(lex_error("\"open\nnext\""), (1, LexicalErrorKind::UnterminatedString));
        assert_eq!(lex_error("\"open"), (1, LexicalErrorKind::UnterminatedString));
        assert_eq!(lex_error("3."), (1, LexicalErrorKind::FloatWithoutDigits));
        assert_eq!(lex_error("3.x"), (1, LexicalErrorKind::FloatWithoutDigits));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut lexer = Lexer::new("x \"bad\n y".chars());
        assert!(matches!(lexer.next(), Some(Ok(Token::Id(_)))));
        assert!(matches!(lexer.next(), Some(Err(CompileError::Lexical { .. }))));
        assert!(lexer.next().is_none());
    }
}
