use tracing::{debug, info};

use super::lexer::Lexer;
use super::token::{Delimiter, Keyword, Operator, Token};
use crate::error::{CompileError, SemanticErrorKind};
use crate::semantic::{SymbolTable, Type};

/// Deepest allowed nesting of parentheses and control-statement bodies.
const MAX_NESTING: usize = 200;

/// Recursive-descent parser that type-checks while it recognizes.
///
/// There is no syntax tree: every procedure that produces a value returns
/// its [`Type`], and declarations go straight into the symbol table. The
/// first error of any kind ends the pass.
pub struct Parser<I: Iterator<Item = char>> {
    lexer: Lexer<I>,
    /// Current token, `None` at end of input.
    look: Option<Token>,
    symbols: SymbolTable,
    nesting: usize,
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub fn new(lexer: Lexer<I>) -> Result<Self, CompileError> {
        let mut parser = Self { lexer, look: None, symbols: SymbolTable::new(), nesting: 0 };
        parser.advance()?;
        parser.symbols.enter_scope(); // global scope
        Ok(parser)
    }

    pub fn parse(mut self) -> Result<(), CompileError> {
        self.program()?;
        if self.look.is_some() {
            return Err(self.syntax_error("additional tokens after 'end'"));
        }
        self.symbols.leave_scope();
        info!(lines = self.lexer.line(), "program accepted");
        Ok(())
    }

    // program ::= PROGRAM [decl-list] BEGIN stmt-list END
    fn program(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Program)?;
        if self.at_type() {
            self.decl_list()?;
        }
        self.expect_keyword(Keyword::Begin)?;
        self.stmt_list()?;
        self.expect_keyword(Keyword::End)
    }

    // decl-list ::= decl {decl}
    fn decl_list(&mut self) -> Result<(), CompileError> {
        loop {
            self.decl()?;
            if !self.at_type() {
                return Ok(());
            }
        }
    }

    // decl ::= type ':' ident-list ';'
    fn decl(&mut self) -> Result<(), CompileError> {
        let ty = self.type_name()?;
        self.expect(Token::Delimiter(Delimiter::Colon))?;
        self.ident_list(ty)?;
        self.expect(Token::Delimiter(Delimiter::Semicolon))
    }

    // ident-list ::= ID {',' ID}
    fn ident_list(&mut self, ty: Type) -> Result<(), CompileError> {
        let name = self.expect_identifier()?;
        self.declare(&name, ty)?;
        while self.check(&Token::Delimiter(Delimiter::Comma)) {
            self.advance()?;
            let name = self.expect_identifier()?;
            self.declare(&name, ty)?;
        }
        Ok(())
    }

    // type ::= INT | FLOAT | CHAR
    fn type_name(&mut self) -> Result<Type, CompileError> {
        let ty = match self.look {
            Some(Token::Reserved(Keyword::Int)) => Type::Int,
            Some(Token::Reserved(Keyword::Float)) => Type::Float,
            Some(Token::Reserved(Keyword::Char)) => Type::Char,
            _ => return Err(self.syntax_error("type expected")),
        };
        self.advance()?;
        Ok(ty)
    }

    // stmt-list ::= stmt {';' stmt}
    fn stmt_list(&mut self) -> Result<(), CompileError> {
        self.stmt()?;
        while self.check(&Token::Delimiter(Delimiter::Semicolon)) {
            self.advance()?;
            self.stmt()?;
        }
        Ok(())
    }

    pub(crate) fn stmt(&mut self) -> Result<(), CompileError> {
        match self.look {
            None => Err(self.syntax_error("statement expected")),
            Some(Token::Id(_)) => self.assign_stmt(),
            Some(Token::Reserved(Keyword::If)) => self.if_stmt(),
            Some(Token::Reserved(Keyword::While)) => self.while_stmt(),
            Some(Token::Reserved(Keyword::Repeat)) => self.repeat_stmt(),
            Some(Token::Reserved(Keyword::In)) => self.read_stmt(),
            Some(Token::Reserved(Keyword::Out)) => self.write_stmt(),
            Some(_) => Err(self.syntax_error("invalid statement start")),
        }
    }

    // assign ::= ID '=' simple-expr
    fn assign_stmt(&mut self) -> Result<(), CompileError> {
        let target = self.expect_identifier()?;
        let declared = self.lookup(&target)?;
        self.expect(Token::Operator(Operator::Assign))?;
        let found = self.simple_expr()?;
        if declared != found {
            return Err(self.semantic_error(SemanticErrorKind::AssignMismatch {
                target,
                declared,
                found,
            }));
        }
        Ok(())
    }

    // if-stmt ::= IF condition THEN [decl-list] stmt-list [ELSE [decl-list] stmt-list] END
    fn if_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::If)?;
        let cond = self.condition()?;
        self.require_bool(cond, "condition of 'if'")?;
        self.expect_keyword(Keyword::Then)?;
        self.block()?;
        if self.check(&Token::Reserved(Keyword::Else)) {
            self.advance()?;
            self.block()?;
        }
        self.expect_keyword(Keyword::End)
    }

    // while-stmt ::= WHILE condition DO [decl-list] stmt-list END
    fn while_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::While)?;
        let cond = self.condition()?;
        self.require_bool(cond, "condition of 'while'")?;
        self.expect_keyword(Keyword::Do)?;
        self.block()?;
        self.expect_keyword(Keyword::End)
    }

    // repeat-stmt ::= REPEAT [decl-list] stmt-list UNTIL condition
    fn repeat_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Repeat)?;
        self.block()?;
        self.expect_keyword(Keyword::Until)?;
        let cond = self.condition()?;
        self.require_bool(cond, "condition of 'until'")
    }

    /// Body of a control statement: its own scope, optional local
    /// declarations, then statements.
    fn block(&mut self) -> Result<(), CompileError> {
        self.enter_nesting()?;
        self.symbols.enter_scope();
        if self.at_type() {
            self.decl_list()?;
        }
        self.stmt_list()?;
        self.symbols.leave_scope();
        self.nesting -= 1;
        Ok(())
    }

    // read-stmt ::= IN '(' ID ')'
    fn read_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::In)?;
        self.expect(Token::Delimiter(Delimiter::LParen))?;
        let name = self.expect_identifier()?;
        self.lookup(&name)?;
        self.expect(Token::Delimiter(Delimiter::RParen))
    }

    // write-stmt ::= OUT '(' writable ')'
    fn write_stmt(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Out)?;
        self.expect(Token::Delimiter(Delimiter::LParen))?;
        self.writable()?;
        self.expect(Token::Delimiter(Delimiter::RParen))
    }

    // writable ::= LITERAL | simple-expr
    fn writable(&mut self) -> Result<(), CompileError> {
        if let Some(Token::Literal(_)) = self.look {
            self.advance()
        } else {
            self.simple_expr().map(|_| ())
        }
    }

    pub(crate) fn condition(&mut self) -> Result<Type, CompileError> {
        self.expression()
    }

    // expression ::= simple-expr [relop simple-expr]
    pub(crate) fn expression(&mut self) -> Result<Type, CompileError> {
        let left = self.simple_expr()?;
        if self.operator().is_some_and(Operator::is_relop) {
            self.advance()?;
            let right = self.simple_expr()?;
            if !Type::comparable(left, right) {
                return Err(self.semantic_error(SemanticErrorKind::IncompatibleComparison(left, right)));
            }
            return Ok(Type::Bool);
        }
        Ok(left)
    }

    // simple-expr ::= term {addop term}
    pub(crate) fn simple_expr(&mut self) -> Result<Type, CompileError> {
        let mut ty = self.term()?;
        while let Some(op) = self.operator().filter(|op| op.is_addop()) {
            self.advance()?;
            let rhs = self.term()?;
            ty = self.binary_result(op, ty, rhs)?;
        }
        Ok(ty)
    }

    // term ::= factor-a {mulop factor-a}
    pub(crate) fn term(&mut self) -> Result<Type, CompileError> {
        let mut ty = self.factor_a()?;
        while let Some(op) = self.operator().filter(|op| op.is_mulop()) {
            self.advance()?;
            let rhs = self.factor_a()?;
            ty = self.binary_result(op, ty, rhs)?;
        }
        Ok(ty)
    }

    // factor-a ::= ['!' | '-'] factor
    pub(crate) fn factor_a(&mut self) -> Result<Type, CompileError> {
        match self.operator() {
            Some(Operator::Not) => {
                self.advance()?;
                let ty = self.factor()?;
                self.require_bool(ty, "operand of '!'")?;
                Ok(Type::Bool)
            }
            Some(Operator::Minus) => {
                self.advance()?;
                let ty = self.factor()?;
                if !(ty.is_numeric() || ty == Type::Char) {
                    return Err(self.semantic_error(SemanticErrorKind::NotNumericOrChar {
                        what: "operand of unary '-'",
                        found: ty,
                    }));
                }
                Ok(ty)
            }
            _ => self.factor(),
        }
    }

    // factor ::= ID | constant | '(' expression ')'
    pub(crate) fn factor(&mut self) -> Result<Type, CompileError> {
        match &self.look {
            Some(Token::Id(name)) => {
                let name = name.clone();
                self.advance()?;
                self.lookup(&name)
            }
            Some(Token::Num(_) | Token::Real(_) | Token::CharConst(_)) => self.constant(),
            Some(Token::Delimiter(Delimiter::LParen)) => {
                self.enter_nesting()?;
                self.advance()?;
                let ty = self.expression()?;
                self.expect(Token::Delimiter(Delimiter::RParen))?;
                self.nesting -= 1;
                Ok(ty)
            }
            _ => Err(self.syntax_error("factor expected")),
        }
    }

    // constant ::= NUM | REAL | CHAR_CONST
    fn constant(&mut self) -> Result<Type, CompileError> {
        let ty = match self.look {
            Some(Token::Num(_)) => Type::Int,
            Some(Token::Real(_)) => Type::Float,
            Some(Token::CharConst(_)) => Type::Char,
            _ => return Err(self.syntax_error("constant expected")),
        };
        self.advance()?;
        Ok(ty)
    }

    /// Type of `a <op> b` for an addop or mulop.
    fn binary_result(&self, op: Operator, a: Type, b: Type) -> Result<Type, CompileError> {
        if matches!(op, Operator::Or | Operator::And) {
            if a != Type::Bool || b != Type::Bool {
                return Err(self.semantic_error(SemanticErrorKind::BooleanOperands(op.symbol())));
            }
            return Ok(Type::Bool);
        }
        Type::arithmetic_result(a, b)
            .ok_or_else(|| self.semantic_error(SemanticErrorKind::IncompatibleArithmetic(a, b)))
    }

    fn require_bool(&self, ty: Type, what: &'static str) -> Result<(), CompileError> {
        if ty != Type::Bool {
            return Err(self.semantic_error(SemanticErrorKind::NotBoolean { what, found: ty }));
        }
        Ok(())
    }

    // Symbol table access, stamped with the current line

    fn declare(&mut self, name: &str, ty: Type) -> Result<(), CompileError> {
        self.symbols.declare(name, ty).map_err(|kind| self.semantic_error(kind))
    }

    fn lookup(&self, name: &str) -> Result<Type, CompileError> {
        self.symbols.lookup(name).map_err(|kind| self.semantic_error(kind))
    }

    fn enter_nesting(&mut self) -> Result<(), CompileError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.syntax_error("nesting too deep"));
        }
        self.nesting += 1;
        Ok(())
    }

    // Token helpers

    fn advance(&mut self) -> Result<(), CompileError> {
        self.look = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, expected: &Token) -> bool {
        self.look.as_ref() == Some(expected)
    }

    fn operator(&self) -> Option<Operator> {
        match self.look {
            Some(Token::Operator(op)) => Some(op),
            _ => None,
        }
    }

    fn at_type(&self) -> bool {
        matches!(
            self.look,
            Some(Token::Reserved(Keyword::Int | Keyword::Float | Keyword::Char))
        )
    }

    fn expect(&mut self, expected: Token) -> Result<(), CompileError> {
        if self.check(&expected) {
            self.advance()
        } else {
            Err(self.syntax_error(&format!("expected {}", expected.describe())))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), CompileError> {
        self.expect(Token::Reserved(keyword))
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        match &self.look {
            Some(Token::Id(name)) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.syntax_error("expected ID")),
        }
    }

    fn syntax_error(&self, message: &str) -> CompileError {
        let found = match &self.look {
            Some(token) => token.to_string(),
            None => "EOF".to_string(),
        };
        debug!(line = self.lexer.line(), message, %found, "syntax error");
        CompileError::Syntax { line: self.lexer.line(), message: message.to_string(), found }
    }

    fn semantic_error(&self, kind: SemanticErrorKind) -> CompileError {
        CompileError::Semantic { line: self.lexer.line(), kind }
    }

    #[cfg(test)]
    fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    #[cfg(test)]
    fn at_end(&self) -> bool {
        self.look.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_with<'a>(source: &'a str, vars: &[(&str, Type)]) -> Parser<std::str::Chars<'a>> {
        let mut parser = Parser::new(Lexer::new(source.chars())).unwrap();
        for (name, ty) in vars {
            parser.symbols_mut().declare(name, *ty).unwrap();
        }
        parser
    }

    fn expr_type(source: &str) -> Result<Type, CompileError> {
        let vars = [("i", Type::Int), ("f", Type::Float), ("c", Type::Char)];
        let mut parser = parser_with(source, &vars);
        let ty = parser.expression()?;
        assert!(parser.at_end(), "trailing input after {source:?}");
        Ok(ty)
    }

    fn semantic_kind(result: Result<Type, CompileError>) -> SemanticErrorKind {
        match result {
            Err(CompileError::Semantic { kind, .. }) => kind,
            other => panic!("expected semantic error, got {other:?}"),
        }
    }

    #[test]
    fn test_constant_types() {
        assert_eq!(expr_type("1").unwrap(), Type::Int);
        assert_eq!(expr_type("1.5").unwrap(), Type::Float);
        assert_eq!(expr_type("'x'").unwrap(), Type::Char);
        assert_eq!(expr_type("(c)").unwrap(), Type::Char);
    }

    #[test]
    fn test_arithmetic_promotion() {
        assert_eq!(expr_type("i + f").unwrap(), Type::Float);
        assert_eq!(expr_type("i * 2").unwrap(), Type::Int);
        assert_eq!(expr_type("c + i").unwrap(), Type::Int);
        assert_eq!(expr_type("2 / c").unwrap(), Type::Int);
        assert_eq!(expr_type("i - 1 + f * 2").unwrap(), Type::Float);
    }

    #[test]
    fn test_arithmetic_rejections() {
        assert_eq!(
            semantic_kind(expr_type("c + f")),
            SemanticErrorKind::IncompatibleArithmetic(Type::Char, Type::Float)
        );
        assert_eq!(
            semantic_kind(expr_type("(i < 1) + i")),
            SemanticErrorKind::IncompatibleArithmetic(Type::Bool, Type::Int)
        );
    }

    #[test]
    fn test_relational_results_are_bool() {
        assert_eq!(expr_type("i < f").unwrap(), Type::Bool);
        assert_eq!(expr_type("c == 65").unwrap(), Type::Bool);
        assert_eq!(expr_type("i + 1 >= f * 2").unwrap(), Type::Bool);
        assert_eq!(
            semantic_kind(expr_type("c != 1.0")),
            SemanticErrorKind::IncompatibleComparison(Type::Char, Type::Float)
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(expr_type("(i < 1) || (i > 9)").unwrap(), Type::Bool);
        assert_eq!(expr_type("(i < 1) && !(f > 2.0)").unwrap(), Type::Bool);
        assert_eq!(semantic_kind(expr_type("i || i")), SemanticErrorKind::BooleanOperands("||"));
        assert_eq!(semantic_kind(expr_type("(i < 1) && 1")), SemanticErrorKind::BooleanOperands("&&"));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(expr_type("-c").unwrap(), Type::Char);
        assert_eq!(expr_type("-f").unwrap(), Type::Float);
        assert_eq!(expr_type("!(i == 0)").unwrap(), Type::Bool);
        assert_eq!(
            semantic_kind(expr_type("!i")),
            SemanticErrorKind::NotBoolean { what: "operand of '!'", found: Type::Int }
        );
        assert_eq!(
            semantic_kind(expr_type("-(i < 0)")),
            SemanticErrorKind::NotNumericOrChar { what: "operand of unary '-'", found: Type::Bool }
        );
    }

    #[test]
    fn test_undeclared_identifier() {
        assert_eq!(
            semantic_kind(expr_type("i + missing")),
            SemanticErrorKind::Undeclared("missing".to_string())
        );
    }

    #[test]
    fn test_factor_expected() {
        match expr_type("i + ;") {
            Err(CompileError::Syntax { message, found, .. }) => {
                assert_eq!(message, "factor expected");
                assert_eq!(found, ";");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_statement_in_isolation() {
        let mut parser = parser_with("i = c + 1", &[("i", Type::Int), ("c", Type::Char)]);
        parser.stmt().unwrap();
        assert!(parser.at_end());

        let mut parser = parser_with("f = i", &[("i", Type::Int), ("f", Type::Float)]);
        match parser.stmt() {
            Err(CompileError::Semantic { kind, .. }) => assert_eq!(
                kind,
                SemanticErrorKind::AssignMismatch {
                    target: "f".to_string(),
                    declared: Type::Float,
                    found: Type::Int,
                }
            ),
            other => panic!("expected assignment mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_control_bodies_get_their_own_scope() {
        let mut parser = parser_with("while i < 3 do int: i; i = 1 end", &[("i", Type::Float)]);
        parser.stmt().unwrap();
        assert_eq!(parser.symbols_mut().depth(), 1);
        assert_eq!(parser.symbols_mut().lookup("i"), Ok(Type::Float));
    }

    #[test]
    fn test_nesting_limit() {
        let within = format!("{}i{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(expr_type(&within).unwrap(), Type::Int);

        let deep = format!("{}i{}", "(".repeat(20_000), ")".repeat(20_000));
        match expr_type(&deep) {
            Err(CompileError::Syntax { message, found, .. }) => {
                assert_eq!(message, "nesting too deep");
                assert_eq!(found, "(");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_boolean_condition() {
        let mut parser = parser_with("if i then i = 1 end", &[("i", Type::Int)]);
        match parser.stmt() {
            Err(CompileError::Semantic { kind, .. }) => assert_eq!(
                kind,
                SemanticErrorKind::NotBoolean { what: "condition of 'if'", found: Type::Int }
            ),
            other => panic!("expected semantic error, got {other:?}"),
        }
    }
}
