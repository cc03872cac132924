use std::collections::HashMap;

use tracing::debug;

use super::Type;
use crate::error::SemanticErrorKind;

/// Stack of lexical scopes, innermost last.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Type>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
        debug!(depth = self.scopes.len(), "enter scope");
    }

    pub fn leave_scope(&mut self) {
        self.scopes.pop();
        debug!(depth = self.scopes.len(), "leave scope");
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declares `name` in the innermost scope, opening the global scope if
    /// none is open yet. Shadowing an outer declaration is allowed,
    /// redeclaring in the same scope is not.
    pub fn declare(&mut self, name: &str, ty: Type) -> Result<(), SemanticErrorKind> {
        if self.scopes.is_empty() {
            self.enter_scope();
        }
        let innermost = self.scopes.len() - 1;
        let scope = &mut self.scopes[innermost];
        if scope.contains_key(name) {
            return Err(SemanticErrorKind::AlreadyDeclared(name.to_string()));
        }
        debug!(name, %ty, "declare");
        scope.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Type, SemanticErrorKind> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .ok_or_else(|| SemanticErrorKind::Undeclared(name.to_string()))
    }
}
