use std::collections::HashMap;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::core::{Value, ValueType},
    },
};

/// How a binding came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Declared by a statement.
    Local,
    /// Bound to an argument when a function was entered.
    Parameter,
}

/// A named, typed binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Current value; always of type `ty`.
    pub value:      Value,
    /// The type fixed at declaration.
    pub ty:         ValueType,
    /// Whether this is a local or a parameter.
    pub visibility: Visibility,
}

/// A single flat namespace with scope marks.
///
/// Every visible binding lives in one map, so a name can be bound at most
/// once at any time: an inner block can neither shadow nor redeclare a name
/// of an enclosing block. Opening a scope records how many bindings exist;
/// closing it removes, newest first, every binding made since.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    variables: HashMap<String, Variable>,
    order:     Vec<String>,
    scopes:    Vec<usize>,
}

impl SymbolTable {
    /// Creates an empty table at scope depth zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a new variable.
    ///
    /// # Errors
    /// - `RuntimeError::VariableRedeclaration` if `name` is already bound.
    /// - `RuntimeError::TypeMismatch` if `value` is not of type `ty`.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{
    ///     symbols::{SymbolTable, Visibility},
    ///     value::core::{Value, ValueType},
    /// };
    ///
    /// let mut symbols = SymbolTable::new();
    /// symbols.add_variable("x", ValueType::Int, Value::Int(1), Visibility::Local, 1).unwrap();
    ///
    /// assert!(symbols.add_variable("x", ValueType::Int, Value::Int(2), Visibility::Local, 2).is_err());
    /// assert_eq!(symbols.get("x").unwrap().value, Value::Int(1));
    /// ```
    pub fn add_variable(&mut self,
                        name: &str,
                        ty: ValueType,
                        value: Value,
                        visibility: Visibility,
                        line: usize)
                        -> EvalResult<()> {
        if self.variables.contains_key(name) {
            return Err(RuntimeError::VariableRedeclaration { name: name.to_string(),
                                                             line });
        }
        if value.value_type() != ty {
            return Err(RuntimeError::TypeMismatch { details: format!("cannot initialize {ty} '{name}' with {} '{value}'",
                                                                     value.value_type()),
                                                    line });
        }
        self.variables.insert(name.to_string(), Variable { value, ty, visibility });
        self.order.push(name.to_string());
        Ok(())
    }

    /// Replaces the value of an existing variable.
    ///
    /// On error the binding is left untouched.
    ///
    /// # Errors
    /// - `RuntimeError::UndeclaredVariable` if `name` is not bound.
    /// - `RuntimeError::TypeMismatch` if `value` differs from the declared
    ///   type.
    pub fn update_variable(&mut self, name: &str, value: Value, line: usize) -> EvalResult<()> {
        let variable = self.variables
                           .get_mut(name)
                           .ok_or_else(|| RuntimeError::UndeclaredVariable { name: name.to_string(),
                                                                             line })?;
        if value.value_type() != variable.ty {
            return Err(RuntimeError::TypeMismatch { details: format!("cannot assign {} '{value}' to {} '{name}'",
                                                                     value.value_type(),
                                                                     variable.ty),
                                                    line });
        }
        variable.value = value;
        Ok(())
    }

    /// Returns the binding for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Returns the binding for `name`.
    ///
    /// # Errors
    /// Returns `RuntimeError::UndeclaredVariable` if `name` is not bound.
    pub fn lookup(&self, name: &str, line: usize) -> EvalResult<&Variable> {
        self.variables.get(name).ok_or_else(|| RuntimeError::UndeclaredVariable { name: name.to_string(),
                                                                                   line })
    }

    /// Returns `true` if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Opens a scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(self.order.len());
    }

    /// Closes the innermost scope and returns how many bindings it removed.
    /// Closing with no open scope removes nothing.
    pub fn pop_scope(&mut self) -> usize {
        match self.scopes.pop() {
            Some(mark) => self.truncate(mark),
            None => 0,
        }
    }

    /// Closes scopes until `depth` remain open and returns how many bindings
    /// were removed.
    pub fn unwind_to(&mut self, depth: usize) -> usize {
        let mut removed = 0;
        while self.scopes.len() > depth {
            removed += self.pop_scope();
        }
        removed
    }

    /// Returns the number of open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Returns the number of visible bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates over the bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.order.iter().filter_map(|name| self.variables.get(name).map(|var| (name.as_str(), var)))
    }

    fn truncate(&mut self, mark: usize) -> usize {
        let removed = self.order.split_off(mark);
        for name in removed.iter().rev() {
            self.variables.remove(name);
        }
        removed.len()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;

    fn local(symbols: &mut SymbolTable, name: &str, value: Value) -> EvalResult<()> {
        symbols.add_variable(name, value.value_type(), value, Visibility::Local, 1)
    }

    #[test]
    fn pop_scope_removes_exactly_the_scope_bindings() {
        let mut symbols = SymbolTable::new();
        local(&mut symbols, "outer", Value::Int(1)).unwrap();
        let before = symbols.clone();

        symbols.push_scope();
        local(&mut symbols, "a", Value::Int(2)).unwrap();
        local(&mut symbols, "b", Value::from("x")).unwrap();
        assert_eq!(symbols.pop_scope(), 2);

        assert_eq!(symbols, before);
    }

    #[test]
    fn failed_update_leaves_the_table_unchanged() {
        let mut symbols = SymbolTable::new();
        local(&mut symbols, "n", Value::Int(4)).unwrap();
        let before = symbols.clone();

        let err = symbols.update_variable("n", Value::from("four"), 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(symbols, before);

        let err = symbols.update_variable("m", Value::Int(1), 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndeclaredVariable);
        assert_eq!(symbols, before);
    }

    #[test]
    fn inner_scopes_cannot_shadow() {
        let mut symbols = SymbolTable::new();
        local(&mut symbols, "x", Value::Int(1)).unwrap();
        symbols.push_scope();
        let err = local(&mut symbols, "x", Value::Int(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VariableRedeclaration);
    }

    #[test]
    fn unwind_closes_nested_scopes() {
        let mut symbols = SymbolTable::new();
        symbols.push_scope();
        local(&mut symbols, "a", Value::Int(1)).unwrap();
        symbols.push_scope();
        local(&mut symbols, "b", Value::Int(2)).unwrap();
        symbols.push_scope();

        assert_eq!(symbols.unwind_to(1), 1);
        assert_eq!(symbols.depth(), 1);
        assert_eq!(symbols.iter().map(|(name, _)| name).collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(symbols.pop_scope(), 1);
        assert_eq!(symbols.pop_scope(), 0);
        assert!(symbols.is_empty());
    }

    #[test]
    fn declaration_checks_the_value_type() {
        let mut symbols = SymbolTable::new();
        let err = symbols.add_variable("f", ValueType::Float, Value::Int(1), Visibility::Local, 2)
                         .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(!symbols.contains("f"));
    }
}
