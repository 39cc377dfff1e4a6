use std::{collections::HashMap, rc::Rc};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, LineState},
        line::NodeRef,
        program::Position,
        value::core::ValueType,
    },
};

/// A declared parameter of a user-defined function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Name the argument is bound to inside the body.
    pub name: String,
    /// Type every argument must have.
    pub ty:   ValueType,
}

/// A user-defined function.
///
/// Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// The function name.
    pub name:        String,
    /// Parameters in declaration order.
    pub parameters:  Vec<Parameter>,
    /// Type of the value the function returns; `null` for procedures.
    pub return_type: ValueType,
    /// The `{` that opens the body.
    pub entry:       Position,
    /// The `}` that closes the body.
    pub body_close:  Position,
    /// Source line of the definition.
    pub line:        usize,
}

/// All user-defined functions, by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Rc<Function>>,
}

impl FunctionTable {
    /// Registers a function.
    ///
    /// # Errors
    /// Returns `RuntimeError::FunctionRedefinition` if the name is taken.
    pub fn register(&mut self, function: Function) -> EvalResult<()> {
        if self.functions.contains_key(&function.name) {
            return Err(RuntimeError::FunctionRedefinition { name: function.name,
                                                            line: function.line, });
        }
        self.functions.insert(function.name.clone(), Rc::new(function));
        Ok(())
    }

    /// Returns the function registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<Function>> {
        self.functions.get(name).cloned()
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Returns the number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if no function is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// The tokens of a call expression in the caller's working line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// The function name.
    pub name:  NodeRef,
    /// The `)` closing the argument list.
    pub close: NodeRef,
}

/// An activation record.
///
/// Holds everything needed to resume the caller once the function returns:
/// the caller's partially reduced working line and the depths of the scope
/// and loop stacks at the time of the call.
#[derive(Debug, Clone)]
pub struct Call {
    /// The function being executed.
    pub function:    Rc<Function>,
    /// Program line of the call expression.
    pub called_from: usize,
    /// Where the result has to be spliced in.
    pub call_site:   CallSite,
    /// Open scopes before the body was entered.
    pub scope_depth: usize,
    /// Active loops before the body was entered.
    pub loop_depth:  usize,
    /// The caller's working line.
    pub saved:       LineState,
}

/// The stack of active calls. Its depth is the dynamic nesting depth of
/// function invocations.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    calls: Vec<Call>,
}

impl CallStack {
    /// Pushes a call.
    pub fn push(&mut self, call: Call) {
        self.calls.push(call);
    }

    /// Pops the innermost call.
    pub fn pop(&mut self) -> Option<Call> {
        self.calls.pop()
    }

    /// Returns the innermost call.
    #[must_use]
    pub fn last(&self) -> Option<&Call> {
        self.calls.last()
    }

    /// Returns the number of active calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns `true` outside of any function.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
