use std::rc::Rc;

use tracing::debug;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        function::{Call, CallSite, Function, Parameter},
        line::{NodeRef, TokenLine},
        program::Position,
        symbols::{Variable, Visibility},
        token::{Bracket, BracketKind, TokenKind},
        value::core::{Value, ValueType},
    },
};

impl Context {
    /// Handles `def <type> name(<type> <name>, ...) { ... }`.
    ///
    /// Registers the function and continues after its body; the body only
    /// runs when the function is called. Commas between parameters are
    /// optional.
    pub(crate) fn define_function(&mut self, at: NodeRef) -> EvalResult<()> {
        let header = self.state.index;
        let line = &self.program.lines()[header];
        let line_no = line.get(at).line;
        let malformed = || RuntimeError::UnrecognizedOperator { token: "def".to_string(),
                                                                line:  line_no, };

        let ret_at = line.next(at).ok_or_else(malformed)?;
        let return_type = match &line.get(ret_at).kind {
            TokenKind::Type(ty) => *ty,
            TokenKind::Literal(Value::Null) => ValueType::Null,
            _ => return Err(malformed()),
        };
        let name_at = line.next(ret_at).ok_or_else(malformed)?;
        let TokenKind::Identifier(name) = &line.get(name_at).kind else {
            return Err(malformed());
        };
        let open = line.next(name_at)
                       .filter(|&open| line.get(open).is_bracket(BracketKind::Call, Bracket::Open))
                       .ok_or_else(malformed)?;
        let close = line.matching_close(open)
                        .ok_or_else(|| RuntimeError::UnterminatedBracket { bracket: "(".to_string(),
                                                                            line:    line_no, })?;
        let parameters = parse_parameters(line, open, close, line_no)?;

        let entry = self.program.block_open_after(Position { line:  header,
                                                             token: close, })?;
        let body_close = self.program.matching_close(entry)?;
        let function = Function { name: name.clone(),
                                  parameters,
                                  return_type,
                                  entry,
                                  body_close,
                                  line: line_no };
        debug!(name = %function.name,
               parameters = function.parameters.len(),
               returns = %function.return_type,
               "defined function");

        self.functions.register(function)?;
        self.jump_to(self.program.position_after(body_close));
        Ok(())
    }

    /// Calls the function whose fully reduced argument list is enclosed by
    /// `open` and `close`.
    ///
    /// The caller's working line is saved in the activation record and
    /// execution continues at the first statement of the body.
    pub(crate) fn invoke(&mut self, open: NodeRef, close: NodeRef) -> EvalResult<()> {
        let line_no = self.state.line.get(open).line;
        let (name_at, name) = match self.state.line.prev(open).map(|at| (at, &self.state.line.get(at).kind)) {
            Some((at, TokenKind::Identifier(name))) => (at, name.clone()),
            _ => {
                return Err(RuntimeError::UnrecognizedOperator { token: "(".to_string(),
                                                                line:  line_no, });
            },
        };
        let arguments = self.call_arguments(open, close)?;
        let function = self.resolve_function(&name, line_no)?;

        if arguments.len() != function.parameters.len() {
            return Err(RuntimeError::ArgumentCountMismatch { name:     function.name.clone(),
                                                             expected: function.parameters.len(),
                                                             found:    arguments.len(),
                                                             line:     line_no, });
        }
        for (parameter, argument) in function.parameters.iter().zip(&arguments) {
            if argument.value_type() != parameter.ty {
                return Err(RuntimeError::TypeMismatch { details: format!("parameter '{}' of '{}' expects {} but got {} '{argument}'",
                                                                         parameter.name,
                                                                         function.name,
                                                                         parameter.ty,
                                                                         argument.value_type()),
                                                        line:    line_no, });
            }
        }

        let saved = std::mem::take(&mut self.state);
        self.calls.push(Call { function: Rc::clone(&function),
                               called_from: saved.index,
                               call_site: CallSite { name:  name_at,
                                                     close, },
                               scope_depth: self.symbols.depth(),
                               loop_depth: self.loops.len(),
                               saved });
        self.open_scope(None);
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            self.symbols.add_variable(&parameter.name,
                                      parameter.ty,
                                      argument,
                                      Visibility::Parameter,
                                      line_no)?;
        }
        debug!(name = %function.name, depth = self.calls.len(), "call");

        self.jump_to(self.program.position_after(function.entry));
        Ok(())
    }

    /// Handles `return` and `return <value>`.
    pub(crate) fn eval_return(&mut self, at: NodeRef) -> EvalResult<()> {
        let line_no = self.state.line.get(at).line;
        let value = match self.state.line.next(at) {
            None => Value::Null,
            Some(operand) => {
                if let Some(stray) = self.state.line.next(operand) {
                    let token = self.state.line.get(stray);
                    return Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                                    line:  token.line, });
                }
                self.resolve(operand)?
            },
        };
        self.return_from_call(value, line_no)
    }

    /// Leaves the innermost call with `value`.
    ///
    /// Closes every scope and loop opened since the call, restores the
    /// caller's working line and replaces `name(args)` in it with the value.
    pub(crate) fn return_from_call(&mut self, value: Value, line: usize) -> EvalResult<()> {
        let call = self.calls.pop().ok_or(RuntimeError::EmptyCallStack { line })?;
        let function = &call.function;
        if value.value_type() != function.return_type {
            return Err(RuntimeError::TypeMismatch { details: format!("'{}' must return {} but returned {} '{value}'",
                                                                     function.name,
                                                                     function.return_type,
                                                                     value.value_type()),
                                                    line });
        }

        let removed = self.symbols.unwind_to(call.scope_depth);
        self.loops.truncate(call.loop_depth);
        debug!(name = %function.name,
               %value,
               removed,
               resume = call.called_from,
               "return");

        self.state = call.saved;
        let CallSite { name, close } = call.call_site;
        while let Some(at) = self.state.line.next(name) {
            self.state.line.remove(at);
            if at == close {
                break;
            }
        }
        self.splice_value(name, value);
        Ok(())
    }

    /// Finds the function a call names. A variable holding a function
    /// reference calls the function it refers to.
    fn resolve_function(&self, name: &str, line: usize) -> EvalResult<Rc<Function>> {
        let target = match self.symbols.get(name) {
            Some(Variable { value: Value::Def(target),
                            .. }) => target.as_str(),
            _ => name,
        };
        self.functions
            .get(target)
            .ok_or_else(|| RuntimeError::UndefinedFunction { name: target.to_string(),
                                                             line })
    }

    /// Resolves the comma separated, fully reduced arguments of a call.
    fn call_arguments(&self, open: NodeRef, close: NodeRef) -> EvalResult<Vec<Value>> {
        let mut values = Vec::new();
        let mut expecting = true;

        for (at, token) in self.state.line.iter_from(open).skip(1) {
            if at == close {
                if expecting && !values.is_empty() {
                    return Err(RuntimeError::UnrecognizedOperator { token: ",".to_string(),
                                                                    line:  token.line, });
                }
                return Ok(values);
            }
            match (&token.kind, expecting) {
                (TokenKind::Comma, false) => expecting = true,
                (kind, true) if kind.is_operand() => {
                    values.push(self.resolve_token(token)?);
                    expecting = false;
                },
                _ => {
                    return Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                                    line:  token.line, });
                },
            }
        }

        Err(RuntimeError::UnterminatedBracket { bracket: "(".to_string(),
                                                line:    self.state.line.get(open).line, })
    }
}

/// Reads `<type> <name>` pairs between the parentheses of a definition.
fn parse_parameters(line: &TokenLine,
                    open: NodeRef,
                    close: NodeRef,
                    line_no: usize)
                    -> EvalResult<Vec<Parameter>> {
    let mut parameters: Vec<Parameter> = Vec::new();
    let mut pending = None;

    for (at, token) in line.iter_from(open).skip(1) {
        if at == close {
            break;
        }
        match (&token.kind, pending) {
            (TokenKind::Comma, None) => {},
            (TokenKind::Type(ty), None) => pending = Some(*ty),
            (TokenKind::Identifier(name), Some(ty)) => {
                if parameters.iter().any(|p| p.name == *name) {
                    return Err(RuntimeError::VariableRedeclaration { name: name.clone(),
                                                                     line: line_no, });
                }
                parameters.push(Parameter { name: name.clone(),
                                            ty });
                pending = None;
            },
            _ => {
                return Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                                line:  line_no, });
            },
        }
    }

    match pending {
        Some(ty) => Err(RuntimeError::UnrecognizedOperator { token: ty.to_string(),
                                                             line:  line_no, }),
        None => Ok(parameters),
    }
}
