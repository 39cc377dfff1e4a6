use std::{collections::HashMap, io::Write};

use tracing::{debug, trace};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::loops::LoopFrame,
        function::{CallStack, FunctionTable},
        line::{NodeRef, TokenLine},
        program::{Position, Program},
        symbols::SymbolTable,
        token::{Bracket, BracketKind, IdGenerator, Token, TokenId, TokenKind},
        value::core::Value,
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Host supplied settings for a run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Key/value pairs readable from scripts through `system property`.
    pub properties: HashMap<String, String>,
}

impl Config {
    /// Adds a property and returns the updated configuration.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::evaluator::core::Config;
    ///
    /// let config = Config::default().with_property("mode", "test");
    /// assert_eq!(config.properties["mode"], "test");
    /// ```
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// What the line being reduced is for, which decides what happens once it
/// runs out of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineRole {
    /// An ordinary statement; execution continues on the next line.
    #[default]
    Statement,
    /// The initializer of a `for` header.
    LoopInit,
    /// A loop condition; its result decides whether the body runs.
    LoopCondition,
    /// The step of a `for` header.
    LoopStep,
}

/// The working copy of the line being reduced.
#[derive(Debug, Clone, Default)]
pub struct LineState {
    /// Index of the program line the copy was taken from.
    pub index:    usize,
    /// The working copy.
    pub line:     TokenLine,
    /// What the line is for.
    pub role:     LineRole,
    /// A token that must be acted on before asking for the highest priority.
    pub selected: Option<NodeRef>,
}

impl LineState {
    fn statement(index: usize, line: TokenLine) -> Self {
        Self { index,
               line,
               role: LineRole::Statement,
               selected: None }
    }
}

/// A block scope opened by a `{` reached in normal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBlock {
    /// Scope depth right after the block was opened.
    pub depth: usize,
    /// The `{` that opened it.
    pub open:  Position,
}

/// Stores the runtime state of a program.
///
/// The interpreter never recurses on the host stack. Every construct that
/// needs to come back somewhere (loops, calls, `goto`) pushes an explicit
/// frame, and [`Context::step`] performs exactly one reduction or transfer of
/// control at a time.
///
/// ## Usage
///
/// A `Context` is created from a loaded [`Program`] and driven by
/// [`Context::run`], or one step at a time by [`Context::step`] until
/// [`Context::is_finished`] reports `true`.
pub struct Context {
    pub(crate) program:    Program,
    pub(crate) symbols:    SymbolTable,
    pub(crate) functions:  FunctionTable,
    pub(crate) calls:      CallStack,
    pub(crate) gotos:      Vec<usize>,
    pub(crate) loops:      Vec<LoopFrame>,
    pub(crate) blocks:     Vec<OpenBlock>,
    pub(crate) state:      LineState,
    pub(crate) ids:        IdGenerator,
    pub(crate) output:     Box<dyn Write>,
    pub(crate) properties: HashMap<String, String>,
    finished:              bool,
}

impl Context {
    /// Creates a context that prints to standard output.
    #[must_use]
    pub fn new(program: Program) -> Self {
        Self::with_config(program, Config::default(), Box::new(std::io::stdout()))
    }

    /// Creates a context with explicit settings and output sink.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{
    ///     evaluator::core::{Config, Context},
    ///     program::Program,
    ///     value::core::Value,
    /// };
    ///
    /// let program = Program::from_source("int x = 2 + 3 * 4").unwrap();
    /// let mut context = Context::with_config(program, Config::default(), Box::new(std::io::sink()));
    /// context.run().unwrap();
    ///
    /// assert_eq!(context.variable("x"), Some(&Value::Int(14)));
    /// ```
    #[must_use]
    pub fn with_config(program: Program, config: Config, output: Box<dyn Write>) -> Self {
        let ids = IdGenerator::starting_at(program.next_id());
        let mut context = Self { program,
                                 symbols: SymbolTable::new(),
                                 functions: FunctionTable::default(),
                                 calls: CallStack::default(),
                                 gotos: Vec::new(),
                                 loops: Vec::new(),
                                 blocks: Vec::new(),
                                 state: LineState::default(),
                                 ids,
                                 output,
                                 properties: config.properties,
                                 finished: false };
        context.load_line(0);
        context
    }

    /// Runs the program to completion.
    ///
    /// # Errors
    /// Returns the first [`RuntimeError`] raised; execution stops there.
    pub fn run(&mut self) -> EvalResult<()> {
        while !self.finished {
            self.step()?;
        }
        self.output
            .flush()
            .map_err(|e| RuntimeError::UnhandledOperation { details: format!("cannot flush output: {e}"),
                                                            line:    0, })
    }

    /// Performs a single reduction or control transfer.
    ///
    /// # Errors
    /// Returns the [`RuntimeError`] raised by the reduction.
    pub fn step(&mut self) -> EvalResult<()> {
        if self.finished {
            return Ok(());
        }
        if self.state.line.is_empty() {
            return self.complete_line(None);
        }

        let selected = self.state
                           .selected
                           .take()
                           .filter(|&at| {
                               self.state.line.contains(at) && !self.state.line.get(at).kind.is_inert()
                           })
                           .or_else(|| self.state.line.highest_priority());
        let Some(at) = selected else {
            return self.complete_line(None);
        };

        let token = self.state.line.get(at);
        if token.kind.is_inert() {
            return match self.state.line.next(at).or_else(|| self.state.line.prev(at)) {
                None => {
                    let token = self.state.line.remove(at);
                    self.complete_line(Some(token))
                },
                Some(other) => {
                    let stray = self.state.line.get(other);
                    Err(RuntimeError::UnrecognizedOperator { token: stray.to_string(),
                                                             line:  stray.line, })
                },
            };
        }

        trace!(line = self.state.index,
               token = %token,
               priority = token.priority,
               working = %self.state.line,
               "reducing");
        self.dispatch(at)
    }

    fn dispatch(&mut self, at: NodeRef) -> EvalResult<()> {
        let token = self.state.line.get(at);
        match token.kind.clone() {
            TokenKind::Bracket(BracketKind::Scope, Bracket::Open) => {
                let open = self.here(at);
                self.state.line.remove(at);
                self.open_scope(Some(open));
                Ok(())
            },
            TokenKind::Bracket(BracketKind::Scope, Bracket::Close) => self.leave_scope(at),
            TokenKind::Bracket(kind, Bracket::Open) => self.reduce_bracket(at, kind),
            TokenKind::Operator(op) if op.is_assignment() => self.reduce_assignment(at, op),
            TokenKind::Operator(op) if op.is_unary() => self.reduce_unary(at, op),
            TokenKind::Operator(op) => self.reduce_binary(at, op),
            TokenKind::Type(ty) => self.reduce_declaration(at, ty),
            TokenKind::FString(template) => self.expand_fstring(at, &template),
            TokenKind::Keyword(keyword) => self.dispatch_keyword(at, keyword),
            _ => Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                          line:  token.line, }),
        }
    }

    /// Decides what happens once the working line has been reduced to at most
    /// one inert token.
    pub(crate) fn complete_line(&mut self, result: Option<Token>) -> EvalResult<()> {
        match self.state.role {
            LineRole::Statement => match result {
                Some(Token { kind: TokenKind::Signal(signal),
                             line,
                             .. }) => self.loop_signal(signal, line),
                _ => {
                    self.load_line(self.state.index + 1);
                    Ok(())
                },
            },
            LineRole::LoopInit | LineRole::LoopStep => self.check_loop_condition(),
            LineRole::LoopCondition => self.conclude_condition(result),
        }
    }

    /// Makes a fresh copy of program line `index` the working line, or
    /// finishes the run past the last line.
    pub(crate) fn load_line(&mut self, index: usize) {
        match self.program.line(index) {
            Some(line) => self.state = LineState::statement(index, line.copy()),
            None => self.finish(),
        }
    }

    /// Continues execution at `target`; tokens before it on its line are
    /// dropped. `None` finishes the run.
    pub(crate) fn jump_to(&mut self, target: Option<Position>) {
        let Some(target) = target else {
            self.finish();
            return;
        };
        let mut line = self.program.lines()[target.line].copy();
        if let Some(before) = line.prev(target.token) {
            line.remove_until(before);
        }
        // A block brace we jump onto is entered right away.
        let selected = line.get(target.token)
                           .is_bracket(BracketKind::Scope, Bracket::Open)
                           .then_some(target.token);
        debug!(line = target.line, "jump");
        self.state = LineState { index: target.line,
                                 line,
                                 role: LineRole::Statement,
                                 selected };
    }

    fn finish(&mut self) {
        debug!(scopes = self.symbols.depth(), calls = self.calls.len(), "program finished");
        self.state = LineState::default();
        self.finished = true;
    }

    pub(crate) const fn fresh_id(&mut self) -> TokenId {
        self.ids.fresh()
    }

    /// Replaces the token at `at` with a literal holding `value`.
    pub(crate) fn splice_value(&mut self, at: NodeRef, value: Value) {
        let line = self.state.line.get(at).line;
        let id = self.fresh_id();
        self.state.line.replace(at, Token::literal(value, id, line));
    }

    /// Returns the value an operand token stands for.
    ///
    /// # Errors
    /// - `RuntimeError::UndeclaredVariable` for unknown names.
    /// - `RuntimeError::UnrecognizedOperator` for tokens that are not operands.
    pub(crate) fn resolve_token(&self, token: &Token) -> EvalResult<Value> {
        match &token.kind {
            TokenKind::Literal(value) => Ok(value.clone()),
            TokenKind::Identifier(name) => self.lookup_value(name, token.line),
            _ => Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                          line:  token.line, }),
        }
    }

    pub(crate) fn resolve(&self, at: NodeRef) -> EvalResult<Value> {
        self.resolve_token(self.state.line.get(at))
    }

    /// Looks `name` up as a variable, falling back to a reference to the
    /// user-defined function of that name.
    pub(crate) fn lookup_value(&self, name: &str, line: usize) -> EvalResult<Value> {
        if let Some(variable) = self.symbols.get(name) {
            return Ok(variable.value.clone());
        }
        if self.functions.contains(name) {
            return Ok(Value::Def(name.to_string()));
        }
        Err(RuntimeError::UndeclaredVariable { name: name.to_string(),
                                               line })
    }

    /// Returns the operand directly before `op`.
    pub(crate) fn operand_before(&self, op: NodeRef) -> EvalResult<NodeRef> {
        self.expect_operand(op, self.state.line.prev(op))
    }

    /// Returns the operand directly after `op`.
    pub(crate) fn operand_after(&self, op: NodeRef) -> EvalResult<NodeRef> {
        self.expect_operand(op, self.state.line.next(op))
    }

    fn expect_operand(&self, op: NodeRef, candidate: Option<NodeRef>) -> EvalResult<NodeRef> {
        candidate.filter(|&at| self.state.line.get(at).kind.is_operand())
                 .ok_or_else(|| {
                     let token = self.state.line.get(op);
                     RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                          line:  token.line, }
                 })
    }

    /// Returns the position of `at` in the program.
    pub(crate) const fn here(&self, at: NodeRef) -> Position {
        Position { line:  self.state.index,
                   token: at, }
    }

    /// Opens a scope. Block scopes record their `{`; loop and call scopes
    /// pass `None`.
    pub(crate) fn open_scope(&mut self, open: Option<Position>) {
        self.symbols.push_scope();
        let depth = self.symbols.depth();
        self.blocks.retain(|block| block.depth < depth);
        if let Some(open) = open {
            self.blocks.push(OpenBlock { depth, open });
        }
    }

    /// Returns `true` once the last line has completed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the program being executed.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the current value of a variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name).map(|variable| &variable.value)
    }

    /// Returns the symbol table.
    #[must_use]
    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Returns the table of user-defined functions.
    #[must_use]
    pub const fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Returns the number of active function calls.
    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.calls.len()
    }

    /// Returns the number of pending `goto` origins.
    #[must_use]
    pub fn goto_depth(&self) -> usize {
        self.gotos.len()
    }

    /// Returns the number of active loops.
    #[must_use]
    pub fn loop_depth(&self) -> usize {
        self.loops.len()
    }

    /// Returns the number of open scopes.
    #[must_use]
    pub fn scope_depth(&self) -> usize {
        self.symbols.depth()
    }

    /// Returns the index of the program line being executed, `None` once
    /// finished.
    #[must_use]
    pub const fn current_line(&self) -> Option<usize> {
        if self.finished { None } else { Some(self.state.index) }
    }

    /// Returns the working copy of the current line.
    #[must_use]
    pub const fn working_line(&self) -> &TokenLine {
        &self.state.line
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn context(source: &str) -> Context {
        let program = Program::from_source(source).unwrap();
        Context::with_config(program, Config::default(), Box::new(std::io::sink()))
    }

    #[test]
    fn each_step_performs_one_reduction() {
        let mut context = context("x = 2 + 3 * 4");
        context.step().unwrap();
        assert_eq!(context.working_line().to_string(), "x = 2 + 12");
        context.step().unwrap();
        assert_eq!(context.working_line().to_string(), "x = 14");
        context.step().unwrap();
        assert_eq!(context.working_line().to_string(), "14");
        context.step().unwrap();
        assert!(context.is_finished());
        assert_eq!(context.variable("x"), Some(&Value::Int(14)));
    }

    #[test]
    fn two_values_side_by_side_are_rejected() {
        let mut context = context("1 2");
        let err = context.run().unwrap_err();
        assert_eq!(err,
                   RuntimeError::UnrecognizedOperator { token: "2".into(),
                                                        line:  1, });
    }

    #[test]
    fn empty_program_finishes_immediately() {
        let context = context("// nothing here");
        assert!(context.is_finished());
        assert_eq!(context.current_line(), None);
    }

    #[test]
    fn run_leaves_no_open_frames() {
        let mut context = context("int i = 0\nwhile i < 3 {\ni += 1\n}");
        context.run().unwrap();
        assert_eq!(context.scope_depth(), 0);
        assert_eq!(context.loop_depth(), 0);
        assert_eq!(context.call_depth(), 0);
        assert_eq!(context.variable("i"), Some(&Value::Int(3)));
    }
}
