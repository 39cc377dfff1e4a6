use tracing::debug;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult, LineRole, LineState},
        line::NodeRef,
        program::Position,
        token::{Bracket, BracketKind, Signal, Token, TokenKind},
    },
};

/// Which loop construct a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// `while <condition> { ... }`
    While,
    /// `for (<init>; <condition>; <step>) { ... }`
    For,
}

/// A token range `first..=last` inside the loop's header line.
pub type HeaderRange = (NodeRef, NodeRef);

/// Bookkeeping for one active loop.
///
/// Header parts are stored as ranges of the pristine header line and
/// evaluated from fresh copies each time, so every iteration sees the
/// original tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopFrame {
    /// The construct.
    pub kind:        LoopKind,
    /// Program line holding the loop keyword.
    pub header:      usize,
    /// `for` initializer.
    pub init:        Option<HeaderRange>,
    /// Loop condition; a missing condition ends the loop.
    pub condition:   Option<HeaderRange>,
    /// `for` step.
    pub step:        Option<HeaderRange>,
    /// The `{` opening the body.
    pub body_open:   Position,
    /// The `}` closing the body.
    pub body_close:  Position,
    /// Open scopes before the loop scope was pushed.
    pub scope_depth: usize,
    /// Active calls when the loop started.
    pub call_depth:  usize,
}

impl LoopFrame {
    /// Returns `true` if `line` lies inside the loop body.
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line > self.header && line <= self.body_close.line
    }
}

impl Context {
    /// Handles `while <condition> {`.
    ///
    /// Opens the loop scope, pushes a frame and evaluates the condition.
    pub(crate) fn enter_while(&mut self, at: NodeRef) -> EvalResult<()> {
        let header = self.state.index;
        let body_open = self.program.block_open_after(self.here(at))?;
        let body_close = self.program.matching_close(body_open)?;

        let line = &self.program.lines()[header];
        let first = line.next(at).filter(|&first| first != body_open.token);
        let last = if body_open.line == header {
            line.prev(body_open.token)
        } else {
            line.last()
        };
        let condition = first.zip(last).filter(|&(_, last)| last != at);

        self.push_loop(LoopFrame { kind: LoopKind::While,
                                   header,
                                   init: None,
                                   condition,
                                   step: None,
                                   body_open,
                                   body_close,
                                   scope_depth: self.symbols.depth(),
                                   call_depth: self.calls.len() });
        self.check_loop_condition()
    }

    /// Handles `for (<init>; <condition>; <step>) {`.
    ///
    /// Each of the three header parts may be empty.
    pub(crate) fn enter_for(&mut self, at: NodeRef) -> EvalResult<()> {
        let header = self.state.index;
        let line = &self.program.lines()[header];
        let line_no = line.get(at).line;
        let malformed = || RuntimeError::UnrecognizedOperator { token: "for".to_string(),
                                                                line:  line_no, };

        let open = line.next(at)
                       .filter(|&open| line.get(open).is_bracket(BracketKind::Paren, Bracket::Open))
                       .ok_or_else(malformed)?;
        let close = line.matching_close(open)
                        .ok_or_else(|| RuntimeError::UnterminatedBracket { bracket: "(".to_string(),
                                                                            line:    line_no, })?;

        let mut parts = Vec::with_capacity(3);
        let mut part: Option<HeaderRange> = None;
        for (token_at, token) in line.iter_from(open).skip(1) {
            if token_at == close || token.kind == TokenKind::Semicolon {
                parts.push(part.take());
                if token_at == close {
                    break;
                }
                continue;
            }
            part = Some(part.map_or((token_at, token_at), |(first, _)| (first, token_at)));
        }
        let [init, condition, step] = parts[..] else {
            return Err(malformed());
        };

        let body_open = self.program.block_open_after(Position { line:  header,
                                                                 token: close, })?;
        let body_close = self.program.matching_close(body_open)?;

        self.push_loop(LoopFrame { kind: LoopKind::For,
                                   header,
                                   init,
                                   condition,
                                   step,
                                   body_open,
                                   body_close,
                                   scope_depth: self.symbols.depth(),
                                   call_depth: self.calls.len() });
        match init {
            Some(range) => {
                self.run_header_part(header, range, LineRole::LoopInit);
                Ok(())
            },
            None => self.check_loop_condition(),
        }
    }

    fn push_loop(&mut self, frame: LoopFrame) {
        debug!(kind = ?frame.kind,
               header = frame.header,
               body_close = frame.body_close.line,
               "enter loop");
        self.open_scope(None);
        self.loops.push(frame);
    }

    /// Makes a fresh copy of part of a loop header the working line.
    fn run_header_part(&mut self, header: usize, (first, last): HeaderRange, role: LineRole) {
        let mut line = self.program.lines()[header].copy();
        line.narrow(first, last);
        self.state = LineState { index: header,
                                 line,
                                 role,
                                 selected: None };
    }

    /// Evaluates the condition of the innermost loop, or leaves the loop if
    /// it has none.
    pub(crate) fn check_loop_condition(&mut self) -> EvalResult<()> {
        let Some((header, condition)) = self.loops.last().map(|frame| (frame.header, frame.condition)) else {
            return Ok(());
        };
        match condition {
            Some(range) => {
                self.run_header_part(header, range, LineRole::LoopCondition);
                Ok(())
            },
            None => self.exit_loop(),
        }
    }

    /// Acts on the reduced condition: a `true` enters the body, a `false`
    /// or an empty result leaves the loop.
    ///
    /// # Errors
    /// Returns `RuntimeError::TypeMismatch` for a result that is not a
    /// boolean.
    pub(crate) fn conclude_condition(&mut self, result: Option<Token>) -> EvalResult<()> {
        let Some(token) = result else {
            return self.exit_loop();
        };
        let value = self.resolve_token(&token)?;
        if !value.as_bool(token.line)? {
            return self.exit_loop();
        }
        let Some(body_open) = self.loops.last().map(|frame| frame.body_open) else {
            return Ok(());
        };
        self.jump_to(Some(body_open));
        Ok(())
    }

    /// Pops the innermost loop, closes its scopes and continues after its
    /// body.
    pub(crate) fn exit_loop(&mut self) -> EvalResult<()> {
        let Some(frame) = self.loops.pop() else {
            return Ok(());
        };
        let removed = self.symbols.unwind_to(frame.scope_depth);
        debug!(header = frame.header, removed, "exit loop");
        self.jump_to(self.program.position_after(frame.body_close));
        Ok(())
    }

    /// Finishes an iteration: closes the body scopes, then runs the step (if
    /// any) and the condition.
    pub(crate) fn end_iteration(&mut self) -> EvalResult<()> {
        let Some(frame) = self.loops.last() else {
            return Ok(());
        };
        let (header, step) = (frame.header, frame.step);
        self.symbols.unwind_to(frame.scope_depth + 1);
        match step {
            Some(range) => {
                self.run_header_part(header, range, LineRole::LoopStep);
                Ok(())
            },
            None => self.check_loop_condition(),
        }
    }

    /// Handles `break` and `continue`: the line is replaced by a marker that
    /// takes effect when the statement completes.
    pub(crate) fn raise_signal(&mut self, at: NodeRef, signal: Signal) {
        let line = self.state.line.get(at).line;
        let id = self.fresh_id();
        self.state.line.clear();
        self.state.line.append(Token::new(TokenKind::Signal(signal), id, line));
    }

    /// Applies a completed `break` or `continue` to the innermost loop.
    ///
    /// # Errors
    /// Returns `RuntimeError::UnhandledOperation` when no loop of the current
    /// function is active.
    pub(crate) fn loop_signal(&mut self, signal: Signal, line: usize) -> EvalResult<()> {
        let depth = self.calls.len();
        if !self.loops.last().is_some_and(|frame| frame.call_depth == depth) {
            let keyword = match signal {
                Signal::Break => "break",
                Signal::Continue => "continue",
            };
            return Err(RuntimeError::UnhandledOperation { details: format!("'{keyword}' outside of a loop"),
                                                          line });
        }
        match signal {
            Signal::Break => self.exit_loop(),
            Signal::Continue => self.end_iteration(),
        }
    }
}
