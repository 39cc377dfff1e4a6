use std::rc::Rc;

use tracing::debug;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        line::NodeRef,
        token::{Bracket, BracketKind, Keyword, Signal, TokenKind},
        value::core::{Value, ValueType},
    },
};

impl Context {
    /// Routes a selected keyword to its handler.
    pub(crate) fn dispatch_keyword(&mut self, at: NodeRef, keyword: Keyword) -> EvalResult<()> {
        match keyword {
            Keyword::If => self.eval_if(at),
            Keyword::Else => self.skip_else(at),
            Keyword::While => self.enter_while(at),
            Keyword::For => self.enter_for(at),
            Keyword::Goto => self.eval_goto(at),
            Keyword::Goback => self.eval_goback(at),
            Keyword::Def => self.define_function(at),
            Keyword::Return => self.eval_return(at),
            Keyword::System => self.eval_system(at),
            Keyword::Break => {
                self.raise_signal(at, Signal::Break);
                Ok(())
            },
            Keyword::Continue => {
                self.raise_signal(at, Signal::Continue);
                Ok(())
            },
        }
    }

    /// Handles `if <condition> {`.
    ///
    /// `if` ranks below everything else on its line, so the condition is a
    /// single reduced value by the time it acts. A true condition enters the
    /// block. A false one continues after the block, entering an `else`
    /// branch if one follows.
    fn eval_if(&mut self, at: NodeRef) -> EvalResult<()> {
        let token = self.state.line.get(at);
        let line = token.line;
        let condition = self.operand_after(at)?;
        if let Some(stray) = self.state
                                 .line
                                 .next(condition)
                                 .filter(|&next| !self.state.line.get(next).is_bracket(BracketKind::Scope, Bracket::Open))
        {
            let token = self.state.line.get(stray);
            return Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                            line:  token.line, });
        }
        let value = self.resolve(condition)?;
        let taken = match value {
            Value::Bool(taken) => taken,
            other => {
                return Err(RuntimeError::TypeMismatch { details: format!("if condition must be bool but is {} '{other}'",
                                                                         other.value_type()),
                                                        line });
            },
        };

        let block = self.program.block_open_after(self.here(at))?;
        debug!(line = self.state.index, taken, "if");
        if taken {
            self.jump_to(Some(block));
            return Ok(());
        }

        let close = self.program.matching_close(block)?;
        let target = match self.program.position_after(close) {
            Some(after) if self.program.token(after).is_keyword(Keyword::Else) => {
                self.program.position_after(after)
            },
            other => other,
        };
        self.jump_to(target);
        Ok(())
    }

    /// Handles an `else` reached by falling out of a taken `if` block: its
    /// own block is skipped.
    fn skip_else(&mut self, at: NodeRef) -> EvalResult<()> {
        let block = self.program.block_open_after(self.here(at))?;
        let close = self.program.matching_close(block)?;
        self.jump_to(self.program.position_after(close));
        Ok(())
    }

    /// Handles `goto <label>`.
    ///
    /// Remembers the current line for `goback`. Loops and blocks of the
    /// current function that do not contain the target are closed along with
    /// their scopes.
    fn eval_goto(&mut self, at: NodeRef) -> EvalResult<()> {
        let token = self.state.line.get(at);
        let line = token.line;
        let name = match self.state.line.next(at).map(|next| &self.state.line.get(next).kind) {
            Some(TokenKind::Identifier(name)) => name.clone(),
            _ => {
                return Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                                line });
            },
        };
        let target = self.program
                         .label(&name)
                         .ok_or(RuntimeError::UndefinedLabel { name, line })?;

        let keep = self.scopes_kept_by_goto(target)?;
        self.gotos.push(self.state.index);
        let depth = self.calls.len();
        self.loops.retain(|frame| frame.call_depth != depth || frame.contains_line(target));
        let removed = self.symbols.unwind_to(keep);
        self.blocks.retain(|block| block.depth <= keep);
        debug!(from = self.state.index,
               to = target,
               pending = self.gotos.len(),
               removed,
               "goto");
        self.load_line(target);
        Ok(())
    }

    /// Returns how many scopes stay open when the running function jumps to
    /// line `target`.
    fn scopes_kept_by_goto(&self, target: usize) -> EvalResult<usize> {
        let open = self.symbols.depth();
        let floor = self.calls.last().map_or(0, |call| call.scope_depth + 1);
        let depth = self.calls.len();

        let mut keep = open;
        for frame in self.loops
                         .iter()
                         .filter(|frame| frame.call_depth == depth && !frame.contains_line(target))
        {
            keep = keep.min(frame.scope_depth);
        }
        for block in self.blocks
                         .iter()
                         .filter(|block| block.depth > floor && block.depth <= open)
        {
            let close = self.program.matching_close(block.open)?;
            if target <= block.open.line || target > close.line {
                keep = keep.min(block.depth - 1);
            }
        }
        Ok(keep)
    }

    /// Handles `goback`: resumes on the line after the most recent `goto`.
    fn eval_goback(&mut self, at: NodeRef) -> EvalResult<()> {
        let line = self.state.line.get(at).line;
        let origin = self.gotos.pop().ok_or(RuntimeError::EmptyGotoStack { line })?;
        debug!(to = origin + 1, pending = self.gotos.len(), "goback");
        self.load_line(origin + 1);
        Ok(())
    }

    /// Handles `system <name> <args...>`.
    ///
    /// The name is an identifier, a type keyword or a string. The values that
    /// follow, commas aside, are the arguments; they end at the first token
    /// that is not a value, such as the `)` of an enclosing group. The result
    /// replaces the `system` expression, and a native without a result clears
    /// the line.
    fn eval_system(&mut self, at: NodeRef) -> EvalResult<()> {
        let token = self.state.line.get(at);
        let line = token.line;
        let (name_at, name) = match self.state.line.next(at).map(|next| (next, &self.state.line.get(next).kind)) {
            Some((next, TokenKind::Identifier(name) | TokenKind::Literal(Value::Str(name)))) => {
                (next, name.clone())
            },
            // `int` and `float` lex as type keywords.
            Some((next, TokenKind::Type(ty))) => (next, ty.name().to_string()),
            _ => {
                return Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                                line });
            },
        };

        let mut args = Vec::new();
        let mut last = name_at;
        for (next, token) in self.state.line.iter_from(name_at).skip(1) {
            match &token.kind {
                TokenKind::Comma => {},
                kind if kind.is_operand() => args.push(self.resolve_token(token)?),
                _ => break,
            }
            last = next;
        }

        let result = self.call_native(&name, &args, line)?;
        debug!(%name, args = args.len(), "system");
        match result {
            Some(value) => {
                while let Some(next) = self.state.line.next(at) {
                    self.state.line.remove(next);
                    if next == last {
                        break;
                    }
                }
                self.splice_value(at, value);
            },
            None => self.state.line.clear(),
        }
        Ok(())
    }

    /// Handles a `}`.
    ///
    /// Closes the block scope. The `}` of the innermost loop body ends the
    /// iteration; the `}` of the running function's body returns `null` from
    /// it.
    pub(crate) fn leave_scope(&mut self, at: NodeRef) -> EvalResult<()> {
        let line = self.state.line.get(at).line;
        self.state.line.remove(at);
        let removed = self.symbols.pop_scope();
        debug!(line = self.state.index, removed, "close scope");

        let index = self.state.index;
        let depth = self.calls.len();
        if self.loops
               .last()
               .is_some_and(|frame| frame.body_close.line == index && frame.call_depth == depth)
        {
            return self.end_iteration();
        }

        let Some(function) = self.calls
                                 .last()
                                 .filter(|call| call.function.body_close.line == index)
                                 .map(|call| Rc::clone(&call.function))
        else {
            return Ok(());
        };
        if function.return_type != ValueType::Null {
            return Err(RuntimeError::TypeMismatch { details: format!("'{}' reached the end of its body without returning {}",
                                                                     function.name,
                                                                     function.return_type),
                                                    line });
        }
        self.return_from_call(Value::Null, line)
    }
}
