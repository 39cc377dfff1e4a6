use tracing::trace;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        line::NodeRef,
        symbols::Visibility,
        token::{BracketKind, Operator, Token, TokenKind, priority},
        value::core::{Value, ValueType},
    },
};

/// A piece of an f-string template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Name(String),
}

impl Context {
    /// Reduces `left op right` to a single literal.
    pub(crate) fn reduce_binary(&mut self, at: NodeRef, op: Operator) -> EvalResult<()> {
        let left = self.operand_before(at)?;
        let right = self.operand_after(at)?;
        let line = self.state.line.get(at).line;

        let result = Self::eval_binary(op, &self.resolve(left)?, &self.resolve(right)?, line)?;
        trace!(%op, %result, "binary");

        self.splice_value(at, result);
        self.state.line.remove(left);
        self.state.line.remove(right);
        Ok(())
    }

    /// Reduces `op operand` to a single literal.
    ///
    /// A `-` whose operand is the base of a `**` drops just below that `**`
    /// and waits, so `-2 ** 2` is `-4` while `2 ** -1` still negates first.
    pub(crate) fn reduce_unary(&mut self, at: NodeRef, op: Operator) -> EvalResult<()> {
        let operand = self.operand_after(at)?;
        let line = self.state.line.get(at).line;

        if op == Operator::Negate
           && let Some(pow) = self.state
                                  .line
                                  .next(operand)
                                  .map(|next| self.state.line.get(next))
                                  .filter(|token| matches!(token.kind, TokenKind::Operator(Operator::Pow)))
                                  .map(|token| token.priority)
           && self.state.line.get(at).priority >= pow
        {
            trace!(line, priority = pow - 1, "negation waits for '**'");
            self.state.line.get_mut(at).priority = pow - 1;
            return Ok(());
        }

        let result = Self::eval_unary(op, &self.resolve(operand)?, line)?;

        self.splice_value(at, result);
        self.state.line.remove(operand);
        Ok(())
    }

    /// Handles a selected `(`.
    ///
    /// The first selection boosts everything up to the partner `)` so the
    /// contents reduce before anything outside. Once selected again the
    /// contents are fully reduced: a group must hold exactly one value, a
    /// call bracket invokes its function.
    pub(crate) fn reduce_bracket(&mut self, open: NodeRef, kind: BracketKind) -> EvalResult<()> {
        let token = self.state.line.get(open);
        let line = token.line;
        let close = self.state.line
                        .matching_close(open)
                        .ok_or_else(|| RuntimeError::UnterminatedBracket { bracket: "(".to_string(),
                                                                            line })?;

        if !token.expanded {
            self.state.line.boost_between(open, close, priority::BRACKET_BOOST);
            self.state.line.get_mut(open).expanded = true;
            return Ok(());
        }

        if kind == BracketKind::Call {
            return self.invoke(open, close);
        }

        match self.state.line.next(open) {
            Some(inner) if inner != close && self.state.line.next(inner) == Some(close) => {
                if !self.state.line.get(inner).kind.is_operand() {
                    let token = self.state.line.get(inner);
                    return Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                                    line:  token.line, });
                }
                self.state.line.remove(open);
                self.state.line.remove(close);
                Ok(())
            },
            Some(inner) if inner != close => {
                let stray = self.state.line.next(inner).unwrap_or(inner);
                let token = self.state.line.get(stray);
                Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                         line:  token.line, })
            },
            _ => Err(RuntimeError::UnrecognizedOperator { token: "()".to_string(),
                                                          line }),
        }
    }

    /// Handles `=` and the compound assignments.
    ///
    /// With a type keyword before the name this declares the variable, and
    /// the value's type must equal the declared type. Without one, an
    /// existing variable is updated under its declared type and an unknown
    /// name is declared with the type of the value. Compound assignments
    /// require an existing variable. The assigned value stays in the line.
    pub(crate) fn reduce_assignment(&mut self, at: NodeRef, op: Operator) -> EvalResult<()> {
        let line = self.state.line.get(at).line;
        let (target, name) = match self.state.line.prev(at).map(|t| (t, &self.state.line.get(t).kind)) {
            Some((target, TokenKind::Identifier(name))) => (target, name.clone()),
            _ => {
                return Err(RuntimeError::UnrecognizedOperator { token: op.to_string(),
                                                                line });
            },
        };
        let declared = self.state.line.prev(target).and_then(|ty_at| match self.state.line.get(ty_at).kind {
                                                       TokenKind::Type(ty) => Some((ty_at, ty)),
                                                       _ => None,
                                                   });

        let source = self.operand_after(at)?;
        let mut value = self.resolve(source)?;
        if let Some(base) = op.compound_base() {
            let current = self.symbols.lookup(&name, line)?.value.clone();
            value = Self::eval_binary(base, &current, &value, line)?;
        }

        match declared {
            Some((ty_at, ty)) => {
                if op != Operator::Assign {
                    return Err(RuntimeError::UnrecognizedOperator { token: op.to_string(),
                                                                    line });
                }
                self.symbols.add_variable(&name, ty, value.clone(), Visibility::Local, line)?;
                self.state.line.remove(ty_at);
            },
            None if self.symbols.contains(&name) => {
                self.symbols.update_variable(&name, value.clone(), line)?;
            },
            None => {
                self.symbols.add_variable(&name, value.value_type(), value.clone(), Visibility::Local, line)?;
            },
        }
        trace!(%name, %value, "assigned");

        self.splice_value(at, value);
        self.state.line.remove(target);
        self.state.line.remove(source);
        Ok(())
    }

    /// Handles a type keyword that was not consumed by an assignment, as in
    /// `int count`: the name is declared holding the type's default value.
    pub(crate) fn reduce_declaration(&mut self, at: NodeRef, ty: ValueType) -> EvalResult<()> {
        let token = self.state.line.get(at);
        let line = token.line;
        let name = match self.state.line.next(at).map(|next| &self.state.line.get(next).kind) {
            Some(TokenKind::Identifier(name)) => name.clone(),
            _ => {
                return Err(RuntimeError::UnrecognizedOperator { token: token.to_string(),
                                                                line });
            },
        };

        self.symbols.add_variable(&name, ty, ty.default_value(), Visibility::Local, line)?;
        self.state.line.remove(at);
        Ok(())
    }

    /// Rewrites an f-string into a chain of `+` operations.
    ///
    /// `f"a{x}b"` becomes `"a" + x + "b"`. The generated operators rank above
    /// everything the f-string was competing with, so the chain reduces to a
    /// single string before its neighbours act.
    pub(crate) fn expand_fstring(&mut self, at: NodeRef, template: &str) -> EvalResult<()> {
        let token = self.state.line.get(at);
        let line = token.line;
        let add_priority = priority::ADDITIVE + (token.priority - priority::FSTRING) + priority::BRACKET_BOOST;
        let segments = parse_template(template, line)?;

        let mut pieces = segments.into_iter();
        let first = match pieces.next() {
            Some(Segment::Text(text)) => TokenKind::Literal(Value::Str(text)),
            Some(Segment::Name(name)) => {
                // Leading empty text keeps the chain a string concatenation.
                self.insert_piece(at, TokenKind::Literal(Value::Str(String::new())), line);
                self.insert_add(at, add_priority, line);
                TokenKind::Identifier(name)
            },
            None => TokenKind::Literal(Value::Str(String::new())),
        };
        self.insert_piece(at, first, line);

        for segment in pieces {
            self.insert_add(at, add_priority, line);
            let kind = match segment {
                Segment::Text(text) => TokenKind::Literal(Value::Str(text)),
                Segment::Name(name) => TokenKind::Identifier(name),
            };
            self.insert_piece(at, kind, line);
        }

        self.state.line.remove(at);
        Ok(())
    }

    fn insert_piece(&mut self, before: NodeRef, kind: TokenKind, line: usize) {
        let id = self.fresh_id();
        self.state.line.insert_before(before, Token::new(kind, id, line));
    }

    fn insert_add(&mut self, before: NodeRef, priority: i32, line: usize) {
        let id = self.fresh_id();
        let mut add = Token::new(TokenKind::Operator(Operator::Add), id, line);
        add.priority = priority;
        self.state.line.insert_before(before, add);
    }
}

/// Splits an f-string template into text and `{name}` segments. Empty text
/// between placeholders is dropped.
fn parse_template(template: &str, line: usize) -> EvalResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 1..];
        let end = after.find('}')
                       .ok_or_else(|| RuntimeError::UnterminatedBracket { bracket: "{".to_string(),
                                                                           line })?;
        let name = after[..end].trim();
        if name.is_empty() {
            return Err(RuntimeError::UnrecognizedOperator { token: "{}".to_string(),
                                                            line });
        }
        segments.push(Segment::Name(name.to_string()));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn templates_split_into_text_and_names() {
        assert_eq!(parse_template("a{x}b{ y }", 1).unwrap(),
                   vec![Segment::Text("a".into()),
                        Segment::Name("x".into()),
                        Segment::Text("b".into()),
                        Segment::Name("y".into())]);
        assert_eq!(parse_template("", 1).unwrap(), vec![]);
    }

    #[test]
    fn unclosed_placeholder_is_an_unterminated_bracket() {
        assert_eq!(parse_template("a{x", 4).unwrap_err(),
                   RuntimeError::UnterminatedBracket { bracket: "{".into(),
                                                       line:    4, });
    }
}
