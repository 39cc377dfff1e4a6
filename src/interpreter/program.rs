use std::collections::HashMap;

use tracing::debug;

use crate::{
    error::{ParseError, RuntimeError},
    interpreter::{
        evaluator::core::EvalResult,
        lexer::{Lexeme, tokenize},
        line::{NodeRef, TokenLine},
        token::{Bracket, BracketKind, IdGenerator, Keyword, Operator, Token, TokenKind},
        value::core::{Value, ValueType},
    },
};

/// Address of a single token inside a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Index of the statement line.
    pub line:  usize,
    /// The token inside that line.
    pub token: NodeRef,
}

/// A loaded program: its statement lines and label table.
///
/// The lines are never modified while the program runs. The interpreter
/// executes copies, so every [`Position`] into a program stays valid for the
/// whole run and also addresses the same token in any copy of its line.
#[derive(Debug, Clone, Default)]
pub struct Program {
    lines:   Vec<TokenLine>,
    labels:  HashMap<String, usize>,
    next_id: u32,
}

impl Program {
    /// Builds a program from already tokenized lines.
    ///
    /// `labels` maps a label name to the index of the line it marks; an index
    /// equal to the number of lines marks the end of the program.
    #[must_use]
    pub fn new(lines: Vec<TokenLine>, labels: HashMap<String, usize>) -> Self {
        let next_id = lines.iter()
                           .flat_map(|line| line.iter().map(|(_, token)| token.id.0 + 1))
                           .max()
                           .unwrap_or(0);
        Self { lines,
               labels,
               next_id }
    }

    /// Lexes `source` and splits it into statement lines.
    ///
    /// Newlines and `;` end a statement unless they appear inside
    /// parentheses. A `{` ends the statement it closes and a `}` always forms
    /// a statement of its own, so block braces only ever start or end a line.
    /// A label `@name` marks the statement that follows it.
    ///
    /// # Errors
    /// Returns a [`ParseError`] for unknown characters, unbalanced brackets
    /// and duplicate labels.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::program::Program;
    ///
    /// let program = Program::from_source("x = 1; if x == 1 {\n y = 2\n}").unwrap();
    ///
    /// assert_eq!(program.len(), 4);
    /// assert_eq!(program.line(1).unwrap().to_string(), "if x == 1 {");
    /// assert_eq!(program.line(3).unwrap().to_string(), "}");
    /// ```
    pub fn from_source(source: &str) -> Result<Self, ParseError> {
        let mut loader = Loader::default();
        for (lexeme, line) in tokenize(source)? {
            loader.push(lexeme, line)?;
        }
        let program = loader.finish()?;
        debug!(lines = program.len(), labels = program.labels.len(), "loaded program");
        Ok(program)
    }

    /// Returns the number of statement lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` for a program without statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the pristine line at `index`.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&TokenLine> {
        self.lines.get(index)
    }

    /// Returns all pristine lines.
    #[must_use]
    pub fn lines(&self) -> &[TokenLine] {
        &self.lines
    }

    /// Returns the first id not used by any token of the program.
    #[must_use]
    pub const fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Returns the line index a label marks.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Returns the token at `pos`.
    ///
    /// # Panics
    /// Panics if `pos` does not address a token of this program.
    #[must_use]
    pub fn token(&self, pos: Position) -> &Token {
        self.lines[pos.line].get(pos.token)
    }

    /// Returns the position of the first token of the first non-empty line at
    /// or after `index`, `None` past the end.
    #[must_use]
    pub fn line_start(&self, index: usize) -> Option<Position> {
        self.lines
            .iter()
            .enumerate()
            .skip(index)
            .find_map(|(line, tokens)| tokens.first().map(|token| Position { line, token }))
    }

    /// Returns the position of the token following `pos`, continuing on the
    /// next line when `pos` ends its line. `None` means `pos` is the last
    /// token of the program.
    #[must_use]
    pub fn position_after(&self, pos: Position) -> Option<Position> {
        match self.lines[pos.line].next(pos.token) {
            Some(token) => Some(Position { line: pos.line,
                                           token }),
            None => self.line_start(pos.line + 1),
        }
    }

    /// Iterates over every token from `start` to the end of the program.
    pub fn positions_from(&self, start: Position) -> impl Iterator<Item = (Position, &Token)> {
        std::iter::successors(Some(start), |&pos| self.position_after(pos)).map(|pos| (pos, self.token(pos)))
    }

    /// Finds the `{` that opens the block of the keyword at `keyword`.
    ///
    /// The block opener is the first `{` on the rest of the keyword's line, or
    /// a `{` starting the next line.
    ///
    /// # Errors
    /// Returns `RuntimeError::MissingBlock` if there is no such `{`.
    pub fn block_open_after(&self, keyword: Position) -> EvalResult<Position> {
        let line = &self.lines[keyword.line];
        let same_line = line.iter_from(keyword.token)
                            .skip(1)
                            .find(|(_, token)| token.is_bracket(BracketKind::Scope, Bracket::Open));
        if let Some((token, _)) = same_line {
            return Ok(Position { line: keyword.line,
                                 token });
        }

        let next_line = keyword.line + 1;
        if let Some(first) = self.lines.get(next_line).and_then(TokenLine::first)
           && self.lines[next_line].get(first).is_bracket(BracketKind::Scope, Bracket::Open)
        {
            return Ok(Position { line:  next_line,
                                 token: first, });
        }

        let token = line.get(keyword.token);
        Err(RuntimeError::MissingBlock { keyword: token.to_string(),
                                         line:    token.line, })
    }

    /// Finds the `}` that closes the block opened at `open`, scanning across
    /// lines.
    ///
    /// # Errors
    /// Returns `RuntimeError::UnterminatedBracket` if the block never closes.
    pub fn matching_close(&self, open: Position) -> EvalResult<Position> {
        let mut depth = 0usize;
        for (pos, token) in self.positions_from(open) {
            if token.is_bracket(BracketKind::Scope, Bracket::Open) {
                depth += 1;
            } else if token.is_bracket(BracketKind::Scope, Bracket::Close) {
                depth -= 1;
                if depth == 0 {
                    return Ok(pos);
                }
            }
        }
        Err(RuntimeError::UnterminatedBracket { bracket: "{".to_string(),
                                                line:    self.token(open).line, })
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            writeln!(f, "{index:>4}: {line}")?;
        }
        Ok(())
    }
}

/// Accumulates lexemes into statement lines.
#[derive(Default)]
struct Loader {
    lines:    Vec<TokenLine>,
    current:  TokenLine,
    labels:   HashMap<String, usize>,
    ids:      IdGenerator,
    parens:   Vec<(BracketKind, usize)>,
    braces:   Vec<usize>,
    previous: Option<TokenKind>,
}

impl Loader {
    fn push(&mut self, lexeme: Lexeme, line: usize) -> Result<(), ParseError> {
        let kind = match lexeme {
            Lexeme::NewLine | Lexeme::Semicolon if self.parens.is_empty() => {
                self.end_statement();
                return Ok(());
            },
            Lexeme::Label(name) => {
                self.end_statement();
                if self.labels.contains_key(&name) {
                    return Err(ParseError::LabelRedefinition { name, line });
                }
                self.labels.insert(name, self.lines.len());
                return Ok(());
            },
            Lexeme::LBrace => {
                self.reject_open_paren()?;
                self.braces.push(line);
                self.emit(TokenKind::Bracket(BracketKind::Scope, Bracket::Open), line);
                self.end_statement();
                return Ok(());
            },
            Lexeme::RBrace => {
                self.reject_open_paren()?;
                if self.braces.pop().is_none() {
                    return Err(ParseError::UnmatchedClose { bracket: "}".to_string(),
                                                            line });
                }
                self.end_statement();
                self.emit(TokenKind::Bracket(BracketKind::Scope, Bracket::Close), line);
                self.end_statement();
                return Ok(());
            },
            Lexeme::LParen => {
                let kind = if matches!(self.previous, Some(TokenKind::Identifier(_))) {
                    BracketKind::Call
                } else {
                    BracketKind::Paren
                };
                self.parens.push((kind, line));
                TokenKind::Bracket(kind, Bracket::Open)
            },
            Lexeme::RParen => {
                let Some((kind, _)) = self.parens.pop() else {
                    return Err(ParseError::UnmatchedClose { bracket: ")".to_string(),
                                                            line });
                };
                TokenKind::Bracket(kind, Bracket::Close)
            },
            Lexeme::NewLine => return Ok(()),
            Lexeme::Semicolon => TokenKind::Semicolon,
            Lexeme::Minus if self.follows_operand() => TokenKind::Operator(Operator::Sub),
            Lexeme::Minus => TokenKind::Operator(Operator::Negate),
            other => simple_kind(other),
        };
        self.emit(kind, line);
        Ok(())
    }

    fn follows_operand(&self) -> bool {
        matches!(self.previous,
                 Some(TokenKind::Literal(_)
                      | TokenKind::FString(_)
                      | TokenKind::Identifier(_)
                      | TokenKind::Bracket(_, Bracket::Close)))
    }

    fn reject_open_paren(&self) -> Result<(), ParseError> {
        match self.parens.last() {
            Some((_, line)) => Err(ParseError::UnterminatedBracket { bracket: "(".to_string(),
                                                                     line:    *line, }),
            None => Ok(()),
        }
    }

    fn emit(&mut self, kind: TokenKind, line: usize) {
        self.previous = Some(kind.clone());
        let id = self.ids.fresh();
        self.current.append(Token::new(kind, id, line));
    }

    fn end_statement(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
        self.previous = None;
    }

    fn finish(mut self) -> Result<Program, ParseError> {
        if let Some(&(_, line)) = self.parens.last() {
            return Err(ParseError::UnterminatedBracket { bracket: "(".to_string(),
                                                         line });
        }
        if let Some(&line) = self.braces.last() {
            return Err(ParseError::UnterminatedBracket { bracket: "{".to_string(),
                                                         line });
        }
        self.end_statement();
        Ok(Program { lines:   self.lines,
                     labels:  self.labels,
                     next_id: self.ids.peek(), })
    }
}

/// Maps the lexemes whose token kind does not depend on their neighbours.
fn simple_kind(lexeme: Lexeme) -> TokenKind {
    match lexeme {
        Lexeme::Float(x) => TokenKind::Literal(Value::Float(x)),
        Lexeme::Integer(n) => TokenKind::Literal(Value::Int(n)),
        Lexeme::Str(s) => TokenKind::Literal(Value::Str(s)),
        Lexeme::Bool(b) => TokenKind::Literal(Value::Bool(b)),
        Lexeme::Null => TokenKind::Literal(Value::Null),
        Lexeme::FString(template) => TokenKind::FString(template),
        Lexeme::Identifier(name) => TokenKind::Identifier(name),
        Lexeme::IntType => TokenKind::Type(ValueType::Int),
        Lexeme::FloatType => TokenKind::Type(ValueType::Float),
        Lexeme::StringType => TokenKind::Type(ValueType::String),
        Lexeme::BoolType => TokenKind::Type(ValueType::Boolean),
        Lexeme::If => TokenKind::Keyword(Keyword::If),
        Lexeme::Else => TokenKind::Keyword(Keyword::Else),
        Lexeme::While => TokenKind::Keyword(Keyword::While),
        Lexeme::For => TokenKind::Keyword(Keyword::For),
        Lexeme::Goto => TokenKind::Keyword(Keyword::Goto),
        Lexeme::Goback => TokenKind::Keyword(Keyword::Goback),
        Lexeme::Def => TokenKind::Keyword(Keyword::Def),
        Lexeme::Return => TokenKind::Keyword(Keyword::Return),
        Lexeme::System => TokenKind::Keyword(Keyword::System),
        Lexeme::Break => TokenKind::Keyword(Keyword::Break),
        Lexeme::Continue => TokenKind::Keyword(Keyword::Continue),
        Lexeme::PlusAssign => TokenKind::Operator(Operator::AddAssign),
        Lexeme::MinusAssign => TokenKind::Operator(Operator::SubAssign),
        Lexeme::StarAssign => TokenKind::Operator(Operator::MulAssign),
        Lexeme::SlashAssign => TokenKind::Operator(Operator::DivAssign),
        Lexeme::PercentAssign => TokenKind::Operator(Operator::ModAssign),
        Lexeme::StarStar => TokenKind::Operator(Operator::Pow),
        Lexeme::Plus => TokenKind::Operator(Operator::Add),
        Lexeme::Star => TokenKind::Operator(Operator::Mul),
        Lexeme::Slash => TokenKind::Operator(Operator::Div),
        Lexeme::Percent => TokenKind::Operator(Operator::Mod),
        Lexeme::EqualEqual => TokenKind::Operator(Operator::Equal),
        Lexeme::BangEqual => TokenKind::Operator(Operator::NotEqual),
        Lexeme::LessEqual => TokenKind::Operator(Operator::LessEqual),
        Lexeme::GreaterEqual => TokenKind::Operator(Operator::GreaterEqual),
        Lexeme::Less => TokenKind::Operator(Operator::Less),
        Lexeme::Greater => TokenKind::Operator(Operator::Greater),
        Lexeme::AndAnd => TokenKind::Operator(Operator::And),
        Lexeme::OrOr => TokenKind::Operator(Operator::Or),
        Lexeme::Bang => TokenKind::Operator(Operator::Not),
        Lexeme::Equals => TokenKind::Operator(Operator::Assign),
        Lexeme::Comma => TokenKind::Comma,
        // Handled by `Loader::push` or skipped by the lexer.
        Lexeme::Minus
        | Lexeme::LParen
        | Lexeme::RParen
        | Lexeme::LBrace
        | Lexeme::RBrace
        | Lexeme::Semicolon
        | Lexeme::NewLine
        | Lexeme::Label(_)
        | Lexeme::Comment
        | Lexeme::MultiLineComment
        | Lexeme::Ignored => unreachable!("{lexeme:?} is handled by the loader"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rendered(program: &Program) -> Vec<String> {
        program.lines().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn statements_split_on_newlines_and_semicolons() {
        let program = Program::from_source("a = 1; b = 2\n\n\nc = a + b").unwrap();
        assert_eq!(rendered(&program), vec!["a = 1", "b = 2", "c = a + b"]);
    }

    #[test]
    fn semicolons_inside_parentheses_stay_in_the_line() {
        let program = Program::from_source("for (int i = 0; i < 3; i += 1) {\n}").unwrap();
        assert_eq!(rendered(&program), vec!["for ( int i = 0 ; i < 3 ; i += 1 ) {", "}"]);
    }

    #[test]
    fn braces_split_blocks_into_their_own_lines() {
        let program = Program::from_source("if x { y = 1 } else { y = 2 }").unwrap();
        assert_eq!(rendered(&program), vec!["if x {", "y = 1", "}", "else {", "y = 2", "}"]);
    }

    #[test]
    fn call_and_group_parentheses_are_distinguished() {
        let program = Program::from_source("f(1) * (2)").unwrap();
        let kinds = program.line(0).unwrap().iter().map(|(_, t)| t.kind.clone()).collect::<Vec<_>>();
        assert_eq!(kinds[1], TokenKind::Bracket(BracketKind::Call, Bracket::Open));
        assert_eq!(kinds[5], TokenKind::Bracket(BracketKind::Paren, Bracket::Open));
    }

    #[test]
    fn minus_is_negation_without_a_left_operand() {
        let program = Program::from_source("x = -3 - -y").unwrap();
        let ops = program.line(0)
                         .unwrap()
                         .iter()
                         .filter_map(|(_, t)| match t.kind {
                             TokenKind::Operator(op) => Some(op),
                             _ => None,
                         })
                         .collect::<Vec<_>>();
        assert_eq!(ops, vec![Operator::Assign, Operator::Negate, Operator::Sub, Operator::Negate]);
    }

    #[test]
    fn labels_mark_the_following_statement() {
        let program = Program::from_source("a = 1\n@here\nb = 2\n@end").unwrap();
        assert_eq!(program.label("here"), Some(1));
        assert_eq!(program.label("end"), Some(2));
        assert_eq!(program.label("missing"), None);
    }

    #[test]
    fn loading_errors() {
        let err = Program::from_source("@a\n@a").unwrap_err();
        assert_eq!(err,
                   ParseError::LabelRedefinition { name: "a".into(),
                                                   line: 2, });

        let err = Program::from_source("x = (1 + 2").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnterminatedBracket);

        let err = Program::from_source("}").unwrap_err();
        assert_eq!(err,
                   ParseError::UnmatchedClose { bracket: "}".into(),
                                                line:    1, });
    }

    #[test]
    fn blocks_are_found_across_lines() {
        let program = Program::from_source("while x\n{\nif y {\n}\n}\nz").unwrap();
        let keyword = Position { line:  0,
                                 token: program.line(0).unwrap().first().unwrap(), };
        let open = program.block_open_after(keyword).unwrap();
        assert_eq!(open.line, 1);

        let close = program.matching_close(open).unwrap();
        assert_eq!(close.line, 4);
        assert_eq!(program.position_after(close).map(|p| p.line), Some(5));
    }

    #[test]
    fn keyword_without_block_is_reported() {
        let program = Program::from_source("while x\ny = 1").unwrap();
        let keyword = program.line_start(0).unwrap();
        let err = program.block_open_after(keyword).unwrap_err();
        assert_eq!(err,
                   RuntimeError::MissingBlock { keyword: "while".into(),
                                                line:    1, });
    }

    #[test]
    fn ids_are_unique_across_the_program() {
        let program = Program::from_source("a = 1\nb = 2").unwrap();
        let mut ids = program.lines()
                             .iter()
                             .flat_map(|line| line.iter().map(|(_, t)| t.id.0))
                             .collect::<Vec<_>>();
        ids.dedup();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(program.next_id(), 6);
    }
}
