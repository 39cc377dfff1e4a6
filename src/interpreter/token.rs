use crate::interpreter::value::core::{Value, ValueType};

/// Static evaluation priorities.
///
/// The reduction loop always acts on the token with the highest priority in
/// a line, so this table is the whole operator precedence of the language.
/// Tokens that cannot be reduced on their own sit at [`INERT`], far below
/// anything actionable even after repeated [`BRACKET_BOOST`]s.
pub mod priority {
    /// Values, identifiers, separators, closing brackets and scope brackets
    /// that do not start their line.
    pub const INERT: i32 = -10_000;
    /// `if` and `return`, which act on their already reduced operand.
    pub const DEFERRED_KEYWORD: i32 = -5;
    /// A type keyword that was not consumed by an assignment.
    pub const DECLARATION: i32 = -2;
    /// `=` and the compound assignments.
    pub const ASSIGNMENT: i32 = -1;
    /// `system`, which consumes the reduced remainder of its line.
    pub const NATIVE_CALL: i32 = 0;
    /// `&&` and `||`.
    pub const LOGICAL: i32 = 1;
    /// `==`, `!=`, `<`, `>`, `<=`, `>=`.
    pub const COMPARISON: i32 = 2;
    /// `+` and `-`.
    pub const ADDITIVE: i32 = 3;
    /// `*`, `/` and `%`.
    pub const MULTIPLICATIVE: i32 = 4;
    /// `**`. One above [`MULTIPLICATIVE`] is left free for a unary `-`
    /// waiting on a `**`.
    pub const POWER: i32 = 6;
    /// Unary `-` and `!`.
    pub const UNARY: i32 = 9;
    /// Opening parenthesis or call bracket.
    pub const BRACKET_OPEN: i32 = 10;
    /// Unexpanded f-string literals.
    pub const FSTRING: i32 = 11;
    /// Keywords that must act before their operands are reduced.
    pub const CONTROL_KEYWORD: i32 = 50;
    /// Added to every token between a pair of brackets when the opening
    /// bracket is first selected.
    pub const BRACKET_BOOST: i32 = 100;
}

/// Stable identity of a token.
///
/// Copies of a line keep the ids of their tokens, so two copies can be asked
/// whether they hold "the same" token without comparing link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

/// Hands out fresh [`TokenId`]s.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    /// Creates a generator whose first id is `start`.
    #[must_use]
    pub const fn starting_at(start: u32) -> Self {
        Self { next: start }
    }

    /// Returns an id that has not been handed out before.
    pub const fn fresh(&mut self) -> TokenId {
        let id = TokenId(self.next);
        self.next += 1;
        id
    }

    /// Returns the id the next call to [`Self::fresh`] will produce.
    #[must_use]
    pub const fn peek(&self) -> u32 {
        self.next
    }
}

/// Which half of a bracket pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    /// `(` or `{`.
    Open,
    /// `)` or `}`.
    Close,
}

/// The bracket category. Partners are matched only within one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    /// Grouping parentheses.
    Paren,
    /// Parentheses enclosing call arguments or a parameter list.
    Call,
    /// Block braces.
    Scope,
}

/// All operators of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `+`
    Add,
    /// Binary `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,
    /// Unary `-`
    Negate,
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
}

impl Operator {
    /// Returns the static priority of the operator.
    #[must_use]
    pub const fn priority(self) -> i32 {
        match self {
            Self::Not | Self::Negate => priority::UNARY,
            Self::Pow => priority::POWER,
            Self::Mul | Self::Div | Self::Mod => priority::MULTIPLICATIVE,
            Self::Add | Self::Sub => priority::ADDITIVE,
            Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::Greater
            | Self::LessEqual
            | Self::GreaterEqual => priority::COMPARISON,
            Self::And | Self::Or => priority::LOGICAL,
            Self::Assign
            | Self::AddAssign
            | Self::SubAssign
            | Self::MulAssign
            | Self::DivAssign
            | Self::ModAssign => priority::ASSIGNMENT,
        }
    }

    /// Returns `true` for operators that take a single right-hand operand.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Not | Self::Negate)
    }

    /// Returns the arithmetic operator behind a compound assignment, `None`
    /// for every other operator.
    #[must_use]
    pub const fn compound_base(self) -> Option<Self> {
        match self {
            Self::AddAssign => Some(Self::Add),
            Self::SubAssign => Some(Self::Sub),
            Self::MulAssign => Some(Self::Mul),
            Self::DivAssign => Some(Self::Div),
            Self::ModAssign => Some(Self::Mod),
            _ => None,
        }
    }

    /// Returns `true` for `=` and the compound assignments.
    #[must_use]
    pub const fn is_assignment(self) -> bool {
        matches!(self, Self::Assign) || self.compound_base().is_some()
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Add => "+",
            Self::Sub | Self::Negate => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Not => "!",
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::ModAssign => "%=",
        };
        write!(f, "{operator}")
    }
}

/// Keywords dispatched to the control-flow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// `if`
    If,
    /// `else`
    Else,
    /// `while`
    While,
    /// `for`
    For,
    /// `goto`
    Goto,
    /// `goback`
    Goback,
    /// `def`
    Def,
    /// `return`
    Return,
    /// `system`
    System,
    /// `break`
    Break,
    /// `continue`
    Continue,
}

impl Keyword {
    /// Returns the static priority of the keyword.
    #[must_use]
    pub const fn priority(self) -> i32 {
        match self {
            Self::If | Self::Return => priority::DEFERRED_KEYWORD,
            Self::System => priority::NATIVE_CALL,
            Self::Else
            | Self::While
            | Self::For
            | Self::Goto
            | Self::Goback
            | Self::Def
            | Self::Break
            | Self::Continue => priority::CONTROL_KEYWORD,
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keyword = match self {
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::For => "for",
            Self::Goto => "goto",
            Self::Goback => "goback",
            Self::Def => "def",
            Self::Return => "return",
            Self::System => "system",
            Self::Break => "break",
            Self::Continue => "continue",
        };
        write!(f, "{keyword}")
    }
}

/// Loop control produced by `break` and `continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Leave the innermost loop.
    Break,
    /// Start the next iteration of the innermost loop.
    Continue,
}

/// The category of a token together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A literal or computed value.
    Literal(Value),
    /// An f-string template that still has to be expanded.
    FString(String),
    /// A variable, function or label name.
    Identifier(String),
    /// A type keyword such as `int`.
    Type(ValueType),
    /// An operator.
    Operator(Operator),
    /// One half of a bracket pair.
    Bracket(BracketKind, Bracket),
    /// A control keyword.
    Keyword(Keyword),
    /// The marker left in a line by `break` or `continue`.
    Signal(Signal),
    /// `,`
    Comma,
    /// `;` inside a `for` header.
    Semicolon,
}

impl TokenKind {
    /// Returns the priority a freshly constructed token of this kind gets.
    #[must_use]
    pub const fn base_priority(&self) -> i32 {
        match self {
            Self::Operator(op) => op.priority(),
            Self::Keyword(keyword) => keyword.priority(),
            Self::Bracket(BracketKind::Paren | BracketKind::Call, Bracket::Open) => {
                priority::BRACKET_OPEN
            },
            Self::FString(_) => priority::FSTRING,
            Self::Type(_) => priority::DECLARATION,
            Self::Literal(_)
            | Self::Identifier(_)
            | Self::Bracket(..)
            | Self::Signal(_)
            | Self::Comma
            | Self::Semicolon => priority::INERT,
        }
    }

    /// Returns `true` for tokens that stand for a value once resolved.
    #[must_use]
    pub const fn is_operand(&self) -> bool {
        matches!(self, Self::Literal(_) | Self::Identifier(_))
    }

    /// Returns `true` for tokens the reduction loop never acts on directly.
    #[must_use]
    pub const fn is_inert(&self) -> bool {
        matches!(self,
                 Self::Literal(_)
                 | Self::Identifier(_)
                 | Self::Signal(_)
                 | Self::Comma
                 | Self::Semicolon
                 | Self::Bracket(BracketKind::Paren | BracketKind::Call, Bracket::Close))
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(Value::Str(s)) => write!(f, "{s:?}"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::FString(template) => write!(f, "f{template:?}"),
            Self::Identifier(name) => write!(f, "{name}"),
            Self::Type(ty) => write!(f, "{ty}"),
            Self::Operator(op) => write!(f, "{op}"),
            Self::Bracket(BracketKind::Scope, Bracket::Open) => write!(f, "{{"),
            Self::Bracket(BracketKind::Scope, Bracket::Close) => write!(f, "}}"),
            Self::Bracket(_, Bracket::Open) => write!(f, "("),
            Self::Bracket(_, Bracket::Close) => write!(f, ")"),
            Self::Keyword(keyword) => write!(f, "{keyword}"),
            Self::Signal(Signal::Break) => write!(f, "break"),
            Self::Signal(Signal::Continue) => write!(f, "continue"),
            Self::Comma => write!(f, ","),
            Self::Semicolon => write!(f, ";"),
        }
    }
}

/// A single lexical unit of a statement.
///
/// Besides its kind, a token carries its current evaluation priority (which
/// grows while it sits inside unresolved brackets), a stable identity and the
/// source line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Category and payload.
    pub kind:     TokenKind,
    /// Current evaluation priority; higher is reduced first.
    pub priority: i32,
    /// Stable identity, shared by copies of the token.
    pub id:       TokenId,
    /// Source line number for error reporting.
    pub line:     usize,
    /// Set once an opening bracket has boosted its contents.
    pub expanded: bool,
}

impl Token {
    /// Creates a token with the static priority of its kind.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::token::{Operator, Token, TokenId, TokenKind, priority};
    ///
    /// let star = Token::new(TokenKind::Operator(Operator::Mul), TokenId(0), 1);
    /// let plus = Token::new(TokenKind::Operator(Operator::Add), TokenId(1), 1);
    ///
    /// assert!(star.priority > plus.priority);
    /// assert_eq!(plus.priority, priority::ADDITIVE);
    /// ```
    #[must_use]
    pub const fn new(kind: TokenKind, id: TokenId, line: usize) -> Self {
        let priority = kind.base_priority();
        Self { kind,
               priority,
               id,
               line,
               expanded: false }
    }

    /// Creates an inert literal token holding `value`.
    #[must_use]
    pub const fn literal(value: Value, id: TokenId, line: usize) -> Self {
        Self::new(TokenKind::Literal(value), id, line)
    }

    /// Returns `true` if this token is an opening or closing bracket of the
    /// given category.
    #[must_use]
    pub fn is_bracket(&self, kind: BracketKind, half: Bracket) -> bool {
        self.kind == TokenKind::Bracket(kind, half)
    }

    /// Returns `true` if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}
