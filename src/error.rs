/// Loading errors.
///
/// Defines all error types that can occur while lexing source text and
/// splitting it into statements. Parse errors include unrecognized characters,
/// unbalanced brackets and duplicate labels, all detected before execution.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised while a program is reduced and
/// executed, such as undeclared variables, type mismatches, division by zero
/// or jumps to labels that do not exist.
pub mod runtime_error;

pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;

/// The category of a failure, independent of where it was raised.
///
/// Every [`ParseError`] and [`RuntimeError`] maps onto exactly one kind, which
/// lets hosts and tests branch on the failure without matching on the detailed
/// error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A character sequence the lexer does not recognize.
    LexicalError,
    /// An operator or token that cannot be applied where it appears.
    UnrecognizedOperator,
    /// A parenthesis, call, scope or f-string brace that is never closed.
    UnterminatedBracket,
    /// A control keyword that is not followed by a `{ ... }` block.
    MissingBlock,
    /// A variable was read before being declared.
    UndeclaredVariable,
    /// A variable was declared twice.
    VariableRedeclaration,
    /// A value had a type other than the one required.
    TypeMismatch,
    /// A call referred to a function that does not exist.
    UndefinedFunction,
    /// A function was defined twice.
    FunctionRedefinition,
    /// A call supplied the wrong number of arguments.
    ArgumentCountMismatch,
    /// A `goto` referred to a label that does not exist.
    UndefinedLabel,
    /// A label was defined twice.
    LabelRedefinition,
    /// A `goback` was executed without a preceding `goto`.
    EmptyGotoStack,
    /// A `return` was executed outside of any function call.
    EmptyCallStack,
    /// Division or modulus by zero.
    DivisionByZero,
    /// An operator was applied to an incompatible pair of types.
    UnhandledOperation,
    /// An operation that exists in the language but is not supported yet.
    UnimplementedOperation,
}

/// Any failure produced while loading or executing a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The source could not be turned into a program.
    Parse(ParseError),
    /// The program failed while executing.
    Runtime(RuntimeError),
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(e) => e.kind(),
            Self::Runtime(e) => e.kind(),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}
