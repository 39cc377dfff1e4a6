use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur while a program executes.
pub enum RuntimeError {
    /// A token could not be reduced where it appears, for example an operator
    /// with a missing operand or two values with nothing between them.
    UnrecognizedOperator {
        /// The offending token.
        token: String,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// A bracket (or f-string placeholder brace) has no closing partner.
    UnterminatedBracket {
        /// The opening bracket.
        bracket: String,
        /// The source line where the bracket was opened.
        line:    usize,
    },
    /// A control keyword was not followed by a `{ ... }` block.
    MissingBlock {
        /// The keyword that requires a block.
        keyword: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// Tried to read a variable that was never declared.
    UndeclaredVariable {
        /// The name of the variable.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Tried to declare a variable whose name is already bound.
    VariableRedeclaration {
        /// The name of the variable.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A value had a different type than the one required.
    TypeMismatch {
        /// Details about the type mismatch.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// Called a function that is not defined.
    UndefinedFunction {
        /// The name of the function.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Attempted to define a function that already exists.
    FunctionRedefinition {
        /// The name of the function.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// The wrong number of arguments was supplied to a function.
    ArgumentCountMismatch {
        /// The name of the function.
        name:     String,
        /// The number of declared parameters.
        expected: usize,
        /// The number of supplied arguments.
        found:    usize,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// A `goto` named a label that does not exist.
    UndefinedLabel {
        /// The label name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A `goback` was executed with no pending `goto`.
    EmptyGotoStack {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A `return` was executed with no active function call.
    EmptyCallStack {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Attempted division by zero.
    DivisionByZero {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An operation is not defined for the given operand types.
    UnhandledOperation {
        /// Details about the operation and its operands.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// An operation exists in the language but is not supported for the
    /// given operands.
    UnimplementedOperation {
        /// Details about the operation and its operands.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
}

impl RuntimeError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnrecognizedOperator { .. } => ErrorKind::UnrecognizedOperator,
            Self::UnterminatedBracket { .. } => ErrorKind::UnterminatedBracket,
            Self::MissingBlock { .. } => ErrorKind::MissingBlock,
            Self::UndeclaredVariable { .. } => ErrorKind::UndeclaredVariable,
            Self::VariableRedeclaration { .. } => ErrorKind::VariableRedeclaration,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::UndefinedFunction { .. } => ErrorKind::UndefinedFunction,
            Self::FunctionRedefinition { .. } => ErrorKind::FunctionRedefinition,
            Self::ArgumentCountMismatch { .. } => ErrorKind::ArgumentCountMismatch,
            Self::UndefinedLabel { .. } => ErrorKind::UndefinedLabel,
            Self::EmptyGotoStack { .. } => ErrorKind::EmptyGotoStack,
            Self::EmptyCallStack { .. } => ErrorKind::EmptyCallStack,
            Self::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            Self::UnhandledOperation { .. } => ErrorKind::UnhandledOperation,
            Self::UnimplementedOperation { .. } => ErrorKind::UnimplementedOperation,
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedOperator { token, line } => {
                write!(f, "Error on line {line}: Cannot reduce '{token}' here.")
            },
            Self::UnterminatedBracket { bracket, line } => write!(f,
                                                                  "Error on line {line}: Bracket '{bracket}' is never closed."),
            Self::MissingBlock { keyword, line } => write!(f,
                                                           "Error on line {line}: '{keyword}' must be followed by a block."),
            Self::UndeclaredVariable { name, line } => {
                write!(f, "Error on line {line}: Undeclared variable '{name}'.")
            },
            Self::VariableRedeclaration { name, line } => write!(f,
                                                                 "Error on line {line}: Variable '{name}' is already declared."),
            Self::TypeMismatch { details, line } => {
                write!(f, "Error on line {line}: Type mismatch: {details}.")
            },
            Self::UndefinedFunction { name, line } => {
                write!(f, "Error on line {line}: Undefined function '{name}'.")
            },
            Self::FunctionRedefinition { name, line } => write!(f,
                                                                "Error on line {line}: Function '{name}' is already defined."),
            Self::ArgumentCountMismatch { name,
                                          expected,
                                          found,
                                          line, } => write!(f,
                                                            "Error on line {line}: '{name}' expects {expected} argument(s) but got {found}."),
            Self::UndefinedLabel { name, line } => {
                write!(f, "Error on line {line}: Undefined label '@{name}'.")
            },
            Self::EmptyGotoStack { line } => {
                write!(f, "Error on line {line}: 'goback' without a preceding 'goto'.")
            },
            Self::EmptyCallStack { line } => {
                write!(f, "Error on line {line}: 'return' outside of a function call.")
            },
            Self::DivisionByZero { line } => write!(f, "Error on line {line}: Division by zero."),
            Self::UnhandledOperation { details, line } => {
                write!(f, "Error on line {line}: Unhandled operation: {details}.")
            },
            Self::UnimplementedOperation { details, line } => {
                write!(f, "Error on line {line}: Unimplemented operation: {details}.")
            },
        }
    }
}

impl std::error::Error for RuntimeError {}
