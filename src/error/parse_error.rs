use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur while loading a program.
pub enum ParseError {
    /// Found a character sequence that is not part of the language.
    Lexical {
        /// The unrecognized text.
        text: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// An opening bracket reached the end of the source without a partner.
    UnterminatedBracket {
        /// The opening bracket, e.g. `(` or `{`.
        bracket: String,
        /// The source line where the bracket was opened.
        line:    usize,
    },
    /// A closing bracket appeared without a matching opening bracket.
    UnmatchedClose {
        /// The closing bracket, e.g. `)` or `}`.
        bracket: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A label name was defined more than once.
    LabelRedefinition {
        /// The label name.
        name: String,
        /// The source line of the second definition.
        line: usize,
    },
}

impl ParseError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Lexical { .. } => ErrorKind::LexicalError,
            Self::UnterminatedBracket { .. } | Self::UnmatchedClose { .. } => {
                ErrorKind::UnterminatedBracket
            },
            Self::LabelRedefinition { .. } => ErrorKind::LabelRedefinition,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexical { text, line } => {
                write!(f, "Error on line {line}: Unrecognized input '{text}'.")
            },
            Self::UnterminatedBracket { bracket, line } => write!(f,
                                                                  "Error on line {line}: Bracket '{bracket}' is never closed."),
            Self::UnmatchedClose { bracket, line } => write!(f,
                                                             "Error on line {line}: Closing '{bracket}' has no matching opening bracket."),
            Self::LabelRedefinition { name, line } => {
                write!(f, "Error on line {line}: Label '@{name}' is already defined.")
            },
        }
    }
}

impl std::error::Error for ParseError {}
