use logos::Logos;

use crate::error::ParseError;

/// Represents a lexical unit of the source input before it is turned into a
/// prioritized [`Token`](crate::interpreter::token::Token).
///
/// The lexer only recognizes character sequences. Whether `(` opens a call
/// or a group and whether `-` is a negation is decided by the program loader,
/// which sees the surrounding lexemes.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(extras = LexerExtras)]
pub enum Lexeme {
    /// Float literal tokens, such as `3.14`.
    #[regex(r"[0-9]+\.[0-9]+", parse_float)]
    Float(f64),
    /// Integer literal tokens, such as `42`.
    #[regex(r"[0-9]+", parse_integer)]
    Integer(i64),
    /// String literal tokens, such as `"hello\n"`.
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(&lex.slice()[1..lex.slice().len() - 1]))]
    Str(String),
    /// F-string literal tokens, such as `f"x = {x}"`.
    #[regex(r#"f"([^"\\\n]|\\.)*""#, |lex| unescape(&lex.slice()[2..lex.slice().len() - 1]))]
    FString(String),
    /// Boolean literal tokens.
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),
    /// `null`, both the literal and the return type.
    #[token("null")]
    Null,
    /// `int`
    #[token("int")]
    IntType,
    /// `float`
    #[token("float")]
    FloatType,
    /// `string`
    #[token("string")]
    StringType,
    /// `bool`
    #[token("bool")]
    BoolType,
    /// `if`
    #[token("if")]
    If,
    /// `else`
    #[token("else")]
    Else,
    /// `while`
    #[token("while")]
    While,
    /// `for`
    #[token("for")]
    For,
    /// `goto`
    #[token("goto")]
    Goto,
    /// `goback`
    #[token("goback")]
    Goback,
    /// `def`
    #[token("def")]
    Def,
    /// `return`
    #[token("return")]
    Return,
    /// `system`
    #[token("system")]
    System,
    /// `break`
    #[token("break")]
    Break,
    /// `continue`
    #[token("continue")]
    Continue,
    /// Identifier tokens; variable, function or label names.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// Label definitions such as `@retry`.
    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Label(String),
    /// `// Comments.`
    #[regex(r"//[^\n\r]*", logos::skip, allow_greedy = true)]
    Comment,
    /// `/* Multi line comments. */`
    #[regex(r"/\*([^*]|\*[^/])*\*/", |lex| {
        let comment      = lex.slice();
        let newlines     = comment.chars().filter(|&c| c == '\n').count();
        lex.extras.line += newlines;
        logos::Skip
    })]
    MultiLineComment,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    StarAssign,
    /// `/=`
    #[token("/=")]
    SlashAssign,
    /// `%=`
    #[token("%=")]
    PercentAssign,
    /// `**`
    #[token("**")]
    StarStar,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `!`
    #[token("!")]
    Bang,
    /// `=`
    #[token("=")]
    Equals,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// Line breaks end statements outside of parentheses.
    #[token("\n", |lex| {
        lex.extras.line += 1;
    })]
    NewLine,
    /// Spaces, tabs and feeds.
    #[regex(r"[ \t\r\f]+", logos::skip)]
    Ignored,
}

/// Additional information carried by the lexer during tokenization.
///
/// Tracks the current line number for error reporting and diagnostics.
#[derive(Default)]
pub struct LexerExtras {
    /// The current line number in the source being tokenized.
    pub line: usize,
}

/// Splits source text into lexemes paired with their line numbers.
///
/// # Errors
/// Returns `ParseError::Lexical` for the first character sequence that is not
/// part of the language, including integer literals that do not fit in `i64`.
///
/// # Example
/// ```
/// use tokline::interpreter::lexer::{Lexeme, tokenize};
///
/// let lexemes = tokenize("x = 1\ny").unwrap();
/// assert_eq!(lexemes[0], (Lexeme::Identifier("x".into()), 1));
/// assert_eq!(lexemes[4], (Lexeme::Identifier("y".into()), 2));
/// ```
pub fn tokenize(source: &str) -> Result<Vec<(Lexeme, usize)>, ParseError> {
    let mut lexemes = Vec::new();
    let mut lexer = Lexeme::lexer_with_extras(source, LexerExtras { line: 1 });

    while let Some(lexeme) = lexer.next() {
        // A newline reports the line it terminates.
        let line = if lexeme == Ok(Lexeme::NewLine) {
            lexer.extras.line - 1
        } else {
            lexer.extras.line
        };
        match lexeme {
            Ok(lexeme) => lexemes.push((lexeme, line)),
            Err(()) => {
                return Err(ParseError::Lexical { text: lexer.slice().to_string(),
                                                 line });
            },
        }
    }

    Ok(lexemes)
}

/// Parses a floating-point literal from the current token slice.
fn parse_float(lex: &logos::Lexer<Lexeme>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Parses an integer literal from the current token slice. Literals that do
/// not fit in `i64` are rejected.
fn parse_integer(lex: &logos::Lexer<Lexeme>) -> Option<i64> {
    lex.slice().parse().ok()
}

/// Resolves the escape sequences `\n`, `\t`, `\"` and `\\` in a string body.
fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lexemes(source: &str) -> Vec<Lexeme> {
        tokenize(source).unwrap().into_iter().map(|(l, _)| l).collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(lexemes("while whilex int"),
                   vec![Lexeme::While, Lexeme::Identifier("whilex".into()), Lexeme::IntType]);
    }

    #[test]
    fn string_escapes_are_resolved() {
        assert_eq!(lexemes(r#""a\n\"b\"""#), vec![Lexeme::Str("a\n\"b\"".into())]);
        assert_eq!(lexemes(r#"f"{x}!""#), vec![Lexeme::FString("{x}!".into())]);
    }

    #[test]
    fn longest_operator_is_chosen() {
        assert_eq!(lexemes("a ** b *= c"),
                   vec![Lexeme::Identifier("a".into()),
                        Lexeme::StarStar,
                        Lexeme::Identifier("b".into()),
                        Lexeme::StarAssign,
                        Lexeme::Identifier("c".into())]);
    }

    #[test]
    fn comments_are_skipped_and_lines_counted() {
        let lexemes = tokenize("/* one\ntwo */ x // trailing\ny").unwrap();
        assert_eq!(lexemes,
                   vec![(Lexeme::Identifier("x".into()), 2),
                        (Lexeme::NewLine, 2),
                        (Lexeme::Identifier("y".into()), 3)]);
    }

    #[test]
    fn labels_drop_their_marker() {
        assert_eq!(lexemes("@retry"), vec![Lexeme::Label("retry".into())]);
    }

    #[test]
    fn unknown_characters_are_lexical_errors() {
        let err = tokenize("x = 1\ny = $").unwrap_err();
        assert_eq!(err,
                   ParseError::Lexical { text: "$".into(),
                                         line: 2, });
    }
}
