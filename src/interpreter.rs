/// The evaluator module reduces token lines and transfers control.
///
/// The evaluator owns the runtime state, picks the highest priority token of
/// the working line, applies operators and keywords to it, and moves the
/// execution position for loops, calls and jumps.
///
/// # Responsibilities
/// - Reduces operators, brackets, assignments and f-strings in place.
/// - Handles `if`, `while`, `for`, `goto`, `def`, `return` and `system`.
/// - Reports runtime errors such as division by zero or type mismatches.
pub mod evaluator;
/// User-defined functions and activation records.
pub mod function;
/// The lexer module splits source text into lexemes.
///
/// # Responsibilities
/// - Converts the input character stream into lexemes with source lines.
/// - Handles numeric, string and f-string literals, labels and operators.
/// - Reports lexical errors for invalid or malformed input.
pub mod lexer;
/// The mutable, doubly linked token line every statement is reduced in.
pub mod line;
/// Loaded programs: statement lines, labels and cross-line block scans.
pub mod program;
/// The flat, scoped variable table.
pub mod symbols;
/// Tokens, their categories and the static priority table.
pub mod token;
/// The value module defines the runtime data types for evaluation.
///
/// # Responsibilities
/// - Defines the `Value` enum and the `ValueType` of declarations.
/// - Implements conversions and checks shared by operators and natives.
pub mod value;
