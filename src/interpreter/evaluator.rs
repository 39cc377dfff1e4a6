/// Binary operator evaluation logic.
///
/// Handles arithmetic, string concatenation, comparisons, logical operators
/// and exponentiation on already resolved values.
pub mod binary;

/// Unary operator evaluation logic.
///
/// Implements arithmetic negation and logical NOT.
pub mod unary;

/// Core evaluation logic and context management.
///
/// Contains the runtime context, the step loop and the helpers that move
/// the execution position.
pub mod core;

/// In-place reduction of operators, brackets, assignments, declarations and
/// f-strings.
pub mod reduce;

/// `if`, `else`, `goto`, `goback`, `system` and block ends.
pub mod control;

/// `while` and `for` loops, `break` and `continue`.
pub mod loops;

/// Function definition, calls and `return`.
pub mod call;

/// The fixed table of natives reachable through `system`.
pub mod native;
