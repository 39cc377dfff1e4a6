/// Binary operator dispatch.
pub mod core;

/// `+`, `-`, `*`, `/` and `%` on numbers, plus string concatenation.
pub mod arithmetic;

/// Equality and ordering comparisons.
pub mod comparison;

/// `&&` and `||`.
pub mod logic;

/// Exponentiation.
pub mod power;
