use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Largest integer magnitude exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_U64_INT: u64 = 9_007_199_254_740_991;

/// Safely converts an `i64` to `f64` if and only if it is exactly
/// representable.
///
/// Used whenever an `int` operand is promoted to `float` for mixed
/// arithmetic or comparison.
///
/// ## Errors
/// Returns `Err(error)` if the value exceeds `MAX_SAFE_U64_INT` in absolute
/// value.
///
/// ## Example
/// ```
/// use tokline::util::num::{MAX_SAFE_U64_INT, i64_to_f64_checked};
///
/// assert_eq!(i64_to_f64_checked(42, "too big!").unwrap(), 42.0);
///
/// let big = MAX_SAFE_U64_INT as i64 + 1;
/// assert!(i64_to_f64_checked(big, "too big!").is_err());
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn i64_to_f64_checked<E>(value: i64, error: E) -> Result<f64, E> {
    if value.unsigned_abs() > MAX_SAFE_U64_INT {
        return Err(error);
    }
    Ok(value as f64)
}

/// Converts an `f64` to `i64` by truncating towards zero.
///
/// ## Errors
/// Returns `RuntimeError::UnhandledOperation` for NaN, infinities and values
/// outside the `i64` range.
///
/// ## Example
/// ```
/// use tokline::util::num::f64_to_i64_truncated;
///
/// assert_eq!(f64_to_i64_truncated(2.9, 1).unwrap(), 2);
/// assert_eq!(f64_to_i64_truncated(-2.9, 1).unwrap(), -2);
/// assert!(f64_to_i64_truncated(f64::NAN, 1).is_err());
/// ```
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
pub fn f64_to_i64_truncated(value: f64, line: usize) -> EvalResult<i64> {
    if !value.is_finite() || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(RuntimeError::UnhandledOperation { details: format!("{value} cannot be converted to int"),
                                                      line });
    }
    Ok(value.trunc() as i64)
}

/// Converts a non-negative `i64` exponent to `u32` for `checked_pow`.
///
/// ## Errors
/// Returns `RuntimeError::UnhandledOperation` when the exponent does not fit.
pub fn i64_to_u32_checked(value: i64, line: usize) -> EvalResult<u32> {
    u32::try_from(value).map_err(|_| RuntimeError::UnhandledOperation { details: format!("exponent {value} is out of range"),
                                                                         line })
}

/// Converts a length to an `int` value.
///
/// ## Errors
/// Returns `RuntimeError::UnhandledOperation` if the length exceeds `i64`.
pub fn usize_to_i64_checked(value: usize, line: usize) -> EvalResult<i64> {
    i64::try_from(value).map_err(|_| RuntimeError::UnhandledOperation { details: format!("length {value} is out of range"),
                                                                         line })
}

/// Formats a float so that integral values keep a trailing `.0`.
///
/// ## Example
/// ```
/// use tokline::util::num::format_float;
///
/// assert_eq!(format_float(3.0), "3.0");
/// assert_eq!(format_float(2.5), "2.5");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
