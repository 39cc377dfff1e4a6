use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::i64_to_u32_checked,
};

impl Context {
    /// Evaluates an exponentiation operation.
    ///
    /// Integer–integer exponentiation uses checked arithmetic. Negative integer
    /// exponents are computed in floating-point form. In all other cases the
    /// operands are promoted to floats and evaluated with `powf`.
    ///
    /// # Parameters
    /// - `base`: The base value.
    /// - `exponent`: The exponent value.
    /// - `line`: Line number for error reporting.
    ///
    /// # Returns
    /// An `EvalResult<Value>` containing the result of `base ** exponent`.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{evaluator::core::Context, value::core::Value};
    ///
    /// let result = Context::eval_pow(&Value::Int(2), &Value::Int(10), 1).unwrap();
    /// assert_eq!(result, Value::Int(1024));
    ///
    /// let result = Context::eval_pow(&Value::Int(2), &Value::Int(-1), 1).unwrap();
    /// assert_eq!(result, Value::Float(0.5));
    /// ```
    pub fn eval_pow(base: &Value, exponent: &Value, line: usize) -> EvalResult<Value> {
        use Value::{Float, Int};

        match (base, exponent) {
            (Int(b), Int(e)) => {
                if *e < 0 {
                    Ok(Float(base.as_float(line)?.powf(exponent.as_float(line)?)))
                } else {
                    b.checked_pow(i64_to_u32_checked(*e, line)?)
                     .map(Int)
                     .ok_or_else(|| RuntimeError::UnhandledOperation { details: format!("integer overflow in {b} ** {e}"),
                                                                       line })
                }
            },
            (b, e) if b.is_numeric() && e.is_numeric() => {
                Ok(Float(b.as_float(line)?.powf(e.as_float(line)?)))
            },
            _ => Err(RuntimeError::UnhandledOperation { details: format!("cannot raise {} '{base}' to {} '{exponent}'",
                                                                         base.value_type(),
                                                                         exponent.value_type()),
                                                        line }),
        }
    }
}
