use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        token::Operator,
        value::core::Value,
    },
};

impl Context {
    /// Evaluates a unary operation on a value.
    ///
    /// Supported operators:
    /// - `Negate`: numeric negation for integers and floats.
    /// - `Not`: boolean negation.
    ///
    /// # Parameters
    /// - `op`: Unary operator.
    /// - `value`: Input value.
    /// - `line`: Line number for error reporting.
    ///
    /// # Returns
    /// The computed `Value` wrapped in `EvalResult`.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{evaluator::core::Context, token::Operator, value::core::Value};
    ///
    /// let v = Context::eval_unary(Operator::Negate, &Value::Int(5), 1).unwrap();
    /// assert_eq!(v, Value::Int(-5));
    ///
    /// let v = Context::eval_unary(Operator::Not, &Value::Bool(false), 1).unwrap();
    /// assert_eq!(v, Value::Bool(true));
    /// ```
    pub fn eval_unary(op: Operator, value: &Value, line: usize) -> EvalResult<Value> {
        match op {
            Operator::Negate => match value {
                Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                                     RuntimeError::UnhandledOperation { details: format!("integer overflow in -{n}"),
                                                                        line }
                                 }),
                Value::Float(x) => Ok(Value::Float(-x)),
                _ => Err(RuntimeError::UnhandledOperation { details: format!("cannot negate {} '{value}'",
                                                                             value.value_type()),
                                                            line }),
            },
            Operator::Not => Ok(Value::Bool(!value.as_bool(line)?)),
            _ => Err(RuntimeError::UnrecognizedOperator { token: op.to_string(),
                                                          line }),
        }
    }
}
