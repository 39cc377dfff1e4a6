use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        token::Operator,
        value::core::Value,
    },
};

impl Context {
    /// Evaluates a logical operation between two boolean values.
    ///
    /// Both operands are already reduced when the operator is selected, so
    /// there is no short-circuiting; both must be booleans.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{evaluator::core::Context, token::Operator, value::core::Value};
    ///
    /// let result = Context::eval_logic(Operator::Or, &Value::Bool(false), &Value::Bool(true), 1);
    /// assert_eq!(result.unwrap(), Value::Bool(true));
    /// ```
    pub fn eval_logic(op: Operator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
        match op {
            Operator::And => Ok(Value::Bool(left.as_bool(line)? && right.as_bool(line)?)),
            Operator::Or => Ok(Value::Bool(left.as_bool(line)? || right.as_bool(line)?)),
            _ => Err(RuntimeError::UnrecognizedOperator { token: op.to_string(),
                                                          line }),
        }
    }
}
