use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        token::Operator,
        value::core::Value,
    },
};

impl Context {
    /// Evaluates a comparison of the form `Value <Operator> Value`.
    ///
    /// `==` and `!=` accept any pair of values: numbers compare by numeric
    /// value across `int` and `float`, everything else compares structurally
    /// and values of different types are never equal. The ordering operators
    /// accept two numbers or two strings.
    ///
    /// # Parameters
    /// - `op`: The comparison operator.
    /// - `left`: The left-hand value.
    /// - `right`: The right-hand value.
    /// - `line`: Current line number used for error reporting.
    ///
    /// # Returns
    /// An `EvalResult<Value>` containing a boolean result.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{evaluator::core::Context, token::Operator, value::core::Value};
    ///
    /// let result = Context::eval_comparison(Operator::Less, &Value::Int(3), &Value::Float(3.5), 1);
    /// assert_eq!(result.unwrap(), Value::Bool(true));
    ///
    /// let result = Context::eval_comparison(Operator::Equal, &Value::from("3"), &Value::Int(3), 1);
    /// assert_eq!(result.unwrap(), Value::Bool(false));
    /// ```
    pub fn eval_comparison(op: Operator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
        let outcome = match op {
            Operator::Equal => Self::values_equal(left, right, line)?,
            Operator::NotEqual => !Self::values_equal(left, right, line)?,
            _ => {
                let ordering = Self::order(left, right).ok_or_else(|| {
                                   RuntimeError::UnhandledOperation { details: format!("cannot compare {} '{left}' {op} {} '{right}'",
                                                                                       left.value_type(),
                                                                                       right.value_type()),
                                                                      line }
                               })?;
                match op {
                    Operator::Less => ordering == Ordering::Less,
                    Operator::Greater => ordering == Ordering::Greater,
                    Operator::LessEqual => ordering != Ordering::Greater,
                    Operator::GreaterEqual => ordering != Ordering::Less,
                    _ => {
                        return Err(RuntimeError::UnrecognizedOperator { token: op.to_string(),
                                                                        line });
                    },
                }
            },
        };
        Ok(Value::Bool(outcome))
    }

    fn values_equal(left: &Value, right: &Value, line: usize) -> EvalResult<bool> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                Ok(OrderedFloat(a.as_float(line)?) == OrderedFloat(b.as_float(line)?))
            },
            (a, b) => Ok(a == b),
        }
    }

    fn order(left: &Value, right: &Value) -> Option<Ordering> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let a = OrderedFloat(a.as_float(0).ok()?);
                let b = OrderedFloat(b.as_float(0).ok()?);
                Some(a.cmp(&b))
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;

    fn compare(op: Operator, left: Value, right: Value) -> EvalResult<Value> {
        Context::eval_comparison(op, &left, &right, 1)
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(compare(Operator::Equal, Value::Int(2), Value::Float(2.0)).unwrap(),
                   Value::Bool(true));
        assert_eq!(compare(Operator::GreaterEqual, Value::Float(1.5), Value::Int(2)).unwrap(),
                   Value::Bool(false));
    }

    #[test]
    fn strings_order_lexicographically() {
        assert_eq!(compare(Operator::Less, Value::from("abc"), Value::from("abd")).unwrap(),
                   Value::Bool(true));
    }

    #[test]
    fn equality_accepts_mixed_types() {
        assert_eq!(compare(Operator::NotEqual, Value::Null, Value::Bool(false)).unwrap(),
                   Value::Bool(true));
        assert_eq!(compare(Operator::Equal, Value::Null, Value::Null).unwrap(), Value::Bool(true));
    }

    #[test]
    fn ordering_rejects_mixed_types() {
        let err = compare(Operator::Less, Value::from("1"), Value::Int(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnhandledOperation);
    }
}
