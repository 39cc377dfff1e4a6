use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        token::Operator,
        value::core::Value,
    },
};

impl Context {
    /// Evaluates `+`, `-`, `*`, `/` or `%`.
    ///
    /// A string on either side of `+` concatenates with the display form of
    /// the other operand. Two integers use checked integer arithmetic; an
    /// integer mixed with a float is promoted. Division truncates towards zero
    /// for integers.
    ///
    /// # Parameters
    /// - `op`: The arithmetic operator.
    /// - `left`: Left operand.
    /// - `right`: Right operand.
    /// - `line`: Line number for error reporting.
    ///
    /// # Returns
    /// - `Err(RuntimeError::DivisionByZero)` for `/` or integer `%` by zero.
    /// - `Err(RuntimeError::UnimplementedOperation)` for `%` on floats.
    /// - `Err(RuntimeError::UnhandledOperation)` on overflow or for operand
    ///   types the operator does not accept.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{evaluator::core::Context, token::Operator, value::core::Value};
    ///
    /// let sum = Context::eval_arithmetic(Operator::Add, &Value::Int(1), &Value::Float(0.5), 1);
    /// assert_eq!(sum.unwrap(), Value::Float(1.5));
    ///
    /// let text = Context::eval_arithmetic(Operator::Add, &Value::from("n="), &Value::Int(3), 1);
    /// assert_eq!(text.unwrap(), Value::from("n=3"));
    /// ```
    pub fn eval_arithmetic(op: Operator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
        use Value::{Float, Int, Str};

        match (left, right) {
            (Str(a), b) if op == Operator::Add => Ok(Str(format!("{a}{b}"))),
            (a, Str(b)) if op == Operator::Add => Ok(Str(format!("{a}{b}"))),
            (Int(a), Int(b)) => Self::eval_int_op(op, *a, *b, line).map(Int),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                Self::eval_float_op(op, a.as_float(line)?, b.as_float(line)?, line).map(Float)
            },
            _ => Err(RuntimeError::UnhandledOperation { details: format!("cannot apply '{op}' to {} '{left}' and {} '{right}'",
                                                                         left.value_type(),
                                                                         right.value_type()),
                                                        line }),
        }
    }

    fn eval_int_op(op: Operator, a: i64, b: i64, line: usize) -> EvalResult<i64> {
        let result = match op {
            Operator::Add => a.checked_add(b),
            Operator::Sub => a.checked_sub(b),
            Operator::Mul => a.checked_mul(b),
            Operator::Div | Operator::Mod if b == 0 => {
                return Err(RuntimeError::DivisionByZero { line });
            },
            Operator::Div => a.checked_div(b),
            Operator::Mod => a.checked_rem(b),
            _ => {
                return Err(RuntimeError::UnrecognizedOperator { token: op.to_string(),
                                                                line });
            },
        };
        result.ok_or_else(|| RuntimeError::UnhandledOperation { details: format!("integer overflow in {a} {op} {b}"),
                                                                line })
    }

    fn eval_float_op(op: Operator, a: f64, b: f64, line: usize) -> EvalResult<f64> {
        match op {
            Operator::Add => Ok(a + b),
            Operator::Sub => Ok(a - b),
            Operator::Mul => Ok(a * b),
            Operator::Div if b == 0.0 => Err(RuntimeError::DivisionByZero { line }),
            Operator::Div => Ok(a / b),
            Operator::Mod => Err(RuntimeError::UnimplementedOperation { details: "'%' on float operands".to_string(),
                                                                        line }),
            _ => Err(RuntimeError::UnrecognizedOperator { token: op.to_string(),
                                                          line }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;

    use Value::{Bool, Float, Int, Str};

    fn eval(op: Operator, left: Value, right: Value) -> EvalResult<Value> {
        Context::eval_arithmetic(op, &left, &right, 1)
    }

    #[test]
    fn integer_division_truncates() {
        assert_eq!(eval(Operator::Div, Int(7), Int(2)).unwrap(), Int(3));
        assert_eq!(eval(Operator::Div, Int(-7), Int(2)).unwrap(), Int(-3));
        assert_eq!(eval(Operator::Mod, Int(7), Int(3)).unwrap(), Int(1));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(eval(Operator::Div, Int(1), Int(0)).unwrap_err().kind(), ErrorKind::DivisionByZero);
        assert_eq!(eval(Operator::Mod, Int(1), Int(0)).unwrap_err().kind(), ErrorKind::DivisionByZero);
        assert_eq!(eval(Operator::Div, Float(1.0), Float(0.0)).unwrap_err().kind(),
                   ErrorKind::DivisionByZero);
    }

    #[test]
    fn float_modulus_is_not_supported() {
        assert_eq!(eval(Operator::Mod, Float(5.5), Int(2)).unwrap_err().kind(),
                   ErrorKind::UnimplementedOperation);
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(eval(Operator::Add, Int(i64::MAX), Int(1)).unwrap_err().kind(),
                   ErrorKind::UnhandledOperation);
        assert_eq!(eval(Operator::Div, Int(i64::MIN), Int(-1)).unwrap_err().kind(),
                   ErrorKind::UnhandledOperation);
    }

    #[test]
    fn incompatible_operands() {
        assert_eq!(eval(Operator::Sub, Str("a".into()), Int(1)).unwrap_err().kind(),
                   ErrorKind::UnhandledOperation);
        assert_eq!(eval(Operator::Mul, Bool(true), Int(2)).unwrap_err().kind(),
                   ErrorKind::UnhandledOperation);
    }

    #[test]
    fn strings_concatenate_with_anything() {
        assert_eq!(eval(Operator::Add, Str("x".into()), Bool(true)).unwrap(), Value::from("xtrue"));
        assert_eq!(eval(Operator::Add, Float(2.0), Str("!".into())).unwrap(), Value::from("2.0!"));
    }
}
