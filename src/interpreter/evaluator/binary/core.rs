use crate::interpreter::{
    evaluator::core::{Context, EvalResult},
    token::Operator,
    value::core::Value,
};

impl Context {
    /// Evaluates a binary operation between two values.
    ///
    /// Routes the operation to the arithmetic, power, comparison or logic
    /// handler depending on the operator.
    ///
    /// # Parameters
    /// - `op`: The operator.
    /// - `left`: Left operand.
    /// - `right`: Right operand.
    /// - `line`: Line number for error reporting.
    ///
    /// # Returns
    /// An `EvalResult<Value>` containing the evaluated result.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{evaluator::core::Context, token::Operator, value::core::Value};
    ///
    /// let left = Value::Int(3);
    /// let right = Value::Int(4);
    ///
    /// let result = Context::eval_binary(Operator::Add, &left, &right, 1);
    /// assert_eq!(result.unwrap(), Value::Int(7));
    /// ```
    pub fn eval_binary(op: Operator, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
        use Operator::{
            Add, And, Div, Equal, Greater, GreaterEqual, Less, LessEqual, Mod, Mul, NotEqual, Or,
            Pow, Sub,
        };

        match op {
            Add | Sub | Mul | Div | Mod => Self::eval_arithmetic(op, left, right, line),
            Pow => Self::eval_pow(left, right, line),
            Less | Greater | LessEqual | GreaterEqual | Equal | NotEqual => {
                Self::eval_comparison(op, left, right, line)
            },
            And | Or => Self::eval_logic(op, left, right, line),
            _ => Err(crate::error::RuntimeError::UnrecognizedOperator { token: op.to_string(),
                                                                        line }),
        }
    }
}
