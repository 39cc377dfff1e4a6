use crate::{
    error::RuntimeError,
    interpreter::evaluator::core::EvalResult,
    util::num::{format_float, i64_to_f64_checked},
};

/// The declared type of a variable, parameter or function result.
///
/// Every [`Value`] has exactly one type. Once a variable is bound, all later
/// assignments to it must carry the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 64 bit signed integers, written `int`.
    Int,
    /// Double precision floats, written `float`.
    Float,
    /// Strings, written `string`.
    String,
    /// Booleans, written `bool`.
    Boolean,
    /// The unit type, written `null`.
    Null,
    /// References to user-defined functions.
    Def,
}

impl ValueType {
    /// Returns the value a variable of this type holds when it is declared
    /// without an initializer.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::Str(String::new()),
            Self::Boolean => Value::Bool(false),
            Self::Null => Value::Null,
            Self::Def => Value::Def(String::new()),
        }
    }

    /// Returns the keyword used for this type in source code.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "bool",
            Self::Null => "null",
            Self::Def => "def",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Represents a runtime value in the interpreter.
///
/// Values live inside literal tokens; every reduction step consumes the values
/// of neighbouring tokens and splices a new literal token holding the result
/// back into the line.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A 64 bit integer.
    Int(i64),
    /// A double precision float.
    Float(f64),
    /// A string.
    Str(String),
    /// A boolean, produced by comparisons and logical operators and required
    /// by every condition.
    Bool(bool),
    /// The only value of the `null` type.
    Null,
    /// A reference to the user-defined function with the given name.
    Def(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl Value {
    /// Returns the type of this value.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::value::core::{Value, ValueType};
    ///
    /// assert_eq!(Value::Int(3).value_type(), ValueType::Int);
    /// assert_eq!(Value::from("x").value_type(), ValueType::String);
    /// ```
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::String,
            Self::Bool(_) => ValueType::Boolean,
            Self::Null => ValueType::Null,
            Self::Def(_) => ValueType::Def,
        }
    }

    /// Converts the value to `bool`, or returns an error if not boolean.
    ///
    /// Used for conditions and logical operators.
    ///
    /// # Parameters
    /// - `line`: Source code line number for error reporting.
    ///
    /// # Returns
    /// - `Ok(bool)`: The boolean value.
    /// - `Err(RuntimeError::TypeMismatch)`: If not boolean.
    pub fn as_bool(&self, line: usize) -> EvalResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(RuntimeError::TypeMismatch { details: format!("expected bool but found {} '{self}'",
                                                                   self.value_type()),
                                                  line }),
        }
    }

    /// Converts the value to an `f64`, or returns an error if not numeric.
    ///
    /// Integers are promoted as long as they are exactly representable.
    ///
    /// # Parameters
    /// - `line`: Source code line number for error reporting.
    pub fn as_float(&self, line: usize) -> EvalResult<f64> {
        match self {
            Self::Float(f) => Ok(*f),
            Self::Int(n) => i64_to_f64_checked(*n,
                                               RuntimeError::UnhandledOperation { details: format!("{n} cannot be promoted to float"),
                                                                                  line }),
            _ => Err(RuntimeError::TypeMismatch { details: format!("expected a number but found {} '{self}'",
                                                                   self.value_type()),
                                                  line }),
        }
    }

    /// Returns `true` for `int` and `float` values.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{}", format_float(*x)),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
            Self::Def(name) => write!(f, "<def {name}>"),
        }
    }
}
