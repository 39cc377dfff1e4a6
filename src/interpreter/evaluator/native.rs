use std::{collections::HashMap, io::Write};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{f64_to_i64_truncated, usize_to_i64_checked},
};

/// What a native function may touch besides its arguments.
pub struct NativeEnv<'a> {
    /// Where `print` writes.
    pub output:     &'a mut dyn Write,
    /// Host properties readable through `property`.
    pub properties: &'a HashMap<String, String>,
}

/// Type alias for native function handlers.
///
/// A native receives its environment, the resolved argument values and the
/// line number. It returns `None` when it produces no value.
type NativeFn = fn(&mut NativeEnv<'_>, &[Value], usize) -> EvalResult<Option<Value>>;

/// Specifies the allowed number of arguments for a native.
///
/// - `Exact(n)` means the native must receive exactly `n` arguments.
/// - `Any` accepts any number of arguments.
#[derive(Clone, Copy)]
enum Arity {
    Exact(usize),
    Any,
}

/// Defines native functions by generating a lookup table and a name list.
///
/// The macro produces:
/// - `NativeDef` (internal metadata),
/// - `NATIVE_TABLE` (static table for lookup),
/// - `NATIVE_FUNCTIONS` (public list of native names).
macro_rules! native_functions {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        struct NativeDef {
            name:  &'static str,
            arity: Arity,
            func:  NativeFn,
        }
        static NATIVE_TABLE: &[NativeDef] = &[
            $(
                NativeDef { name: $name, arity: $arity, func: $func },
            )*
        ];
        /// Names accepted by `system`.
        pub const NATIVE_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

native_functions! {
    "print"    => { arity: Arity::Any,      func: |env, args, line| print(env, args, "", line) },
    "println"  => { arity: Arity::Any,      func: |env, args, line| print(env, args, "\n", line) },
    "len"      => { arity: Arity::Exact(1), func: len },
    "str"      => { arity: Arity::Exact(1), func: |_, args, _| Ok(Some(Value::Str(args[0].to_string()))) },
    "int"      => { arity: Arity::Exact(1), func: to_int },
    "float"    => { arity: Arity::Exact(1), func: to_float },
    "type"     => { arity: Arity::Exact(1), func: |_, args, _| Ok(Some(Value::from(args[0].value_type().name()))) },
    "property" => { arity: Arity::Exact(1), func: property },
}

impl Arity {
    /// Tests whether the given argument count satisfies this arity constraint.
    const fn check(self, n: usize) -> bool {
        match self {
            Self::Exact(m) => n == m,
            Self::Any => true,
        }
    }

    const fn expected(self, found: usize) -> usize {
        match self {
            Self::Exact(m) => m,
            Self::Any => found,
        }
    }
}

impl Context {
    /// Invokes the native function `name`.
    ///
    /// # Errors
    /// - `RuntimeError::UndefinedFunction` for unknown names.
    /// - `RuntimeError::ArgumentCountMismatch` for a wrong argument count.
    /// - Whatever the native itself reports.
    pub(crate) fn call_native(&mut self, name: &str, args: &[Value], line: usize) -> EvalResult<Option<Value>> {
        let native = NATIVE_TABLE.iter()
                                 .find(|native| native.name == name)
                                 .ok_or_else(|| RuntimeError::UndefinedFunction { name: name.to_string(),
                                                                                  line })?;
        if !native.arity.check(args.len()) {
            return Err(RuntimeError::ArgumentCountMismatch { name: name.to_string(),
                                                             expected: native.arity.expected(args.len()),
                                                             found: args.len(),
                                                             line });
        }

        let mut env = NativeEnv { output:     self.output.as_mut(),
                                  properties: &self.properties, };
        (native.func)(&mut env, args, line)
    }
}

/// Writes the arguments separated by single spaces, followed by `end`.
fn print(env: &mut NativeEnv<'_>, args: &[Value], end: &str, line: usize) -> EvalResult<Option<Value>> {
    let text = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
    write!(env.output, "{text}{end}").map_err(|e| RuntimeError::UnhandledOperation { details: format!("cannot write output: {e}"),
                                                                                     line })?;
    Ok(None)
}

/// Returns the number of characters in a string.
fn len(_: &mut NativeEnv<'_>, args: &[Value], line: usize) -> EvalResult<Option<Value>> {
    match &args[0] {
        Value::Str(s) => Ok(Some(Value::Int(usize_to_i64_checked(s.chars().count(), line)?))),
        other => Err(RuntimeError::TypeMismatch { details: format!("len expects a string but got {} '{other}'",
                                                                   other.value_type()),
                                                  line }),
    }
}

/// Converts a number, boolean or numeric string to `int`. Floats truncate
/// towards zero.
fn to_int(_: &mut NativeEnv<'_>, args: &[Value], line: usize) -> EvalResult<Option<Value>> {
    let value = match &args[0] {
        Value::Int(n) => *n,
        Value::Float(x) => f64_to_i64_truncated(*x, line)?,
        Value::Bool(b) => i64::from(*b),
        Value::Str(s) => s.trim().parse().map_err(|_| RuntimeError::UnhandledOperation { details: format!("'{s}' is not an int"),
                                                                                          line })?,
        other => {
            return Err(RuntimeError::TypeMismatch { details: format!("cannot convert {} '{other}' to int",
                                                                     other.value_type()),
                                                    line });
        },
    };
    Ok(Some(Value::Int(value)))
}

/// Converts a number or numeric string to `float`.
fn to_float(_: &mut NativeEnv<'_>, args: &[Value], line: usize) -> EvalResult<Option<Value>> {
    let value = match &args[0] {
        Value::Int(_) | Value::Float(_) => args[0].as_float(line)?,
        Value::Str(s) => s.trim().parse().map_err(|_| RuntimeError::UnhandledOperation { details: format!("'{s}' is not a float"),
                                                                                          line })?,
        other => {
            return Err(RuntimeError::TypeMismatch { details: format!("cannot convert {} '{other}' to float",
                                                                     other.value_type()),
                                                    line });
        },
    };
    Ok(Some(Value::Float(value)))
}

/// Looks a host property up; `null` when it is not set.
fn property(env: &mut NativeEnv<'_>, args: &[Value], line: usize) -> EvalResult<Option<Value>> {
    let Value::Str(key) = &args[0] else {
        return Err(RuntimeError::TypeMismatch { details: format!("property expects a string key but got {} '{}'",
                                                                 args[0].value_type(),
                                                                 args[0]),
                                                line });
    };
    Ok(Some(env.properties.get(key).map_or(Value::Null, |value| Value::from(value.as_str()))))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;

    fn call(name: &str, args: &[Value]) -> (EvalResult<Option<Value>>, String) {
        let mut output = Vec::new();
        let properties = HashMap::from([("mode".to_string(), "test".to_string())]);
        let native = NATIVE_TABLE.iter().find(|native| native.name == name).unwrap();
        let mut env = NativeEnv { output:     &mut output,
                                  properties: &properties, };
        let result = (native.func)(&mut env, args, 1);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn print_joins_arguments_with_spaces() {
        let (result, output) = call("println", &[Value::from("a"), Value::Int(1), Value::Float(2.0)]);
        assert_eq!(result.unwrap(), None);
        assert_eq!(output, "a 1 2.0\n");
    }

    #[test]
    fn conversions() {
        assert_eq!(call("int", &[Value::Float(-2.7)]).0.unwrap(), Some(Value::Int(-2)));
        assert_eq!(call("int", &[Value::from(" 42 ")]).0.unwrap(), Some(Value::Int(42)));
        assert_eq!(call("float", &[Value::Int(3)]).0.unwrap(), Some(Value::Float(3.0)));
        assert_eq!(call("str", &[Value::Bool(true)]).0.unwrap(), Some(Value::from("true")));
        assert_eq!(call("type", &[Value::Null]).0.unwrap(), Some(Value::from("null")));
        assert_eq!(call("int", &[Value::from("x")]).0.unwrap_err().kind(),
                   ErrorKind::UnhandledOperation);
    }

    #[test]
    fn len_counts_characters() {
        assert_eq!(call("len", &[Value::from("héllo")]).0.unwrap(), Some(Value::Int(5)));
        assert_eq!(call("len", &[Value::Int(5)]).0.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn properties_default_to_null() {
        assert_eq!(call("property", &[Value::from("mode")]).0.unwrap(), Some(Value::from("test")));
        assert_eq!(call("property", &[Value::from("other")]).0.unwrap(), Some(Value::Null));
    }

    #[test]
    fn names_are_listed() {
        assert!(NATIVE_FUNCTIONS.contains(&"println"));
        assert_eq!(NATIVE_FUNCTIONS.len(), NATIVE_TABLE.len());
    }
}
