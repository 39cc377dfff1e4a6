use std::{
    cell::RefCell,
    fs::{self},
    io::{self, Write},
    rc::Rc,
};

use pretty_assertions::assert_eq;
use tokline::{
    error::{Error, ErrorKind},
    interpreter::{
        evaluator::core::{Config, Context},
        program::Program,
        value::core::Value,
    },
    run_with,
};
use walkdir::WalkDir;

/// An output sink the test keeps a handle on after the context took it.
#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn scripts_work() {
    let mut count = 0;

    for entry in
        WalkDir::new("tests/scripts").into_iter()
                                     .filter_map(Result::ok)
                                     .filter(|e| e.path().extension().is_some_and(|ext| ext == "tkl"))
    {
        let path = entry.path();
        let source =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        count += 1;
        let output = Captured::default();
        if let Err(e) = run_with(&source, Config::default(), Box::new(output.clone())) {
            panic!("Script {path:?} failed:\n{source}\nError: {e}");
        }

        let expected = path.with_extension("out");
        if expected.exists() {
            let expected = fs::read_to_string(&expected).unwrap_or_else(|e| {
                                                            panic!("Failed to read {expected:?}: {e}")
                                                        });
            assert_eq!(output.text(), expected, "output of {path:?}");
        }
    }

    assert!(count > 0, "No scripts found in tests/scripts");
}

fn assert_success(src: &str) -> Context {
    match run_with(src, Config::default(), Box::new(io::sink())) {
        Ok(context) => context,
        Err(e) => panic!("Expected success, got error: {e}\nSource:\n{src}"),
    }
}

fn assert_failure(src: &str, kind: ErrorKind) -> Error {
    match run_with(src, Config::default(), Box::new(io::sink())) {
        Ok(_) => panic!("Expected {kind:?}, but the script succeeded\nSource:\n{src}"),
        Err(e) => {
            assert_eq!(e.kind(), kind, "unexpected error: {e}");
            e
        },
    }
}

fn output_of(src: &str) -> String {
    let output = Captured::default();
    if let Err(e) = run_with(src, Config::default(), Box::new(output.clone())) {
        panic!("Expected success, got error: {e}\nSource:\n{src}");
    }
    output.text()
}

fn value(context: &Context, name: &str) -> Value {
    context.variable(name)
           .cloned()
           .unwrap_or_else(|| panic!("'{name}' is not declared"))
}

// ---------- Expressions ----------

#[test]
fn precedence() {
    let context = assert_success("int a = 2 + 3 * 4\nint b = (2 + 3) * 4\nint c = -3 * 2\nint d = 10 - 4 - 3");
    assert_eq!(value(&context, "a"), Value::Int(14));
    assert_eq!(value(&context, "b"), Value::Int(20));
    assert_eq!(value(&context, "c"), Value::Int(-6));
    assert_eq!(value(&context, "d"), Value::Int(3));
}

#[test]
fn negation_binds_looser_than_power() {
    let context = assert_success("int a = -2 ** 2\nint b = 2 * -3\nfloat c = 2 ** -1\nint d = 2 * -3 ** 2\nfloat e = -2 ** -1\nint f = (-2) ** 2");
    assert_eq!(value(&context, "a"), Value::Int(-4));
    assert_eq!(value(&context, "b"), Value::Int(-6));
    assert_eq!(value(&context, "c"), Value::Float(0.5));
    assert_eq!(value(&context, "d"), Value::Int(-18));
    assert_eq!(value(&context, "e"), Value::Float(-0.5));
    assert_eq!(value(&context, "f"), Value::Int(4));
}

#[test]
fn mixed_numbers_and_strings() {
    let context = assert_success("float half = 7 / 2.0\nint rem = 7 % 3\nstring s = \"n=\" + 4\nbool b = 1 < 2 && !false");
    assert_eq!(value(&context, "half"), Value::Float(3.5));
    assert_eq!(value(&context, "rem"), Value::Int(1));
    assert_eq!(value(&context, "s"), Value::from("n=4"));
    assert_eq!(value(&context, "b"), Value::Bool(true));
}

#[test]
fn compound_assignment() {
    let context = assert_success("int x = 10\nx += 5\nx *= 2\nx -= 1\nx /= 3\nx %= 4");
    assert_eq!(value(&context, "x"), Value::Int(1));
}

#[test]
fn failed_update_keeps_the_old_value() {
    let program = Program::from_source("int n = 4\nn = \"four\"").unwrap();
    let mut context = Context::new(program);
    let error = context.run().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    assert_eq!(context.variable("n"), Some(&Value::Int(4)));
}

#[test]
fn a_lone_literal_is_left_alone() {
    let program = Program::from_source("42").unwrap();
    let mut context = Context::with_config(program, Config::default(), Box::new(io::sink()));
    assert_eq!(context.working_line().to_string(), "42");
    context.step().unwrap();
    assert!(context.is_finished());
    assert_eq!(context.symbols().len(), 0);
}

#[test]
fn f_strings_interpolate_variables() {
    assert_eq!(output_of("int n = 3\nstring who = \"you\"\nsystem println f\"{who} got {n}!\""),
               "you got 3!\n");
}

// ---------- Control flow ----------

#[test]
fn while_loop() {
    let context = assert_success("int i = 0\nwhile i < 3 {\n  int next = i + 1\n  i = next\n}");
    assert_eq!(value(&context, "i"), Value::Int(3));
    assert_eq!(context.variable("next"), None);
    assert_eq!(context.scope_depth(), 0);
    assert_eq!(context.loop_depth(), 0);
}

#[test]
fn for_loop_variable_is_scoped_to_the_loop() {
    let context = assert_success("int total = 0\nfor (int i = 0; i < 5; i += 1) {\n  total += i\n}");
    assert_eq!(value(&context, "total"), Value::Int(10));
    assert_eq!(context.variable("i"), None);
}

#[test]
fn for_loop_with_empty_parts() {
    let context = assert_success("int i = 0\nfor (; i < 4;) {\n  i += 2\n}");
    assert_eq!(value(&context, "i"), Value::Int(4));
}

#[test]
fn if_else_branches() {
    let src = |x: i64| {
        format!("int x = {x}\nstring r = \"\"\nif x > 3 {{\n  r = \"big\"\n}} else {{\n  r = \"small\"\n}}")
    };
    assert_eq!(value(&assert_success(&src(5)), "r"), Value::from("big"));
    assert_eq!(value(&assert_success(&src(1)), "r"), Value::from("small"));
}

#[test]
fn else_if_chain() {
    let src = |n: i64| {
        format!("int n = {n}\nstring r = \"\"\nif n == 1 {{\nr = \"one\"\n}} else if n == 2 {{\nr = \"two\"\n}} else {{\nr = \"many\"\n}}")
    };
    assert_eq!(value(&assert_success(&src(1)), "r"), Value::from("one"));
    assert_eq!(value(&assert_success(&src(2)), "r"), Value::from("two"));
    assert_eq!(value(&assert_success(&src(7)), "r"), Value::from("many"));
}

#[test]
fn block_variables_go_out_of_scope() {
    let context = assert_success("if true {\n  int tmp = 1\n}\nint tmp = 2");
    assert_eq!(value(&context, "tmp"), Value::Int(2));
}

#[test]
fn break_and_continue() {
    let src = "int i = 0
int sum = 0
while true {
  i += 1
  if i == 2 {
    continue
  }
  if i > 4 {
    break
  }
  sum += i
}";
    let context = assert_success(src);
    assert_eq!(value(&context, "sum"), Value::Int(8));
    assert_eq!(value(&context, "i"), Value::Int(5));
    assert_eq!(context.scope_depth(), 0);
}

#[test]
fn goto_and_goback() {
    let src = "int x = 1
goto double
x += 100
goto done
@double
x *= 2
goback
@done";
    let context = assert_success(src);
    assert_eq!(value(&context, "x"), Value::Int(102));
    // The jump to `done` is never returned from.
    assert_eq!(context.goto_depth(), 1);
}

#[test]
fn goto_out_of_a_loop_closes_its_scopes() {
    let src = "for (int i = 0; i < 3; i += 1) {
  goto out
}
@out
for (int i = 0; i < 2; i += 1) {
}";
    let context = assert_success(src);
    assert_eq!(context.scope_depth(), 0);
    assert_eq!(context.loop_depth(), 0);

    let src = "while true {
  int tmp = 1
  goto out
}
@out
int tmp = 2";
    let context = assert_success(src);
    assert_eq!(value(&context, "tmp"), Value::Int(2));
    assert_eq!(context.scope_depth(), 0);
}

#[test]
fn goto_out_of_an_if_block_closes_its_scope() {
    let src = "int x = 2
if x > 1 {
  int inner = 1
  goto skip
}
@skip
int inner = 3";
    let context = assert_success(src);
    assert_eq!(value(&context, "inner"), Value::Int(3));
    assert_eq!(context.scope_depth(), 0);
    assert_eq!(context.loop_depth(), 0);
}

#[test]
fn goto_within_a_block_keeps_its_scope() {
    let src = "if true {
  int a = 1
  goto inner
  a = 5
  @inner
  a += 1
  system println a
}";
    assert_eq!(output_of(src), "2\n");
    assert_eq!(assert_success(src).scope_depth(), 0);
}

#[test]
fn goto_inside_a_function_keeps_the_caller_scopes() {
    let src = "def int pick(int n) {
  if n > 0 {
    goto positive
  }
  return 0
  @positive
  return 1
}
int r = 0
if true {
  r = pick(5)
}";
    let context = assert_success(src);
    assert_eq!(value(&context, "r"), Value::Int(1));
    assert_eq!(context.scope_depth(), 0);
    assert_eq!(context.call_depth(), 0);
}

// ---------- Functions ----------

#[test]
fn function_call() {
    let context = assert_success("def int add(int a, int b) {\n  return a + b\n}\nint s = add(2, 3)");
    assert_eq!(value(&context, "s"), Value::Int(5));
    assert_eq!(context.call_depth(), 0);
    assert_eq!(context.variable("a"), None);
}

#[test]
fn call_inside_an_expression_restores_the_caller() {
    let src = "def int add(int a, int b) {\n  return a + b\n}\nif true {\n  int s = 1 + add(2, 3) * 2\n}";
    let program = Program::from_source(src).unwrap();
    let mut context = Context::with_config(program, Config::default(), Box::new(io::sink()));

    let mut before = None;
    while context.call_depth() == 0 {
        assert!(!context.is_finished(), "the call never started");
        before = Some((context.scope_depth(), context.current_line()));
        context.step().unwrap();
    }
    let (depth, line) = before.unwrap();
    assert_eq!(depth, 1);
    assert_eq!(line, Some(4));
    assert_eq!(context.scope_depth(), depth + 1);

    while context.call_depth() > 0 {
        context.step().unwrap();
    }
    assert_eq!(context.scope_depth(), depth);
    assert_eq!(context.current_line(), line);
    assert_eq!(context.working_line().to_string(), "int s = 1 + 5 * 2");

    while context.current_line() == line {
        context.step().unwrap();
    }
    assert_eq!(value(&context, "s"), Value::Int(11));
    context.run().unwrap();
    assert_eq!(context.scope_depth(), 0);
    assert_eq!(context.variable("s"), None);
}

#[test]
fn parameter_commas_are_optional() {
    let context = assert_success("def int sub(int a int b) {\n  return a - b\n}\nint s = sub(9, 4)");
    assert_eq!(value(&context, "s"), Value::Int(5));
}

#[test]
fn null_function_falls_off_its_body() {
    assert_eq!(output_of("def null greet(string who) {\n  system println f\"hello {who}\"\n}\ngreet(\"world\")"),
               "hello world\n");
}

#[test]
fn function_references() {
    let src = "def int twice(int n) {\n  return n * 2\n}\nf = twice\nint r = f(4)";
    let context = assert_success(src);
    assert_eq!(value(&context, "r"), Value::Int(8));
    assert_eq!(value(&context, "f"), Value::Def("twice".to_string()));
}

#[test]
fn calls_in_loop_conditions() {
    let src = "def bool small(int v) {\n  return v < 3\n}\nint i = 0\nwhile small(i) {\n  i += 1\n}";
    let context = assert_success(src);
    assert_eq!(value(&context, "i"), Value::Int(3));
}

#[test]
fn return_from_inside_a_loop() {
    let src = "def int first_over(int limit) {
  for (int i = 0; i < 100; i += 1) {
    if i * i > limit {
      return i
    }
  }
  return -1
}
int r = first_over(10)";
    let context = assert_success(src);
    assert_eq!(value(&context, "r"), Value::Int(4));
    assert_eq!(context.loop_depth(), 0);
    assert_eq!(context.scope_depth(), 0);
}

#[test]
fn recursion_rebinding_a_parameter_is_a_redeclaration() {
    let src = "def int fact(int n) {
  if n <= 1 {
    return 1
  }
  return n * fact(n - 1)
}
int r = fact(3)";
    assert_failure(src, ErrorKind::VariableRedeclaration);
}

// ---------- Natives ----------

#[test]
fn system_natives() {
    let context = assert_success("int l = system len \"abcd\"\nstring t = system type 1.5\nint n = system int \"42\"");
    assert_eq!(value(&context, "l"), Value::Int(4));
    assert_eq!(value(&context, "t"), Value::from("float"));
    assert_eq!(value(&context, "n"), Value::Int(42));
    assert_eq!(output_of("system println 1.5 * 2"), "3.0\n");
}

#[test]
fn parenthesized_system_call_inside_an_expression() {
    let context = assert_success("int n = (system len \"abc\") + 1\nint r = 0\nif (system len \"ab\") == 2 {\n  r = 1\n}");
    assert_eq!(value(&context, "n"), Value::Int(4));
    assert_eq!(value(&context, "r"), Value::Int(1));
}

#[test]
fn host_properties() {
    let config = Config::default().with_property("name", "tokline");
    let context = run_with("string n = system property \"name\"\nx = system property \"missing\"",
                           config,
                           Box::new(io::sink())).unwrap();
    assert_eq!(value(&context, "n"), Value::from("tokline"));
    assert_eq!(value(&context, "x"), Value::Null);
}

// ---------- Errors ----------

#[test]
fn runtime_errors() {
    assert_failure("int x = \"a\"", ErrorKind::TypeMismatch);
    assert_failure("int x = 1.5", ErrorKind::TypeMismatch);
    assert_failure("int x = 1\nx = 2.5", ErrorKind::TypeMismatch);
    assert_failure("y = z", ErrorKind::UndeclaredVariable);
    assert_failure("int x = 1\nif true {\nint x = 2\n}", ErrorKind::VariableRedeclaration);
    assert_failure("int x = 1 / 0", ErrorKind::DivisionByZero);
    assert_failure("goto nowhere", ErrorKind::UndefinedLabel);
    assert_failure("goback", ErrorKind::EmptyGotoStack);
    assert_failure("return 1", ErrorKind::EmptyCallStack);
    assert_failure("if 1 {\n}", ErrorKind::TypeMismatch);
    assert_failure("\"a\" < 1", ErrorKind::UnhandledOperation);
    assert_failure("float x = 5.5 % 2", ErrorKind::UnimplementedOperation);
    assert_failure("break", ErrorKind::UnhandledOperation);
    assert_failure("while true\nx = 1", ErrorKind::MissingBlock);
    assert_failure("1 2", ErrorKind::UnrecognizedOperator);
    assert_failure("string s = f\"{name\"", ErrorKind::UnterminatedBracket);
}

#[test]
fn function_errors() {
    assert_failure("g(1)", ErrorKind::UndefinedFunction);
    assert_failure("def int f() {\n}\nf(1)", ErrorKind::ArgumentCountMismatch);
    assert_failure("def int f() {\n}\nint x = f()", ErrorKind::TypeMismatch);
    assert_failure("def int f(int n) {\nreturn \"s\"\n}\nf(1)", ErrorKind::TypeMismatch);
    assert_failure("def int f(int n) {\nreturn n\n}\nf(\"s\")", ErrorKind::TypeMismatch);
    assert_failure("def int f() {\nreturn 1\n}\ndef int f() {\nreturn 2\n}",
                   ErrorKind::FunctionRedefinition);
    assert_failure("system nope 1", ErrorKind::UndefinedFunction);
    assert_failure("system len \"a\", \"b\"", ErrorKind::ArgumentCountMismatch);
}

#[test]
fn load_errors() {
    assert_failure("@a\n@a", ErrorKind::LabelRedefinition);
    assert_failure("x = $", ErrorKind::LexicalError);
    assert_failure("x = (1 + 2", ErrorKind::UnterminatedBracket);
}

#[test]
fn errors_carry_the_source_line() {
    let error = assert_failure("int x = 1\n\nint y = x / 0", ErrorKind::DivisionByZero);
    assert_eq!(error.to_string(), "Error on line 3: Division by zero.");
}

#[test]
fn output_before_an_error_is_kept() {
    let output = Captured::default();
    let result = run_with("system println \"before\"\nint x = 1 / 0",
                          Config::default(),
                          Box::new(output.clone()));
    assert!(result.is_err());
    assert_eq!(output.text(), "before\n");
}
