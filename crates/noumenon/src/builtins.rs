//! The built-in function library and the host-function adapter.
//!
//! Built-ins are enum variants dispatched through a single [`Builtin::call`],
//! so the evaluator invokes them exactly like user functions: with a fresh
//! call scope (child of the caller's scope) and the evaluated arguments.
//! They never error; misuse yields Null.

use std::{borrow::Cow, fmt::Write as _, rc::Rc};

use crate::{
    error::ParseError,
    interp::Interp,
    object::Object,
    scope::{ScopeId, Scopes},
    value::{Function, Value},
};

/// A callable implemented by the embedding host.
///
/// Host functions receive their arguments as plain [`Object`] data and
/// return one; inside the interpreter they behave like any other function
/// value (a fresh call scope is created and the result replaces the call).
pub trait HostFunction {
    /// The name the function is bound to in the root scope.
    fn name(&self) -> &str;

    fn call(&self, args: Vec<Object>) -> Object;
}

/// The interpreter-native built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Print,
    Println,
    Typeof,
    Range,
    Length,
    List,
    Require,
}

impl Builtin {
    const ALL: [Self; 7] = [
        Self::Print,
        Self::Println,
        Self::Typeof,
        Self::Range,
        Self::Length,
        Self::List,
        Self::Require,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Println => "println",
            Self::Typeof => "typeof",
            Self::Range => "range",
            Self::Length => "length",
            Self::List => "list",
            Self::Require => "require",
        }
    }

    /// Calls this built-in. `scope` is the freshly minted call scope, whose
    /// parent chain is the caller's environment.
    pub fn call(
        self,
        interp: &mut Interp<'_>,
        scope: ScopeId,
        args: &[Value],
    ) -> Result<Value, ParseError> {
        match self {
            Self::Print => Ok(builtin_print(interp, args, false)),
            Self::Println => Ok(builtin_print(interp, args, true)),
            Self::Typeof => Ok(builtin_typeof(args)),
            Self::Range => Ok(builtin_range(args)),
            Self::Length => Ok(builtin_length(args)),
            Self::List => Ok(builtin_list(interp, scope)),
            Self::Require => builtin_require(interp, scope, args),
        }
    }
}

/// Installs every built-in into `scope` (normally the root scope).
pub(crate) fn install(scopes: &mut Scopes, scope: ScopeId) {
    for builtin in Builtin::ALL {
        scopes.declare(
            scope,
            Rc::from(builtin.name()),
            Value::Function(Function::Builtin(builtin)),
        );
    }
}

/// `print(xs…)` / `println(xs…)`: stringifies and writes each argument, no
/// separator; `println` appends a newline. Returns Null.
fn builtin_print(interp: &mut Interp<'_>, args: &[Value], newline: bool) -> Value {
    for arg in args {
        interp.out.stdout_write(Cow::Owned(arg.to_string()));
    }
    if newline {
        interp.out.stdout_push('\n');
    }
    Value::Null
}

/// `typeof(x)`: the name of the dynamic type, as a String.
fn builtin_typeof(args: &[Value]) -> Value {
    match args.first() {
        Some(value) => Value::Str(Rc::from(value.type_of().as_str())),
        None => Value::Null,
    }
}

/// `range(a, b)`: the Ints `a..b` as an Array (empty when `b <= a`).
fn builtin_range(args: &[Value]) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::Int(from)), Some(Value::Int(to))) => {
            Value::array((*from..*to).map(Value::Int).collect())
        }
        _ => Value::Null,
    }
}

/// `length(x)`: the iteration length as an Int; zero for non-iterables.
fn builtin_length(args: &[Value]) -> Value {
    match args.first() {
        Some(value) => Value::Int(value.length() as i64),
        None => Value::Null,
    }
}

/// `list()`: prints every variable in the scope chain, innermost first.
fn builtin_list(interp: &mut Interp<'_>, scope: ScopeId) -> Value {
    let mut output = String::from("Variables in current scope:\n");
    let mut current = Some(scope);
    while let Some(id) = current {
        for (name, value) in interp.scopes.bindings(id) {
            let _ = writeln!(output, "  {name} = {value}");
        }
        current = interp.scopes.parent(id);
    }
    interp.out.stdout_write(Cow::Owned(output));
    Value::Null
}

/// `require(path, args…)`: reads and executes the file at `path` in a new
/// scope below the call scope, binding `arg` to the remaining arguments.
/// Yields the file's result value (an empty Object if it ran off the end),
/// or Null when the path is not a String or cannot be read. A parse error
/// in the file propagates to the driver.
fn builtin_require(
    interp: &mut Interp<'_>,
    scope: ScopeId,
    args: &[Value],
) -> Result<Value, ParseError> {
    let Some(Value::Str(path)) = args.first() else {
        return Ok(Value::Null);
    };
    let Ok(bytes) = std::fs::read(&**path) else {
        return Ok(Value::Null);
    };
    let source = String::from_utf8_lossy(&bytes).into_owned();

    let arguments = Value::array(args[1..].to_vec());
    let nested = interp.scopes.push(scope);
    interp.declare(nested, Rc::from("arg"), arguments);
    let result = interp.execute(nested, &source);
    interp.scopes.pop(nested);
    result
}
