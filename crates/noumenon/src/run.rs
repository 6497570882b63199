//! Public interface for running Noumenon code.

use std::rc::Rc;

use crate::{
    builtins::{self, HostFunction},
    error::ParseError,
    interp::Interp,
    io::PrintWriter,
    object::Object,
    scope::{ROOT_SCOPE, Scopes},
    value::{Function, Value},
};

/// Primary interface for running Noumenon code.
///
/// A `Runner` holds the source text and configuration; [`run`](Self::run)
/// executes it against a fresh root scope with the built-ins installed and
/// returns the program's result — the value of the first top-level `return`,
/// or the empty Object when the program runs off the end.
///
/// Parsing and evaluation interleave statement by statement, so statements
/// before a syntax error execute before the error is reported.
///
/// # Example
/// ```
/// use noumenon::{CollectPrint, Object, Runner};
///
/// let mut out = CollectPrint::new();
/// let result = Runner::new("println(\"hi\"); return 41 + 1;")
///     .run(&mut out)
///     .unwrap();
/// assert_eq!(result, Object::Int(42));
/// assert_eq!(out.output(), "hi\n");
/// ```
pub struct Runner {
    code: String,
    quiet: bool,
    host_functions: Vec<Rc<dyn HostFunction>>,
    variables: Vec<(String, Object)>,
}

impl Runner {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            quiet: false,
            host_functions: vec![],
            variables: vec![],
        }
    }

    /// Suppresses the `no such variable` / `redefinition of variable`
    /// diagnostics.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Registers a host function in the root scope under its own name.
    #[must_use]
    pub fn host_function(mut self, function: Rc<dyn HostFunction>) -> Self {
        self.host_functions.push(function);
        self
    }

    /// Pre-binds a variable in the root scope (the driver uses this for
    /// `arg` and `env`).
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: Object) -> Self {
        self.variables.push((name.into(), value));
        self
    }

    /// Executes the program, sending output and diagnostics to `print`.
    pub fn run(&self, print: &mut dyn PrintWriter) -> Result<Object, ParseError> {
        let mut scopes = Scopes::new();
        builtins::install(&mut scopes, ROOT_SCOPE);
        for function in &self.host_functions {
            scopes.declare(
                ROOT_SCOPE,
                Rc::from(function.name()),
                Value::Function(Function::Host(function.clone())),
            );
        }
        for (name, value) in &self.variables {
            scopes.declare(ROOT_SCOPE, Rc::from(name.as_str()), value.to_value());
        }

        let mut interp = Interp::new(&mut scopes, self.quiet, print);
        let value = interp.execute(ROOT_SCOPE, &self.code)?;
        Ok(Object::from(&value))
    }
}
