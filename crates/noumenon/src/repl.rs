//! Persistent interactive session support.
//!
//! A [`ReplSession`] keeps the root scope alive across `execute` calls so
//! interactive lines share variables and functions. Each line gets the
//! driver's semicolon injection appended, so short inputs terminate their
//! statements without an explicit `;`.

use crate::{
    builtins,
    error::ParseError,
    interp::Interp,
    io::PrintWriter,
    object::Object,
    scope::{ROOT_SCOPE, Scopes},
    value::{Function, Value},
};

/// A persistent interpreter session for line-at-a-time execution.
pub struct ReplSession {
    scopes: Scopes,
    quiet: bool,
}

impl ReplSession {
    /// Creates a session with the built-ins installed in its root scope.
    #[must_use]
    pub fn new() -> Self {
        let mut scopes = Scopes::new();
        builtins::install(&mut scopes, ROOT_SCOPE);
        Self {
            scopes,
            quiet: false,
        }
    }

    /// Suppresses the `no such variable` / `redefinition of variable`
    /// diagnostics.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Executes one line of input against the session's root scope.
    ///
    /// Returns `Ok(Some(value))` when the line produced a `return` carrier,
    /// `Ok(None)` when it ran to completion without one (the usual case for
    /// statements), and the parse error otherwise. Session state survives
    /// parse errors.
    pub fn execute(
        &mut self,
        line: &str,
        print: &mut dyn PrintWriter,
    ) -> Result<Option<Object>, ParseError> {
        // the driver trick: semicolons terminate short inputs
        let source = format!("{line};;;");
        let mut interp = Interp::new(&mut self.scopes, self.quiet, print);
        let carrier = interp.run_source(ROOT_SCOPE, &source)?;
        Ok(carrier.map(|value| Object::from(&value)))
    }

    /// The variables bound in the root scope, in declaration order, with
    /// their printed form. Built-ins are omitted.
    #[must_use]
    pub fn list_variables(&self) -> Vec<(String, String)> {
        self.scopes
            .bindings(ROOT_SCOPE)
            .filter(|(_, value)| !matches!(value, Value::Function(Function::Builtin(_))))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}
