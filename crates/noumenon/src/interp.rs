//! The tree-walking evaluator.
//!
//! Statements evaluate to `Option<Value>`: `None` means "continue", and
//! `Some(v)` is the return carrier produced by a `return` statement, which
//! unwinds to the nearest enclosing function call (or out of the program).
//! This sentinel is the only non-local control mechanism.
//!
//! Parsing and evaluation interleave: [`Interp::run_source`] pulls one
//! statement at a time from the parser and evaluates it before the next is
//! parsed, so statements before a syntax error observably execute. The only
//! runtime error is a [`ParseError`] bubbling out of a `require`d file.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    ast::{Expr, Stmt, Variable},
    error::ParseError,
    io::PrintWriter,
    object::Object,
    parser::Parser,
    scope::{ScopeId, Scopes},
    value::{Function, Value},
};

/// Evaluated call arguments, in source order.
pub(crate) type Args = SmallVec<[Value; 4]>;

/// The evaluator: a scope arena, the diagnostics flag, and the output sink.
pub(crate) struct Interp<'a> {
    pub scopes: &'a mut Scopes,
    pub quiet: bool,
    pub out: &'a mut dyn PrintWriter,
}

impl<'a> Interp<'a> {
    pub fn new(scopes: &'a mut Scopes, quiet: bool, out: &'a mut dyn PrintWriter) -> Self {
        Self { scopes, quiet, out }
    }

    /// Parses and evaluates `source` one statement at a time against
    /// `scope`. Returns the first return carrier, or `None` if the input
    /// ran out without one.
    pub fn run_source(&mut self, scope: ScopeId, source: &str) -> Result<Option<Value>, ParseError> {
        let mut parser = Parser::new(source);
        while let Some(statement) = parser.next_statement()? {
            if let Some(value) = self.statement(scope, &statement)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Like [`run_source`](Self::run_source), but a program that runs off
    /// the end yields the empty Object.
    pub fn execute(&mut self, scope: ScopeId, source: &str) -> Result<Value, ParseError> {
        self.run_source(scope, source)
            .map(|carrier| carrier.unwrap_or_else(Value::empty_object))
    }

    fn diagnostic(&mut self, message: &str) {
        if !self.quiet {
            self.out.stderr_write(message);
        }
    }

    /// Binds a name in `scope`, refusing redefinition within that scope.
    pub fn declare(&mut self, scope: ScopeId, name: Rc<str>, value: Value) {
        if !self.scopes.declare(scope, name.clone(), value) {
            self.diagnostic(&format!("redefinition of variable: \"{name}\""));
        }
    }

    pub fn statement(&mut self, scope: ScopeId, statement: &Stmt) -> Result<Option<Value>, ParseError> {
        match statement {
            Stmt::Empty => Ok(None),
            Stmt::Var { name, init } => {
                let value = self.expression(scope, init)?;
                self.declare(scope, name.clone(), value);
                Ok(None)
            }
            Stmt::Assign { target, value } => {
                let value = self.expression(scope, value)?;
                self.write_variable(scope, target, value)?;
                Ok(None)
            }
            Stmt::Call { callee, args } => {
                self.call(scope, callee, args)?;
                Ok(None)
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => {
                let condition = self.expression(scope, condition)?;
                let body = self.scopes.push(scope);
                let result = if condition.is_true() {
                    self.run_block(body, then_body)
                } else {
                    self.run_block(body, else_body)
                };
                self.scopes.pop(body);
                result
            }
            Stmt::While { condition, body } => {
                while self.expression(scope, condition)?.is_true() {
                    let iteration = self.scopes.push(scope);
                    let result = self.run_block(iteration, body);
                    self.scopes.pop(iteration);
                    if let Some(value) = result? {
                        return Ok(Some(value));
                    }
                }
                Ok(None)
            }
            Stmt::For {
                key,
                value,
                iterable,
                body,
            } => {
                let target = self.expression(scope, iterable)?;

                let mut index = 0;
                while index < target.length() {
                    let iteration = self.scopes.push(scope);
                    if let Some(key) = key {
                        self.declare(iteration, key.clone(), target.key_at(index));
                    }
                    self.declare(iteration, value.clone(), target.value_at(index));

                    let result = self.run_block(iteration, body);
                    self.scopes.pop(iteration);
                    if let Some(value) = result? {
                        return Ok(Some(value));
                    }
                    index += 1;
                }
                Ok(None)
            }
            Stmt::Return(expression) => self.expression(scope, expression).map(Some),
        }
    }

    /// Runs a statement list, stopping at the first return carrier.
    fn run_block(&mut self, scope: ScopeId, statements: &[Stmt]) -> Result<Option<Value>, ParseError> {
        for statement in statements {
            if let Some(value) = self.statement(scope, statement)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    pub fn expression(&mut self, scope: ScopeId, expression: &Expr) -> Result<Value, ParseError> {
        match expression {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Int(value) => Ok(Value::Int(*value)),
            Expr::Float(value) => Ok(Value::Float(*value)),
            Expr::Str(value) => Ok(Value::Str(value.clone())),
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.expression(scope, element)?);
                }
                Ok(Value::array(values))
            }
            Expr::Object(entries) => {
                let mut values = std::collections::BTreeMap::new();
                for (key, entry) in entries {
                    let value = self.expression(scope, entry)?;
                    values.insert(key.clone(), value);
                }
                Ok(Value::object(values))
            }
            Expr::Function(def) => Ok(Value::Function(Function::User(def.clone()))),
            Expr::Variable(variable) => self.read_variable(scope, variable),
            Expr::Call { callee, args } => self.call(scope, callee, args),
            Expr::Unary { op, rhs } => {
                let rhs = self.expression(scope, rhs)?;
                Ok(rhs.unary_op(*op))
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.expression(scope, lhs)?;
                let rhs = self.expression(scope, rhs)?;
                Ok(lhs.binary_op(*op, &rhs))
            }
        }
    }

    /// Evaluates arguments in source order, resolves the callee in the
    /// caller's environment, and dispatches the call against a fresh call
    /// scope whose parent is the caller's scope.
    fn call(&mut self, scope: ScopeId, callee: &Variable, args: &[Expr]) -> Result<Value, ParseError> {
        let mut values = Args::new();
        for arg in args {
            values.push(self.expression(scope, arg)?);
        }

        let function = self.read_variable(scope, callee)?;
        let call_scope = self.scopes.push(scope);
        let result = self.call_value(&function, call_scope, &values);
        self.scopes.pop(call_scope);
        result
    }

    /// Invokes a value. Calling anything that is not a function yields Null.
    ///
    /// For user functions, missing trailing arguments become Null and extra
    /// arguments are ignored; the first statement producing a return carrier
    /// ends the call, and the carrier is absorbed here.
    pub fn call_value(
        &mut self,
        callee: &Value,
        call_scope: ScopeId,
        args: &[Value],
    ) -> Result<Value, ParseError> {
        match callee {
            Value::Function(Function::User(def)) => {
                for (i, parameter) in def.parameters.iter().enumerate() {
                    let value = args.get(i).cloned().unwrap_or(Value::Null);
                    self.declare(call_scope, parameter.clone(), value);
                }

                self.run_block(call_scope, &def.body)
                    .map(|carrier| carrier.unwrap_or(Value::Null))
            }
            Value::Function(Function::Builtin(builtin)) => builtin.call(self, call_scope, args),
            Value::Function(Function::Host(host)) => {
                let args = args.iter().map(Object::from).collect();
                Ok(host.call(args).to_value())
            }
            _ => Ok(Value::Null),
        }
    }

    /// Reads a variable and applies its selectors left to right. An
    /// undefined name is reported (unless quiet) and yields Null.
    fn read_variable(&mut self, scope: ScopeId, variable: &Variable) -> Result<Value, ParseError> {
        let Some(mut value) = self.scopes.lookup(scope, &variable.identifier) else {
            self.diagnostic(&format!("no such variable: \"{}\"", variable.identifier));
            return Ok(Value::Null);
        };

        for selector in &variable.selectors {
            let index = self.expression(scope, selector)?;
            value = value.select(&index);
        }
        Ok(value)
    }

    /// Writes through a variable reference: a plain name rebinds in its
    /// owning scope; with selectors, the innermost receiver is modified in
    /// place. An undefined name is reported and the write dropped.
    fn write_variable(
        &mut self,
        scope: ScopeId,
        variable: &Variable,
        value: Value,
    ) -> Result<(), ParseError> {
        let Some(current) = self.scopes.lookup(scope, &variable.identifier) else {
            self.diagnostic(&format!("no such variable: \"{}\"", variable.identifier));
            return Ok(());
        };

        let Some((last, walk)) = variable.selectors.split_last() else {
            self.scopes.assign(scope, &variable.identifier, value);
            return Ok(());
        };

        let mut receiver = current;
        for selector in walk {
            let index = self.expression(scope, selector)?;
            receiver = receiver.select(&index);
        }

        let index = self.expression(scope, last)?;
        receiver.modify(&index, value);
        Ok(())
    }
}
