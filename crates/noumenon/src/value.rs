//! The runtime value model and its polymorphic operations.
//!
//! A [`Value`] carries a dynamic type tag and payload. Operations dispatch
//! on the receiver's type and then on the operand's type; every combination
//! the language does not define yields `Null`, so dispatch is total and the
//! interpreter never aborts on a type mismatch.
//!
//! Containers are shared: `Array` and `Object` hold `Rc<RefCell<…>>`, so
//! selection hands out aliases of the same underlying storage and
//! `a[0][1] = v` mutates through the shared graph. Strings are immutable
//! and indexed by code point.

use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use crate::{ast::{BinaryOp, FunctionDef, UnaryOp}, builtins::{Builtin, HostFunction}};

/// The dynamic type of a value, as reported by `typeof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Array,
    Bool,
    Float,
    Function,
    Int,
    Null,
    Object,
    String,
}

impl Type {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::Bool => "Bool",
            Self::Float => "Float",
            Self::Function => "Function",
            Self::Int => "Int",
            Self::Null => "Null",
            Self::Object => "Object",
            Self::String => "String",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function value: a user function (parameters plus body statements) or a
/// built-in/host callable.
#[derive(Clone)]
pub(crate) enum Function {
    User(Rc<FunctionDef>),
    Builtin(Builtin),
    Host(Rc<dyn HostFunction>),
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(def) => f.debug_tuple("User").field(&def.parameters).finish(),
            Self::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            Self::Host(host) => f.debug_tuple("Host").field(&host.name()).finish(),
        }
    }
}

/// A runtime value.
///
/// Cloning is cheap: immediates are copied and containers share their
/// storage, mirroring how every value travels by shared handle at runtime.
#[derive(Debug, Clone)]
pub(crate) enum Value {
    /// The unique sentinel; every undefined operation yields it.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    /// Keys iterate sorted ascending by code point; `BTreeMap` over UTF-8
    /// strings compares bytewise, which is the same order.
    Object(Rc<RefCell<BTreeMap<Rc<str>, Value>>>),
    Function(Function),
}

impl Value {
    pub fn array(values: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(values)))
    }

    pub fn object(entries: BTreeMap<Rc<str>, Self>) -> Self {
        Self::Object(Rc::new(RefCell::new(entries)))
    }

    /// The empty Object a program yields when it runs off the end.
    pub fn empty_object() -> Self {
        Self::object(BTreeMap::new())
    }

    pub fn type_of(&self) -> Type {
        match self {
            Self::Null => Type::Null,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Str(_) => Type::String,
            Self::Array(_) => Type::Array,
            Self::Object(_) => Type::Object,
            Self::Function(_) => Type::Function,
        }
    }

    /// Branch truthiness: only `Bool(true)` is true. Non-zero numbers and
    /// non-empty containers are *not* true.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    pub fn unary_op(&self, op: UnaryOp) -> Self {
        match (self, op) {
            (Self::Int(value), UnaryOp::Neg) => Self::Int(value.wrapping_neg()),
            (Self::Float(value), UnaryOp::Neg) => Self::Float(-value),
            (Self::Bool(value), UnaryOp::Not) => Self::Bool(!value),
            _ => Self::Null,
        }
    }

    /// Binary dispatch: outer match on the `(receiver, operand)` type pair,
    /// inner match on the operator. Anything not listed is `Null`.
    pub fn binary_op(&self, op: BinaryOp, rhs: &Self) -> Self {
        use BinaryOp as Op;

        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => match op {
                Op::Add => Self::Int(a.wrapping_add(*b)),
                Op::Sub => Self::Int(a.wrapping_sub(*b)),
                Op::Mul => Self::Int(a.wrapping_mul(*b)),
                Op::Div if *b != 0 => Self::Int(a.wrapping_div(*b)),
                Op::Mod if *b != 0 => Self::Int(a.wrapping_rem(*b)),
                Op::Equ => Self::Bool(a == b),
                Op::Neq => Self::Bool(a != b),
                Op::Les => Self::Bool(a < b),
                Op::Leq => Self::Bool(a <= b),
                Op::Grt => Self::Bool(a > b),
                Op::Geq => Self::Bool(a >= b),
                _ => Self::Null,
            },
            // Int/Float mixes compare and calculate mathematically but have
            // no equality (Int == Float is undefined).
            (Self::Int(a), Self::Float(b)) => numeric_mixed(*a as f64, *b, op),
            (Self::Float(a), Self::Int(b)) => numeric_mixed(*a, *b as f64, op),
            (Self::Float(a), Self::Float(b)) => match op {
                Op::Add => Self::Float(a + b),
                Op::Sub => Self::Float(a - b),
                Op::Mul => Self::Float(a * b),
                Op::Div if *b != 0.0 => Self::Float(a / b),
                Op::Equ => Self::Bool(a == b),
                Op::Neq => Self::Bool(a != b),
                Op::Les => Self::Bool(a < b),
                Op::Leq => Self::Bool(a <= b),
                Op::Grt => Self::Bool(a > b),
                Op::Geq => Self::Bool(a >= b),
                _ => Self::Null,
            },
            (Self::Bool(a), Self::Bool(b)) => match op {
                Op::And => Self::Bool(*a && *b),
                Op::Or => Self::Bool(*a || *b),
                Op::Equ => Self::Bool(a == b),
                Op::Neq => Self::Bool(a != b),
                _ => Self::Null,
            },
            (Self::Str(a), Self::Str(b)) => match op {
                Op::Add => Self::Str(Rc::from(format!("{a}{b}"))),
                Op::Equ => Self::Bool(a == b),
                Op::Neq => Self::Bool(a != b),
                _ => Self::Null,
            },
            // String + anything appends the operand's rendering.
            (Self::Str(a), b) => match op {
                Op::Add => Self::Str(Rc::from(format!("{}{}", a, StringifyRhs(b)))),
                _ => Self::Null,
            },
            (Self::Array(values), rhs) => match op {
                // append
                Op::Add => {
                    let mut result = values.borrow().clone();
                    result.push(rhs.clone());
                    Self::array(result)
                }
                // remove every element equal to the operand
                Op::Sub => {
                    let result = values
                        .borrow()
                        .iter()
                        .filter(|value| !value.binary_op(Op::Equ, rhs).is_true())
                        .cloned()
                        .collect();
                    Self::array(result)
                }
                _ => Self::Null,
            },
            (Self::Object(entries), Self::Str(key)) => match op {
                // delete key
                Op::Sub => {
                    let mut result = entries.borrow().clone();
                    result.remove(&**key);
                    Self::object(result)
                }
                _ => Self::Null,
            },
            (Self::Object(a), Self::Object(b)) => match op {
                // intersection: keys present in both, values from the lhs
                Op::And => {
                    let b = b.borrow();
                    let result = a
                        .borrow()
                        .iter()
                        .filter(|(key, _)| b.contains_key(&***key))
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect();
                    Self::object(result)
                }
                // union: the lhs value wins on conflicts
                Op::Or => {
                    let mut result = a.borrow().clone();
                    for (key, value) in b.borrow().iter() {
                        result.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                    Self::object(result)
                }
                Op::Equ => Self::Bool(object_eq(a, b)),
                Op::Neq => Self::Bool(!object_eq(a, b)),
                _ => Self::Null,
            },
            _ => Self::Null,
        }
    }

    /// Selection `a[k]`. Out-of-range and unknown combinations yield `Null`.
    pub fn select(&self, index: &Self) -> Self {
        match (self, index) {
            (Self::Array(values), Self::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| values.borrow().get(i).cloned())
                .unwrap_or(Self::Null),
            (Self::Object(entries), Self::Str(key)) => entries
                .borrow()
                .get(&**key)
                .cloned()
                .unwrap_or(Self::Null),
            (Self::Str(s), Self::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map_or(Self::Null, |c| Self::Str(Rc::from(c.to_string()))),
            _ => Self::Null,
        }
    }

    /// In-place update `a[k] = v`. Out-of-range array indices and unknown
    /// combinations are silent no-ops; object keys insert or overwrite.
    pub fn modify(&self, index: &Self, value: Self) {
        match (self, index) {
            (Self::Array(values), Self::Int(i)) => {
                if let Ok(i) = usize::try_from(*i) {
                    let mut values = values.borrow_mut();
                    if i < values.len() {
                        values[i] = value;
                    }
                }
            }
            (Self::Object(entries), Self::Str(key)) => {
                entries.borrow_mut().insert(key.clone(), value);
            }
            _ => {}
        }
    }

    /// Iteration length; zero for non-iterable values.
    pub fn length(&self) -> usize {
        match self {
            Self::Array(values) => values.borrow().len(),
            Self::Object(entries) => entries.borrow().len(),
            Self::Str(s) => s.chars().count(),
            _ => 0,
        }
    }

    /// The i-th iteration key: the index for arrays and strings, the i-th
    /// key in sorted order for objects.
    pub fn key_at(&self, index: usize) -> Self {
        match self {
            Self::Array(_) | Self::Str(_) => Self::Int(index as i64),
            Self::Object(entries) => entries
                .borrow()
                .keys()
                .nth(index)
                .map_or(Self::Null, |key| Self::Str(key.clone())),
            _ => Self::Null,
        }
    }

    /// The i-th iteration value.
    pub fn value_at(&self, index: usize) -> Self {
        match self {
            Self::Array(values) => values.borrow().get(index).cloned().unwrap_or(Self::Null),
            Self::Object(entries) => entries
                .borrow()
                .values()
                .nth(index)
                .cloned()
                .unwrap_or(Self::Null),
            Self::Str(s) => s
                .chars()
                .nth(index)
                .map_or(Self::Null, |c| Self::Str(Rc::from(c.to_string()))),
            _ => Self::Null,
        }
    }
}

/// Mixed Int/Float arithmetic and ordering; equality stays undefined.
fn numeric_mixed(a: f64, b: f64, op: BinaryOp) -> Value {
    match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div if b != 0.0 => Value::Float(a / b),
        BinaryOp::Les => Value::Bool(a < b),
        BinaryOp::Leq => Value::Bool(a <= b),
        BinaryOp::Grt => Value::Bool(a > b),
        BinaryOp::Geq => Value::Bool(a >= b),
        _ => Value::Null,
    }
}

/// Structural object equality: same key set, and every per-key value pair
/// satisfies `EQU`.
fn object_eq(
    a: &Rc<RefCell<BTreeMap<Rc<str>, Value>>>,
    b: &Rc<RefCell<BTreeMap<Rc<str>, Value>>>,
) -> bool {
    let a = a.borrow();
    let b = b.borrow();
    a.len() == b.len()
        && b.iter().all(|(key, bv)| {
            a.get(&**key)
                .is_some_and(|av| av.binary_op(BinaryOp::Equ, bv).is_true())
        })
}

/// Renders a float with the shortest representation that round-trips.
pub(crate) fn float_to_string(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_owned();
    }
    if f.is_infinite() {
        return if f.is_sign_negative() { "-inf" } else { "inf" }.to_owned();
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format(f).to_owned()
}

/// The right operand of `String + x`, rendered per the stringification
/// rules: containers and functions render as their type name.
struct StringifyRhs<'a>(&'a Value);

impl fmt::Display for StringifyRhs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => f.write_str(if *value { "true" } else { "false" }),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => f.write_str(&float_to_string(*value)),
            Value::Str(value) => f.write_str(value),
            Value::Array(_) => f.write_str("Array"),
            Value::Object(_) => f.write_str("Object"),
            Value::Function(_) => f.write_str("Function"),
        }
    }
}

/// Print rendering: strings are written raw, arrays as `[a, b]`, objects as
/// `{k: v}`, functions as `function(p1,p2)`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => f.write_str(if *value { "true" } else { "false" }),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&float_to_string(*value)),
            Self::Str(value) => f.write_str(value),
            Self::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Function(Function::User(def)) => {
                f.write_str("function(")?;
                for (i, parameter) in def.parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(parameter)?;
                }
                f.write_str(")")
            }
            Self::Function(_) => f.write_str("function()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, rc::Rc};

    use crate::ast::{BinaryOp as Op, UnaryOp};

    use super::Value;

    fn s(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }

    fn obj(entries: &[(&str, Value)]) -> Value {
        Value::object(
            entries
                .iter()
                .map(|(key, value)| (Rc::from(*key), value.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn int_arithmetic() {
        assert!(matches!(Value::Int(7).binary_op(Op::Add, &Value::Int(3)), Value::Int(10)));
        assert!(matches!(Value::Int(7).binary_op(Op::Div, &Value::Int(2)), Value::Int(3)));
        assert!(matches!(Value::Int(-7).binary_op(Op::Mod, &Value::Int(2)), Value::Int(-1)));
        assert!(matches!(Value::Int(7).binary_op(Op::Div, &Value::Int(0)), Value::Null));
        assert!(matches!(Value::Int(7).binary_op(Op::Mod, &Value::Int(0)), Value::Null));
    }

    #[test]
    fn int_overflow_wraps() {
        assert!(matches!(
            Value::Int(i64::MAX).binary_op(Op::Add, &Value::Int(1)),
            Value::Int(i64::MIN)
        ));
        assert!(matches!(
            Value::Int(i64::MIN).unary_op(UnaryOp::Neg),
            Value::Int(i64::MIN)
        ));
    }

    #[test]
    fn truncated_division_law() {
        for (a, b) in [(7i64, 2i64), (-7, 2), (7, -2), (-7, -2), (1, 3)] {
            let div = Value::Int(a).binary_op(Op::Div, &Value::Int(b));
            let rem = Value::Int(a).binary_op(Op::Mod, &Value::Int(b));
            let (Value::Int(q), Value::Int(r)) = (div, rem) else {
                panic!("expected ints");
            };
            assert_eq!(q * b + r, a);
        }
    }

    #[test]
    fn mixed_numeric_comparison_but_no_equality() {
        assert!(Value::Int(1).binary_op(Op::Les, &Value::Float(1.5)).is_true());
        assert!(Value::Float(2.5).binary_op(Op::Grt, &Value::Int(2)).is_true());
        assert!(matches!(Value::Int(1).binary_op(Op::Equ, &Value::Float(1.0)), Value::Null));
        assert!(matches!(Value::Float(1.0).binary_op(Op::Equ, &Value::Int(1)), Value::Null));
    }

    #[test]
    fn undefined_combinations_yield_null() {
        assert!(matches!(Value::Bool(true).binary_op(Op::Add, &Value::Bool(true)), Value::Null));
        assert!(matches!(Value::Null.binary_op(Op::Equ, &Value::Null), Value::Null));
        assert!(matches!(Value::Int(1).binary_op(Op::And, &Value::Int(1)), Value::Null));
        assert!(matches!(s("a").binary_op(Op::Les, &s("b")), Value::Null));
    }

    #[test]
    fn string_concatenation_and_stringification() {
        let Value::Str(result) = s("n=").binary_op(Op::Add, &Value::Int(42)) else {
            panic!("expected string");
        };
        assert_eq!(&*result, "n=42");

        for (rhs, expected) in [
            (Value::Null, "x:null"),
            (Value::Bool(false), "x:false"),
            (Value::array(vec![]), "x:Array"),
            (obj(&[]), "x:Object"),
        ] {
            let Value::Str(result) = s("x:").binary_op(Op::Add, &rhs) else {
                panic!("expected string");
            };
            assert_eq!(&*result, expected);
        }
    }

    #[test]
    fn array_append_and_remove() {
        let a = Value::array(vec![Value::Int(10), Value::Int(20), Value::Int(10)]);
        let appended = a.binary_op(Op::Add, &Value::Int(30));
        assert_eq!(appended.length(), 4);
        assert!(appended.value_at(3).binary_op(Op::Equ, &Value::Int(30)).is_true());

        let removed = a.binary_op(Op::Sub, &Value::Int(10));
        assert_eq!(removed.length(), 1);
        assert!(removed.value_at(0).binary_op(Op::Equ, &Value::Int(20)).is_true());
    }

    #[test]
    fn object_union_intersection_delete() {
        let a = obj(&[("x", Value::Int(1)), ("y", Value::Int(2))]);
        let b = obj(&[("y", Value::Int(9)), ("z", Value::Int(3))]);

        let union = a.binary_op(Op::Or, &b);
        assert_eq!(union.length(), 3);
        // lhs wins on conflict
        assert!(union.select(&s("y")).binary_op(Op::Equ, &Value::Int(2)).is_true());

        let intersection = a.binary_op(Op::And, &b);
        assert_eq!(intersection.length(), 1);
        assert!(intersection.select(&s("y")).binary_op(Op::Equ, &Value::Int(2)).is_true());

        let deleted = a.binary_op(Op::Sub, &s("x"));
        assert_eq!(deleted.length(), 1);
        assert!(matches!(deleted.select(&s("x")), Value::Null));
    }

    #[test]
    fn object_deep_equality() {
        let a = obj(&[("x", obj(&[("y", Value::Int(1))]))]);
        let b = obj(&[("x", obj(&[("y", Value::Int(1))]))]);
        let c = obj(&[("x", obj(&[("y", Value::Int(2))]))]);
        assert!(a.binary_op(Op::Equ, &b).is_true());
        assert!(a.binary_op(Op::Neq, &c).is_true());
        assert!(!a.binary_op(Op::Equ, &c).is_true());
    }

    #[test]
    fn selection_and_modification() {
        let a = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert!(a.select(&Value::Int(1)).binary_op(Op::Equ, &Value::Int(2)).is_true());
        assert!(matches!(a.select(&Value::Int(2)), Value::Null));
        assert!(matches!(a.select(&Value::Int(-1)), Value::Null));
        assert!(matches!(a.select(&s("0")), Value::Null));

        // out-of-range modification is a silent no-op
        a.modify(&Value::Int(5), Value::Int(9));
        assert_eq!(a.length(), 2);
        a.modify(&Value::Int(0), Value::Int(9));
        assert!(a.select(&Value::Int(0)).binary_op(Op::Equ, &Value::Int(9)).is_true());
    }

    #[test]
    fn string_selection_is_by_code_point() {
        let text = s("héllo");
        assert_eq!(text.length(), 5);
        let Value::Str(c) = text.select(&Value::Int(1)) else {
            panic!("expected one-code-point string");
        };
        assert_eq!(&*c, "é");
    }

    #[test]
    fn shared_container_aliasing() {
        let a = Value::array(vec![Value::Int(1)]);
        let alias = a.clone();
        alias.modify(&Value::Int(0), Value::Int(2));
        assert!(a.select(&Value::Int(0)).binary_op(Op::Equ, &Value::Int(2)).is_true());
    }

    #[test]
    fn display_format() {
        let a = Value::array(vec![Value::Int(10), s("x"), Value::Null]);
        assert_eq!(a.to_string(), "[10, x, null]");
        let o = obj(&[("b", Value::Int(2)), ("a", Value::Int(1))]);
        assert_eq!(o.to_string(), "{a: 1, b: 2}");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::empty_object().to_string(), "{}");
    }
}
