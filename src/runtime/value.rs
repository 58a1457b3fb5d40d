use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::function::{Function, NativeFunction};
use super::table::Table;

/// Dynamically typed runtime value. Containers and functions are shared by
/// reference; cloning a `Value` never deep-copies.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Table(Rc<RefCell<Table>>),
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
}

impl Value {
    pub fn string(text: impl Into<Rc<str>>) -> Self {
        Value::String(text.into())
    }

    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn table(table: Table) -> Self {
        Value::Table(Rc::new(RefCell::new(table)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Table(_) => "table",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    /// `null` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(text) => write!(f, "{text:?}"),
            other => write!(f, "{other}"),
        }
    }
}

/// Language equality: scalars by value, containers and functions by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(left), Value::Boolean(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::List(left), Value::List(right)) => Rc::ptr_eq(left, right),
            (Value::Table(left), Value::Table(right)) => Rc::ptr_eq(left, right),
            (Value::Function(left), Value::Function(right)) => Rc::ptr_eq(left, right),
            (Value::Native(left), Value::Native(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Number(value) => f.write_str(&format_number(*value)),
            Value::String(text) => f.write_str(text),
            Value::List(values) => {
                f.write_str("[")?;
                for (position, value) in values.borrow().iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    value.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Value::Table(table) => {
                f.write_str("{")?;
                for (position, (key, value)) in table.borrow().iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    key.to_value().fmt_nested(f)?;
                    f.write_str(": ")?;
                    value.fmt_nested(f)?;
                }
                f.write_str("}")
            }
            Value::Function(function) => match function.name() {
                Some(name) => write!(f, "<func {name}>"),
                None => f.write_str("<func>"),
            },
            Value::Native(native) => write!(f, "<native {}>", native.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TableKey;

    #[test]
    fn truthiness_only_rejects_null_and_false() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn displays_numbers_without_integral_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-4.0).to_string(), "-4");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn quotes_strings_inside_containers_only() {
        let mut table = Table::new();
        table.insert(TableKey::from("a"), Value::string("x"));
        let list = Value::list(vec![
            Value::Number(1.0),
            Value::string("two"),
            Value::table(table),
        ]);
        assert_eq!(list.to_string(), r#"[1, "two", {"a": "x"}]"#);
        assert_eq!(Value::string("two").to_string(), "two");
    }

    #[test]
    fn containers_compare_by_identity() {
        let list = Value::list(vec![Value::Number(1.0)]);
        assert_eq!(list, list.clone());
        assert_ne!(list, Value::list(vec![Value::Number(1.0)]));
        assert_eq!(Value::string("a"), Value::string("a"));
        assert_ne!(Value::Number(0.0), Value::Boolean(false));
    }
}
