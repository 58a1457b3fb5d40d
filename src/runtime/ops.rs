//! Operator, indexing and iteration semantics shared by the tree-walking and
//! the compiled backend.

use std::cmp::Ordering;

use crate::ast::{AddOperator, CompareOperator, MulOperator, UnaryOperator};

use super::error::{RuntimeError, RuntimeResult};
use super::table::TableKey;
use super::value::Value;

fn mismatch(operation: &'static str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        operation,
        left: left.type_name(),
        right: right.type_name(),
    }
}

pub fn add(left: &Value, right: &Value) -> RuntimeResult<Value> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
        (Value::String(_), _) | (_, Value::String(_)) => {
            Ok(Value::string(format!("{left}{right}")))
        }
        (Value::List(head), Value::List(tail)) => {
            let joined = head.borrow().iter().chain(tail.borrow().iter()).cloned().collect();
            Ok(Value::list(joined))
        }
        _ => Err(mismatch("+", left, right)),
    }
}

pub fn sub(left: &Value, right: &Value) -> RuntimeResult<Value> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left - right)),
        _ => Err(mismatch("-", left, right)),
    }
}

pub fn additive(op: AddOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    match op {
        AddOperator::Add => add(left, right),
        AddOperator::Sub => sub(left, right),
    }
}

pub fn multiplicative(op: MulOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    let symbol = match op {
        MulOperator::Mul => "*",
        MulOperator::Div => "/",
        MulOperator::Pow => "**",
        MulOperator::FloorDiv => "//",
        MulOperator::Mod => "%",
    };
    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(mismatch(symbol, left, right));
    };
    let (a, b) = (*a, *b);
    Ok(Value::Number(match op {
        MulOperator::Mul => a * b,
        MulOperator::Div => a / b,
        MulOperator::Pow => a.powf(b),
        MulOperator::FloorDiv => (a / b).floor(),
        MulOperator::Mod => a % b,
    }))
}

pub fn compare(op: CompareOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    let (symbol, accepts): (&'static str, fn(Ordering) -> bool) = match op {
        CompareOperator::Equal => return Ok(Value::Boolean(left == right)),
        CompareOperator::NotEqual => return Ok(Value::Boolean(left != right)),
        CompareOperator::Less => ("<", Ordering::is_lt),
        CompareOperator::LessEqual => ("<=", Ordering::is_le),
        CompareOperator::Greater => (">", Ordering::is_gt),
        CompareOperator::GreaterEqual => (">=", Ordering::is_ge),
    };
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => return Err(mismatch(symbol, left, right)),
    };
    // NaN is unordered and compares false under every ordering operator.
    Ok(Value::Boolean(ordering.is_some_and(accepts)))
}

pub fn unary(op: UnaryOperator, operand: &Value) -> RuntimeResult<Value> {
    match (op, operand) {
        (UnaryOperator::Not, value) => Ok(Value::Boolean(!value.is_truthy())),
        (UnaryOperator::Negate, Value::Number(value)) => Ok(Value::Number(-value)),
        (UnaryOperator::Negate, other) => Err(RuntimeError::UnsupportedOperand {
            operation: "-",
            type_name: other.type_name(),
        }),
    }
}

/// Resolves a possibly negative, possibly fractional index against `len`.
fn slot(index: f64, len: usize) -> Option<usize> {
    if index.fract() != 0.0 {
        return None;
    }
    let resolved = if index < 0.0 { len as f64 + index } else { index };
    (resolved >= 0.0 && resolved < len as f64).then_some(resolved as usize)
}

fn numeric_index(container: &'static str, index: &Value) -> RuntimeResult<f64> {
    index.as_number().ok_or(RuntimeError::IndexType {
        container,
        got: index.type_name(),
    })
}

/// `container[index]`. Missing table keys and out-of-range or fractional
/// positions read as `null`.
pub fn index(container: &Value, index: &Value) -> RuntimeResult<Value> {
    match container {
        Value::Table(table) => {
            let key = TableKey::from_value(index)?;
            Ok(table.borrow().get(&key).cloned().unwrap_or_default())
        }
        Value::List(values) => {
            let position = numeric_index("List", index)?;
            let values = values.borrow();
            Ok(slot(position, values.len())
                .map(|slot| values[slot].clone())
                .unwrap_or_default())
        }
        Value::String(text) => {
            let position = numeric_index("String", index)?;
            let len = text.chars().count();
            Ok(slot(position, len)
                .and_then(|slot| text.chars().nth(slot))
                .map(|ch| Value::string(ch.to_string()))
                .unwrap_or_default())
        }
        other => Err(RuntimeError::NotIndexable {
            type_name: other.type_name(),
        }),
    }
}

/// `container[index] = value`. Lists accept any existing position or `len`
/// to append; assigning `null` to a table key removes it.
pub fn set_index(container: &Value, index: &Value, value: Value) -> RuntimeResult<()> {
    match container {
        Value::Table(table) => {
            let key = TableKey::from_value(index)?;
            let mut table = table.borrow_mut();
            if value.is_null() {
                table.remove(&key);
            } else {
                table.insert(key, value);
            }
            Ok(())
        }
        Value::List(values) => {
            let position = numeric_index("List", index)?;
            let mut values = values.borrow_mut();
            let len = values.len();
            match slot(position, len) {
                Some(slot) => values[slot] = value,
                None if position == len as f64 => values.push(value),
                None => {
                    return Err(RuntimeError::IndexOutOfBounds {
                        index: position,
                        len,
                    });
                }
            }
            Ok(())
        }
        other => Err(RuntimeError::NotAssignable {
            type_name: other.type_name(),
        }),
    }
}

/// `container.name`: string-keyed table lookup.
pub fn member(container: &Value, name: &str) -> RuntimeResult<Value> {
    match container {
        Value::Table(table) => Ok(table
            .borrow()
            .get(&TableKey::from(name))
            .cloned()
            .unwrap_or_default()),
        other => Err(RuntimeError::NoMembers {
            member: name.to_string(),
            type_name: other.type_name(),
        }),
    }
}

pub fn set_member(container: &Value, name: &str, value: Value) -> RuntimeResult<()> {
    match container {
        Value::Table(_) => set_index(container, &Value::string(name), value),
        other => Err(RuntimeError::NotAssignable {
            type_name: other.type_name(),
        }),
    }
}

/// Snapshot of `(value, key)` pairs visited by `for v, k in container`.
/// Taken up front so the loop body may mutate the container.
pub fn iteration_items(container: &Value) -> RuntimeResult<Vec<(Value, Value)>> {
    match container {
        Value::List(values) => Ok(values
            .borrow()
            .iter()
            .enumerate()
            .map(|(position, value)| (value.clone(), Value::Number(position as f64)))
            .collect()),
        Value::Table(table) => {
            let table = table.borrow();
            let mut items = Vec::with_capacity(table.len());
            items.extend(
                table
                    .iter()
                    .map(|(key, value)| (value.clone(), key.to_value())),
            );
            Ok(items)
        }
        Value::String(text) => Ok(text
            .chars()
            .enumerate()
            .map(|(position, ch)| (Value::string(ch.to_string()), Value::Number(position as f64)))
            .collect()),
        other => Err(RuntimeError::NotIterable {
            type_name: other.type_name(),
        }),
    }
}

/// Counter of a numeric `for … of` loop.
#[derive(Debug, Clone, Copy)]
pub struct NumericRange {
    /// `None` once the counter can no longer move.
    next: Option<f64>,
    end: f64,
    step: f64,
}

impl NumericRange {
    /// Direction comes from the bounds; only the magnitude of `step` is used.
    pub fn new(start: &Value, end: &Value, step: Option<&Value>) -> RuntimeResult<Self> {
        let bound = |name: &'static str, value: &Value| {
            value.as_number().ok_or(RuntimeError::LoopBound {
                bound: name,
                got: value.type_name(),
            })
        };
        let start = bound("start", start)?;
        let end = bound("end", end)?;
        let magnitude = match step {
            Some(step) => bound("step", step)?.abs(),
            None => 1.0,
        };
        if magnitude == 0.0 {
            return Err(RuntimeError::ZeroStep);
        }
        let step = if end >= start { magnitude } else { -magnitude };
        Ok(Self {
            next: Some(start),
            end,
            step,
        })
    }
}

impl Iterator for NumericRange {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let current = self.next?;
        let within = if self.step > 0.0 {
            current <= self.end
        } else {
            current >= self.end
        };
        if !within {
            return None;
        }
        // Past 2^53 a small step can round back to `current`.
        let advanced = current + self.step;
        self.next = (advanced != current).then_some(advanced);
        Some(current)
    }
}
