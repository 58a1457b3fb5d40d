use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::error::{RuntimeError, RuntimeResult};
use super::value::Value;

/// Hashable projection of a value usable as a table key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    String(Rc<str>),
    /// Bit pattern of the number with `-0.0` folded into `0.0`.
    Number(u64),
    Boolean(bool),
}

impl TableKey {
    pub fn from_value(value: &Value) -> RuntimeResult<Self> {
        match value {
            Value::String(text) => Ok(TableKey::String(text.clone())),
            Value::Number(number) if number.is_nan() => Err(RuntimeError::UnhashableKey {
                type_name: "NaN",
            }),
            Value::Number(number) => Ok(TableKey::Number((number + 0.0).to_bits())),
            Value::Boolean(flag) => Ok(TableKey::Boolean(*flag)),
            Value::Null => Err(RuntimeError::NullIndex),
            other => Err(RuntimeError::UnhashableKey {
                type_name: other.type_name(),
            }),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            TableKey::String(text) => Value::String(text.clone()),
            TableKey::Number(bits) => Value::Number(f64::from_bits(*bits)),
            TableKey::Boolean(flag) => Value::Boolean(*flag),
        }
    }
}

impl From<&str> for TableKey {
    fn from(text: &str) -> Self {
        TableKey::String(Rc::from(text))
    }
}

/// Insertion-ordered map from keys to values.
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<(TableKey, Value)>,
    index: FxHashMap<TableKey, usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &TableKey) -> Option<&Value> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    /// Inserts or replaces; a replaced key keeps its original position.
    pub fn insert(&mut self, key: TableKey, value: Value) {
        if let Some(&slot) = self.index.get(&key) {
            self.entries[slot].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    pub fn remove(&mut self, key: &TableKey) -> Option<Value> {
        let slot = self.index.remove(key)?;
        let (_, value) = self.entries.remove(slot);
        for (key, _) in &self.entries[slot..] {
            if let Some(position) = self.index.get_mut(key) {
                *position -= 1;
            }
        }
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableKey, &Value)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_key(value: f64) -> TableKey {
        TableKey::from_value(&Value::Number(value)).expect("number key")
    }

    #[test]
    fn keeps_insertion_order_across_updates_and_removals() {
        let mut table = Table::new();
        table.insert(TableKey::from("a"), Value::Number(1.0));
        table.insert(TableKey::from("b"), Value::Number(2.0));
        table.insert(TableKey::from("c"), Value::Number(3.0));
        table.insert(TableKey::from("a"), Value::Number(10.0));
        assert_eq!(table.remove(&TableKey::from("b")), Some(Value::Number(2.0)));

        assert_eq!(table.len(), 2);
        let keys: Vec<_> = table.iter().map(|(key, _)| key.clone()).collect();
        assert_eq!(keys, vec![TableKey::from("a"), TableKey::from("c")]);
        assert_eq!(table.get(&TableKey::from("c")), Some(&Value::Number(3.0)));
        assert_eq!(table.get(&TableKey::from("a")), Some(&Value::Number(10.0)));
    }

    #[test]
    fn removing_the_last_key_empties_the_table() {
        let mut table = Table::new();
        assert!(table.is_empty());
        table.insert(number_key(1.0), Value::Boolean(true));
        assert!(!table.is_empty());
        assert_eq!(table.remove(&number_key(1.0)), Some(Value::Boolean(true)));
        assert!(table.is_empty());
        assert_eq!(table.remove(&number_key(1.0)), None);
    }

    #[test]
    fn negative_zero_and_zero_are_the_same_key() {
        assert_eq!(number_key(0.0), number_key(-0.0));
        assert_eq!(number_key(2.0).to_value(), Value::Number(2.0));
    }

    #[test]
    fn rejects_unhashable_keys() {
        assert_eq!(
            TableKey::from_value(&Value::Null),
            Err(RuntimeError::NullIndex)
        );
        assert!(matches!(
            TableKey::from_value(&Value::list(vec![])),
            Err(RuntimeError::UnhashableKey { type_name: "list" })
        ));
    }
}
