use std::{collections::HashMap, sync::Arc};

use object::Value;

use crate::EncodeError;

/// Deduplication key. Stricter than value equality: `1` and `1.0` get
/// separate slots, floats are keyed by bit pattern and containers by
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LiteralKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    String(String),
    Container(usize),
}

impl LiteralKey {
    fn of(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Void => return None,
            Value::Bool(b) => LiteralKey::Bool(*b),
            Value::Int(n) => LiteralKey::Int(*n),
            Value::Float(x) => LiteralKey::Float(x.to_bits()),
            Value::String(s) => LiteralKey::String(s.clone()),
            Value::Container(desc) => LiteralKey::Container(Arc::as_ptr(desc) as usize),
        })
    }
}

/// Constant pool under construction. Each distinct literal gets one slot;
/// instructions address it by index.
#[derive(Debug, Default)]
pub struct LiteralPool {
    indices: HashMap<LiteralKey, u16>,
    values: Vec<Value>,
}

impl LiteralPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `value`, allocating one on first sight.
    pub fn intern(&mut self, value: Value) -> Result<u16, EncodeError> {
        let key = LiteralKey::of(&value).ok_or(EncodeError::Unrepresentable {
            index: self.values.len(),
            tag: value.type_tag(),
        })?;
        if let Some(&index) = self.indices.get(&key) {
            return Ok(index);
        }

        let index = u16::try_from(self.values.len()).map_err(|_| EncodeError::TooMany {
            what: "literals",
            count: self.values.len() + 1,
            max: u16::MAX as usize,
        })?;
        self.indices.insert(key, index);
        self.values.push(value);
        Ok(index)
    }

    pub fn get(&self, index: u16) -> Option<&Value> {
        self.values.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Literals in slot order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object::{TypeTag, VectorDescriptor};

    #[test]
    fn repeated_literals_share_a_slot() {
        let mut pool = LiteralPool::new();
        assert_eq!(pool.intern(Value::from("hi")).unwrap(), 0);
        assert_eq!(pool.intern(Value::Int(1)).unwrap(), 1);
        assert_eq!(pool.intern(Value::from("hi")).unwrap(), 0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn numerically_equal_literals_keep_their_variant() {
        let mut pool = LiteralPool::new();
        let int = pool.intern(Value::Int(1)).unwrap();
        let float = pool.intern(Value::Float(1.0)).unwrap();
        assert_ne!(int, float);
        assert!(matches!(pool.get(float), Some(Value::Float(_))));
    }

    #[test]
    fn containers_dedupe_by_identity() {
        let mut pool = LiteralPool::new();
        let list = Value::from(VectorDescriptor::new(TypeTag::Int));
        let other = Value::from(VectorDescriptor::new(TypeTag::Int));
        let a = pool.intern(list.clone()).unwrap();
        assert_eq!(pool.intern(list).unwrap(), a);
        assert_ne!(pool.intern(other).unwrap(), a);
    }

    #[test]
    fn void_is_not_a_literal() {
        let mut pool = LiteralPool::new();
        assert!(matches!(
            pool.intern(Value::Void),
            Err(EncodeError::Unrepresentable { index: 0, tag: TypeTag::Void })
        ));
        assert!(pool.is_empty());
    }
}
