//! Archived form of values and type tags.
//!
//! The encoding is positional, not self-describing: a reader must decode
//! with the same shapes the writer used. Type tags travel as their `u32`
//! code. Values travel as a variant index followed by the payload;
//! containers carry their declared types, sample and contents.
//!
//! Device records and containers that reach themselves have no archived
//! form and fail to serialize.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};

use crate::{ArchiveError, HeapDescriptor, MapDescriptor, TypeTag, Value, VectorDescriptor};

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u32::deserialize(deserializer)?;
        TypeTag::from_code(code)
            .ok_or_else(|| de::Error::custom(ArchiveError::UnknownTypeCode(code)))
    }
}

/// Owned mirror of [`Value`] with the derived encoding.
#[derive(Debug, Serialize, Deserialize)]
enum Repr {
    Void,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List {
        element_type: TypeTag,
        sample: Vec<Repr>,
        items: Vec<Repr>,
    },
    Map {
        key_type: TypeTag,
        element_type: TypeTag,
        sample: Vec<Repr>,
        entries: Vec<(String, Repr)>,
    },
}

impl Repr {
    fn from_value(
        value: &Value,
        visiting: &mut Vec<*const HeapDescriptor>,
    ) -> Result<Self, ArchiveError> {
        let desc = match value {
            Value::Void => return Ok(Repr::Void),
            Value::Bool(b) => return Ok(Repr::Bool(*b)),
            Value::Int(n) => return Ok(Repr::Int(*n)),
            Value::Float(x) => return Ok(Repr::Float(*x)),
            Value::String(s) => return Ok(Repr::String(s.clone())),
            Value::Container(desc) => desc,
        };

        let ptr = Arc::as_ptr(desc);
        if visiting.contains(&ptr) {
            return Err(ArchiveError::Cycle);
        }
        visiting.push(ptr);

        let repr = match &**desc {
            HeapDescriptor::Vector(vector) => Repr::List {
                element_type: vector.element_type(),
                sample: all(desc.sample(), visiting)?,
                items: all(&vector.values(), visiting)?,
            },
            HeapDescriptor::Map(map) => {
                if let object_type @ TypeTag::Device(_) = map.object_type() {
                    return Err(ArchiveError::Unrepresentable(object_type));
                }
                let entries = map
                    .entries()
                    .into_iter()
                    .map(|(key, v)| Ok((key, Repr::from_value(&v, visiting)?)))
                    .collect::<Result<Vec<_>, ArchiveError>>()?;
                Repr::Map {
                    key_type: map.key_type(),
                    element_type: map.element_type(),
                    sample: all(desc.sample(), visiting)?,
                    entries,
                }
            }
        };

        visiting.pop();
        Ok(repr)
    }

    fn into_value(self) -> Value {
        match self {
            Repr::Void => Value::Void,
            Repr::Bool(b) => Value::Bool(b),
            Repr::Int(n) => Value::Int(n),
            Repr::Float(x) => Value::Float(x),
            Repr::String(s) => Value::String(s),
            Repr::List {
                element_type,
                mut sample,
                items,
            } => {
                let mut vector = VectorDescriptor::from_values(
                    element_type,
                    items.into_iter().map(Repr::into_value),
                );
                if let Some(sample) = sample.pop() {
                    vector = vector.with_sample(sample.into_value());
                }
                vector.into()
            }
            Repr::Map {
                key_type,
                element_type,
                sample,
                entries,
            } => {
                let mut map = MapDescriptor::with_types(TypeTag::Map, key_type, element_type);
                let mut sample = sample.into_iter().map(Repr::into_value);
                if let (Some(key), Some(value)) = (sample.next(), sample.next()) {
                    map = map.with_sample(key, value);
                }
                for (key, value) in entries {
                    map.insert_raw(key, value.into_value());
                }
                map.into()
            }
        }
    }
}

fn all(
    values: &[Value],
    visiting: &mut Vec<*const HeapDescriptor>,
) -> Result<Vec<Repr>, ArchiveError> {
    values.iter().map(|v| Repr::from_value(v, visiting)).collect()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Repr::from_value(self, &mut Vec::new())
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Repr::deserialize(deserializer).map(Repr::into_value)
    }
}
