//! Conversions between host data and [`Value`], used by device drivers to
//! pack readings into values and unpack writes back out.

use std::collections::HashMap;

use crate::{
    DeviceType, MapDescriptor, TypeTag, Value, ValueError, VectorDescriptor, type_compatible,
};

pub trait ToValue {
    /// Type tag of the produced value, used as the element type when the
    /// value is stored in a container.
    const TYPE: TypeTag;

    fn to_value(&self) -> Value;
}

pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueError>;
}

fn mismatch(value: &Value) -> ValueError {
    ValueError::type_error("unpack", value, None)
}

impl ToValue for Value {
    const TYPE: TypeTag = TypeTag::Any;

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Ok(value.clone())
    }
}

impl ToValue for bool {
    const TYPE: TypeTag = TypeTag::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_bool().ok_or_else(|| mismatch(value))
    }
}

impl ToValue for i64 {
    const TYPE: TypeTag = TypeTag::Int;

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_int().ok_or_else(|| mismatch(value))
    }
}

impl ToValue for f64 {
    const TYPE: TypeTag = TypeTag::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

/// Accepts integers too, since the two are interchangeable.
impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_f64().ok_or_else(|| mismatch(value))
    }
}

impl ToValue for String {
    const TYPE: TypeTag = TypeTag::String;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.as_str().map(str::to_owned).ok_or_else(|| mismatch(value))
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    const TYPE: TypeTag = TypeTag::List;

    fn to_value(&self) -> Value {
        VectorDescriptor::from_values(T::TYPE, self.iter().map(ToValue::to_value)).into()
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let vector = value.as_vector().ok_or_else(|| mismatch(value))?;
        vector.values().iter().map(T::from_value).collect()
    }
}

impl<T: ToValue> ToValue for HashMap<String, T> {
    const TYPE: TypeTag = TypeTag::Map;

    fn to_value(&self) -> Value {
        let map = MapDescriptor::new(T::TYPE);
        for (key, value) in self {
            map.insert_raw(key.clone(), value.to_value());
        }
        map.into()
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let map = value.as_map().ok_or_else(|| mismatch(value))?;
        map.entries()
            .into_iter()
            .map(|(key, v)| Ok((key, T::from_value(&v)?)))
            .collect()
    }
}

/// Build a device record, overriding the listed attributes.
///
/// Unknown attribute names fail with `KeyNotFound`; readings whose type
/// does not fit the declared attribute type fail with `TypeError`.
pub fn pack_device(device: DeviceType, readings: &[(&str, Value)]) -> Result<Value, ValueError> {
    let record = MapDescriptor::device(device);
    for (name, reading) in readings {
        let declared = device.attribute_type(name).ok_or_else(|| ValueError::KeyNotFound {
            key: (*name).to_owned(),
        })?;
        if !type_compatible(&declared.default_value(), reading) {
            return Err(ValueError::TypeError {
                op: "pack",
                lhs: declared,
                rhs: Some(reading.type_tag()),
            });
        }
        record.emplace(&Value::from(*name), reading.clone())?;
    }
    Ok(record.into())
}

/// Attribute values of a device record, in declaration order.
pub fn unpack_device(value: &Value) -> Result<(DeviceType, Vec<(String, Value)>), ValueError> {
    let Some(TypeTag::Device(device)) = value.as_map().map(MapDescriptor::object_type) else {
        return Err(mismatch(value));
    };
    let map = value.as_map().ok_or_else(|| mismatch(value))?;
    let attributes = device
        .attributes()
        .iter()
        .map(|(name, _)| {
            let key = Value::from(*name);
            Ok(((*name).to_owned(), map.get(&key)?))
        })
        .collect::<Result<Vec<_>, ValueError>>()?;
    Ok((device, attributes))
}
