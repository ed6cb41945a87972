use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{HeapDescriptor, MapDescriptor, TypeTag, ValueError, VectorDescriptor};

/// The unit of computation.
///
/// Scalars are copied by value. `Container` holds a shared handle, so
/// cloning it aliases the same descriptor rather than copying its contents.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Void,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Container(Arc<HeapDescriptor>),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Void => TypeTag::Void,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::String(_) => TypeTag::String,
            Value::Container(desc) => desc.object_type(),
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Container(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Numeric view, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(n) => Some(n as f64),
            Value::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Arc<HeapDescriptor>> {
        match self {
            Value::Container(desc) => Some(desc),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapDescriptor> {
        self.as_container().and_then(|desc| desc.as_map())
    }

    pub fn as_vector(&self) -> Option<&VectorDescriptor> {
        self.as_container().and_then(|desc| desc.as_vector())
    }

    /// Element count for containers, character count for strings, 1 for
    /// every other scalar.
    pub fn size(&self) -> usize {
        match self {
            Value::Container(desc) => desc.size(),
            Value::String(s) => s.chars().count(),
            _ => 1,
        }
    }

    /// Textual form of a scalar. This is also how map keys are derived.
    pub fn stringify(&self) -> Result<String, ValueError> {
        match self {
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(x) => Ok(x.to_string()),
            Value::String(s) => Ok(s.clone()),
            Value::Void | Value::Container(_) => Err(ValueError::type_error("stringify", self, None)),
        }
    }

    /// Whether two values point at the same container.
    pub fn same_container(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Container(a), Value::Container(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ── Conversions ────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<Arc<HeapDescriptor>> for Value {
    fn from(desc: Arc<HeapDescriptor>) -> Self {
        Value::Container(desc)
    }
}

impl From<HeapDescriptor> for Value {
    fn from(desc: HeapDescriptor) -> Self {
        Value::Container(Arc::new(desc))
    }
}

impl From<MapDescriptor> for Value {
    fn from(map: MapDescriptor) -> Self {
        HeapDescriptor::Map(map).into()
    }
}

impl From<VectorDescriptor> for Value {
    fn from(vector: VectorDescriptor) -> Self {
        HeapDescriptor::Vector(vector).into()
    }
}

// ── Display ────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}

/// `visiting` holds the containers currently being printed; meeting one
/// again prints an ellipsis instead of recursing forever.
fn write_value(
    f: &mut fmt::Formatter<'_>,
    value: &Value,
    visiting: &mut Vec<*const HeapDescriptor>,
) -> fmt::Result {
    let desc = match value {
        Value::Void => return f.write_str("void"),
        Value::Bool(b) => return write!(f, "{b}"),
        Value::Int(n) => return write!(f, "{n}"),
        Value::Float(x) => return write!(f, "{x}"),
        Value::String(s) => return f.write_str(s),
        Value::Container(desc) => desc,
    };

    let ptr = Arc::as_ptr(desc);
    let is_map = desc.as_map().is_some();
    if visiting.contains(&ptr) {
        return f.write_str(if is_map { "{...}" } else { "[...]" });
    }

    visiting.push(ptr);
    let result = match &**desc {
        HeapDescriptor::Vector(vector) => {
            f.write_str("[")?;
            for (i, element) in vector.values().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, element, visiting)?;
            }
            f.write_str("]")
        }
        HeapDescriptor::Map(map) => {
            f.write_str("{")?;
            for (i, (key, element)) in map.entries().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key} : ")?;
                write_value(f, element, visiting)?;
            }
            f.write_str("}")
        }
    };
    visiting.pop();
    result
}

// ── Hashing ────────────────────────────────────────────────────────

const TRUE_HASH: u64 = 7741;
const FALSE_HASH: u64 = 7753;

/// Range of floats whose integral values convert to `i64` exactly.
const I64_FLOAT_RANGE: std::ops::Range<f64> = -9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0;

/// The integer a float equals, if any. Shared by equality and hashing so
/// `Int(2) == Float(2.0)` also hash alike.
pub(crate) fn integral_float(x: f64) -> Option<i64> {
    (x.fract() == 0.0 && I64_FLOAT_RANGE.contains(&x)).then_some(x as i64)
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(hash_value(self, &mut Vec::new()));
    }
}

fn hash_value(value: &Value, visiting: &mut Vec<*const HeapDescriptor>) -> u64 {
    let mut hasher = DefaultHasher::new();
    match value {
        Value::Void => 0u8.hash(&mut hasher),
        Value::Bool(b) => return if *b { TRUE_HASH } else { FALSE_HASH },
        Value::Int(n) => {
            1u8.hash(&mut hasher);
            n.hash(&mut hasher);
        }
        Value::Float(x) => match integral_float(*x) {
            Some(n) => {
                1u8.hash(&mut hasher);
                n.hash(&mut hasher);
            }
            None => {
                2u8.hash(&mut hasher);
                x.to_bits().hash(&mut hasher);
            }
        },
        Value::String(s) => {
            3u8.hash(&mut hasher);
            s.hash(&mut hasher);
        }
        Value::Container(desc) => {
            let ptr = Arc::as_ptr(desc);
            if visiting.contains(&ptr) {
                return 0;
            }
            visiting.push(ptr);
            match &**desc {
                HeapDescriptor::Vector(vector) => {
                    4u8.hash(&mut hasher);
                    for element in vector.values() {
                        hash_value(&element, visiting).hash(&mut hasher);
                    }
                }
                HeapDescriptor::Map(map) => {
                    // Entry order carries no meaning, so entries are summed.
                    let combined = map.entries().iter().fold(0u64, |acc, (key, element)| {
                        let mut entry = DefaultHasher::new();
                        key.hash(&mut entry);
                        hash_value(element, visiting).hash(&mut entry);
                        acc.wrapping_add(entry.finish())
                    });
                    5u8.hash(&mut hasher);
                    combined.hash(&mut hasher);
                }
            }
            visiting.pop();
        }
    }
    hasher.finish()
}
