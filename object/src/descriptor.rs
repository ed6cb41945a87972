//! Heap-resident container backing for [`Value::Container`].
//!
//! Every descriptor guards its contents with its own lock. Operations take
//! that lock for their duration only and never while holding another
//! descriptor's lock: anything touching two containers snapshots the first,
//! releases it, then locks the second. Callers holding a [`ValueRef`] must
//! follow the same rule and drop it before accessing any other container.

use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use indexmap::IndexMap;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::{DeviceType, TypeTag, Value, ValueError};

/// Mutable reference into a container slot. The descriptor stays locked
/// until this guard is dropped.
pub type ValueRef<'a> = MappedMutexGuard<'a, Value>;

/// A container: string-keyed map or dense vector.
pub enum HeapDescriptor {
    Map(MapDescriptor),
    Vector(VectorDescriptor),
}

impl HeapDescriptor {
    pub fn object_type(&self) -> TypeTag {
        match self {
            HeapDescriptor::Map(map) => map.object_type,
            HeapDescriptor::Vector(_) => TypeTag::List,
        }
    }

    pub fn key_type(&self) -> TypeTag {
        match self {
            HeapDescriptor::Map(map) => map.key_type,
            HeapDescriptor::Vector(_) => TypeTag::None,
        }
    }

    pub fn element_type(&self) -> TypeTag {
        match self {
            HeapDescriptor::Map(map) => map.element_type,
            HeapDescriptor::Vector(vector) => vector.element_type,
        }
    }

    /// Sample used to probe nested element types; `[key, value]` for maps,
    /// `[element]` for vectors, empty when none was declared.
    pub fn sample(&self) -> &[Value] {
        match self {
            HeapDescriptor::Map(map) => &map.sample,
            HeapDescriptor::Vector(vector) => &vector.sample,
        }
    }

    /// The sample if there is one, else the first stored element (keyed by
    /// its string key for maps), else nothing.
    pub fn representative(&self) -> Vec<Value> {
        if !self.sample().is_empty() {
            return self.sample().to_vec();
        }
        match self {
            HeapDescriptor::Map(map) => map
                .entries
                .lock()
                .first()
                .map(|(key, value)| vec![Value::String(key.clone()), value.clone()])
                .unwrap_or_default(),
            HeapDescriptor::Vector(vector) => {
                vector.elements.lock().first().cloned().into_iter().collect()
            }
        }
    }

    pub fn size(&self) -> usize {
        match self {
            HeapDescriptor::Map(map) => map.size(),
            HeapDescriptor::Vector(vector) => vector.size(),
        }
    }

    /// `map[key]` or `vector[index]`, depending on the kind.
    pub fn access(&self, key: &Value) -> Result<ValueRef<'_>, ValueError> {
        match self {
            HeapDescriptor::Map(map) => map.access(key),
            HeapDescriptor::Vector(vector) => vector.access(key),
        }
    }

    /// Every value this descriptor keeps alive: sample plus contents.
    /// Taken under a single lock acquisition and returned as a snapshot.
    pub fn children(&self) -> Vec<Value> {
        let mut out = self.sample().to_vec();
        match self {
            HeapDescriptor::Map(map) => out.extend(map.entries.lock().values().cloned()),
            HeapDescriptor::Vector(vector) => out.extend(vector.elements.lock().iter().cloned()),
        }
        out
    }

    /// Drop all stored contents. The declared sample is kept.
    pub fn clear(&self) {
        match self {
            HeapDescriptor::Map(map) => map.clear(),
            HeapDescriptor::Vector(vector) => vector.clear(),
        }
    }

    pub fn as_map(&self) -> Option<&MapDescriptor> {
        match self {
            HeapDescriptor::Map(map) => Some(map),
            HeapDescriptor::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorDescriptor> {
        match self {
            HeapDescriptor::Vector(vector) => Some(vector),
            HeapDescriptor::Map(_) => None,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified_flag().load(Ordering::Acquire)
    }

    pub fn mark_modified(&self) {
        self.modified_flag().store(true, Ordering::Release);
    }

    pub fn clear_modified(&self) {
        self.modified_flag().store(false, Ordering::Release);
    }

    fn modified_flag(&self) -> &AtomicBool {
        match self {
            HeapDescriptor::Map(map) => &map.modified,
            HeapDescriptor::Vector(vector) => &vector.modified,
        }
    }
}

impl From<MapDescriptor> for HeapDescriptor {
    fn from(map: MapDescriptor) -> Self {
        HeapDescriptor::Map(map)
    }
}

impl From<VectorDescriptor> for HeapDescriptor {
    fn from(vector: VectorDescriptor) -> Self {
        HeapDescriptor::Vector(vector)
    }
}

// Contents are left out: they may contain the descriptor itself.
impl fmt::Debug for HeapDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeapDescriptor::Map(_) => "Map",
            HeapDescriptor::Vector(_) => "Vector",
        };
        f.debug_struct(name)
            .field("object_type", &self.object_type())
            .field("key_type", &self.key_type())
            .field("element_type", &self.element_type())
            .field("size", &self.size())
            .finish()
    }
}

// ── Map ────────────────────────────────────────────────────────────

/// String-keyed container. Keys are the stringified form of scalar values.
pub struct MapDescriptor {
    object_type: TypeTag,
    key_type: TypeTag,
    element_type: TypeTag,
    sample: Vec<Value>,
    entries: Mutex<IndexMap<String, Value>>,
    modified: AtomicBool,
}

impl MapDescriptor {
    /// A plain `map<string, element_type>`.
    pub fn new(element_type: TypeTag) -> Self {
        Self::with_types(TypeTag::Map, TypeTag::String, element_type)
    }

    /// A map with an explicit object type. Device object types come
    /// pre-populated with each attribute's default value.
    pub fn with_types(object_type: TypeTag, key_type: TypeTag, element_type: TypeTag) -> Self {
        let mut entries = IndexMap::new();
        if let TypeTag::Device(device) = object_type {
            for (name, ty) in device.attributes() {
                entries.insert((*name).to_owned(), ty.default_value());
            }
        }
        Self {
            object_type,
            key_type,
            element_type,
            sample: Vec::new(),
            entries: Mutex::new(entries),
            modified: AtomicBool::new(false),
        }
    }

    pub fn device(device: DeviceType) -> Self {
        Self::with_types(TypeTag::Device(device), TypeTag::String, TypeTag::Any)
    }

    /// Declare the sample entry used for type-compatibility probing.
    pub fn with_sample(mut self, key: Value, value: Value) -> Self {
        self.sample = vec![key, value];
        self
    }

    pub fn object_type(&self) -> TypeTag {
        self.object_type
    }

    pub fn key_type(&self) -> TypeTag {
        self.key_type
    }

    pub fn element_type(&self) -> TypeTag {
        self.element_type
    }

    /// Lock and return the slot stored under `stringify(key)`.
    pub fn access(&self, key: &Value) -> Result<ValueRef<'_>, ValueError> {
        let key = map_key(key)?;
        MutexGuard::try_map(self.entries.lock(), |entries| entries.get_mut(&key))
            .map_err(|_| ValueError::KeyNotFound { key })
    }

    /// Copy of the value under `key`.
    pub fn get(&self, key: &Value) -> Result<Value, ValueError> {
        self.access(key).map(|slot| slot.clone())
    }

    /// Insert or overwrite unconditionally.
    pub fn emplace(&self, key: &Value, value: Value) -> Result<(), ValueError> {
        let key = map_key(key)?;
        self.entries.lock().insert(key, value);
        self.modified.store(true, Ordering::Release);
        Ok(())
    }

    /// Insert under an already-derived key without touching the modified flag.
    pub(crate) fn insert_raw(&self, key: String, value: Value) {
        self.entries.lock().insert(key, value);
    }

    pub fn contains(&self, key: &Value) -> Result<bool, ValueError> {
        let key = map_key(key)?;
        Ok(self.entries.lock().contains_key(&key))
    }

    /// Remove `key`, keeping the remaining entries in insertion order.
    pub fn erase(&self, key: &Value) -> Result<Option<Value>, ValueError> {
        let key = map_key(key)?;
        let removed = self.entries.lock().shift_remove(&key);
        if removed.is_some() {
            self.modified.store(true, Ordering::Release);
        }
        Ok(removed)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn size(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.lock().values().cloned().collect()
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.entries
            .lock()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

fn map_key(key: &Value) -> Result<String, ValueError> {
    match key {
        Value::Void | Value::Container(_) => Err(ValueError::type_error("map key", key, None)),
        _ => key.stringify(),
    }
}

// ── Vector ─────────────────────────────────────────────────────────

/// Dense, zero-indexed sequence.
pub struct VectorDescriptor {
    element_type: TypeTag,
    sample: Vec<Value>,
    elements: Mutex<Vec<Value>>,
    modified: AtomicBool,
}

impl VectorDescriptor {
    pub fn new(element_type: TypeTag) -> Self {
        Self {
            element_type,
            sample: Vec::new(),
            elements: Mutex::new(Vec::new()),
            modified: AtomicBool::new(false),
        }
    }

    pub fn with_sample(mut self, sample: Value) -> Self {
        self.sample = vec![sample];
        self
    }

    /// Vector of `values`, typed by `element_type`.
    pub fn from_values(element_type: TypeTag, values: impl IntoIterator<Item = Value>) -> Self {
        let vector = Self::new(element_type);
        vector.elements.lock().extend(values);
        vector
    }

    pub fn element_type(&self) -> TypeTag {
        self.element_type
    }

    /// Lock and return the slot at `index`, which must be an `Int`.
    pub fn access(&self, index: &Value) -> Result<ValueRef<'_>, ValueError> {
        let &Value::Int(raw) = index else {
            return Err(ValueError::type_error("index", index, None));
        };
        let guard = self.elements.lock();
        let len = guard.len();
        MutexGuard::try_map(guard, |elements| {
            usize::try_from(raw).ok().and_then(|i| elements.get_mut(i))
        })
        .map_err(|_| ValueError::IndexOutOfBounds { index: raw, len })
    }

    pub fn get(&self, index: &Value) -> Result<Value, ValueError> {
        self.access(index).map(|slot| slot.clone())
    }

    /// Replace the element at `index`, returning the old one.
    pub fn set(&self, index: &Value, value: Value) -> Result<Value, ValueError> {
        let old = std::mem::replace(&mut *self.access(index)?, value);
        self.modified.store(true, Ordering::Release);
        Ok(old)
    }

    pub fn append(&self, value: Value) {
        self.elements.lock().push(value);
        self.modified.store(true, Ordering::Release);
    }

    pub fn pop(&self) -> Option<Value> {
        let popped = self.elements.lock().pop();
        if popped.is_some() {
            self.modified.store(true, Ordering::Release);
        }
        popped
    }

    pub fn clear(&self) {
        self.elements.lock().clear();
    }

    pub fn size(&self) -> usize {
        self.elements.lock().len()
    }

    /// Snapshot of all elements.
    pub fn values(&self) -> Vec<Value> {
        self.elements.lock().clone()
    }
}
