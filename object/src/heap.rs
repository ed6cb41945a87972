//! Registry of live containers with an explicit cycle breaker.
//!
//! Containers are reference counted, so a vector that reaches itself is
//! never freed on its own. The [`Heap`] keeps a weak slot for every
//! registered descriptor, addressed by a generation-checked [`HeapHandle`].
//! [`Heap::collect`] marks everything reachable from the host's roots and
//! empties registered descriptors that are still alive but unreachable;
//! with their contents gone the reference counts fall to zero and the
//! memory is released normally.
//!
//! Nothing runs implicitly. The host decides when to collect, typically
//! when [`Heap::should_collect`] says so, and must report every value it
//! still holds as a root.

use std::{
    collections::HashSet,
    sync::{Arc, Weak},
};

use crate::{HeapDescriptor, Value};

/// Consumers implement this to provide roots at collection time.
pub trait RootProvider {
    fn visit_roots(&mut self, visitor: &mut dyn FnMut(&Value));
}

impl RootProvider for [Value] {
    fn visit_roots(&mut self, visitor: &mut dyn FnMut(&Value)) {
        self.iter().for_each(visitor);
    }
}

impl RootProvider for Vec<Value> {
    fn visit_roots(&mut self, visitor: &mut dyn FnMut(&Value)) {
        self.as_mut_slice().visit_roots(visitor);
    }
}

// ── Heap settings ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HeapSettings {
    /// Slots reserved up front.
    pub initial_capacity: usize,
    /// Registrations since the last collection after which
    /// [`Heap::should_collect`] reports true. 0 disables the hint.
    pub collect_threshold: usize,
    /// Upper bound on simultaneously registered containers.
    pub max_slots: usize,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            collect_threshold: 4096,
            max_slots: u32::MAX as usize,
        }
    }
}

impl HeapSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_slots == 0 {
            return Err("max_slots must be > 0");
        }
        if self.max_slots > u32::MAX as usize {
            return Err("max_slots too large for handle index");
        }
        if self.initial_capacity > self.max_slots {
            return Err("initial_capacity must not exceed max_slots");
        }
        Ok(())
    }
}

// ── Handles ────────────────────────────────────────────────────────

/// Stable name for a registered container. A handle outlives its slot
/// safely: once the slot is recycled the generation no longer matches and
/// lookups fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapHandle {
    index: u32,
    generation: u32,
}

impl HeapHandle {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Weak<HeapDescriptor>>,
}

/// Outcome of one [`Heap::collect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Registered containers reachable from the roots.
    pub live: usize,
    /// Unreachable containers whose contents were cleared.
    pub cleared: usize,
    /// Slots recycled because their container is gone.
    pub freed: usize,
}

pub struct Heap {
    settings: HeapSettings,
    slots: Vec<Slot>,
    free: Vec<u32>,
    since_collect: usize,
}

impl Heap {
    pub fn new(settings: HeapSettings) -> Result<Self, &'static str> {
        settings.validate()?;
        Ok(Self {
            slots: Vec::with_capacity(settings.initial_capacity),
            free: Vec::new(),
            since_collect: 0,
            settings,
        })
    }

    /// Wrap `descriptor` in a value and register it.
    pub fn alloc(
        &mut self,
        descriptor: impl Into<HeapDescriptor>,
    ) -> Result<(HeapHandle, Value), &'static str> {
        let desc = Arc::new(descriptor.into());
        let handle = self.register(&desc)?;
        Ok((handle, Value::Container(desc)))
    }

    /// Track an existing container. Registering the same container twice
    /// yields two handles for it.
    pub fn register(&mut self, desc: &Arc<HeapDescriptor>) -> Result<HeapHandle, &'static str> {
        let entry = Some(Arc::downgrade(desc));
        self.since_collect += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = entry;
            return Ok(HeapHandle {
                index,
                generation: slot.generation,
            });
        }

        if self.slots.len() >= self.settings.max_slots {
            return Err("heap registry is full");
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry,
        });
        Ok(HeapHandle {
            index,
            generation: 0,
        })
    }

    /// The container behind `handle`, or `None` if the handle is stale or
    /// the container has been dropped.
    pub fn get(&self, handle: HeapHandle) -> Option<Value> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()?.upgrade().map(Value::Container)
    }

    /// Registered containers that are still alive.
    pub fn live(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref())
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn should_collect(&self) -> bool {
        self.settings.collect_threshold != 0
            && self.since_collect >= self.settings.collect_threshold
    }

    /// Break cycles among containers unreachable from `roots`.
    ///
    /// Marking snapshots one container's children at a time, so no two
    /// descriptor locks are ever held together.
    pub fn collect(&mut self, roots: &mut dyn RootProvider) -> CollectStats {
        let mut stats = CollectStats::default();

        // Reached containers stay pinned until the sweep is over so their
        // addresses cannot be reused while we compare pointers.
        let mut reached: Vec<Arc<HeapDescriptor>> = Vec::new();
        let mut marked: HashSet<*const HeapDescriptor> = HashSet::new();
        let mut worklist: Vec<Arc<HeapDescriptor>> = Vec::new();

        roots.visit_roots(&mut |value: &Value| {
            if let Value::Container(desc) = value {
                worklist.push(desc.clone());
            }
        });

        while let Some(desc) = worklist.pop() {
            if !marked.insert(Arc::as_ptr(&desc)) {
                continue;
            }
            worklist.extend(desc.children().into_iter().filter_map(|child| match child {
                Value::Container(inner) => Some(inner),
                _ => None,
            }));
            reached.push(desc);
        }

        // Clear pass: take every unreachable container's contents out.
        let mut garbage = Vec::new();
        for slot in &self.slots {
            let Some(desc) = slot.entry.as_ref().and_then(Weak::upgrade) else {
                continue;
            };
            if marked.contains(&Arc::as_ptr(&desc)) {
                stats.live += 1;
            } else {
                garbage.push(desc);
            }
        }
        for desc in &garbage {
            desc.clear();
        }
        stats.cleared = garbage.len();
        drop(garbage);
        drop(reached);

        // Free pass: recycle slots whose container is now gone.
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let dead = slot
                .entry
                .as_ref()
                .is_some_and(|weak| weak.strong_count() == 0);
            if dead {
                slot.entry = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                stats.freed += 1;
            }
        }

        self.since_collect = 0;
        log::debug!(
            "heap collect: {} live, {} cleared, {} freed",
            stats.live,
            stats.cleared,
            stats.freed
        );
        stats
    }
}
