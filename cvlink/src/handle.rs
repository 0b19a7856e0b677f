//! # Generation-checked handles
//!
//! Foreign callers hold references to heap objects as plain integers. A raw
//! pointer would make every use-after-close undefined behavior; instead each
//! wrapped type gets a [`HandleStore`] of slots addressed by index plus a
//! generation counter. Closing a handle bumps the slot's generation, so a
//! stale handle simply fails to resolve.
//!
//! Handles pack into a `u64` for the ABI, with `0` reserved as the null
//! sentinel that factory wrappers return on fault.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Typed reference to an object owned by a [`HandleStore`].
///
/// The low 32 bits carry the slot index offset by one (so the packed value is
/// never zero), the high 32 bits the generation the slot had when the object
/// was inserted.
pub struct Handle<T> {
    raw: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Decode a handle received across the ABI.
    ///
    /// `0` is the null sentinel and yields `None`. Any other value decodes;
    /// whether it still refers to a live object is decided at resolve time.
    pub fn from_raw(raw: u64) -> Option<Self> {
        if raw as u32 == 0 {
            None
        } else {
            Some(Self {
                raw,
                _marker: PhantomData,
            })
        }
    }

    /// The packed value handed across the ABI.
    pub fn raw(self) -> u64 {
        self.raw
    }

    fn pack(index: u32, generation: u32) -> Self {
        Self {
            raw: ((generation as u64) << 32) | (index as u64 + 1),
            _marker: PhantomData,
        }
    }

    fn index(self) -> usize {
        (self.raw as u32 - 1) as usize
    }

    fn generation(self) -> u32 {
        (self.raw >> 32) as u32
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.raw)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<Arc<Mutex<T>>>,
}

struct Inner<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

/// Arena of generation-checked slots for one wrapped type.
///
/// Objects sit behind `Arc<Mutex<_>>` so an operation that resolved a handle
/// keeps the object alive even if another thread closes the handle mid-call;
/// the storage is freed when the last in-flight reference drops.
///
/// `new` is `const`, so a store per wrapped type can live in a `static`.
pub struct HandleStore<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> HandleStore<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                free: Vec::new(),
            }),
        }
    }

    /// Insert an object and mint a handle for it.
    pub fn insert(&self, value: T) -> Handle<T> {
        let mut inner = self.lock();
        let value = Some(Arc::new(Mutex::new(value)));
        match inner.free.pop() {
            Some(index) => {
                let slot = &mut inner.slots[index as usize];
                slot.value = value;
                Handle::pack(index, slot.generation)
            }
            None => {
                let index = inner.slots.len() as u32;
                inner.slots.push(Slot {
                    generation: 1,
                    value,
                });
                Handle::pack(index, 1)
            }
        }
    }

    /// Resolve a handle to its object.
    ///
    /// Returns `None` if the handle was closed, refers to a recycled slot, or
    /// never came from this store.
    pub fn resolve(&self, handle: Handle<T>) -> Option<Arc<Mutex<T>>> {
        let inner = self.lock();
        let slot = inner.slots.get(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.clone()
    }

    /// Close a handle, releasing the store's reference to the object.
    ///
    /// Returns `false` if the handle was already closed or never valid;
    /// closing is idempotent and a double close is never UB.
    pub fn remove(&self, handle: Handle<T>) -> bool {
        let mut inner = self.lock();
        let index = handle.index();
        let slot = match inner.slots.get_mut(index) {
            Some(slot) => slot,
            None => return false,
        };
        if slot.generation != handle.generation() || slot.value.is_none() {
            return false;
        }
        slot.value = None;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(index as u32);
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
