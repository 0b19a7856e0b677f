//! # Last-error store
//!
//! Status codes are cheap to hand across the ABI; detailed fault text is not.
//! This module keeps the most recent fault message per execution context so a
//! caller that received only a code (or a null handle) can fetch the detail
//! afterwards.
//!
//! The store is a registry keyed by thread identity rather than thread-local
//! storage: isolation between concurrent callers is a hard invariant, and an
//! explicit registry keeps that invariant visible and testable. Slots are
//! boxed and never evicted, so a pointer into a slot stays valid for the
//! lifetime of the process once the owning thread has touched the store.

use std::collections::HashMap;
use std::os::raw::c_char;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

/// Maximum number of message bytes retained, excluding the NUL terminator.
///
/// Messages past the limit are truncated silently; this is diagnostic text,
/// not a correctness-critical payload.
pub const MESSAGE_CAPACITY: usize = 2047;

const SLOT_BYTES: usize = MESSAGE_CAPACITY + 1;

/// Fixed-capacity message slot owned by one execution context.
struct ErrorSlot {
    len: usize,
    bytes: [u8; SLOT_BYTES],
}

impl ErrorSlot {
    fn new() -> Box<Self> {
        Box::new(Self {
            len: 0,
            bytes: [0; SLOT_BYTES],
        })
    }

    fn write(&mut self, message: &str) {
        let take = message.len().min(MESSAGE_CAPACITY);
        self.bytes[..take].copy_from_slice(&message.as_bytes()[..take]);
        self.bytes[take] = 0;
        self.len = take;
    }

    fn clear(&mut self) {
        self.bytes[0] = 0;
        self.len = 0;
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes[..self.len]).into_owned()
    }
}

/// Registry of per-context error slots.
///
/// One slot per thread, created on first use. Each thread only ever writes
/// its own slot, so two concurrent callers never observe or clobber each
/// other's text.
pub struct LastErrorStore {
    slots: Mutex<HashMap<ThreadId, Box<ErrorSlot>>>,
}

impl LastErrorStore {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Record a message for the calling context.
    ///
    /// `None` is equivalent to [`clear`](Self::clear). Text beyond
    /// [`MESSAGE_CAPACITY`] bytes is dropped.
    pub fn set(&self, message: Option<&str>) {
        match message {
            Some(message) => self.with_slot(|slot| slot.write(message)),
            None => self.clear(),
        }
    }

    /// Reset the calling context's slot to empty.
    pub fn clear(&self) {
        self.with_slot(ErrorSlot::clear)
    }

    /// The calling context's current text, empty if nothing was recorded.
    pub fn get(&self) -> String {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&thread::current().id())
            .map(|slot| slot.text())
            .unwrap_or_default()
    }

    /// Borrowed NUL-terminated view of the calling context's slot.
    ///
    /// The pointer stays valid for the process lifetime and always reflects
    /// the most recent [`set`](Self::set)/[`clear`](Self::clear) performed by
    /// the same thread.
    pub fn message_ptr(&self) -> *const c_char {
        self.with_slot(|slot| slot.bytes.as_ptr() as *const c_char)
    }

    fn with_slot<R>(&self, f: impl FnOnce(&mut ErrorSlot) -> R) -> R {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f(slots
            .entry(thread::current().id())
            .or_insert_with(ErrorSlot::new))
    }
}

impl Default for LastErrorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn store() -> &'static LastErrorStore {
    static STORE: OnceLock<LastErrorStore> = OnceLock::new();
    STORE.get_or_init(LastErrorStore::new)
}

/// Record `message` in the process-wide store for the calling context.
pub fn set_last_error(message: Option<&str>) {
    store().set(message)
}

/// Clear the calling context's slot in the process-wide store.
pub fn clear_last_error() {
    store().clear()
}

/// The calling context's current text from the process-wide store.
pub fn get_last_error() -> String {
    store().get()
}

/// Borrowed C-string view of the calling context's slot.
pub fn last_error_ptr() -> *const c_char {
    store().message_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::Barrier;

    #[test]
    fn starts_empty() {
        let store = LastErrorStore::new();
        assert_eq!(store.get(), "");
    }

    #[test]
    fn set_then_get() {
        let store = LastErrorStore::new();
        store.set(Some("resize: bad size"));
        assert_eq!(store.get(), "resize: bad size");
        store.set(Some("second"));
        assert_eq!(store.get(), "second");
    }

    #[test]
    fn clear_is_idempotent() {
        let store = LastErrorStore::new();
        store.set(Some("boom"));
        store.clear();
        assert_eq!(store.get(), "");
        store.clear();
        assert_eq!(store.get(), "");
    }

    #[test]
    fn set_none_equals_clear() {
        let store = LastErrorStore::new();
        store.set(Some("boom"));
        store.set(None);
        assert_eq!(store.get(), "");
    }

    #[test]
    fn oversized_messages_truncate_to_prefix() {
        let store = LastErrorStore::new();
        let long = "x".repeat(MESSAGE_CAPACITY * 3);
        store.set(Some(&long));
        let stored = store.get();
        assert_eq!(stored.len(), MESSAGE_CAPACITY);
        assert_eq!(stored, &long[..MESSAGE_CAPACITY]);

        // The C view stays NUL-terminated at the boundary.
        let text = unsafe { CStr::from_ptr(store.message_ptr()) };
        assert_eq!(text.to_bytes().len(), MESSAGE_CAPACITY);
    }

    #[test]
    fn message_ptr_tracks_set_and_clear() {
        let store = LastErrorStore::new();
        let ptr = store.message_ptr();
        assert_eq!(unsafe { CStr::from_ptr(ptr) }.to_bytes(), b"");

        store.set(Some("stale handle"));
        assert_eq!(unsafe { CStr::from_ptr(ptr) }.to_bytes(), b"stale handle");

        store.clear();
        assert_eq!(unsafe { CStr::from_ptr(ptr) }.to_bytes(), b"");
    }

    #[test]
    fn contexts_are_isolated() {
        static STORE: OnceLock<LastErrorStore> = OnceLock::new();
        let store = STORE.get_or_init(LastErrorStore::new);
        let barrier = Barrier::new(2);

        store.set(Some("main"));

        std::thread::scope(|s| {
            for label in ["A", "B"] {
                let barrier = &barrier;
                s.spawn(move || {
                    store.set(Some(label));
                    barrier.wait();
                    assert_eq!(store.get(), label);
                });
            }
        });

        assert_eq!(store.get(), "main");
    }

    #[test]
    fn module_level_api_round_trips() {
        clear_last_error();
        assert_eq!(get_last_error(), "");
        set_last_error(Some("gpu api call failed"));
        assert_eq!(get_last_error(), "gpu api call failed");
        set_last_error(None);
        assert_eq!(get_last_error(), "");
    }
}
