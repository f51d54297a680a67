//! Lock-free primitives shared between the owner thread and per-frame readers.

use arc_swap::ArcSwapOption;
use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cache-line aligned atomic f32.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFloat {
    value: AtomicF32,
}

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Single-slot mailbox where a newer value replaces an unread older one.
///
/// Producers (tracking callbacks) call [`LatestSlot::publish`] at frame rate;
/// the owner thread calls [`LatestSlot::take`] when it gets round to it and
/// only ever sees the newest value. Intermediate values are dropped.
#[derive(Debug)]
pub struct LatestSlot<T> {
    slot: ArcSwapOption<T>,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Store a value, discarding any value not yet taken.
    pub fn publish(&self, value: T) {
        self.slot.store(Some(Arc::new(value)));
    }

    /// Take the newest value, leaving the slot empty.
    pub fn take(&self) -> Option<Arc<T>> {
        self.slot.swap(None)
    }

    pub fn is_pending(&self) -> bool {
        self.slot.load().is_some()
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
