//! Per-member evaluation probes
//!
//! A [`Probe`] is acquired before a member is evaluated and records elapsed
//! time and allocated bytes into its [`Measurement`] when dropped, so every
//! exit path is measured.
//!
//! Allocation counts come from [`CountingAllocator`]. Binaries that want the
//! allocated-bytes column install it as their global allocator; without it
//! the probe reports zero.

use serde::{Deserialize, Serialize};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::time::{Duration, Instant};

thread_local! {
    static ALLOCATED: Cell<u64> = const { Cell::new(0) };
}

/// Global allocator wrapper counting bytes allocated per thread
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc(layout)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc_zeroed(layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record(new_size.saturating_sub(layout.size()));
        System.realloc(ptr, layout, new_size)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[inline]
fn record(size: usize) {
    // TLS may already be torn down while a thread exits
    let _ = ALLOCATED.try_with(|total| total.set(total.get().wrapping_add(size as u64)));
}

/// Bytes allocated so far on the current thread
pub fn thread_allocated_bytes() -> u64 {
    ALLOCATED.try_with(Cell::get).unwrap_or(0)
}

/// Cost of evaluating one member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Measurement {
    pub elapsed: Duration,
    pub allocated_bytes: u64,
}

impl Measurement {
    /// Elapsed time in fractional milliseconds, the unit the time column shows
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Whether anything was measured at all
    pub fn is_measured(&self) -> bool {
        !self.elapsed.is_zero()
    }
}

/// Scoped probe; records into its slot on drop
pub struct Probe<'a> {
    slot: &'a mut Measurement,
    started: Instant,
    allocated_at_start: u64,
}

impl<'a> Probe<'a> {
    pub fn start(slot: &'a mut Measurement) -> Self {
        Self {
            slot,
            allocated_at_start: thread_allocated_bytes(),
            started: Instant::now(),
        }
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        self.slot.elapsed = self.started.elapsed();
        self.slot.allocated_bytes = thread_allocated_bytes().saturating_sub(self.allocated_at_start);
    }
}

/// Measure `f`, returning its output with the measurement
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Measurement) {
    let mut measurement = Measurement::default();
    let output = {
        let _probe = Probe::start(&mut measurement);
        f()
    };
    (output, measurement)
}
