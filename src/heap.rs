//! The page-level heap provider.
//!
//! `spec.md` treats "an object that can return the current low/high bounds
//! of the heap region and extend the heap by N bytes" as an external
//! collaborator assumed by the rest of the allocator. [`HeapProvider`] names
//! that seam; [`SbrkHeap`] is the one concrete implementation this crate
//! ships, built the same way the teacher crate talks to the OS — through
//! `libc::sbrk` — rather than `mmap`/`VirtualAlloc`.

use std::ptr;

use libc::{c_void, intptr_t, sbrk};

/// Bounds and growth operations the placement engine needs from the
/// underlying memory region. Kept as a trait so `allocator.rs` depends on
/// this interface rather than calling `sbrk` directly, even though only one
/// implementation (`SbrkHeap`) exists today.
pub trait HeapProvider {
    /// Inclusive low bound of the region currently owned by the heap.
    fn low(&self) -> *mut u8;

    /// Exclusive high bound (one byte past the last valid byte) of the
    /// region currently owned by the heap. Undefined (returns `low()`)
    /// before the first `extend`.
    fn high(&self) -> *mut u8;

    /// Grows the heap by exactly `bytes` bytes.
    ///
    /// Returns the pre-extension end of the heap (the start of the freshly
    /// added region) on success, or `None` if the provider is exhausted.
    fn extend(&mut self, bytes: usize) -> Option<*mut u8>;
}

/// A [`HeapProvider`] backed by the POSIX `sbrk(2)` program-break call,
/// mirroring `examples/0xErwin1-rallocator/src/bump.rs`'s direct use of
/// `libc::sbrk`.
pub struct SbrkHeap {
    low: *mut u8,
    high: *mut u8,
}

impl SbrkHeap {
    /// Creates a provider with no region yet claimed. `low`/`high` are only
    /// meaningful once `extend` has been called at least once.
    pub fn new() -> Self {
        Self {
            low: ptr::null_mut(),
            high: ptr::null_mut(),
        }
    }
}

impl Default for SbrkHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapProvider for SbrkHeap {
    fn low(&self) -> *mut u8 {
        self.low
    }

    fn high(&self) -> *mut u8 {
        self.high
    }

    fn extend(&mut self, bytes: usize) -> Option<*mut u8> {
        let old_break = unsafe { sbrk(bytes as intptr_t) };
        if old_break == usize::MAX as *mut c_void {
            return None;
        }

        let old_break = old_break as *mut u8;
        if self.low.is_null() {
            self.low = old_break;
        }
        self.high = unsafe { old_break.add(bytes) };

        Some(old_break)
    }
}

/// Copies `n` bytes from `src` to `dst`. The two regions must not overlap.
///
/// # Safety
///
/// `src` and `dst` must each be valid for reads/writes of `n` bytes and
/// must not alias.
pub unsafe fn memcopy(dst: *mut u8, src: *const u8, n: usize) {
    unsafe {
        ptr::copy_nonoverlapping(src, dst, n);
    }
}

/// Fills `n` bytes starting at `dst` with the byte value `v`.
///
/// # Safety
///
/// `dst` must be valid for writes of `n` bytes.
pub unsafe fn memset(dst: *mut u8, v: u8, n: usize) {
    unsafe {
        ptr::write_bytes(dst, v, n);
    }
}

/// A fixed-capacity, never-moving [`HeapProvider`] for tests. `mm.c` itself
/// is written against a swappable `memlib.h` seam (`mm_sbrk`/`mm_heap_lo`/
/// `mm_heap_hi`), so exercising the allocator against a provider other than
/// `SbrkHeap` is true to the original design, not a deviation from it — and
/// it keeps allocator tests from fighting over the one real process break
/// that a parallel test run would otherwise share.
#[cfg(test)]
pub(crate) struct FixedHeap {
    arena: Box<[u8]>,
    used: usize,
}

#[cfg(test)]
impl FixedHeap {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            arena: vec![0u8; capacity].into_boxed_slice(),
            used: 0,
        }
    }
}

#[cfg(test)]
impl HeapProvider for FixedHeap {
    fn low(&self) -> *mut u8 {
        self.arena.as_ptr() as *mut u8
    }

    fn high(&self) -> *mut u8 {
        unsafe { (self.arena.as_ptr() as *mut u8).add(self.used) }
    }

    fn extend(&mut self, bytes: usize) -> Option<*mut u8> {
        if self.used + bytes > self.arena.len() {
            return None;
        }
        let old = unsafe { self.arena.as_mut_ptr().add(self.used) };
        self.used += bytes;
        Some(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_advances_high_and_preserves_low() {
        let mut heap = SbrkHeap::new();

        let first = heap.extend(64).expect("first extend should succeed");
        assert_eq!(heap.low(), first);
        assert_eq!(heap.high(), unsafe { first.add(64) });

        let second = heap.extend(128).expect("second extend should succeed");
        assert_eq!(second, unsafe { first.add(64) });
        assert_eq!(heap.low(), first);
        assert_eq!(heap.high(), unsafe { second.add(128) });
    }

    #[test]
    fn memcopy_and_memset_roundtrip() {
        let mut src = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut dst = [0u8; 8];

        unsafe {
            memcopy(dst.as_mut_ptr(), src.as_ptr(), 8);
        }
        assert_eq!(src, dst);

        unsafe {
            memset(src.as_mut_ptr(), 0xAA, 8);
        }
        assert_eq!(src, [0xAA; 8]);
    }
}
