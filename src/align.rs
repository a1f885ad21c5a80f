//! Size constants and alignment helpers.
//!
//! All metadata in this crate is word-sized (8 bytes); every block's total
//! size is rounded up to a multiple of [`DSIZE`] (16 bytes) so the low four
//! bits of a size word are free for the `alloc`/`prev_alloc` flags described
//! in `block.rs`.

/// Size of a single metadata word (header, footer, or link word), in bytes.
pub const WSIZE: usize = 8;

/// Double-word size: also the payload/user-pointer alignment, in bytes.
pub const DSIZE: usize = 16;

/// The minimum total size of any block (header + 2 link words + footer).
/// Free blocks must be at least this big because their payload stores the
/// prev/next free-list links.
pub const MIN_BLOCK_SIZE: usize = 32;

/// Number of free-list root cells kept in the heap prelude (see `spec.md`
/// size-class table in `freelist.rs`).
pub const ROOT_COUNT: usize = 9;

/// Words reserved at the start of the heap before the first real block:
/// the 9 class roots, one alignment pad word, a 2-word prologue
/// (header+footer, a zero-payload always-allocated sentinel block), and one
/// epilogue header word. The first real block's payload begins immediately
/// after this prelude (see `allocator.rs::Allocator::init`).
pub const PRELUDE_WORDS: usize = ROOT_COUNT + 4;

/// Rounds `value` up to the next multiple of [`DSIZE`].
///
/// # Examples
///
/// ```
/// use segalloc::align::align;
///
/// assert_eq!(align(0), 0);
/// assert_eq!(align(1), 16);
/// assert_eq!(align(16), 16);
/// assert_eq!(align(17), 32);
/// ```
#[inline]
pub const fn align(value: usize) -> usize {
    DSIZE * ((value + DSIZE - 1) / DSIZE)
}

/// Same rounding as [`align`], spelled as a macro for call sites that
/// prefer the teacher crate's `align!` style.
#[macro_export]
macro_rules! align {
    ($value:expr) => {
        $crate::align::align($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_dsize_multiples() {
        for base in 1..8usize {
            let expected = base * DSIZE;
            let lo = expected - DSIZE + 1;
            for size in lo..=expected {
                assert_eq!(align(size), expected, "align({size}) should be {expected}");
            }
        }
    }

    #[test]
    fn zero_aligns_to_zero() {
        assert_eq!(align(0), 0);
    }

    #[test]
    fn macro_matches_function() {
        assert_eq!(align!(100), align(100));
    }
}
