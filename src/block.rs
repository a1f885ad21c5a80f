//! In-band block encoding.
//!
//! Every block (free or allocated) carries its metadata inline: a header
//! word immediately before the user pointer, and — for free blocks, plus
//! allocated ones for uniformity — a footer word at the end. Both words pack
//! the block's total size (a multiple of 16, so the low 4 bits are free)
//! with two flag bits: bit 0 is `alloc`, bit 1 is `prev_alloc`. This module
//! is the crate's one unchecked raw-pointer façade; every other module goes
//! through these functions instead of deriving pointer arithmetic itself.
//!
//! Ported one-to-one from `mm.c`'s `pack`/`get_header`/`get_size`/
//! `get_footer`/`get_nextblk`/`get_prevblk`/`get_alloc`/`get_prevalloc`/
//! `set_ptr`/`get_ptr`/`set_prevalloc`/`put`.

use crate::align::{DSIZE, WSIZE};

const ALLOC_BIT: u64 = 0x1;
const PREV_ALLOC_BIT: u64 = 0x2;
const SIZE_MASK: u64 = !0xf;

/// Packs a block size and `alloc` flag into a header/footer word.
/// `prev_alloc` is not set here; callers that need it OR it in separately
/// via [`set_prev_alloc`] (matching `mm.c`, which only ever sets this bit
/// after the fact, never at `pack` time, except for the epilogue sentinel).
#[inline]
pub fn pack(size: usize, alloc: bool) -> u64 {
    size as u64 | if alloc { ALLOC_BIT } else { 0 }
}

/// Packs a size with both flag bits forced on — used only for the epilogue
/// sentinel, whose header is always written as `pack(0, 3)` in the original
/// source (alloc and prev_alloc both set, regardless of the true state of
/// the block that precedes it).
#[inline]
pub fn pack_epilogue() -> u64 {
    ALLOC_BIT | PREV_ALLOC_BIT
}

/// Reads the word at `p`.
///
/// # Safety
///
/// `p` must be valid for an 8-byte read.
#[inline]
pub unsafe fn get_word(p: *mut u8) -> u64 {
    unsafe { (p as *mut u64).read() }
}

/// Writes `val` as the word at `p`.
///
/// # Safety
///
/// `p` must be valid for an 8-byte write.
#[inline]
pub unsafe fn put_word(p: *mut u8, val: u64) {
    unsafe {
        (p as *mut u64).write(val);
    }
}

/// Extracts the block size (header+payload+footer) from a packed word,
/// ignoring the low 4 flag/reserved bits.
#[inline]
pub fn block_size(word: u64) -> usize {
    (word & SIZE_MASK) as usize
}

/// Extracts the `alloc` bit from a packed word.
#[inline]
pub fn is_alloc(word: u64) -> bool {
    word & ALLOC_BIT != 0
}

/// Extracts the `prev_alloc` bit from a packed word.
#[inline]
pub fn is_prev_alloc(word: u64) -> bool {
    word & PREV_ALLOC_BIT != 0
}

/// Given a user pointer `bp`, returns a pointer to its header word.
#[inline]
pub fn header(bp: *mut u8) -> *mut u8 {
    unsafe { bp.sub(WSIZE) }
}

/// Reads the size of the block whose user pointer is `bp`.
///
/// # Safety
///
/// `bp`'s header must be a valid, initialized header word.
#[inline]
pub unsafe fn size_of_block(bp: *mut u8) -> usize {
    unsafe { block_size(get_word(header(bp))) }
}

/// Given a user pointer `bp`, returns a pointer to its footer word.
///
/// # Safety
///
/// `bp`'s header must already encode the block's correct size.
#[inline]
pub unsafe fn footer(bp: *mut u8) -> *mut u8 {
    unsafe { bp.add(size_of_block(bp) - DSIZE) }
}

/// Returns the user pointer of the block physically following `bp`.
///
/// # Safety
///
/// `bp`'s header must encode the block's correct size, and the following
/// block's header word must be readable (true for every block up to and
/// including the epilogue).
#[inline]
pub unsafe fn next_block(bp: *mut u8) -> *mut u8 {
    unsafe { bp.add(size_of_block(bp)) }
}

/// Returns the user pointer of the block physically preceding `bp`, read
/// via that block's footer. Only valid when the previous block has a
/// footer — i.e. it is free, or it is the prologue (whose footer is always
/// written).
///
/// # Safety
///
/// The word at `bp - DSIZE` must be a valid footer of the previous block.
#[inline]
pub unsafe fn prev_block(bp: *mut u8) -> *mut u8 {
    unsafe {
        let prev_size = block_size(get_word(bp.sub(DSIZE)));
        bp.sub(prev_size)
    }
}

/// Reads the `alloc` bit of the word at `ptr` (a header or footer pointer).
///
/// # Safety
///
/// `ptr` must be a valid header/footer word.
#[inline]
pub unsafe fn get_alloc(ptr: *mut u8) -> bool {
    unsafe { is_alloc(get_word(ptr)) }
}

/// Reads the `prev_alloc` bit of the word at `ptr`.
///
/// # Safety
///
/// `ptr` must be a valid header/footer word.
#[inline]
pub unsafe fn get_prev_alloc(ptr: *mut u8) -> bool {
    unsafe { is_prev_alloc(get_word(ptr)) }
}

/// ORs the `prev_alloc` bit into the word at `ptr`, leaving size and
/// `alloc` untouched.
///
/// # Safety
///
/// `ptr` must be a valid header/footer word.
#[inline]
pub unsafe fn set_prev_alloc(ptr: *mut u8) {
    unsafe {
        let word = get_word(ptr);
        put_word(ptr, word | PREV_ALLOC_BIT);
    }
}

/// Writes a free-list link word: stores `target` (itself a word-sized
/// pointer value) at `slot`. Used both for ordinary node prev/next slots
/// and for root cells, which are just fixed-offset slots holding the list
/// head pointer.
///
/// # Safety
///
/// `slot` must be valid for an 8-byte write.
#[inline]
pub unsafe fn write_link(slot: *mut u8, target: *mut u8) {
    unsafe {
        put_word(slot, target as u64);
    }
}

/// Reads a free-list link word previously stored with [`write_link`].
///
/// # Safety
///
/// `slot` must be valid for an 8-byte read and must hold a value written
/// by [`write_link`].
#[inline]
pub unsafe fn read_link(slot: *mut u8) -> *mut u8 {
    unsafe { get_word(slot) as *mut u8 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack_roundtrip() {
        let word = pack(128, true);
        assert_eq!(block_size(word), 128);
        assert!(is_alloc(word));
        assert!(!is_prev_alloc(word));
    }

    #[test]
    fn pack_epilogue_sets_both_flags() {
        let word = pack_epilogue();
        assert_eq!(block_size(word), 0);
        assert!(is_alloc(word));
        assert!(is_prev_alloc(word));
    }

    #[test]
    fn header_footer_and_neighbor_arithmetic() {
        // Lay out a 48-byte free block by hand in a local buffer and check
        // that header()/footer()/next_block() agree with manual offsets.
        let mut buf = [0u8; 64];
        let base = buf.as_mut_ptr();
        let bp = unsafe { base.add(WSIZE) }; // user pointer starts after header

        unsafe {
            put_word(header(bp), pack(48, false));
            put_word(footer(bp), pack(48, false));
        }

        assert_eq!(header(bp), base);
        assert_eq!(unsafe { footer(bp) }, unsafe { bp.add(48 - DSIZE) });
        assert_eq!(unsafe { next_block(bp) }, unsafe { bp.add(48) });
        assert_eq!(unsafe { size_of_block(bp) }, 48);
        assert!(!unsafe { get_alloc(header(bp)) });
    }

    #[test]
    fn prev_alloc_bit_set_independently_of_size_and_alloc() {
        let mut word = pack(32, true);
        assert!(!is_prev_alloc(word));

        let mut buf = [0u8; 8];
        let slot = buf.as_mut_ptr();
        unsafe {
            put_word(slot, word);
            set_prev_alloc(slot);
            word = get_word(slot);
        }

        assert!(is_prev_alloc(word));
        assert!(is_alloc(word));
        assert_eq!(block_size(word), 32);
    }

    #[test]
    fn link_words_roundtrip_pointer_values() {
        let mut slot_buf = [0u8; 8];
        let slot = slot_buf.as_mut_ptr();
        let target = 0xDEAD_BEEFusize as *mut u8;

        unsafe {
            write_link(slot, target);
            assert_eq!(read_link(slot), target);
        }
    }
}
