//! Boundary-tag coalescing.
//!
//! Merges a newly-freed block with whichever of its immediate physical
//! neighbors are also free, per the four-case table in `spec.md` §4.4.
//! Ported from `mm.c`'s `coalesce`. The merged blocks are unlinked from
//! their free lists here; re-inserting the result is always the caller's
//! job — this function never touches a root cell for insertion.

use crate::align::{DSIZE, ROOT_COUNT, WSIZE};
use crate::block::{
    block_size, footer, get_alloc, get_word, header, next_block, pack, prev_block, put_word,
};
use crate::freelist::{pick_root, reset_free};

/// Merges `bp` (a free block) with its free physical neighbors, unlinking
/// any neighbor consumed by the merge. Returns the user pointer of the
/// resulting (possibly unchanged) block; the caller must insert it into the
/// free list for its new size.
///
/// `roots` is the allocator's array of class-root slot addresses, needed to
/// unlink a merged neighbor from whichever list it is on.
///
/// # Safety
///
/// `bp` must be a currently-free block with a valid header and footer;
/// `roots[pick_root(..)]` for any neighbor's size must be a valid root
/// slot.
pub unsafe fn coalesce(bp: *mut u8, roots: &[*mut u8; ROOT_COUNT]) -> *mut u8 {
    unsafe {
        // The word at bp - DSIZE is the previous block's footer (every
        // block in this design writes one, allocated or not), so its alloc
        // bit is read directly rather than via bp's own prev_alloc flag —
        // matching `mm.c`'s `coalesce`, which never consults that flag.
        let prev_alloc = get_alloc(bp.sub(DSIZE));
        let next_blk = next_block(bp);
        let next_alloc = get_alloc(header(next_blk));

        match (prev_alloc, next_alloc) {
            (true, true) => bp,
            (true, false) => {
                // Case 2: prev allocated, next free.
                let curr_size = block_size(get_word(header(bp)));
                let next_size = block_size(get_word(header(next_blk)));
                let merged = curr_size + next_size;

                reset_free(roots[pick_root(next_size)], next_blk);

                put_word(header(bp), pack(merged, false));
                put_word(footer(next_blk), pack(merged, false));

                bp
            }
            (false, true) => {
                // Case 3: prev free, next allocated.
                let prev_blk = prev_block(bp);
                let curr_size = block_size(get_word(header(bp)));
                let prev_size = block_size(get_word(header(prev_blk)));
                let merged = curr_size + prev_size;

                reset_free(roots[pick_root(prev_size)], prev_blk);

                put_word(header(prev_blk), pack(merged, false));
                put_word(footer(bp), pack(merged, false));

                prev_blk
            }
            (false, false) => {
                // Case 4: both prev and next free.
                let prev_blk = prev_block(bp);
                let curr_size = block_size(get_word(header(bp)));
                let prev_size = block_size(get_word(header(prev_blk)));
                let next_size = block_size(get_word(header(next_blk)));
                let merged = curr_size + prev_size + next_size;

                reset_free(roots[pick_root(prev_size)], prev_blk);
                reset_free(roots[pick_root(next_size)], next_blk);

                put_word(header(prev_blk), pack(merged, false));
                put_word(footer(next_blk), pack(merged, false));

                prev_blk
            }
        }
    }
}
