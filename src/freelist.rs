//! Free-list registry and operations: size classing, sorted-ish insertion,
//! and unlinking, over the nine segregated class roots kept in the heap
//! prelude.
//!
//! Ported from `mm.c`'s `pick_root`, `insert_free`, `reset_free`. A root
//! cell is just a fixed-offset word in the heap that holds the head pointer
//! of its class; it doubles as the "previous" link of the head node, so the
//! same `write_link`/`read_link` primitives used for ordinary nodes work
//! for roots too (see `spec.md` §4.2).

use crate::align::ROOT_COUNT;
use crate::block::{read_link, size_of_block, write_link};

/// Upper bound (inclusive) on total block size for each of the first eight
/// classes; class 8 is the catch-all for anything larger than class 7's
/// bound. Mirrors the table in `spec.md` §3 and `mm.c`'s `pick_root`.
const CLASS_UPPER_BOUNDS: [usize; ROOT_COUNT - 1] = [32, 64, 128, 256, 512, 1024, 8192, 16384];

/// Returns the size-class index (0..9) for a block of total size `size`.
pub fn pick_root(size: usize) -> usize {
    for (index, &bound) in CLASS_UPPER_BOUNDS.iter().enumerate() {
        if size <= bound {
            return index;
        }
    }
    ROOT_COUNT - 1
}

/// Inserts free block `bp` into the list rooted at `root` using the
/// two-step, head-relative scheme from `spec.md` §4.3: if the list is
/// empty, `bp` becomes the sole node; otherwise `bp` is spliced in front of
/// the current head if it is no larger, or just after the head otherwise.
/// This only guarantees the head is the smallest node seen so far — it is
/// not a fully sorted insertion (ported faithfully from `mm.c`'s
/// `insert_free`, which the original author's own comment calls "sorted"
/// despite only doing this single head comparison).
///
/// # Safety
///
/// `root` must be a valid link-word slot; `bp` must be a free block's user
/// pointer with room for two link words in its payload.
pub unsafe fn insert_free(root: *mut u8, bp: *mut u8) {
    unsafe {
        let next_slot = |p: *mut u8| p.add(crate::align::WSIZE);

        let head = read_link(root);
        if head.is_null() {
            write_link(root, bp);
            write_link(bp, root);
            write_link(next_slot(bp), std::ptr::null_mut());
            return;
        }

        let new_size = size_of_block(bp);
        let head_size = size_of_block(head);

        if new_size <= head_size {
            // Splice bp in front of head: root -> bp -> head -> ...
            write_link(root, bp);
            write_link(bp, root);
            write_link(next_slot(bp), head);
            write_link(head, bp);
        } else {
            // Splice bp right after head: root -> head -> bp -> head.next
            let head_next = read_link(next_slot(head));

            write_link(next_slot(head), bp);
            write_link(bp, head);
            write_link(next_slot(bp), head_next);

            if !head_next.is_null() {
                write_link(head_next, bp);
            }
        }
    }
}

/// Unlinks free block `bp` from the list rooted at `root`. A no-op if `bp`
/// is not currently on any list (both link words null).
///
/// # Safety
///
/// `root` must be the class root matching `bp`'s current size class; `bp`'s
/// link words must either be both null or describe `bp`'s true position in
/// that list.
pub unsafe fn reset_free(root: *mut u8, bp: *mut u8) {
    unsafe {
        let next_slot = |p: *mut u8| p.add(crate::align::WSIZE);

        let prev = read_link(bp);
        let next = read_link(next_slot(bp));

        if prev.is_null() && next.is_null() {
            return;
        }

        if prev == root {
            write_link(root, next);
            if !next.is_null() {
                write_link(next, root);
            }
        } else {
            write_link(next_slot(prev), next);
            if !next.is_null() {
                write_link(next, prev);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{pack, put_word};

    #[test]
    fn pick_root_matches_size_class_table() {
        assert_eq!(pick_root(16), 0);
        assert_eq!(pick_root(32), 0);
        assert_eq!(pick_root(33), 1);
        assert_eq!(pick_root(64), 1);
        assert_eq!(pick_root(128), 2);
        assert_eq!(pick_root(256), 3);
        assert_eq!(pick_root(512), 4);
        assert_eq!(pick_root(1024), 5);
        assert_eq!(pick_root(8192), 6);
        assert_eq!(pick_root(16384), 7);
        assert_eq!(pick_root(16385), 8);
        assert_eq!(pick_root(1_000_000), 8);
    }

    fn make_block(buf: &mut [u8], size: usize) -> *mut u8 {
        let base = buf.as_mut_ptr();
        let bp = unsafe { base.add(8) };
        unsafe {
            put_word(crate::block::header(bp), pack(size, false));
            put_word(crate::block::footer(bp), pack(size, false));
        }
        bp
    }

    #[test]
    fn insert_single_block_becomes_head() {
        let mut root_buf = [0u8; 8];
        let root = root_buf.as_mut_ptr();
        let mut blk = [0u8; 64];
        let bp = make_block(&mut blk, 48);

        unsafe {
            insert_free(root, bp);
            assert_eq!(read_link(root), bp);
            assert_eq!(read_link(bp), root);
            assert!(read_link(bp.add(8)).is_null());
        }
    }

    #[test]
    fn insert_smaller_block_becomes_new_head() {
        let mut root_buf = [0u8; 8];
        let root = root_buf.as_mut_ptr();
        let mut blk_a = [0u8; 128];
        let mut blk_b = [0u8; 64];
        let a = make_block(&mut blk_a, 96);
        let b = make_block(&mut blk_b, 48);

        unsafe {
            insert_free(root, a);
            insert_free(root, b);

            assert_eq!(read_link(root), b);
            assert_eq!(read_link(b.add(8)), a);
            assert_eq!(read_link(a), b);
        }
    }

    #[test]
    fn insert_larger_block_goes_after_head() {
        let mut root_buf = [0u8; 8];
        let root = root_buf.as_mut_ptr();
        let mut blk_a = [0u8; 64];
        let mut blk_b = [0u8; 128];
        let a = make_block(&mut blk_a, 48);
        let b = make_block(&mut blk_b, 96);

        unsafe {
            insert_free(root, a);
            insert_free(root, b);

            assert_eq!(read_link(root), a);
            assert_eq!(read_link(a.add(8)), b);
            assert_eq!(read_link(b), a);
            assert!(read_link(b.add(8)).is_null());
        }
    }

    #[test]
    fn reset_free_unlinks_head_and_interior_nodes() {
        let mut root_buf = [0u8; 8];
        let root = root_buf.as_mut_ptr();
        let mut blk_a = [0u8; 64];
        let mut blk_b = [0u8; 64];
        let mut blk_c = [0u8; 64];
        let a = make_block(&mut blk_a, 48);
        let b = make_block(&mut blk_b, 48);
        let c = make_block(&mut blk_c, 48);

        unsafe {
            // Equal sizes always take the "splice in front" branch, so each
            // new insert becomes the new head: root -> c -> b -> a.
            insert_free(root, a);
            insert_free(root, b);
            insert_free(root, c);
            assert_eq!(read_link(root), c);

            // Unlink interior node b.
            reset_free(root, b);
            assert_eq!(read_link(root), c);
            assert_eq!(read_link(c.add(8)), a);
            assert_eq!(read_link(a), c);

            // Unlink head node c.
            reset_free(root, c);
            assert_eq!(read_link(root), a);
            assert_eq!(read_link(a), root);

            // Unlinking the sole remaining node empties the list.
            reset_free(root, a);
            assert!(read_link(root).is_null());
        }
    }

    #[test]
    fn reset_free_on_unlinked_block_is_noop() {
        let mut root_buf = [0u8; 8];
        let root = root_buf.as_mut_ptr();
        let mut blk = [0u8; 64];
        let bp = make_block(&mut blk, 48);

        unsafe {
            reset_free(root, bp);
            assert!(read_link(root).is_null());
        }
    }
}
