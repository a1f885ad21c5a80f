use std::io::Read;

use libc::sbrk;
use segalloc::Allocator;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how allocations change the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
/// The program break is the upper boundary of the heap managed via brk/sbrk.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  // Our allocator. It holds:
  // - the sbrk-backed page provider
  // - the heap's start address
  // - the nine segregated free-list roots
  let mut allocator = Allocator::new();

  unsafe {
    print_program_break("start");
    assert!(allocator.init(), "failed to lay out the heap prelude");
    print_program_break("after init (prelude + first 512B extension)");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 1) Allocate 4 bytes.
    // --------------------------------------------------------------------
    let first_block = allocator.allocate(4);
    println!("\n[1] Allocate 4 bytes -> {:?}", first_block);

    let first_ptr = first_block as *mut u32;
    first_ptr.write(0xDEADBEEF);
    println!("[1] Value written to first_block = 0x{:X}", first_ptr.read());

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) Allocate 12 bytes.
    //    Shows how the allocator handles "odd-sized" requests and whether
    //    it splits the remainder of whatever block it picked.
    // --------------------------------------------------------------------
    let second_block = allocator.allocate(12);
    println!("\n[2] Allocate 12 bytes -> {:?}", second_block);

    std::ptr::write_bytes(second_block, 0xAB, 12);
    println!("[2] Initialized second block with 0xAB");

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) Allocate a u64 to show payload alignment (always 16 bytes here).
    // --------------------------------------------------------------------
    let third_block = allocator.allocate(8);
    println!("\n[3] Allocate 8 bytes -> {:?}", third_block);

    let third_ptr = third_block as *mut u64;
    third_ptr.write(0x1122334455667788);
    println!("[3] Value written = 0x{:X}", third_ptr.read());

    let addr_third = third_block as usize;
    println!(
      "[3] Address = {:#X}, addr % 16 = {}",
      addr_third,
      addr_third % 16
    );

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) Free the first block, then allocate a small block and see whether
    //    the allocator reuses that freed space.
    // --------------------------------------------------------------------
    allocator.free(first_block);
    println!("\n[4] Freed first_block at {:?}", first_block);

    let fourth_block = allocator.allocate(2);
    println!("[4] Allocate 2 bytes -> {:?}", fourth_block);
    println!(
      "[4] fourth_block == first_block? {}",
      if fourth_block == first_block {
        "yes, it reused the freed block"
      } else {
        "no, it picked a different free block"
      }
    );

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 5) Grow the second block via reallocate, preserving its contents.
    // --------------------------------------------------------------------
    let grown = allocator.reallocate(second_block, 200);
    println!("\n[5] Grew second_block (12B -> 200B), new pointer = {:?}", grown);
    println!("[5] first byte still 0xAB? {}", *grown == 0xAB);

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 6) Allocate a large block to observe heap growth via extend_heap.
    //    This usually changes the result of `sbrk(0)`.
    // --------------------------------------------------------------------
    print_program_break("before large alloc");

    let big_block = allocator.allocate(64 * 1024);
    println!("\n[6] Allocate 64 KiB -> {:?}", big_block);

    print_program_break("after large alloc");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 7) End of demo: free everything still outstanding.
    // --------------------------------------------------------------------
    allocator.free(third_block);
    allocator.free(grown);
    allocator.free(big_block);
    println!("\n[7] Freed remaining blocks. Process will exit and the OS will reclaim all memory.");
  }
}
