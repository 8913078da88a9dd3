use std::{
    alloc::{self, Layout},
    mem::size_of,
    ptr::NonNull,
};

use crate::error::{Error, Result};

const BLOCK_SIZE: usize = 4096;
const POINTER_LENGTH: usize = size_of::<*mut u8>();
const ALIGN: usize = if POINTER_LENGTH > 8 { POINTER_LENGTH } else { 8 };

/// Memory provider for skiplist nodes. Nothing handed out is ever freed
/// individually; everything lives until the provider itself is dropped.
///
/// # Safety
///
/// Every pointer returned must address `bytes` writable bytes that overlap no
/// other allocation made by this provider, satisfy the requested alignment,
/// and stay valid and unmoved until the provider is dropped, including after
/// the provider itself has been moved. The skiplist writes nodes through these
/// pointers and lets readers follow them without further checks.
pub unsafe trait Allocator {
    /// `bytes` contiguous bytes with no alignment guarantee.
    fn allocate(&mut self, bytes: usize) -> NonNull<u8>;

    /// `bytes` contiguous bytes aligned to the platform pointer size.
    fn allocate_aligned(&mut self, bytes: usize) -> NonNull<u8>;

    /// `bytes` contiguous bytes aligned to `align`, which must be a power of two.
    fn allocate_aligned_to(&mut self, bytes: usize, align: usize) -> NonNull<u8>;

    /// Approximate bytes held, including slop and bookkeeping. Never decreases.
    fn memory_usage(&self) -> usize;
}

struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

/// Bump-pointer allocator carving small requests out of fixed size blocks.
pub struct Arena {
    alloc_ptr: NonNull<u8>,
    remaining: usize,
    usage: usize,
    block_size: usize,
    blocks: Vec<Block>,
}

// Blocks are owned exclusively by the arena, so moving it across threads
// moves the memory with it.
unsafe impl Send for Arena {}

impl Default for Arena {
    fn default() -> Self {
        Arena {
            alloc_ptr: NonNull::dangling(),
            remaining: 0,
            usage: 0,
            block_size: BLOCK_SIZE,
            blocks: Vec::new(),
        }
    }
}

impl Arena {
    pub fn new() -> Self {
        Arena::default()
    }

    pub fn with_block_size(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::InvalidArgument(
                "arena block size must be positive".to_owned(),
            ));
        }
        let mut arena = Arena::default();
        arena.block_size = block_size;
        Ok(arena)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn bump(&mut self, slop: usize, needed: usize) -> NonNull<u8> {
        debug_assert!(slop <= needed && needed <= self.remaining);
        unsafe {
            let result = self.alloc_ptr.add(slop);
            self.alloc_ptr = self.alloc_ptr.add(needed);
            self.remaining -= needed;
            result
        }
    }

    fn allocate_fallback(&mut self, bytes: usize, align: usize) -> NonNull<u8> {
        if bytes > self.block_size / 4 {
            // Oversized requests get their own block so the current one keeps
            // serving small allocations.
            return self.allocate_new_block(bytes, align);
        }

        self.alloc_ptr = self.allocate_new_block(self.block_size, align);
        self.remaining = self.block_size;
        self.bump(0, bytes)
    }

    fn allocate_new_block(&mut self, block_bytes: usize, align: usize) -> NonNull<u8> {
        let layout = Layout::from_size_align(block_bytes, align.max(ALIGN)).unwrap_or_else(|_| {
            panic!("arena block of {block_bytes} bytes aligned to {align} is not allocatable")
        });
        let ptr = NonNull::new(unsafe { alloc::alloc(layout) })
            .unwrap_or_else(|| alloc::handle_alloc_error(layout));

        self.blocks.push(Block { ptr, layout });
        self.usage += block_bytes;
        log::trace!(
            "arena claimed block #{} of {} bytes, {} bytes held",
            self.blocks.len(),
            block_bytes,
            self.usage
        );
        ptr
    }
}

unsafe impl Allocator for Arena {
    fn allocate(&mut self, bytes: usize) -> NonNull<u8> {
        assert!(bytes > 0, "zero sized arena allocation");
        if bytes <= self.remaining {
            self.bump(0, bytes)
        } else {
            self.allocate_fallback(bytes, ALIGN)
        }
    }

    fn allocate_aligned(&mut self, bytes: usize) -> NonNull<u8> {
        self.allocate_aligned_to(bytes, ALIGN)
    }

    fn allocate_aligned_to(&mut self, bytes: usize, align: usize) -> NonNull<u8> {
        assert!(bytes > 0, "zero sized arena allocation");
        assert!(align.is_power_of_two(), "alignment {align} is not a power of two");

        let current_mod = self.alloc_ptr.as_ptr() as usize & (align - 1);
        let slop = if current_mod == 0 {
            0
        } else {
            align - current_mod
        };
        let result = match bytes.checked_add(slop) {
            Some(needed) if needed <= self.remaining => self.bump(slop, needed),
            // fresh blocks are always aligned to at least `align`, and sizes
            // no layout can describe panic there
            _ => self.allocate_fallback(bytes, align),
        };
        debug_assert_eq!(result.as_ptr() as usize & (align - 1), 0);
        result
    }

    fn memory_usage(&self) -> usize {
        self.usage + self.blocks.capacity() * size_of::<Block>()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            unsafe { alloc::dealloc(block.ptr.as_ptr(), block.layout) }
        }
    }
}
