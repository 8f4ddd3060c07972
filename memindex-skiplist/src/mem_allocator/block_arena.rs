use std::{
    alloc::Layout,
    cell::UnsafeCell,
    mem,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering::*},
};

use super::MemAllocator;

const ITEM_SIZE: usize = mem::size_of::<u64>();

pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Alignment of `allocate_aligned`; enough for pointer-sized atomics.
pub const ALIGN: usize = ITEM_SIZE;

const _: () = assert!(mem::align_of::<usize>() <= ALIGN);

struct BlockArenaInner {
    mems: Vec<Vec<u64>>,
    ptr: NonNull<u8>,
    remaining_size: usize,
    block_size: usize,
}

impl BlockArenaInner {
    fn alloc(&mut self, size: usize, align: usize, usage: &AtomicUsize) -> NonNull<u8> {
        debug_assert!(size > 0, "zero sized arena allocation");
        assert!(align.is_power_of_two() && align <= ITEM_SIZE);

        let slop = align_slop(self.ptr, align);
        let need = slop + size;
        if need <= self.remaining_size {
            // SAFETY: `need` bytes past `ptr` are inside the current block.
            unsafe {
                let aligned = self.ptr.add(slop);
                self.ptr = aligned.add(size);
                self.remaining_size -= need;
                return aligned;
            }
        }

        self.alloc_fallback(size, usage)
    }

    fn alloc_fallback(&mut self, size: usize, usage: &AtomicUsize) -> NonNull<u8> {
        if size > self.block_size / 4 {
            // Big objects get their own block so the current one keeps its tail.
            return self.alloc_new_block(size, usage);
        }

        let block_size = self.block_size;
        let ptr = self.alloc_new_block(block_size, usage);
        // SAFETY: a fresh block holds at least `block_size >= size` bytes.
        unsafe {
            self.ptr = ptr.add(size);
        }
        self.remaining_size = block_size - size;
        ptr
    }

    fn alloc_new_block(&mut self, byte_size: usize, usage: &AtomicUsize) -> NonNull<u8> {
        let len = byte_size.div_ceil(ITEM_SIZE);

        let mut block = vec![0u64; len];
        let ptr = NonNull::from(&mut block[..]).cast::<u8>();
        let cap = len * ITEM_SIZE;
        self.mems.push(block);

        let charged = cap + mem::size_of::<Vec<u64>>();
        let total = usage.fetch_add(charged, Relaxed) + charged;
        tracing::debug!(block_bytes = cap, total_bytes = total, "arena allocated new block");

        ptr
    }
}

fn align_slop(ptr: NonNull<u8>, align: usize) -> usize {
    let addr = ptr.as_ptr() as usize;
    (align - (addr & (align - 1))) & (align - 1)
}

/// A bump allocator carving small allocations out of fixed-size blocks.
///
/// Only one thread may allocate at a time; `memory_usage` may be read from anywhere.
/// Every block lives until the arena is dropped.
pub struct BlockArena {
    inner: UnsafeCell<BlockArenaInner>,
    memory_usage: AtomicUsize,
}

// SAFETY: `inner` is only touched through the `unsafe` allocation methods, whose
// contract forbids concurrent callers.
unsafe impl Send for BlockArena {}
unsafe impl Sync for BlockArena {}

impl BlockArena {
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(block_size: usize) -> Self {
        assert!(
            block_size >= ITEM_SIZE && block_size % ITEM_SIZE == 0,
            "block size must be a non-zero multiple of {ITEM_SIZE}, got {block_size}"
        );

        Self {
            inner: UnsafeCell::new(BlockArenaInner {
                mems: Vec::new(),
                ptr: NonNull::dangling(),
                remaining_size: 0,
                block_size,
            }),
            memory_usage: AtomicUsize::new(0),
        }
    }

    /// Returns `size` bytes with no alignment guarantee.
    ///
    /// # Safety
    ///
    /// No other allocation on this arena may run concurrently.
    pub unsafe fn allocate_bytes(&self, size: usize) -> NonNull<u8> {
        unsafe { self.alloc(size, 1) }
    }

    /// Returns `size` bytes aligned to [`ALIGN`].
    ///
    /// # Safety
    ///
    /// No other allocation on this arena may run concurrently.
    pub unsafe fn allocate_aligned(&self, size: usize) -> NonNull<u8> {
        unsafe { self.alloc(size, ALIGN) }
    }

    unsafe fn alloc(&self, size: usize, align: usize) -> NonNull<u8> {
        // SAFETY: the caller guarantees exclusive access to `inner`.
        let inner = unsafe { &mut *self.inner.get() };
        inner.alloc(size, align, &self.memory_usage)
    }

    /// Bytes held by all blocks, including per-block bookkeeping.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage.load(Relaxed)
    }
}

impl Default for BlockArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlockArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockArena")
            .field("memory_usage", &self.memory_usage())
            .finish_non_exhaustive()
    }
}

// SAFETY: a `BlockArena` is not `Clone` and its blocks are reachable only
// through `&self`, so every allocation comes from state this value owns.
unsafe impl MemAllocator for BlockArena {
    unsafe fn allocate(&self, layout: Layout) -> NonNull<u8> {
        unsafe { self.alloc(layout.size(), layout.align()) }
    }

    fn mem_usage(&self) -> usize {
        self.memory_usage()
    }
}
