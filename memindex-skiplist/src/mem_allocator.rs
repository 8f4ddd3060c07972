use std::{alloc::Layout, ptr::NonNull};

pub mod block_arena;

pub mod prelude {
    pub use super::MemAllocator;
    pub use super::block_arena::BlockArena;
}

/// Memory source for skiplist nodes and keys.
///
/// Memory handed out stays valid and in place until the allocator is dropped;
/// there is no way to free a single allocation.
///
/// # Safety
///
/// A list allocates from safe code (its constructors build the head node), so
/// an implementor must own its allocation state exclusively: no other value,
/// on any thread, may hand out memory from the same state. Shared handles such
/// as `Arc<BlockArena>` are therefore not allocators.
///
/// ```compile_fail
/// use std::sync::Arc;
///
/// use memindex_skiplist::prelude::*;
///
/// let arena = Arc::new(BlockArena::default());
/// let _a = SkipList::new(BytewiseComparator, arena.clone());
/// let _b = SkipList::new(BytewiseComparator, arena);
/// ```
pub unsafe trait MemAllocator: Send + Sync {
    /// # Safety
    ///
    /// Must not be called concurrently with any other `allocate` on the same
    /// allocator. `layout.size()` must be non-zero.
    unsafe fn allocate(&self, layout: Layout) -> NonNull<u8>;

    fn mem_usage(&self) -> usize;
}
