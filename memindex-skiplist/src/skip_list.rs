use std::{
    alloc::Layout,
    cell::UnsafeCell,
    cmp::Ordering::*,
    mem,
    ptr::{self, NonNull, addr_of, addr_of_mut, null_mut},
    slice,
    sync::{
        Arc,
        atomic::{AtomicPtr, AtomicUsize, Ordering::*},
    },
};

use memindex_utils::varint::get_length_prefixed;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{comparator::prelude::*, error::Result, mem_allocator::prelude::*};

mod iter;

pub use iter::SkipListIter;

pub const MAX_HEIGHT: usize = 12;

/// Each level holds roughly one in `BRANCHING` nodes of the level below.
pub const BRANCHING: u32 = 4;

pub const DEFAULT_SEED: u64 = 0xdead_beef;

/// An entry stored in the arena: `varint32(key_len) ++ key ++ payload`.
#[derive(Clone, Copy)]
struct EntryView {
    entry: NonNull<u8>,
    entry_len: usize,
    key_offset: usize,
    key_len: usize,
}

impl EntryView {
    const EMPTY: Self = Self {
        entry: NonNull::dangling(),
        entry_len: 0,
        key_offset: 0,
        key_len: 0,
    };
}

#[repr(C)]
struct Node {
    view: EntryView,
    // Only the first `height` slots are allocated.
    tower: [AtomicPtr<Self>; MAX_HEIGHT],
}

impl Node {
    fn get_layout(height: usize) -> Layout {
        assert!(height > 0 && height <= MAX_HEIGHT);
        let size =
            mem::size_of::<Self>() - mem::size_of::<AtomicPtr<Self>>() * (MAX_HEIGHT - height);
        let align = mem::align_of::<Self>();
        Layout::from_size_align(size, align)
            .unwrap_or_else(|_| panic!("Layout error, size: {size}, align: {align}"))
    }

    fn new_in(view: EntryView, height: usize, allocator: &impl MemAllocator) -> NonNull<Self> {
        let layout = Self::get_layout(height);
        unsafe {
            let node = allocator.allocate(layout).cast::<Self>();
            let p = node.as_ptr();
            debug_assert!(p.is_aligned());

            ptr::write(addr_of_mut!((*p).view), view);
            // null is the all-zero AtomicPtr
            ptr::write_bytes(addr_of_mut!((*p).tower).cast::<AtomicPtr<Self>>(), 0, height);
            node
        }
    }

    /// # Safety
    ///
    /// `this` is a live node whose height exceeds `level`.
    unsafe fn slot<'a>(this: *const Self, level: usize) -> &'a AtomicPtr<Self> {
        debug_assert!(level < MAX_HEIGHT);
        unsafe { &*addr_of!((*this).tower).cast::<AtomicPtr<Self>>().add(level) }
    }

    unsafe fn next(this: *const Self, level: usize) -> *mut Self {
        // pairs with the release store in `set_next`
        unsafe { Self::slot(this, level).load(Acquire) }
    }

    unsafe fn set_next(this: *const Self, level: usize, node: *mut Self) {
        unsafe { Self::slot(this, level).store(node, Release) }
    }

    unsafe fn no_barrier_next(this: *const Self, level: usize) -> *mut Self {
        unsafe { Self::slot(this, level).load(Relaxed) }
    }

    unsafe fn no_barrier_set_next(this: *const Self, level: usize, node: *mut Self) {
        unsafe { Self::slot(this, level).store(node, Relaxed) }
    }

    unsafe fn key<'a>(this: *const Self) -> &'a [u8] {
        unsafe {
            let view = (*this).view;
            slice::from_raw_parts(view.entry.as_ptr().add(view.key_offset), view.key_len)
        }
    }

    unsafe fn entry<'a>(this: *const Self) -> &'a [u8] {
        unsafe {
            let view = (*this).view;
            slice::from_raw_parts(view.entry.as_ptr(), view.entry_len)
        }
    }
}

/// A skiplist over length-prefixed entries, ordered by `C` applied to the
/// decoded keys.
///
/// Any number of readers may run alongside one writer without locks. Writers
/// have to be serialized by the caller, which is why the insert methods are
/// `unsafe`. Nodes are never unlinked; all memory goes away with the list.
pub struct SkipList<C, A = BlockArena> {
    head: NonNull<Node>,
    max_height: AtomicUsize,
    len: AtomicUsize,
    // writer only
    rng: UnsafeCell<SmallRng>,
    c: C,
    a: A,
}

unsafe impl<C, A> Send for SkipList<C, A>
where
    C: Send,
    A: Send,
{
}

unsafe impl<C, A> Sync for SkipList<C, A>
where
    C: Sync,
    A: Sync,
{
}

impl<C, A> Default for SkipList<C, A>
where
    C: Comparator + Default,
    A: MemAllocator + Default,
{
    fn default() -> Self {
        Self::new(C::default(), A::default())
    }
}

impl<C, A> SkipList<C, A>
where
    C: Comparator,
    A: MemAllocator,
{
    pub fn new(c: C, a: A) -> Self {
        Self::with_rng(c, a, SmallRng::seed_from_u64(DEFAULT_SEED))
    }

    pub fn with_seed(c: C, a: A, seed: u64) -> Self {
        Self::with_rng(c, a, SmallRng::seed_from_u64(seed))
    }

    pub fn with_os_rng(c: C, a: A) -> Self {
        Self::with_rng(c, a, SmallRng::from_os_rng())
    }

    fn with_rng(c: C, a: A, rng: SmallRng) -> Self {
        let head = Node::new_in(EntryView::EMPTY, MAX_HEIGHT, &a);
        Self {
            head,
            max_height: AtomicUsize::new(1),
            len: AtomicUsize::new(0),
            rng: UnsafeCell::new(rng),
            c,
            a,
        }
    }

    pub fn comparator(&self) -> &C {
        &self.c
    }

    /// Entries linked so far; every one of them is visible to a reader that
    /// observed this count.
    pub fn len(&self) -> usize {
        self.len.load(Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_height(&self) -> usize {
        self.max_height.load(Relaxed)
    }

    pub fn mem_usage(&self) -> usize {
        self.a.mem_usage()
    }

    pub fn iter(self: &Arc<Self>) -> SkipListIter<C, A> {
        SkipListIter::new(self.clone())
    }

    /// Copies `entry` into the arena and links it.
    ///
    /// # Safety
    ///
    /// See [`SkipList::insert_with`].
    pub unsafe fn insert(&self, entry: &[u8]) -> Result<()> {
        unsafe { self.insert_with(entry.len(), |buf| buf.copy_from_slice(entry)) }
    }

    /// Allocates `entry_len` bytes from the arena, lets `fill` write the
    /// entry into them and links the result.
    ///
    /// The entry must start with a varint32 length prefix followed by the key;
    /// anything after the key is carried along untouched. Malformed entries are
    /// rejected before anything becomes visible, though their bytes stay in the arena.
    ///
    /// # Safety
    ///
    /// Inserts must not run concurrently with each other. No key comparing equal
    /// to the new one may already be in the list.
    pub unsafe fn insert_with(
        &self,
        entry_len: usize,
        fill: impl FnOnce(&mut [u8]),
    ) -> Result<()> {
        if entry_len == 0 {
            return Err(memindex_utils::varint::VarIntError::InsufficientBytes.into());
        }

        let layout = Layout::array::<u8>(entry_len)
            .unwrap_or_else(|_| panic!("entry too large: {entry_len}"));
        let ptr = unsafe { self.a.allocate(layout) };
        let buf = unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), entry_len) };
        fill(buf);

        let (key, _) = get_length_prefixed(buf)?;
        let view = EntryView {
            entry: ptr,
            entry_len,
            key_offset: key.as_ptr() as usize - ptr.as_ptr() as usize,
            key_len: key.len(),
        };

        let mut prev = [null_mut(); MAX_HEIGHT];
        let x = self.find_greater_or_equal(key, Some(&mut prev));
        debug_assert!(
            x.is_null() || self.c.compare(key, unsafe { Node::key(x) }) != Equal,
            "duplicate key inserted into skiplist"
        );

        let height = self.random_height();
        let max_height = self.max_height();
        if height > max_height {
            prev[max_height..height].fill(self.head.as_ptr());
            // Readers seeing the new height before the new links just find
            // null at the top levels and drop down.
            self.max_height.store(height, Relaxed);
            tracing::debug!(from = max_height, to = height, "skiplist height raised");
        }

        let node = Node::new_in(view, height, &self.a).as_ptr();
        for (level, &p) in prev.iter().enumerate().take(height) {
            unsafe {
                // The release store into `p` publishes this one.
                Node::no_barrier_set_next(node, level, Node::no_barrier_next(p, level));
                Node::set_next(p, level, node);
            }
        }

        let len = self.len.fetch_add(1, Release) + 1;
        tracing::trace!(height, len, "skiplist insert");
        Ok(())
    }

    /// True iff an entry whose key equals the key framed in `target` is present.
    pub fn contains(&self, target: &[u8]) -> bool {
        let Some(key) = decode_target(target) else {
            return false;
        };
        let x = self.find_greater_or_equal(key, None);
        !x.is_null() && self.c.compare(key, unsafe { Node::key(x) }) == Equal
    }

    fn random_height(&self) -> usize {
        // SAFETY: only the single writer draws heights.
        let rng = unsafe { &mut *self.rng.get() };
        let mut height = 1;
        while height < MAX_HEIGHT && rng.random::<u32>() % BRANCHING == 0 {
            height += 1;
        }
        height
    }

    fn key_is_after_node(&self, key: &[u8], node: *const Node) -> bool {
        !node.is_null() && self.c.compare(unsafe { Node::key(node) }, key) == Less
    }

    /// First node with a key `>= key`, or null. Fills `prev` with the last
    /// node before it on every level in use.
    fn find_greater_or_equal(
        &self,
        key: &[u8],
        mut prev: Option<&mut [*mut Node; MAX_HEIGHT]>,
    ) -> *mut Node {
        let mut x = self.head.as_ptr();
        let mut level = self.max_height() - 1;
        loop {
            let next = unsafe { Node::next(x, level) };
            if self.key_is_after_node(key, next) {
                x = next;
            } else {
                if let Some(prev) = prev.as_deref_mut() {
                    prev[level] = x;
                }
                if level == 0 {
                    return next;
                }
                level -= 1;
            }
        }
    }

    /// Last node with a key `< key`, or head.
    fn find_less_than(&self, key: &[u8]) -> *mut Node {
        let mut x = self.head.as_ptr();
        let mut level = self.max_height() - 1;
        loop {
            let next = unsafe { Node::next(x, level) };
            if next.is_null() || self.c.compare(unsafe { Node::key(next) }, key) != Less {
                if level == 0 {
                    return x;
                }
                level -= 1;
            } else {
                x = next;
            }
        }
    }

    /// Last node in the list, or head if empty.
    fn find_last(&self) -> *mut Node {
        let mut x = self.head.as_ptr();
        let mut level = self.max_height() - 1;
        loop {
            let next = unsafe { Node::next(x, level) };
            if next.is_null() {
                if level == 0 {
                    return x;
                }
                level -= 1;
            } else {
                x = next;
            }
        }
    }

    fn first(&self) -> *mut Node {
        unsafe { Node::next(self.head.as_ptr(), 0) }
    }

    fn head_to_null(&self, node: *mut Node) -> *mut Node {
        if ptr::eq(node, self.head.as_ptr()) {
            null_mut()
        } else {
            node
        }
    }
}

fn decode_target(target: &[u8]) -> Option<&[u8]> {
    match get_length_prefixed(target) {
        Ok((key, _)) => Some(key),
        Err(err) => {
            tracing::warn!(%err, len = target.len(), "malformed skiplist lookup key");
            None
        }
    }
}
