use std::{ptr::null_mut, sync::Arc};

use crate::{comparator::prelude::*, mem_allocator::prelude::*};

use super::{Node, SkipList, decode_target};

/// A cursor over one [`SkipList`].
///
/// Holding the `Arc` keeps the list and its arena alive for as long as the
/// cursor exists. Cursors are independent of each other and of the writer.
pub struct SkipListIter<C, A> {
    list: Arc<SkipList<C, A>>,
    node: *mut Node,
}

unsafe impl<C, A> Send for SkipListIter<C, A>
where
    C: Send + Sync,
    A: Send + Sync,
{
}

unsafe impl<C, A> Sync for SkipListIter<C, A>
where
    C: Send + Sync,
    A: Send + Sync,
{
}

impl<C, A> Clone for SkipListIter<C, A> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            node: self.node,
        }
    }
}

impl<C, A> SkipListIter<C, A>
where
    C: Comparator,
    A: MemAllocator,
{
    /// The new cursor is not positioned.
    pub fn new(list: Arc<SkipList<C, A>>) -> Self {
        Self {
            list,
            node: null_mut(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.node.is_null()
    }

    /// The decoded key at the current position.
    pub fn key(&self) -> &[u8] {
        assert!(self.is_valid());
        unsafe { Node::key(self.node) }
    }

    /// The whole stored entry, length prefix included.
    pub fn entry(&self) -> &[u8] {
        assert!(self.is_valid());
        unsafe { Node::entry(self.node) }
    }

    pub fn next(&mut self) {
        assert!(self.is_valid());
        self.node = unsafe { Node::next(self.node, 0) };
    }

    /// Without back links this searches again for the last key before the current one.
    pub fn prev(&mut self) {
        assert!(self.is_valid());
        let prev = self.list.find_less_than(self.key());
        self.node = self.list.head_to_null(prev);
    }

    /// Positions at the first entry whose key is `>=` the key framed in `target`.
    pub fn seek(&mut self, target: &[u8]) {
        self.node = match decode_target(target) {
            Some(key) => self.list.find_greater_or_equal(key, None),
            None => null_mut(),
        };
    }

    pub fn seek_to_first(&mut self) {
        self.node = self.list.first();
    }

    pub fn seek_to_last(&mut self) {
        let last = self.list.find_last();
        self.node = self.list.head_to_null(last);
    }
}
