use std::sync::Arc;

use bytes::BytesMut;
use memindex_skiplist::prelude::*;
use memindex_utils::varint::{encode_length_prefixed, length_prefixed_len, put_length_prefixed};
use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    iterator::KeyIter,
    options::MemTableOptions,
};

type List<C> = Arc<SkipList<C, BlockArena>>;
type ListIter<C> = SkipListIter<C, BlockArena>;

/// The in-memory ordered set of keys written since the last flush.
///
/// Writers take `write_lock`; readers and iterators never block.
pub struct MemTable<C: Comparator = BytewiseComparator> {
    list: List<C>,
    write_lock: Mutex<()>,
    options: Arc<MemTableOptions>,
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new(BytewiseComparator, Arc::new(MemTableOptions::default()))
    }
}

impl<C: Comparator> MemTable<C> {
    pub fn new(c: C, options: Arc<MemTableOptions>) -> Self {
        tracing::debug!(
            comparator = c.name(),
            block_size = options.arena_block_size,
            "create memtable"
        );

        let arena = BlockArena::with_block_size(options.arena_block_size);
        let list = match options.rng_seed {
            Some(seed) => SkipList::with_seed(c, arena, seed),
            None => SkipList::with_os_rng(c, arena),
        };

        Self {
            list: Arc::new(list),
            write_lock: Mutex::new(()),
            options,
        }
    }

    pub fn insert(&self, key: &[u8]) -> Result<()> {
        if u32::try_from(key.len()).is_err() {
            return Err(Error::KeyTooLarge(key.len()));
        }

        let _guard = self.write_lock.lock();
        if self.options.check_duplicates && self.contains(key) {
            return Err(Error::DuplicateKey);
        }

        // SAFETY: `write_lock` serializes every insert into this list.
        unsafe {
            self.list
                .insert_with(length_prefixed_len(key.len()), |buf| {
                    encode_length_prefixed(buf, key)
                })?;
        }
        Ok(())
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        if u32::try_from(key.len()).is_err() {
            return false;
        }
        self.list.contains(&frame(key))
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn approximate_memory_usage(&self) -> usize {
        self.list.mem_usage()
    }

    pub fn comparator(&self) -> &C {
        self.list.comparator()
    }

    pub fn iter(&self) -> MemTableIter<C> {
        MemTableIter::new(self)
    }
}

fn frame(key: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(length_prefixed_len(key.len()));
    put_length_prefixed(&mut buf, key);
    buf
}

pub struct MemTableIter<C: Comparator> {
    iter: ListIter<C>,
}

impl<C: Comparator> MemTableIter<C> {
    pub fn new(table: &MemTable<C>) -> Self {
        Self {
            iter: table.list.iter(),
        }
    }
}

impl<C: Comparator> Clone for MemTableIter<C> {
    fn clone(&self) -> Self {
        Self {
            iter: self.iter.clone(),
        }
    }
}

impl<C: Comparator> KeyIter for MemTableIter<C> {
    fn is_valid(&self) -> bool {
        self.iter.is_valid()
    }

    fn key(&self) -> Option<&[u8]> {
        self.iter.is_valid().then(|| self.iter.key())
    }

    fn next(&mut self) {
        self.iter.next();
    }

    fn prev(&mut self) {
        self.iter.prev();
    }

    /// Panics if `key` is longer than `u32::MAX` bytes.
    fn seek(&mut self, key: &[u8]) {
        self.iter.seek(&frame(key));
    }

    fn seek_to_first(&mut self) {
        self.iter.seek_to_first();
    }

    fn seek_to_last(&mut self) {
        self.iter.seek_to_last();
    }
}
