mod memtable;

pub mod error;
pub mod iterator;
pub mod options;

pub use memtable::{MemTable, MemTableIter};
pub use memindex_skiplist::comparator::prelude::{BytewiseComparator, Comparator};
