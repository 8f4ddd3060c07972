use std::{cmp, sync::Arc};

mod bytewise_comparator;

pub mod prelude {
    pub use super::{Comparator, bytewise_comparator::BytewiseComparator};
}

/// A total order over logical keys.
///
/// The order must stay the same for the whole life of any list built with it.
pub trait Comparator: Send + Sync + Clone {
    /// Identifies the ordering for on-disk compatibility checks.
    fn name(&self) -> &str;

    fn compare(&self, a: &[u8], b: &[u8]) -> cmp::Ordering;

    /// If `start < limit`, shortens `start` to some `s` with `start <= s < limit`.
    ///
    /// Leaving `start` untouched is always a valid implementation.
    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]);

    /// Changes `key` to a short string `>= key`.
    ///
    /// Leaving `key` untouched is always a valid implementation.
    fn find_short_successor(&self, key: &mut Vec<u8>);
}

impl<C: Comparator> Comparator for Arc<C> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> cmp::Ordering {
        self.as_ref().compare(a, b)
    }

    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]) {
        self.as_ref().find_shortest_separator(start, limit)
    }

    fn find_short_successor(&self, key: &mut Vec<u8>) {
        self.as_ref().find_short_successor(key)
    }
}
