/// A cursor over keys in comparator order.
pub trait KeyIter {
    fn is_valid(&self) -> bool;

    /// `None` when the cursor is not positioned.
    fn key(&self) -> Option<&[u8]>;

    fn next(&mut self);

    fn prev(&mut self);

    /// Positions at the first key `>= key`.
    fn seek(&mut self, key: &[u8]);

    fn seek_to_first(&mut self);

    fn seek_to_last(&mut self);

    fn rewind(&mut self, from_last: bool) {
        match from_last {
            false => self.seek_to_first(),
            true => self.seek_to_last(),
        }
    }
}
