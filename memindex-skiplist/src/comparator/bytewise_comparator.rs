use std::cmp;

use super::Comparator;

/// Lexicographic order over unsigned bytes; a proper prefix sorts first.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn name(&self) -> &str {
        "leveldb.DefaultCmp"
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> cmp::Ordering {
        a.cmp(b)
    }

    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]) {
        let diff_index = start
            .iter()
            .zip(limit)
            .take_while(|(a, b)| a == b)
            .count();

        if diff_index >= start.len().min(limit.len()) {
            // one is a prefix of the other
            return;
        }

        let diff_byte = start[diff_index];
        if diff_byte < u8::MAX && diff_byte + 1 < limit[diff_index] {
            start[diff_index] += 1;
            start.truncate(diff_index + 1);
            debug_assert_eq!(self.compare(start, limit), cmp::Ordering::Less);
        }
    }

    fn find_short_successor(&self, key: &mut Vec<u8>) {
        if let Some(i) = key.iter().position(|&b| b != u8::MAX) {
            key[i] += 1;
            key.truncate(i + 1);
        }
        // a run of 0xff has no shorter successor
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use rand::Rng;

    use crate::comparator::prelude::*;

    fn separator(start: &[u8], limit: &[u8]) -> Vec<u8> {
        let mut start = start.to_vec();
        BytewiseComparator.find_shortest_separator(&mut start, limit);
        start
    }

    fn successor(key: &[u8]) -> Vec<u8> {
        let mut key = key.to_vec();
        BytewiseComparator.find_short_successor(&mut key);
        key
    }

    #[test]
    fn bytewise_compare() {
        let cmp = BytewiseComparator;
        assert_eq!(cmp.compare(b"abc", b"abc"), Ordering::Equal);
        assert_eq!(cmp.compare(b"abc", b"def"), Ordering::Less);
        assert_eq!(cmp.compare(b"def", b"abc"), Ordering::Greater);
        assert_eq!(cmp.compare(b"ab", b"abc"), Ordering::Less);
        assert_eq!(cmp.compare(b"\xff", b"\x01"), Ordering::Greater);
        assert_eq!(cmp.name(), "leveldb.DefaultCmp");
    }

    #[test]
    fn shortest_separator() {
        assert_eq!(separator(b"abc1xyz", b"abc9"), b"abc2");
        assert_eq!(separator(b"helloworld", b"hellz"), b"hellp");

        // adjacent differing bytes leave nothing to shorten into
        assert_eq!(separator(b"abc1xyz", b"abc2"), b"abc1xyz");
        assert_eq!(separator(b"ab\xffxyz", b"ac"), b"ab\xffxyz");
        assert_eq!(separator(b"a\x00\xff", b"a\x02"), b"a\x01");
        // prefixes are never shortened
        assert_eq!(separator(b"abc", b"abcdef"), b"abc");
        assert_eq!(separator(b"abcdef", b"abc"), b"abcdef");
        assert_eq!(separator(b"", b"a"), b"");
    }

    #[test]
    fn short_successor() {
        assert_eq!(successor(b"abc"), b"b");
        assert_eq!(successor(b"\xff\xffz\x01"), b"\xff\xff{");
        assert_eq!(successor(b"\xff\xff\xff"), b"\xff\xff\xff");
        assert_eq!(successor(b""), b"");
    }

    #[test]
    fn separator_law_random() {
        let mut rng = rand::rng();
        let cmp = BytewiseComparator;

        for _ in 0..10_000 {
            let mut a: Vec<u8> = (0..rng.random_range(0..8)).map(|_| rng.random()).collect();
            let mut b: Vec<u8> = (0..rng.random_range(0..8)).map(|_| rng.random()).collect();
            match cmp.compare(&a, &b) {
                Ordering::Equal => continue,
                Ordering::Greater => std::mem::swap(&mut a, &mut b),
                Ordering::Less => {}
            }

            let sep = separator(&a, &b);
            assert_ne!(cmp.compare(&a, &sep), Ordering::Greater, "{a:?} {sep:?}");
            assert_eq!(cmp.compare(&sep, &b), Ordering::Less, "{sep:?} {b:?}");
            assert!(sep.len() <= a.len());
        }
    }

    #[test]
    fn successor_law_random() {
        let mut rng = rand::rng();
        let cmp = BytewiseComparator;

        for _ in 0..10_000 {
            let key: Vec<u8> = (0..rng.random_range(1..8))
                .map(|_| if rng.random_bool(0.5) { u8::MAX } else { rng.random() })
                .collect();

            let succ = successor(&key);
            if key.iter().all(|&b| b == u8::MAX) {
                assert_eq!(succ, key);
            } else {
                assert_eq!(cmp.compare(&succ, &key), Ordering::Greater, "{key:?}");
                assert!(succ.len() <= key.len());
            }
        }
    }
}
