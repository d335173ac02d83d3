/// Iterator module for nestdb
///
/// Wraps a bucket cursor with directional, prefix- and bound-aware
/// positioning. An iterator starts unpositioned; a seek or `first`/`last`
/// call places it, and `valid()` reports whether it currently points at an
/// entry:
///
/// ```ignore
/// let mut iter = bucket.iterate();
/// iter.seek(&Slice::from("user-"), SeekMethod::Prefix);
/// while iter.valid() {
///     // ...
///     iter.next();
/// }
/// ```
///
/// An entry is either a stored key/value pair or a nested bucket, in which
/// case `value()` is `None` and the key is the bucket name.
use crate::bucket::Bucket;
use crate::util::{Result, Slice, Status};

mod cursor;

use cursor::Cursor;

/// Positioning semantics for [`Iterator::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMethod {
    /// Position at the boundary key only if it exists.
    Exact,
    /// Position at the smallest key carrying the boundary as prefix.
    Prefix,
    /// Position at the largest key carrying the boundary as prefix.
    PrefixReverse,
    /// Position at the smallest key >= the boundary.
    GreaterOrEqual,
    /// Position at the largest key below the boundary's exclusive upper
    /// bound (see [`Iterator::seek`]).
    LessOrEqual,
}

#[derive(Debug, Clone, Default)]
pub struct IteratorOptions {
    /// Scan keys in reverse order.
    pub reverse: bool,
    /// Restrict the scan to keys with the given prefix. Cannot be used in
    /// conjunction with `first_key`.
    pub prefix: Option<Slice>,
    /// Start the scan at the given key. Cannot be used with `prefix`.
    pub first_key: Option<Slice>,
}

/// Per-entry verdict of a scan visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// A positioned view over one bucket's entries.
pub struct Iterator<'tx> {
    cursor: Cursor<'tx>,
    key: Option<Slice>,
    value: Option<Slice>,
}

impl<'tx> Iterator<'tx> {
    pub(crate) fn new(bucket: Bucket<'tx>) -> Self {
        Iterator {
            cursor: Cursor::new(bucket),
            key: None,
            value: None,
        }
    }

    /// The bucket this iterator traverses.
    pub fn bucket(&self) -> &Bucket<'tx> {
        self.cursor.bucket()
    }

    /// True while the iterator points at a stored value or nested bucket.
    pub fn valid(&self) -> bool {
        self.key.is_some()
    }

    /// The current key, or `None` if the iterator is not positioned.
    pub fn key(&self) -> Option<&Slice> {
        self.key.as_ref()
    }

    /// The current value. `None` either when the iterator is not positioned
    /// or when the entry is a nested bucket; disambiguate with
    /// [`Iterator::is_nested_bucket`].
    pub fn value(&self) -> Option<&Slice> {
        self.value.as_ref()
    }

    /// True if the iterator points at a nested bucket entry.
    pub fn is_nested_bucket(&self) -> bool {
        self.key.is_some() && self.value.is_none()
    }

    /// Whether the current key carries `prefix`. An unpositioned iterator
    /// only matches the empty prefix.
    pub fn has_key_prefix(&self, prefix: &Slice) -> bool {
        match &self.key {
            Some(key) => key.starts_with(prefix),
            None => prefix.is_empty(),
        }
    }

    /// Move to the first entry of the bucket.
    pub fn first(&mut self) -> bool {
        self.bucket().db().statistics().record_seek();
        let entry = self.cursor.first();
        self.apply(entry)
    }

    /// Move to the last entry of the bucket.
    pub fn last(&mut self) -> bool {
        self.bucket().db().statistics().record_seek();
        let entry = self.cursor.last();
        self.apply(entry)
    }

    /// Step forward. An exhausted or unpositioned iterator stays invalid.
    pub fn next(&mut self) -> bool {
        if !self.valid() {
            return false;
        }
        self.bucket().db().statistics().record_cursor_step();
        let entry = self.cursor.next();
        self.apply(entry)
    }

    /// Step backward. An exhausted or unpositioned iterator stays invalid.
    pub fn prev(&mut self) -> bool {
        if !self.valid() {
            return false;
        }
        self.bucket().db().statistics().record_cursor_step();
        let entry = self.cursor.prev();
        self.apply(entry)
    }

    /// Position the iterator relative to `boundary` according to `method`,
    /// returning whether it landed on an entry.
    ///
    /// `PrefixReverse` and `LessOrEqual` compute an exclusive upper bound by
    /// incrementing the last non-0xFF byte of the boundary and truncating
    /// everything after it; a boundary of all 0xFF bytes has no finite upper
    /// bound and degrades to the last key overall. An empty boundary
    /// degrades to `first()` for the forward methods, `last()` for the
    /// reverse ones, and invalid for `Exact`.
    pub fn seek(&mut self, boundary: &Slice, method: SeekMethod) -> bool {
        self.bucket().db().statistics().record_seek();

        let bound = if boundary.is_empty() {
            None
        } else if matches!(method, SeekMethod::PrefixReverse | SeekMethod::LessOrEqual) {
            increment_prefix(boundary.data())
        } else {
            Some(boundary.data().to_vec())
        };

        let Some(bound) = bound else {
            return match method {
                SeekMethod::Prefix | SeekMethod::GreaterOrEqual => self.first(),
                SeekMethod::LessOrEqual => self.last(),
                SeekMethod::PrefixReverse => {
                    if !self.last() {
                        return false;
                    }
                    if !self.has_key_prefix(boundary) {
                        return self.invalidate();
                    }
                    true
                }
                SeekMethod::Exact => self.invalidate(),
            };
        };

        let entry = self.cursor.seek(&bound);
        self.apply(entry);

        match method {
            SeekMethod::Exact => {
                let hit = self
                    .key
                    .as_ref()
                    .is_some_and(|key| key.data() == bound.as_slice());
                if !hit {
                    return self.invalidate();
                }
                true
            }
            SeekMethod::Prefix => {
                if !self.has_key_prefix(boundary) {
                    return self.invalidate();
                }
                true
            }
            SeekMethod::GreaterOrEqual => self.valid(),
            SeekMethod::PrefixReverse => {
                // The found position is the first key past every key with
                // the prefix; the candidate is one entry before it (or the
                // last key overall when nothing is at or past the bound).
                if self.valid() {
                    if !self.prev() {
                        return false;
                    }
                } else if !self.last() {
                    return false;
                }
                if !self.has_key_prefix(boundary) {
                    return self.invalidate();
                }
                true
            }
            SeekMethod::LessOrEqual => {
                if self.valid() {
                    if !self.prev() {
                        return false;
                    }
                } else if !self.last() {
                    return false;
                }
                let overshoot = self
                    .key
                    .as_ref()
                    .is_some_and(|key| key.data() > bound.as_slice());
                if overshoot {
                    return self.invalidate();
                }
                true
            }
        }
    }

    /// Delete the entry the iterator points at: a stored key is deleted
    /// from the bucket, a nested bucket entry is deleted recursively.
    pub fn delete(&mut self) -> Result<()> {
        let Some(key) = self.key.clone() else {
            return Err(Status::invalid_cursor_position());
        };
        if self.value.is_some() {
            self.cursor.bucket().delete(&key)
        } else {
            self.cursor.bucket().delete_bucket(&key)
        }
    }

    fn apply(&mut self, entry: Option<(Slice, Option<Slice>)>) -> bool {
        match entry {
            Some((key, value)) => {
                self.key = Some(key);
                self.value = value;
                true
            }
            None => self.invalidate(),
        }
    }

    fn invalidate(&mut self) -> bool {
        self.key = None;
        self.value = None;
        false
    }
}

/// The lexicographically next byte string of prefix length: increment the
/// last non-0xFF byte and drop everything after it. `None` when every byte
/// is 0xFF, meaning no finite upper bound exists.
fn increment_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut bound = prefix.to_vec();
    for i in (0..bound.len()).rev() {
        if bound[i] != u8::MAX {
            bound[i] += 1;
            bound.truncate(i + 1);
            return Some(bound);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_simple() {
        assert_eq!(increment_prefix(b"key1"), Some(b"key2".to_vec()));
        assert_eq!(increment_prefix(b"a"), Some(b"b".to_vec()));
    }

    #[test]
    fn test_increment_carries_past_max_bytes() {
        assert_eq!(increment_prefix(&[b'a', 0xFF]), Some(vec![b'b']));
        assert_eq!(increment_prefix(&[b'a', 0xFF, 0xFF]), Some(vec![b'b']));
        assert_eq!(increment_prefix(&[0x01, 0xFF, 0x05]), Some(vec![0x01, 0xFF, 0x06]));
    }

    #[test]
    fn test_increment_overflow() {
        assert_eq!(increment_prefix(&[0xFF]), None);
        assert_eq!(increment_prefix(&[0xFF, 0xFF, 0xFF]), None);
    }

    #[test]
    fn test_bound_delimits_prefix_range() {
        let prefix = b"key1-";
        let bound = increment_prefix(prefix).unwrap();
        // Everything carrying the prefix sorts below the bound.
        assert!(b"key1-".as_slice() < bound.as_slice());
        assert!(b"key1-zzz".as_slice() < bound.as_slice());
        assert!([b"key1-".as_slice(), &[0xFF; 8][..]].concat().as_slice() < bound.as_slice());
        // The first key without it does not.
        assert!(b"key2".as_slice() >= bound.as_slice());
    }
}
