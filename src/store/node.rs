use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use crate::util::{Result, Slice, Status};

/// One bucket of the ordered tree: a sorted map from byte keys to either a
/// plain value or a nested bucket, plus the bucket's autoincrement counter.
///
/// Nested buckets sit behind `Arc` so that cloning a node for a write
/// transaction is shallow; mutation clones nodes along the touched path only
/// (`Arc::make_mut`).
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    entries: BTreeMap<Vec<u8>, Entry>,
    sequence: u64,
}

#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Value(Vec<u8>),
    Bucket(Arc<Node>),
}

impl Entry {
    /// The stored value, or `None` if the entry is a nested bucket.
    pub(crate) fn value(&self) -> Option<&[u8]> {
        match self {
            Entry::Value(value) => Some(value.as_slice()),
            Entry::Bucket(_) => None,
        }
    }
}

/// Statistical data about a bucket and everything nested beneath it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketStats {
    /// Stored key/value pairs, including those in nested buckets.
    pub key_count: u64,
    /// Nested buckets, at any depth.
    pub bucket_count: u64,
    /// Maximum nesting depth, counting this bucket as 1.
    pub depth: u64,
    pub key_bytes: u64,
    pub value_bytes: u64,
}

impl Node {
    pub(crate) fn from_parts(sequence: u64, entries: BTreeMap<Vec<u8>, Entry>) -> Self {
        Node { entries, sequence }
    }

    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn entries(&self) -> impl std::iter::Iterator<Item = (&Vec<u8>, &Entry)> {
        self.entries.iter()
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).and_then(Entry::value)
    }

    pub(crate) fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(Status::invalid_argument("key required"));
        }
        match self.entries.entry(key) {
            std::collections::btree_map::Entry::Occupied(mut occupied) => match occupied.get_mut()
            {
                Entry::Bucket(_) => Err(Status::invalid_argument("key names a nested bucket")),
                slot => {
                    *slot = Entry::Value(value);
                    Ok(())
                }
            },
            std::collections::btree_map::Entry::Vacant(vacant) => {
                vacant.insert(Entry::Value(value));
                Ok(())
            }
        }
    }

    /// Deleting an absent key is not an error; deleting a nested bucket
    /// through `delete` is.
    pub(crate) fn delete(&mut self, key: &[u8]) -> Result<()> {
        match self.entries.get(key) {
            None => Ok(()),
            Some(Entry::Bucket(_)) => {
                Err(Status::invalid_argument("key names a nested bucket"))
            }
            Some(Entry::Value(_)) => {
                self.entries.remove(key);
                Ok(())
            }
        }
    }

    pub(crate) fn child(&self, name: &[u8]) -> Option<&Node> {
        match self.entries.get(name) {
            Some(Entry::Bucket(node)) => Some(node.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn child_mut(&mut self, name: &[u8]) -> Option<&mut Node> {
        match self.entries.get_mut(name) {
            Some(Entry::Bucket(node)) => Some(Arc::make_mut(node)),
            _ => None,
        }
    }

    /// Get-or-create a child bucket. Never fails because the bucket already
    /// exists; fails if the name collides with a stored key.
    pub(crate) fn create_child(&mut self, name: &[u8]) -> Result<&mut Node> {
        let slot = self
            .entries
            .entry(name.to_vec())
            .or_insert_with(|| Entry::Bucket(Arc::new(Node::default())));
        match slot {
            Entry::Bucket(node) => Ok(Arc::make_mut(node)),
            Entry::Value(_) => Err(Status::invalid_argument(
                "bucket name collides with a stored key",
            )),
        }
    }

    /// Recursively delete a child bucket. Returns whether a bucket was
    /// actually removed; an absent name is not an error.
    pub(crate) fn delete_child(&mut self, name: &[u8]) -> Result<bool> {
        match self.entries.get(name) {
            None => Ok(false),
            Some(Entry::Value(_)) => {
                Err(Status::invalid_argument("cannot delete a stored key as a bucket"))
            }
            Some(Entry::Bucket(_)) => {
                self.entries.remove(name);
                Ok(true)
            }
        }
    }

    pub(crate) fn descend(&self, path: &[Slice]) -> Option<&Node> {
        let mut node = self;
        for fragment in path {
            node = node.child(fragment.data())?;
        }
        Some(node)
    }

    pub(crate) fn descend_mut(&mut self, path: &[Slice]) -> Option<&mut Node> {
        let mut node = self;
        for fragment in path {
            node = node.child_mut(fragment.data())?;
        }
        Some(node)
    }

    pub(crate) fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    // Cursor primitives. `seek` positions at the smallest key >= target.

    pub(crate) fn first(&self) -> Option<(&Vec<u8>, &Entry)> {
        self.entries.iter().next()
    }

    pub(crate) fn last(&self) -> Option<(&Vec<u8>, &Entry)> {
        self.entries.iter().next_back()
    }

    pub(crate) fn seek(&self, target: &[u8]) -> Option<(&Vec<u8>, &Entry)> {
        self.entries
            .range::<[u8], _>((Bound::Included(target), Bound::Unbounded))
            .next()
    }

    pub(crate) fn next_after(&self, key: &[u8]) -> Option<(&Vec<u8>, &Entry)> {
        self.entries
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
    }

    pub(crate) fn prev_before(&self, key: &[u8]) -> Option<(&Vec<u8>, &Entry)> {
        self.entries
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
            .next_back()
    }

    pub(crate) fn stats(&self) -> BucketStats {
        let mut stats = BucketStats {
            depth: 1,
            ..BucketStats::default()
        };
        for (key, entry) in &self.entries {
            match entry {
                Entry::Value(value) => {
                    stats.key_count += 1;
                    stats.key_bytes += key.len() as u64;
                    stats.value_bytes += value.len() as u64;
                }
                Entry::Bucket(child) => {
                    let nested = child.stats();
                    stats.key_count += nested.key_count;
                    stats.bucket_count += 1 + nested.bucket_count;
                    stats.depth = stats.depth.max(1 + nested.depth);
                    stats.key_bytes += key.len() as u64 + nested.key_bytes;
                    stats.value_bytes += nested.value_bytes;
                }
            }
        }
        stats
    }
}
