use crate::db::Db;
use crate::iterator::{Iterator, IteratorOptions, SeekMethod, Visit};
use crate::store::{BucketStats, Node};
use crate::tx::Tx;
use crate::util::{Result, Slice, Status};

/// A named namespace of keys and nested buckets.
///
/// A bucket is a view scoped to the transaction that produced it: it stores
/// the resolved fragment chain and looks its node up per operation, so it
/// never outlives or pins the underlying tree.
#[derive(Clone)]
pub struct Bucket<'tx> {
    tx: &'tx Tx<'tx>,
    path: Vec<Slice>,
    name: Slice,
}

impl std::fmt::Debug for Bucket<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("path", &self.path)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<'tx> Bucket<'tx> {
    pub(crate) fn new(tx: &'tx Tx<'tx>, path: Vec<Slice>, name: Slice) -> Self {
        Bucket { tx, path, name }
    }

    /// The bucket name: the last fragment of the path that resolved it.
    pub fn name(&self) -> &Slice {
        &self.name
    }

    /// The transaction this bucket belongs to.
    pub fn tx(&self) -> &'tx Tx<'tx> {
        self.tx
    }

    /// The database this bucket belongs to.
    pub fn db(&self) -> &'tx Db {
        self.tx.db()
    }

    /// Get the value of a key, or `None` if the key is absent or names a
    /// nested bucket.
    pub fn get(&self, key: &Slice) -> Result<Option<Slice>> {
        let value = self.with_node(|node| node.get(key.data()).map(Slice::from))?;
        if let Some(value) = &value {
            self.db().statistics().record_read(value.len() as u64);
        }
        Ok(value)
    }

    /// Store a key/value pair in the bucket.
    pub fn put(&self, key: Slice, value: Slice) -> Result<()> {
        let bytes = (key.len() + value.len()) as u64;
        self.with_node_mut(|node| node.put(key.into_vec(), value.into_vec()))?;
        self.db().statistics().record_write(bytes);
        Ok(())
    }

    /// Delete a key. Deleting an absent key is not an error.
    pub fn delete(&self, key: &Slice) -> Result<()> {
        self.with_node_mut(|node| node.delete(key.data()))?;
        self.db().statistics().record_delete();
        Ok(())
    }

    /// Return the next value of the bucket's autoincrement counter.
    pub fn next_sequence(&self) -> Result<u64> {
        self.with_node_mut(|node| Ok(node.next_sequence()))
    }

    /// Statistics for this bucket and everything nested beneath it.
    pub fn stats(&self) -> Result<BucketStats> {
        self.with_node(|node| node.stats())
    }

    /// Resolve `path` relative to this bucket, creating missing fragments
    /// when the transaction is writable.
    pub fn bucket(&self, path: &Slice) -> Result<Bucket<'tx>> {
        let (resolved, name) = self.tx.resolve(&self.path, path)?;
        Ok(Bucket::new(self.tx, resolved, name))
    }

    /// Delete the bucket at `path` relative to this bucket, including all
    /// nested keys and buckets. A missing bucket is treated as success.
    pub fn delete_bucket(&self, path: &Slice) -> Result<()> {
        self.tx.remove(&self.path, path)
    }

    /// Open an iterator over this bucket's entries.
    pub fn iterate(&self) -> Iterator<'tx> {
        Iterator::new(self.clone())
    }

    /// Drive an iterator across the bucket, invoking `visitor` per entry.
    ///
    /// `prefix` restricts the scan to keys carrying that prefix; `first_key`
    /// starts the scan at the given bound instead. The two are mutually
    /// exclusive. `reverse` scans backwards. The visitor ends the scan early
    /// by returning `Visit::Stop`; an error aborts the scan and propagates.
    pub fn within_iterator(
        &self,
        options: &IteratorOptions,
        mut visitor: impl FnMut(&mut Iterator<'tx>) -> Result<Visit>,
    ) -> Result<()> {
        if options.prefix.is_some() && options.first_key.is_some() {
            return Err(Status::invalid_argument(
                "prefix and first_key cannot be used at the same time",
            ));
        }

        let mut iter = self.iterate();

        // Position at the first match.
        if let Some(prefix) = &options.prefix {
            if !options.reverse {
                iter.seek(prefix, SeekMethod::Prefix);
            } else {
                iter.seek(prefix, SeekMethod::PrefixReverse);
            }
        } else if let Some(first_key) = &options.first_key {
            if !options.reverse {
                iter.seek(first_key, SeekMethod::GreaterOrEqual);
            } else {
                iter.seek(first_key, SeekMethod::LessOrEqual);
            }
        } else if !options.reverse {
            iter.first();
        } else {
            iter.last();
        }

        while iter.valid() {
            match visitor(&mut iter)? {
                Visit::Stop => break,
                Visit::Continue => {}
            }

            if !options.reverse {
                iter.next();
            } else {
                iter.prev();
            }

            // A prefix bound also terminates the scan.
            if let Some(prefix) = &options.prefix {
                if iter.valid() && !iter.has_key_prefix(prefix) {
                    break;
                }
            }
        }

        Ok(())
    }

    pub(crate) fn with_node<T>(&self, operation: impl FnOnce(&Node) -> T) -> Result<T> {
        self.tx.with_node(&self.path, operation)
    }

    pub(crate) fn with_node_mut<T>(
        &self,
        operation: impl FnOnce(&mut Node) -> Result<T>,
    ) -> Result<T> {
        self.tx.with_node_mut(&self.path, operation)
    }
}
