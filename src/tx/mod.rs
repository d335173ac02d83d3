use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::bucket::Bucket;
use crate::db::Db;
use crate::path::PathIter;
use crate::store::Node;
use crate::util::{Result, Slice, Status};

#[derive(Debug, Clone, Copy, Default)]
pub struct TxOptions {
    pub read_only: bool,
}

/// A read-only or read-write transaction.
///
/// Read-only transactions hold an `Arc` snapshot of the committed tree and
/// never block anyone. A read-write transaction owns a working copy and the
/// database's writer mutex; its changes become visible (and durable) only on
/// `commit`. Dropping a transaction without committing discards its changes.
///
/// `Bucket` and iterator handles borrow the transaction, so the borrow
/// checker rejects any use of them after `commit`/`rollback` consume it.
pub struct Tx<'db> {
    db: &'db Db,
    read_only: bool,
    state: Mutex<TxRoot>,
    _writer: Option<MutexGuard<'db, ()>>,
}

impl std::fmt::Debug for Tx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

enum TxRoot {
    Snapshot(Arc<Node>),
    Working(Node),
}

impl TxRoot {
    fn node(&self) -> &Node {
        match self {
            TxRoot::Snapshot(root) => root,
            TxRoot::Working(root) => root,
        }
    }
}

impl<'db> Tx<'db> {
    pub(crate) fn begin(db: &'db Db, options: TxOptions) -> Result<Tx<'db>> {
        if !options.read_only && db.is_read_only() {
            return Err(Status::database_read_only());
        }
        if options.read_only {
            Ok(Tx {
                db,
                read_only: true,
                state: Mutex::new(TxRoot::Snapshot(db.begin_snapshot())),
                _writer: None,
            })
        } else {
            let (guard, working) = db.begin_working();
            Ok(Tx {
                db,
                read_only: false,
                state: Mutex::new(TxRoot::Working(working)),
                _writer: Some(guard),
            })
        }
    }

    /// The database this transaction belongs to.
    pub fn db(&self) -> &'db Db {
        self.db
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Persist and publish the transaction's changes. For a read-only
    /// transaction this silently discards, matching rollback.
    pub fn commit(self) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        let root = match self.state.into_inner() {
            TxRoot::Working(root) => root,
            TxRoot::Snapshot(_) => return Ok(()),
        };
        self.db.persist(&root)?;
        self.db.publish(root);
        self.db.statistics().record_commit();
        Ok(())
    }

    /// Discard the transaction's changes. Always safe.
    pub fn rollback(self) {
        self.db.statistics().record_rollback();
    }

    /// Resolve `path` to a bucket, creating every missing fragment when the
    /// transaction is writable and failing with `BucketNotFound` at the
    /// first missing fragment when it is read-only.
    pub fn bucket(&self, path: &Slice) -> Result<Bucket<'_>> {
        let (resolved, name) = self.resolve(&[], path)?;
        Ok(Bucket::new(self, resolved, name))
    }

    /// Delete the bucket at `path` and everything nested beneath it.
    /// Creates nothing on the way down; a missing fragment or a missing
    /// target bucket is treated as success.
    pub fn delete_bucket(&self, path: &Slice) -> Result<()> {
        self.remove(&[], path)
    }

    pub(crate) fn resolve(&self, base: &[Slice], path: &Slice) -> Result<(Vec<Slice>, Slice)> {
        let mut fragments = PathIter::new(path.data())?;
        let mut resolved: Vec<Slice> = base.to_vec();
        let mut state = self.state.lock();

        let (mut fragment, mut last) = fragments.next_fragment();
        match &mut *state {
            TxRoot::Working(root) => {
                let mut node = root
                    .descend_mut(&resolved)
                    .ok_or_else(|| Status::bucket_not_found("bucket no longer exists"))?;
                loop {
                    node = node.create_child(fragment)?;
                    resolved.push(Slice::from(fragment));
                    if last {
                        break;
                    }
                    (fragment, last) = fragments.next_fragment();
                }
            }
            TxRoot::Snapshot(root) => {
                let mut node = root
                    .descend(&resolved)
                    .ok_or_else(|| Status::bucket_not_found("bucket no longer exists"))?;
                loop {
                    node = node.child(fragment).ok_or_else(|| {
                        Status::bucket_not_found(format!(
                            "bucket '{}' does not exist",
                            Slice::from(fragment)
                        ))
                    })?;
                    resolved.push(Slice::from(fragment));
                    if last {
                        break;
                    }
                    (fragment, last) = fragments.next_fragment();
                }
            }
        }

        Ok((resolved, Slice::from(fragment)))
    }

    pub(crate) fn remove(&self, base: &[Slice], path: &Slice) -> Result<()> {
        if self.read_only {
            return Err(Status::tx_not_writable());
        }
        let mut fragments = PathIter::new(path.data())?;
        let mut state = self.state.lock();
        let root = match &mut *state {
            TxRoot::Working(root) => root,
            TxRoot::Snapshot(_) => return Err(Status::tx_not_writable()),
        };
        let Some(mut node) = root.descend_mut(base) else {
            return Ok(());
        };

        let (mut fragment, mut last) = fragments.next_fragment();
        while !last {
            match node.child_mut(fragment) {
                Some(child) => node = child,
                None => return Ok(()),
            }
            (fragment, last) = fragments.next_fragment();
        }

        if node.delete_child(fragment)? {
            self.db.statistics().record_bucket_delete();
        }
        Ok(())
    }

    /// Run `operation` against the node at `path`, failing with
    /// `BucketNotFound` if the bucket was deleted out from under its handle.
    pub(crate) fn with_node<T>(&self, path: &[Slice], operation: impl FnOnce(&Node) -> T) -> Result<T> {
        let state = self.state.lock();
        match state.node().descend(path) {
            Some(node) => Ok(operation(node)),
            None => Err(Status::bucket_not_found("bucket no longer exists")),
        }
    }

    pub(crate) fn with_node_mut<T>(
        &self,
        path: &[Slice],
        operation: impl FnOnce(&mut Node) -> Result<T>,
    ) -> Result<T> {
        if self.read_only {
            return Err(Status::tx_not_writable());
        }
        let mut state = self.state.lock();
        let root = match &mut *state {
            TxRoot::Working(root) => root,
            TxRoot::Snapshot(_) => return Err(Status::tx_not_writable()),
        };
        match root.descend_mut(path) {
            Some(node) => operation(node),
            None => Err(Status::bucket_not_found("bucket no longer exists")),
        }
    }
}
