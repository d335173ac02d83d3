use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::compression::CompressionType;
use crate::statistics::Statistics;
use crate::store::{Node, snapshot};
use crate::tx::{Tx, TxOptions};
use crate::util::{Result, Slice, Status};

#[derive(Debug, Clone)]
pub struct Options {
    /// Opening a missing file read-only fails; write transactions against a
    /// read-only handle fail with `DatabaseReadOnly`.
    pub read_only: bool,
    /// Unix permission bits for a created containing directory. Ignored on
    /// other platforms and when opening read-only.
    pub dir_mode: u32,
    /// Unix permission bits for the database file. Ignored on other
    /// platforms.
    pub file_mode: u32,
    /// Compression applied to snapshot payloads written by this handle.
    pub compression: CompressionType,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            read_only: false,
            dir_mode: 0o700,
            file_mode: 0o600,
            compression: CompressionType::default(),
        }
    }
}

/// A database: nested buckets of ordered byte keys, backed by one snapshot
/// file that is atomically replaced on every commit.
///
/// The committed tree sits behind `RwLock<Arc<..>>`: read-only transactions
/// clone the `Arc` and observe an immutable snapshot, a write transaction
/// holds the writer mutex for its lifetime, so there is a single read-write
/// transaction at a time and beginning a second one blocks until the first
/// commits or rolls back.
pub struct Db {
    committed: RwLock<Arc<Node>>,
    writer: Mutex<()>,
    file: PathBuf,
    compression: CompressionType,
    file_mode: u32,
    read_only: bool,
    statistics: Arc<Statistics>,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("file", &self.file)
            .field("compression", &self.compression)
            .field("file_mode", &self.file_mode)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Db> {
        Self::open_with_options(path, Options::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: Options) -> Result<Db> {
        let file = path.as_ref().to_path_buf();
        let statistics = Arc::new(Statistics::new());

        let root = if file.exists() {
            let raw = fs::read(&file)
                .map_err(|e| Status::io_error(format!("cannot read database file: {e}")))?;
            let root = snapshot::decode(&raw)?;
            statistics.record_snapshot_load(raw.len() as u64);
            root
        } else if options.read_only {
            return Err(Status::io_error(format!(
                "database file {} does not exist",
                file.display()
            )));
        } else {
            if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
                create_dir(dir, options.dir_mode)?;
            }
            let root = Node::default();
            let encoded = snapshot::encode(&root, options.compression)?;
            write_snapshot_file(&file, &encoded, options.file_mode)?;
            statistics.record_snapshot_write(encoded.len() as u64);
            root
        };

        Ok(Db {
            committed: RwLock::new(Arc::new(root)),
            writer: Mutex::new(()),
            file,
            compression: options.compression,
            file_mode: options.file_mode,
            read_only: options.read_only,
            statistics,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn begin_tx(&self, options: TxOptions) -> Result<Tx<'_>> {
        Tx::begin(self, options)
    }

    /// Run `operation` inside a transaction: commit on success, roll back on
    /// error. The error from the operation wins over commit bookkeeping.
    pub fn within_tx<'db, T>(
        &'db self,
        options: TxOptions,
        operation: impl FnOnce(&Tx<'db>) -> Result<T>,
    ) -> Result<T> {
        let tx = self.begin_tx(options)?;
        match operation(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback();
                Err(err)
            }
        }
    }

    /// Read one key from the bucket at `bucket_path` in a short read-only
    /// transaction. An absent bucket reads as an absent value.
    pub fn get(&self, bucket_path: &Slice, key: &Slice) -> Result<Option<Slice>> {
        self.within_tx(TxOptions { read_only: true }, |tx| {
            match tx.bucket(bucket_path) {
                Ok(bucket) => bucket.get(key),
                Err(err) if err.is_bucket_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    /// Store one key in the bucket at `bucket_path` (created if missing) in
    /// a single-operation transaction.
    pub fn put(&self, bucket_path: &Slice, key: Slice, value: Slice) -> Result<()> {
        self.within_tx(TxOptions::default(), move |tx| {
            tx.bucket(bucket_path)?.put(key, value)
        })
    }

    /// Delete one key in a single-operation transaction. Neither an absent
    /// bucket nor an absent key is an error.
    pub fn delete(&self, bucket_path: &Slice, key: &Slice) -> Result<()> {
        self.within_tx(TxOptions::default(), |tx| match tx.bucket(bucket_path) {
            Ok(bucket) => bucket.delete(key),
            Err(err) if err.is_bucket_not_found() => Ok(()),
            Err(err) => Err(err),
        })
    }

    pub(crate) fn begin_snapshot(&self) -> Arc<Node> {
        self.committed.read().clone()
    }

    pub(crate) fn begin_working(&self) -> (MutexGuard<'_, ()>, Node) {
        let guard = self.writer.lock();
        let working = (**self.committed.read()).clone();
        (guard, working)
    }

    /// Write `root` to the snapshot file. Called with the writer mutex held.
    pub(crate) fn persist(&self, root: &Node) -> Result<()> {
        let encoded = snapshot::encode(root, self.compression)?;
        write_snapshot_file(&self.file, &encoded, self.file_mode)?;
        self.statistics.record_snapshot_write(encoded.len() as u64);
        Ok(())
    }

    pub(crate) fn publish(&self, root: Node) {
        *self.committed.write() = Arc::new(root);
    }
}

fn create_dir(dir: &Path, mode: u32) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder
        .create(dir)
        .map_err(|e| Status::io_error(format!("cannot create database directory: {e}")))
}

/// Replace the database file atomically: write a temporary file in the same
/// directory, then rename it over the target.
fn write_snapshot_file(file: &Path, data: &[u8], mode: u32) -> Result<()> {
    let dir = file
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Status::io_error(format!("cannot create temporary snapshot: {e}")))?;
    tmp.write_all(data)
        .map_err(|e| Status::io_error(format!("cannot write snapshot: {e}")))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| Status::io_error(format!("cannot set snapshot permissions: {e}")))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    tmp.persist(file)
        .map_err(|e| Status::io_error(format!("cannot replace database file: {e}")))?;
    Ok(())
}
