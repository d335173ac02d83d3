use std::sync::atomic::{AtomicU64, Ordering};

/// Database-wide statistics
///
/// Thread-safe statistics tracking for all database operations.
/// Uses atomic counters for lock-free updates.
#[derive(Debug, Default)]
pub struct Statistics {
    // Key operations
    pub num_keys_written: AtomicU64,
    pub num_keys_read: AtomicU64,
    pub num_keys_deleted: AtomicU64,
    pub bytes_written: AtomicU64,
    pub bytes_read: AtomicU64,

    // Iterator operations
    pub num_seeks: AtomicU64,
    pub num_cursor_steps: AtomicU64,

    // Bucket operations
    pub num_buckets_deleted: AtomicU64,

    // Transaction lifecycle
    pub num_commits: AtomicU64,
    pub num_rollbacks: AtomicU64,

    // Snapshot file I/O
    pub num_snapshot_writes: AtomicU64,
    pub num_snapshot_loads: AtomicU64,
    pub snapshot_bytes_written: AtomicU64,
    pub snapshot_bytes_loaded: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_write(&self, bytes: u64) {
        self.num_keys_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_read(&self, bytes: u64) {
        self.num_keys_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delete(&self) {
        self.num_keys_deleted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_seek(&self) {
        self.num_seeks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cursor_step(&self) {
        self.num_cursor_steps.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_bucket_delete(&self) {
        self.num_buckets_deleted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_commit(&self) {
        self.num_commits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rollback(&self) {
        self.num_rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot_write(&self, bytes: u64) {
        self.num_snapshot_writes.fetch_add(1, Ordering::Relaxed);
        self.snapshot_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot_load(&self, bytes: u64) {
        self.num_snapshot_loads.fetch_add(1, Ordering::Relaxed);
        self.snapshot_bytes_loaded.fetch_add(bytes, Ordering::Relaxed);
    }

    // Getters (snapshot values)
    pub fn num_keys_written(&self) -> u64 {
        self.num_keys_written.load(Ordering::Relaxed)
    }

    pub fn num_keys_read(&self) -> u64 {
        self.num_keys_read.load(Ordering::Relaxed)
    }

    pub fn num_keys_deleted(&self) -> u64 {
        self.num_keys_deleted.load(Ordering::Relaxed)
    }

    pub fn num_seeks(&self) -> u64 {
        self.num_seeks.load(Ordering::Relaxed)
    }

    pub fn num_cursor_steps(&self) -> u64 {
        self.num_cursor_steps.load(Ordering::Relaxed)
    }

    pub fn num_buckets_deleted(&self) -> u64 {
        self.num_buckets_deleted.load(Ordering::Relaxed)
    }

    pub fn num_commits(&self) -> u64 {
        self.num_commits.load(Ordering::Relaxed)
    }

    pub fn num_rollbacks(&self) -> u64 {
        self.num_rollbacks.load(Ordering::Relaxed)
    }

    pub fn num_snapshot_writes(&self) -> u64 {
        self.num_snapshot_writes.load(Ordering::Relaxed)
    }

    pub fn num_snapshot_loads(&self) -> u64 {
        self.num_snapshot_loads.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Reset all statistics to zero
    pub fn reset(&self) {
        self.num_keys_written.store(0, Ordering::Relaxed);
        self.num_keys_read.store(0, Ordering::Relaxed);
        self.num_keys_deleted.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.bytes_read.store(0, Ordering::Relaxed);
        self.num_seeks.store(0, Ordering::Relaxed);
        self.num_cursor_steps.store(0, Ordering::Relaxed);
        self.num_buckets_deleted.store(0, Ordering::Relaxed);
        self.num_commits.store(0, Ordering::Relaxed);
        self.num_rollbacks.store(0, Ordering::Relaxed);
        self.num_snapshot_writes.store(0, Ordering::Relaxed);
        self.num_snapshot_loads.store(0, Ordering::Relaxed);
        self.snapshot_bytes_written.store(0, Ordering::Relaxed);
        self.snapshot_bytes_loaded.store(0, Ordering::Relaxed);
    }

    /// Get a formatted statistics report
    pub fn report(&self) -> String {
        format!(
            "Database Statistics:\n\
            \n\
            Keys:\n\
            - Written:       {}\n\
            - Read:          {}\n\
            - Deleted:       {}\n\
            - Bytes written: {}\n\
            - Bytes read:    {}\n\
            \n\
            Iterators:\n\
            - Seeks:         {}\n\
            - Cursor steps:  {}\n\
            \n\
            Buckets:\n\
            - Deleted:       {}\n\
            \n\
            Transactions:\n\
            - Commits:       {}\n\
            - Rollbacks:     {}\n\
            \n\
            Snapshots:\n\
            - Writes:        {}\n\
            - Loads:         {}\n\
            - Bytes written: {}\n\
            - Bytes loaded:  {}",
            self.num_keys_written(),
            self.num_keys_read(),
            self.num_keys_deleted(),
            self.bytes_written(),
            self.bytes_read(),
            self.num_seeks(),
            self.num_cursor_steps(),
            self.num_buckets_deleted(),
            self.num_commits(),
            self.num_rollbacks(),
            self.num_snapshot_writes(),
            self.num_snapshot_loads(),
            self.snapshot_bytes_written.load(Ordering::Relaxed),
            self.snapshot_bytes_loaded.load(Ordering::Relaxed),
        )
    }
}
