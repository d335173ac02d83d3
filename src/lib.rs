pub mod bucket;
pub mod compression;
pub mod db;
pub mod iterator;
pub(crate) mod path;
pub mod statistics;
pub mod store;
pub mod tx;
pub mod util;

pub use bucket::Bucket;
pub use compression::CompressionType;
pub use db::{Db, Options};
pub use iterator::{IteratorOptions, SeekMethod, Visit};
pub use statistics::Statistics;
pub use store::BucketStats;
pub use tx::{Tx, TxOptions};
pub use util::{Result, Slice, Status};
