pub mod coding;
pub mod slice;
pub mod status;

pub use coding::{decode_u64, encode_u64};
pub use slice::Slice;
pub use status::{Code, Result, Status};
