pub mod digest;
pub mod fuzzy;
pub mod magic;

pub use digest::{FileInfo, HashKind};
