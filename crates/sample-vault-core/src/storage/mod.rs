pub mod models;
pub mod queries;
pub mod repository;
pub mod sqlite;

pub use models::{Added, FindKey, Sample, TagCount};
pub use repository::{Repository, Stored};
pub use sqlite::Catalog;
