pub mod commands;
pub mod config;
pub mod error;
pub mod hasher;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod storage;
pub mod vault;

pub use commands::{Command, Context, Outcome, Output, Registry};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use hasher::FileInfo;
pub use progress::{ProgressReporter, SilentReporter};
pub use session::{Fetcher, NoFetcher, Session, Snapshot};
pub use storage::{Catalog, Repository, Sample};
pub use vault::{ImportSummary, Ingest, Vault};
