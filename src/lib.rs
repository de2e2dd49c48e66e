pub mod types;
pub mod error;
pub mod parser;
pub mod storage;
pub mod completion;
pub mod scanner;
pub mod indexer;
pub mod service;
pub mod config;
pub mod cli;
pub mod cli_types;

// Re-export commonly used types
pub use types::*;
pub use error::{DcfError, Result, TemplateError, ValidationError};
pub use storage::memory::TemplateRegistry;
pub use completion::{CompletionQueue, PendingCallback};
pub use scanner::{IndexWorker, LibraryScanner, PackageSource, ScanDriver, ScanResult};
pub use indexer::{IndexPhase, TemplateIndexer, BUILTIN_TEMPLATES};
pub use service::{QueryResponse, TemplateService};
pub use crate::config::IndexerConfig;
pub use cli::CliApp;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
