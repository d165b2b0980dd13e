use crate::cli::CommandLineArgs;
use crate::source::{CsvDirectorySource, RecordSource};

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Source of measurement logs.
    pub source: Arc<dyn RecordSource>,
}

impl AppState {
    /// Create and return an [AppState] reading logs from the configured data directory.
    pub fn new(args: &CommandLineArgs) -> Self {
        let source = CsvDirectorySource::new(&args.data_dir);
        Self::with_source(args, Arc::new(source))
    }

    /// Create and return an [AppState] with a specific record source.
    pub fn with_source(args: &CommandLineArgs, source: Arc<dyn RecordSource>) -> Self {
        Self {
            args: args.clone(),
            source,
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
