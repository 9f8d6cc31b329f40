use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a seed from being generated for a table.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Table {0} was not found")]
    TableNotFound(String),

    #[error("Dump export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Nothing to write for table {0}, the generated seed was empty")]
    EmptyContent(String),

    /// The seed file exists on disk but the run-list was not updated.
    #[error("Seed written to {artifact:?} but the seeder registry was not updated: {source}")]
    Registry {
        artifact: PathBuf,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeedError {
    /// Whether a seed artifact made it to disk before the failure.
    pub fn artifact_written(&self) -> bool {
        matches!(self, Self::Registry { .. })
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Could not find the {0} executable")]
    ToolNotFound(String),

    #[error("Could not run the dump pipeline: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dump command failed (exit code {exit_code:?}): {diagnostics}")]
    Failed {
        exit_code: Option<i32>,
        diagnostics: String,
    },
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Could not read or write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find a run() method body in {path:?}")]
    Format { path: PathBuf },
}
