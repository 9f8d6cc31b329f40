use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::seed_generator::{error::ExportError, table_inspector::quote_table_name};

pub const DUMP_TOOL: &str = "pg_dump";
pub const COMPRESSOR: &str = "gzip";

/// Connection parameters handed to the dump tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

/// What came back from running a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    /// Exit code of the first stage that failed, or of the last stage when all succeeded
    pub exit_code: Option<i32>,
    /// Anything printed to stdout that did not end up in the destination file
    pub stdout: String,
    pub stderr: String,
}

/// Runs `producer | filter > destination`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run_piped(
        &self,
        producer: CommandSpec,
        filter: CommandSpec,
        destination: &Path,
    ) -> io::Result<ProcessOutput>;
}

/// Spawns real processes. The pipeline blocks so it is moved onto the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run_piped(
        &self,
        producer: CommandSpec,
        filter: CommandSpec,
        destination: &Path,
    ) -> io::Result<ProcessOutput> {
        let destination = destination.to_path_buf();

        tokio::task::spawn_blocking(move || run_pipeline(&producer, &filter, &destination))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

fn run_pipeline(
    producer: &CommandSpec,
    filter: &CommandSpec,
    destination: &Path,
) -> io::Result<ProcessOutput> {
    let output_file = std::fs::File::create(destination)?;

    let mut producer_child = Command::new(&producer.program)
        .args(&producer.args)
        .envs(producer.envs.iter().map(|(k, v)| (k, v)))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let producer_stdout = producer_child.stdout.take().ok_or_else(|| {
        io::Error::new(io::ErrorKind::Other, "The dump process should have a stdout pipe")
    })?;

    let filter_child = Command::new(&filter.program)
        .args(&filter.args)
        .envs(filter.envs.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::from(producer_stdout))
        .stdout(Stdio::from(output_file))
        .stderr(Stdio::piped())
        .spawn();

    let filter_child = match filter_child {
        Ok(child) => child,
        Err(e) => {
            let _ = producer_child.kill();
            let _ = producer_child.wait();
            return Err(e);
        }
    };

    // Drain the producer first, the filter keeps consuming its stdout meanwhile
    let producer_out = producer_child.wait_with_output()?;
    let filter_out = filter_child.wait_with_output()?;

    let failed_stage = if !producer_out.status.success() {
        &producer_out
    } else {
        &filter_out
    };

    let mut stderr = String::from_utf8_lossy(&producer_out.stderr).into_owned();
    stderr.push_str(&String::from_utf8_lossy(&filter_out.stderr));

    Ok(ProcessOutput {
        success: producer_out.status.success() && filter_out.status.success(),
        exit_code: failed_stage.status.code(),
        stdout: String::new(),
        stderr,
    })
}

/// `which` style lookup. An explicitly configured path wins, otherwise every PATH entry is
/// tried in order.
pub fn resolve_executable(name: &str, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(explicit) = explicit {
        if explicit.is_dir() {
            let candidate = explicit.join(name);
            return candidate.is_file().then_some(candidate);
        }
        return explicit.is_file().then(|| explicit.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Where to find the external tools. `None` means search the PATH.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpTools {
    pub pg_dump: Option<PathBuf>,
    pub compressor: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpArtifact {
    pub path: PathBuf,
}

pub struct DumpExporter<'a, C: CommandRunner> {
    runner: &'a C,
    connection: &'a ConnectionConfig,
    tools: &'a DumpTools,
}

impl<'a, C: CommandRunner> DumpExporter<'a, C> {
    pub fn new(
        runner: &'a C,
        connection: &'a ConnectionConfig,
        tools: &'a DumpTools,
    ) -> Self {
        Self {
            runner,
            connection,
            tools,
        }
    }

    /// Writes a gzipped, data only dump of `table` to `destination`. A failed dump may leave a
    /// partial file behind.
    pub async fn export(&self, table: &str, destination: &Path) -> Result<DumpArtifact, ExportError> {
        let pg_dump = resolve_executable(DUMP_TOOL, self.tools.pg_dump.as_deref())
            .ok_or_else(|| ExportError::ToolNotFound(DUMP_TOOL.to_string()))?;
        let gzip = resolve_executable(COMPRESSOR, self.tools.compressor.as_deref())
            .ok_or_else(|| ExportError::ToolNotFound(COMPRESSOR.to_string()))?;

        if let Some(parent) = destination.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let producer = CommandSpec {
            program: pg_dump,
            args: self.pg_dump_args(table),
            envs: vec![("PGPASSWORD".to_string(), self.connection.password.clone())],
        };
        let filter = CommandSpec {
            program: gzip,
            args: vec![String::from("-c")],
            envs: vec![],
        };

        debug!(table, destination = ?destination, "running {} | {}", DUMP_TOOL, COMPRESSOR);
        let output = self.runner.run_piped(producer, filter, destination).await?;
        check_output(&output)?;

        Ok(DumpArtifact {
            path: destination.to_path_buf(),
        })
    }

    fn pg_dump_args(&self, table: &str) -> Vec<String> {
        vec![
            format!("--host={}", self.connection.host),
            format!("--port={}", self.connection.port),
            format!("--username={}", self.connection.user),
            format!("--dbname={}", self.connection.database),
            String::from("--no-password"),
            String::from("--data-only"),
            String::from("--column-inserts"),
            String::from("--no-owner"),
            format!("--table={}", quote_table_name(table)),
        ]
    }
}

/// A non-zero exit or any stray output counts as a failed dump. Some dump tools report problems
/// without failing, so output alone is enough.
pub fn check_output(output: &ProcessOutput) -> Result<(), ExportError> {
    let diagnostics = [output.stdout.trim(), output.stderr.trim()]
        .iter()
        .filter(|text| !text.is_empty())
        .copied()
        .collect::<Vec<&str>>()
        .join("\n");

    if output.success && diagnostics.is_empty() {
        return Ok(());
    }

    warn!(exit_code = ?output.exit_code, "dump pipeline reported a failure");
    Err(ExportError::Failed {
        exit_code: output.exit_code,
        diagnostics: if diagnostics.is_empty() {
            String::from("the dump pipeline exited with a non-zero status")
        } else {
            diagnostics
        },
    })
}
