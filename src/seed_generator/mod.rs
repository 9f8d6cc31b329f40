pub mod data_snapshotter;
pub mod dump_exporter;
pub mod error;
pub mod row_serializer;
pub mod seed_formatter;
pub mod seeder_registry;
pub mod stub_renderer;
pub mod table_inspector;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use self::{
    data_snapshotter::RowSource,
    dump_exporter::{CommandRunner, ConnectionConfig, DumpExporter, DumpTools},
    error::SeedError,
    seed_formatter::{build_inline_body, effective_chunk_size, DEFAULT_CHUNK_SIZE},
    seeder_registry::SeederRegistry,
    stub_renderer::{render_dump, render_inline, Stubs},
    table_inspector::{SchemaInspector, TableDescriptor},
};

/// Above this many cells (rows * columns) a table is dumped instead of inlined.
pub const DEFAULT_DUMP_THRESHOLD: u64 = 2000;
pub const SEED_EXTENSION: &str = "php";
pub const DUMP_DIR: &str = "dumps";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Start,
    Inspecting,
    Formatting,
    Exporting,
    Rendering,
    Writing,
    Registering,
    Done,
    Aborted,
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub seed_path: PathBuf,
    pub chunk_size: usize,
    pub dump_threshold: u64,
    pub stubs: Stubs,
    pub tools: DumpTools,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            seed_path: PathBuf::from("./database/seeds"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            dump_threshold: DEFAULT_DUMP_THRESHOLD,
            stubs: Stubs::default(),
            tools: DumpTools::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedKind {
    Inline { chunks: usize },
    Dump { dump_path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedArtifact {
    pub class_name: String,
    pub table: String,
    pub path: PathBuf,
    pub content: String,
    pub kind: SeedKind,
}

/// Turns one table into a seeder class and registers it with the run-list.
///
/// Small tables are written out as insert statements, tables with more than
/// `dump_threshold` cells are exported with pg_dump and loaded from the dump.
pub struct SeedGenerator<'a, I, R, C>
where
    I: SchemaInspector,
    R: RowSource,
    C: CommandRunner,
{
    inspector: &'a I,
    rows: &'a R,
    runner: &'a C,
    connection: &'a ConnectionConfig,
    options: &'a GeneratorOptions,
    state: GenerationState,
}

impl<'a, I, R, C> SeedGenerator<'a, I, R, C>
where
    I: SchemaInspector,
    R: RowSource,
    C: CommandRunner,
{
    pub fn new(
        inspector: &'a I,
        rows: &'a R,
        runner: &'a C,
        connection: &'a ConnectionConfig,
        options: &'a GeneratorOptions,
    ) -> Self {
        Self {
            inspector,
            rows,
            runner,
            connection,
            options,
            state: GenerationState::Start,
        }
    }

    /// The state the last call to [`Self::generate`] finished in.
    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub async fn generate(&mut self, table: &str) -> Result<SeedArtifact, SeedError> {
        self.state = GenerationState::Start;

        let result = self.run(table).await;
        if let Err(e) = &result {
            debug!(table, error = %e, "seed generation aborted");
            self.transition(GenerationState::Aborted);
        }

        result
    }

    fn transition(&mut self, next: GenerationState) {
        debug!(from = ?self.state, to = ?next, "seed generation state");
        self.state = next;
    }

    async fn run(&mut self, table: &str) -> Result<SeedArtifact, SeedError> {
        let options = self.options;

        self.transition(GenerationState::Inspecting);
        let descriptor = self.inspect(table).await?;

        let class_name = generate_class_name(table);
        let path = seed_file_path(&options.seed_path, &class_name);

        let (kind, content) = if descriptor.cell_count() > options.dump_threshold {
            self.transition(GenerationState::Exporting);
            let dump_path = dump_file_path(&options.seed_path, &class_name);
            let exporter = DumpExporter::new(self.runner, self.connection, &options.tools);
            let dump = exporter.export(table, &dump_path).await?;

            self.transition(GenerationState::Rendering);
            let sql_file = dump_file_name(&class_name);
            let content = render_dump(&options.stubs.dump, &class_name, table, &sql_file);

            (SeedKind::Dump { dump_path: dump.path }, content)
        } else {
            self.transition(GenerationState::Formatting);
            let rows = self.rows.fetch_all(table).await?;
            let chunk_size = effective_chunk_size(options.chunk_size);
            let inserts = build_inline_body(table, &rows, chunk_size);
            if inserts.is_empty() {
                return Err(SeedError::EmptyContent(table.to_string()));
            }

            self.transition(GenerationState::Rendering);
            let content = render_inline(&options.stubs.inline, &class_name, table, &inserts);

            let chunks = (rows.len() + chunk_size - 1) / chunk_size;
            (SeedKind::Inline { chunks }, content)
        };

        self.transition(GenerationState::Writing);
        if content.trim().is_empty() {
            return Err(SeedError::EmptyContent(table.to_string()));
        }
        if !options.seed_path.exists() {
            std::fs::create_dir_all(&options.seed_path)?;
        }
        std::fs::write(&path, &content)?;
        info!(table, path = ?path, "seed written");

        self.transition(GenerationState::Registering);
        SeederRegistry::new(&options.seed_path)
            .register(&class_name)
            .map_err(|source| SeedError::Registry {
                artifact: path.clone(),
                source,
            })?;

        self.transition(GenerationState::Done);
        Ok(SeedArtifact {
            class_name,
            table: table.to_string(),
            path,
            content,
            kind,
        })
    }

    async fn inspect(&self, table: &str) -> Result<TableDescriptor, SeedError> {
        if !self.inspector.exists(table).await? {
            return Err(SeedError::TableNotFound(table.to_string()));
        }

        let descriptor = TableDescriptor {
            name: table.to_string(),
            row_count: self.inspector.row_count(table).await?,
            column_count: self.inspector.column_count(table).await?,
        };
        debug!(?descriptor, cells = descriptor.cell_count(), "inspected table");

        Ok(descriptor)
    }
}

/// `user_roles` becomes `UserRolesTableSeeder`. Schema qualified names keep the schema, so
/// `audit.user_roles` becomes `AuditUserRolesTableSeeder`.
pub fn generate_class_name(table: &str) -> String {
    let name: String = table.split(|c: char| c == '_' || c == '.').map(upper_first).collect();

    upper_first(&name) + "TableSeeder"
}

fn upper_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

pub fn seed_file_path(seed_path: &Path, class_name: &str) -> PathBuf {
    seed_path.join(format!("{}.{}", class_name, SEED_EXTENSION))
}

pub fn dump_file_name(class_name: &str) -> String {
    format!("{}.sql.gz", class_name)
}

pub fn dump_file_path(seed_path: &Path, class_name: &str) -> PathBuf {
    seed_path.join(DUMP_DIR).join(dump_file_name(class_name))
}
