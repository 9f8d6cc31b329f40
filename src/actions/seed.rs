use std::path::Path;

use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Args;
use colored::Colorize;

use crate::{
    actions::Action,
    config_file_manager::user_config::UserConfig,
    db_manager::{self, error_handling::get_db_error},
    seed_generator::{
        data_snapshotter::PgRowSource, dump_exporter::SystemCommandRunner, error::SeedError,
        table_inspector::PgSchemaInspector, SeedArtifact, SeedGenerator, SeedKind,
    },
};

#[derive(Debug, Args)]
pub struct Seed {
    /// The tables to generate seeders for. Schema qualify a table as my_schema.my_table,
    /// unqualified tables are looked up on the search path
    #[clap(num_args = 1.., index = 1, required = true)]
    tables: Vec<String>,

    /// The number of rows per insert statement. Overrides chunk_size in the user config
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    chunk_size: Option<u64>,
}

impl Seed {
    fn report_success(artifact: &SeedArtifact) {
        let strategy = match &artifact.kind {
            SeedKind::Inline { chunks } => format!("{} insert statement(s)", chunks),
            SeedKind::Dump { dump_path } => format!("dump {}", dump_path.display()),
        };

        println!(
            "\t{}: {} {} ({})",
            artifact.table.bold().magenta(),
            artifact.path.display(),
            "Success".green(),
            strategy
        );
    }

    /// Prints the outcome of a failed table. Returns false for the soft outcomes, an empty table
    /// or a seeder written but not registered.
    fn report_failure(table: &str, error: SeedError) -> bool {
        match error {
            SeedError::Registry { artifact, source } => {
                println!(
                    "\t{}: {} {}",
                    table.bold().magenta(),
                    artifact.display(),
                    "Written".yellow()
                );
                println!(
                    "\t\t{}: The seeder was not registered, {}",
                    "Warning".yellow(),
                    source
                );
                false
            }
            SeedError::EmptyContent(_) => {
                println!(
                    "\t{}: {} the table is empty, nothing was written",
                    table.bold().magenta(),
                    "Skipped".yellow()
                );
                false
            }
            SeedError::Database(e) => {
                println!("\t{}: {}", table.bold().magenta(), "Failed".red());
                println!("\t\t{}", get_db_error(e));
                true
            }
            error => {
                println!("\t{}: {}", table.bold().magenta(), "Failed".red());
                let message = error.to_string().trim_end().replace('\n', "\n\t\t");
                println!("\t\t{}: {}", "Error".red(), message);
                true
            }
        }
    }
}

#[async_trait]
impl Action for Seed {
    async fn execute(&self) -> Result<()> {
        let default_config = UserConfig::default();
        let config = UserConfig::get_global().unwrap_or(&default_config);

        let connection = db_manager::DbConnection::new().await?;
        let pool = connection.get_connection_pool();

        let options = config.generator_options(
            self.chunk_size.map(|size| size as usize),
            connection.get_pg_bin_path().map(Path::to_path_buf),
        )?;

        let inspector = PgSchemaInspector::new(pool);
        let rows = PgRowSource::new(pool);
        let runner = SystemCommandRunner;
        let mut generator = SeedGenerator::new(
            &inspector,
            &rows,
            &runner,
            connection.get_connection_config(),
            &options,
        );

        println!("\nBeginning Seed Generation:");

        let mut failed = 0;
        for table in &self.tables {
            match generator.generate(table).await {
                Ok(artifact) => Self::report_success(&artifact),
                Err(e) => {
                    if Self::report_failure(table, e) {
                        failed += 1;
                    }
                }
            }
        }

        if failed != 0 {
            bail!("{} of {} table(s) could not be seeded", failed, self.tables.len());
        }

        Ok(())
    }
}
