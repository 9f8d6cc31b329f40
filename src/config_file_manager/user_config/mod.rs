use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::seed_generator::{
    dump_exporter::DumpTools, seed_formatter::DEFAULT_CHUNK_SIZE, stub_renderer::Stubs,
    GeneratorOptions, DEFAULT_DUMP_THRESHOLD,
};

static USER_CONFIG: OnceLock<UserConfig> = OnceLock::new();

pub const DEFAULT_SEED_PATH: &str = "./database/seeds";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedOptions {
    #[serde(default = "default_seed_path")]
    pub seed_path: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_dump_threshold")]
    pub dump_threshold: u64,
    /// Directory holding seed.stub and seed_dump.stub overrides
    #[serde(default)]
    pub stub_path: Option<PathBuf>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            seed_path: default_seed_path(),
            chunk_size: default_chunk_size(),
            dump_threshold: default_dump_threshold(),
            stub_path: None,
        }
    }
}

fn default_seed_path() -> PathBuf {
    PathBuf::from(DEFAULT_SEED_PATH)
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_dump_threshold() -> u64 {
    DEFAULT_DUMP_THRESHOLD
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserConfig {
    #[serde(default)]
    pub seed_options: SeedOptions,
}

impl UserConfig {
    pub fn init(file_path: &str) -> Result<()> {
        let user_config = serde_yaml::from_str(
            &std::fs::read_to_string(file_path)
                .with_context(|| format!("Could not read the user config at {}", file_path))?,
        )
        .with_context(|| format!("The user config at {} is not valid", file_path))?;

        USER_CONFIG
            .set(user_config)
            .expect("This should only be called by one thread in this application");

        Ok(())
    }

    pub fn get_global() -> Result<&'static UserConfig> {
        return USER_CONFIG
            .get()
            .context("User Config must be set before this variable can be used");
    }

    /// Builds the generator options, `chunk_size` overrides the configured value when given.
    pub fn generator_options(
        &self,
        chunk_size: Option<usize>,
        pg_dump: Option<PathBuf>,
    ) -> Result<GeneratorOptions> {
        let seed_options = &self.seed_options;
        let stubs = Stubs::load(seed_options.stub_path.as_deref()).with_context(|| {
            format!("Could not read the stubs in {:?}", seed_options.stub_path)
        })?;

        Ok(GeneratorOptions {
            seed_path: seed_options.seed_path.clone(),
            chunk_size: chunk_size.unwrap_or(seed_options.chunk_size),
            dump_threshold: seed_options.dump_threshold,
            stubs,
            tools: DumpTools {
                pg_dump,
                compressor: None,
            },
        })
    }
}
