use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use colored::Colorize;

use crate::actions::Action;
use crate::config_file_manager::user_config::UserConfig;
use crate::seed_generator::{
    seeder_registry::{DEFAULT_DATABASE_SEEDER, REGISTRY_FILE},
    stub_renderer::{DEFAULT_DUMP_STUB, DEFAULT_INLINE_STUB, DUMP_STUB_FILE, INLINE_STUB_FILE},
};

pub const ENV_LOCATION: &str = "./.seedling/.env";
pub const USER_CONFIG_LOCATION: &str = "./.seedling/user_config.yaml";
pub const STUB_LOCATION: &str = "./.seedling/stubs";

#[derive(Debug, Args)]
pub struct Init {}

impl Init {
    /// Writes `contents` to `path` unless something is already there.
    fn create_file(path: &Path, contents: &str) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, contents)?;
            println!("\tCreated file: {}", path.display().to_string().bold());
        }
        Ok(())
    }

    fn create_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
            println!("\tCreated directory: {}", path.display().to_string().bold());
        }
        Ok(())
    }

    pub fn init_directories(&self) -> Result<()> {
        colored::control::set_override(true);
        Self::init_directories_in(Path::new("."))
    }

    fn init_directories_in(root: &Path) -> Result<()> {
        let stub_dir = root.join(STUB_LOCATION);
        Self::create_dir(&stub_dir)?;

        // Create the .env file for db config info
        Self::create_file(
            &root.join(ENV_LOCATION),
            "DB_USER=****\nDB_PASSWORD=****\nDB_HOST=****\nDB_PORT=****\nDB_NAME=****\n\n#PG_BIN_PATH=****",
        )?;

        let mut user_config = UserConfig::default();
        user_config.seed_options.stub_path = Some(STUB_LOCATION.into());
        Self::create_file(
            &root.join(USER_CONFIG_LOCATION),
            &serde_yaml::to_string(&user_config)?,
        )?;

        // Stubs are copied out so they can be edited per project
        Self::create_file(&stub_dir.join(INLINE_STUB_FILE), DEFAULT_INLINE_STUB)?;
        Self::create_file(&stub_dir.join(DUMP_STUB_FILE), DEFAULT_DUMP_STUB)?;

        let seed_path = root.join(&user_config.seed_options.seed_path);
        Self::create_dir(&seed_path)?;
        Self::create_file(&seed_path.join(REGISTRY_FILE), DEFAULT_DATABASE_SEEDER)?;

        Ok(())
    }
}

#[async_trait]
impl Action for Init {
    async fn execute(&self) -> Result<()> {
        println!("\nInitialising the seedling config and creating template .env file...");
        self.init_directories()?;
        println!("Finished initialisation\n");

        Ok(())
    }
}
