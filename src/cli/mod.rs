use clap::{Parser, Subcommand};

use crate::actions::{init::Init, seed::Seed};
use crate::actions::Action as CliAction;

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Initialise the current directory. Creates the config files, editable stubs, the seed
    /// directory and a DatabaseSeeder.php to register seeders in.
    Init(Init),

    /// Generate seeders from the current contents of one or more tables, using the connection
    /// in ./.seedling/.env
    Seed(Seed),
}

impl Action {
    pub async fn execute(&self) -> anyhow::Result<()> {
        match self {
            Self::Init(init) => init.execute(),
            Self::Seed(seed) => seed.execute(),
        }
        .await?;

        return Ok(());
    }
}
