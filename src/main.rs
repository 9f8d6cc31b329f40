use clap::Parser;

use seedling::{actions::init::USER_CONFIG_LOCATION, cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = cli::CliArgs::parse();

    if std::path::Path::new(USER_CONFIG_LOCATION).exists() {
        // If the user config file exists try read it and initialise the global variable
        seedling::config_file_manager::user_config::UserConfig::init(USER_CONFIG_LOCATION)?;
    }

    args.action.execute().await?;
    Ok(())
}
