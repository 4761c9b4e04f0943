//! Loads the sample configuration item from a live vault.
//!
//! ```text
//! OP_SERVICE_ACCOUNT_TOKEN=... cargo run -p load-config -- --vault "REPO assetlife-api"
//! ```

#![allow(non_snake_case)]

use anyhow::{Context, Result};
use clap::Parser;
use configator::prelude::*;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "load-config", version)]
struct Cli {
    /// Vault holding the configuration item.
    #[arg(long, env = "CONFIGATOR_VAULT")]
    vault: String,

    /// Configuration item title.
    #[arg(long, default_value = "configator-test")]
    item: String,

    /// Print the untyped values as JSON instead of the typed struct.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Schema)]
struct App {
    a_string: String,
    an_integer: i64,
    a_reference: String,
}

#[derive(Debug, Schema)]
struct Env {
    debug: bool,
}

#[derive(Debug, Schema)]
struct TestConfig {
    APP: App,
    ENV: Env,
    #[schema(default = "overridden_default_value")]
    NO_SECTION: String,
    #[schema(default = "default_value")]
    defval: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    configator::telemetry::init()?;
    let cli = Cli::parse();

    let settings = ClientSettings::from_env().context("reading client settings")?;
    let hydrator = Hydrator::new(settings.build_client()?);
    info!(backend = settings.backend().name(), vault = %cli.vault, item = %cli.item, "loading configuration");

    if cli.json {
        let values = hydrator
            .load_values(&TestConfig::descriptor(), &cli.vault, &cli.item)
            .await?;
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        let config: TestConfig = hydrator.load(&cli.vault, &cli.item).await?;
        println!("{config:#?}");
    }
    Ok(())
}
