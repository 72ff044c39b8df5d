use anyhow::{Context, Result};
use clap::Parser;
use paperharvest::{
    cli::Cli,
    config::{HarvestConfig, VenueRegistry},
    harvest::Harvester,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config = HarvestConfig::from_env()?;
    let plan = cli.plan(&VenueRegistry::builtin(), config)?;

    let mut harvester = Harvester::from_plan(&plan).context("failed to set up the http client")?;
    harvester
        .run(&plan.scope)
        .await
        .context("failed to create the output table")?;

    println!("{}", harvester.summary());
    Ok(())
}

/// `RUST_LOG` wins; otherwise `--verbose` decides the level. Logs go to
/// stderr so the summary on stdout stays clean.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "paperharvest=debug"
    } else {
        "paperharvest=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
