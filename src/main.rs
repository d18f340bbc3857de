use anyhow::Context;
use clap::Parser;
use sales_ledger::{run, write::write_ranking, Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Apply a transaction file to the sales representatives' running balances and
/// write the territory totals.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of representative and territory ids (1..=COUNT)
    count: u32,
    /// Representative balance file, updated in place
    representatives: PathBuf,
    /// Transaction file
    transactions: PathBuf,
    /// Territory totals file, overwritten
    territories: PathBuf,
    /// Print the representatives, lowest balance first, as CSV on stdout
    #[arg(long)]
    ranking: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config {
        count: args.count,
        representatives: args.representatives,
        transactions: args.transactions,
        territories: args.territories,
    };
    let (registry, _) = run(&config).with_context(|| {
        format!(
            "failed to apply {} to {}",
            config.transactions.display(),
            config.representatives.display()
        )
    })?;

    if args.ranking {
        write_ranking(std::io::stdout().lock(), &registry)?;
    }
    Ok(())
}
