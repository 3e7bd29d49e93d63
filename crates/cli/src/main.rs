use clap::{Parser, Subcommand};
use spread_watch_core::DEFAULT_CONFIG_PATH;

mod commands;

use commands::{NotionalArgs, RunArgs, UniverseArgs};

#[derive(Parser)]
#[command(name = "spread-watch")]
#[command(about = "Samples Binance bid/ask spreads and exports their change to Prometheus", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, env = "SPREAD_WATCH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select symbols, print one-shot reports, then sample spreads and serve metrics
    Run(RunArgs),
    /// Print the top symbols of a quote asset ranked by a 24h ticker field
    TopSymbols(UniverseArgs),
    /// Print order book notional totals for the top symbols of a quote asset
    Notional(NotionalArgs),
    /// Print the current bid/ask spread of the top symbols of a quote asset
    Spreads(UniverseArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run_pipeline(&cli.config, args).await?,
        Commands::TopSymbols(args) => commands::run_top_symbols(&cli.config, args).await?,
        Commands::Notional(args) => commands::run_notional(&cli.config, args).await?,
        Commands::Spreads(args) => commands::run_spreads(&cli.config, args).await?,
    }

    Ok(())
}

fn init_logging(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use spread_watch_core::RankField;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "spread-watch",
            "--config",
            "custom.toml",
            "run",
            "--metrics-port",
            "9100",
            "--interval-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.config, "custom.toml");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.metrics_port, Some(9100));
                assert_eq!(args.interval_secs, Some(5));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_top_symbols() {
        let cli = Cli::try_parse_from([
            "spread-watch",
            "top-symbols",
            "--asset",
            "BTC",
            "--rank-by",
            "quoteVolume",
            "--count",
            "3",
            "--log-file",
            "out.log",
        ])
        .unwrap();

        assert_eq!(cli.log_file.as_deref(), Some("out.log"));
        match cli.command {
            Commands::TopSymbols(args) => {
                assert_eq!(args.asset.as_deref(), Some("BTC"));
                assert_eq!(args.rank_by, Some(RankField::QuoteVolume));
                assert_eq!(args.count, Some(3));
            }
            _ => panic!("expected top-symbols"),
        }
    }

    #[test]
    fn test_parse_notional_levels() {
        let cli = Cli::try_parse_from(["spread-watch", "notional", "--levels", "50"]).unwrap();
        match cli.command {
            Commands::Notional(args) => {
                assert_eq!(args.levels, Some(50));
                assert!(args.universe.asset.is_none());
            }
            _ => panic!("expected notional"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_rank_field() {
        let result = Cli::try_parse_from(["spread-watch", "spreads", "--rank-by", "price"]);
        assert!(result.is_err());
    }
}
