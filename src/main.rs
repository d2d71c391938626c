use clap::Parser;
use tracing_subscriber::EnvFilter;

use genefam::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("genefam=debug,info")
    } else {
        EnvFilter::new("genefam=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = cli.load_config()?;

    match cli.command {
        cli::Commands::Merge(args) => {
            cli::merge::run(args, &config, cli.format)?;
        }
        cli::Commands::Validate(args) => {
            cli::validate::run(args, &config, cli.format)?;
        }
        cli::Commands::Export(args) => {
            cli::export::run(args, &config, cli.format)?;
        }
        cli::Commands::List(args) => {
            cli::list::run(args, &config, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
