use anyhow::Result;
use clap::Parser;
use counsel::cli::{Cli, Commands};
use counsel::commands::{self, Output};
use counsel::config::AppConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = AppConfig::from_cli(&cli)?;
    let gateway = config.build_gateway()?;
    let out = Output::new(cli.quiet);

    match cli.command {
        Commands::Status => commands::handle_status(&gateway, &out).await?,
        Commands::Switch(args) => commands::handle_switch(args, &gateway, &out).await?,
        Commands::Chat(args) => commands::handle_chat(args, &gateway, &out).await?,
        Commands::Nda(args) => commands::handle_nda(args, &gateway, &out).await?,
        Commands::Redline(args) => commands::handle_redline(args, &gateway, &out).await?,
    }

    Ok(())
}

/// Logs go to stderr. `RUST_LOG` takes precedence over `-v`/`--quiet`.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::UtcTime::rfc_3339()),
        )
        .with(filter)
        .init();
}
