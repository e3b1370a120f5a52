mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;

    match command {
        // Config commands don't need a store
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "keyline", &mut std::io::stdout());
            Ok(())
        }

        Command::Serve(args) => {
            let cfg = config::load_config()?;
            commands::serve::handle(args, &cfg, &global).await
        }

        Command::License(args) => {
            let cfg = config::load_config()?;
            let store = commands::util::open_store(&config::resolve_store_config(&global, &cfg)?)?;
            tracing::debug!(command = ?args.command, "dispatching license command");
            commands::license::handle(store, args, &global).await
        }

        Command::Quota(args) => {
            let cfg = config::load_config()?;
            let store = commands::util::open_store(&config::resolve_store_config(&global, &cfg)?)?;
            tracing::debug!(command = ?args.command, "dispatching quota command");
            commands::quota::handle(store, args, &cfg, &global).await
        }
    }
}
