mod auth;
mod cli;
mod client;
mod commands;
mod config;
mod error;
mod formatter;
mod normalize;
mod output;
mod paths;
mod responses;
#[cfg(test)]
mod test_support;
mod types;
mod writer;

use std::error::Error;
use std::io;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use client::Endpoints;
use commands::get::GetRun;
use config::{Config, Mode};
use error::Result;
use formatter::FormatterRegistry;
use paths::Layout;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");

        if verbose {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("Caused by: {cause}");
                source = cause.source();
            }
        }

        std::process::exit(1);
    }
}

/// Log to stderr at info (debug with --verbose); RUST_LOG overrides.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={level}", env!("CARGO_CRATE_NAME"))));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    output::set_json_output(cli.json);

    let layout = Layout::new(cli.src_dir.clone(), cli.output_dir.clone());

    match &cli.command {
        // Commands that don't need the options files
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "release-notes", &mut io::stdout());
        }
        Commands::Show { file } => {
            commands::show::run(file)?;
        }
        Commands::Init => {
            let opts_dir = Config::opts_dir(cli.opts_dir.clone())?;
            commands::init::run(&opts_dir)?;
        }
        // Commands that need the merged options and credentials
        Commands::Get(args) => {
            let opts_dir = Config::opts_dir(cli.opts_dir.clone())?;
            let config = Config::load(cli.options(Mode::Get, None), &opts_dir)?;
            let get = GetRun {
                local: args.local,
                port: args.port,
                endpoints: Endpoints::default(),
            };
            commands::get::run(&config, &layout, get).await?;
        }
        Commands::Make(args) => {
            let opts_dir = Config::opts_dir(cli.opts_dir.clone())?;
            let config = Config::load(cli.options(Mode::Make, Some(args.file.clone())), &opts_dir)?;
            commands::make::run(&config.options, &layout, &FormatterRegistry::default()).await?;
        }
    }

    Ok(())
}
