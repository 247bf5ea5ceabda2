//! CLI entry point - the composition root.
//!
//! Host adapters are wired together in [`HostContext`]; command dispatch
//! routes to handlers which only see the core ports.

use clap::Parser;
use probeconf_cli::error::exit_code_for;
use probeconf_cli::{Cli, Commands, HostContext, handlers, load_options, logging, split_configure_args};
use probeconf_runtime::HostFileSystem;
use tracing::debug;

fn run(cli: &Cli, package_args: &[String]) -> anyhow::Result<()> {
    let options = load_options(cli, package_args)?;

    match &cli.command {
        Commands::Configure {
            output_dir,
            packages,
            json,
        } => {
            let packages = handlers::select_packages(packages)?;
            let host = HostContext::new(&options)?;
            let configurator = host.configurator(&options);
            handlers::handle_configure(&configurator, &packages, output_dir, *json)?;
        }
        Commands::List => handlers::handle_list(),
        Commands::Candidates { package } => {
            handlers::handle_candidates(package, &options, &HostFileSystem::new())?;
        }
        Commands::Dump => handlers::handle_dump(&options)?,
    }
    Ok(())
}

fn main() {
    // Load .env before clap reads environment-backed flags
    dotenvy::dotenv().ok();

    let (cli_args, package_args) = split_configure_args(std::env::args());
    let cli = Cli::parse_from(cli_args);
    let guard = logging::init_tracing(cli.verbose, cli.command.log_dir());
    debug!(?package_args, "Starting probeconf");

    let result = run(&cli, &package_args);
    // Flush configure.log before exiting
    drop(guard);

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}
