use std::rc::Rc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{open_store, prepare};
use crate::cli::{Cli, Command, RunArgs};
use crate::commands;
use crate::headless;
use crate::paths::AppPaths;
use crate::window;

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    match cli.command {
        Some(Command::Preference(command)) => commands::preference(&paths, command.action),
        Some(Command::Catalog { json }) => commands::catalog(json),
        Some(Command::Where) => commands::print_paths(&paths),
        None => run_experience(&paths, &cli.run),
    }
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_experience(paths: &AppPaths, args: &RunArgs) -> Result<()> {
    let bootstrap = prepare(paths, args)?;
    let store = Rc::new(open_store(paths, args.ephemeral));
    tracing::info!(
        asset = %bootstrap.asset,
        size = ?bootstrap.surface_size,
        headless = args.headless,
        ephemeral = args.ephemeral,
        "starting vistaboot"
    );

    if args.headless {
        headless::run(&bootstrap, store, args)
    } else {
        if args.select.is_some() || args.switch.is_some() {
            tracing::warn!("--select and --switch only apply to --headless runs; ignoring");
        }
        window::run(&bootstrap, store)
    }
}
