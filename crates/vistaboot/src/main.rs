mod bootstrap;
mod cli;
mod commands;
mod headless;
mod paths;
mod run;
mod session;
mod window;

use anyhow::Result;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::run(cli)
}
