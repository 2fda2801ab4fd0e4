use std::path::PathBuf;

use clap::{Parser, Subcommand};
use variants::Variant;

#[derive(Parser, Debug)]
#[command(
    name = "vistaboot",
    author,
    version,
    about = "Panoramic boot experience with switchable interface variants"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Panorama image: a path (relative to the data directory) or an http(s) URL.
    #[arg(long, value_name = "PATH|URL", env = "VISTABOOT_ASSET")]
    pub asset: Option<String>,

    /// Configuration file to load instead of `<config_dir>/vistaboot.toml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value = "1280x720")]
    pub size: String,

    /// Run without a window, printing progress to the terminal.
    #[arg(long)]
    pub headless: bool,

    /// Keep the variant choice in memory only.
    #[arg(long)]
    pub ephemeral: bool,

    /// Headless only: variant to pick when the selector appears.
    #[arg(long, value_name = "ID", value_parser = parse_variant)]
    pub select: Option<Variant>,

    /// Headless only: switch to this variant once one is mounted.
    #[arg(long, value_name = "ID", value_parser = parse_variant)]
    pub switch: Option<Variant>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or change the stored interface variant.
    Preference(PreferenceCommand),
    /// List the available interface variants.
    Catalog {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print resolved directories and files.
    Where,
}

#[derive(Parser, Debug)]
pub struct PreferenceCommand {
    #[command(subcommand)]
    pub action: PreferenceAction,
}

#[derive(Subcommand, Debug)]
pub enum PreferenceAction {
    /// Print the stored variant.
    Show,
    /// Store a variant by id (e.g. `1.0.1`).
    Set {
        #[arg(value_name = "ID", value_parser = parse_variant)]
        variant: Variant,
    },
    /// Forget the stored variant so the selector appears on next run.
    Clear,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_variant(value: &str) -> Result<Variant, String> {
    Variant::from_id(value).ok_or_else(|| {
        let known: Vec<&str> = Variant::ALL.iter().map(|variant| variant.id()).collect();
        format!(
            "unknown variant '{}'; expected one of {}",
            value.trim(),
            known.join(", ")
        )
    })
}
