use anyhow::{Context, Result};
use serde::Serialize;
use variants::{FileStore, Preference, PreferenceStore, Variant, VariantInfo};

use crate::cli::PreferenceAction;
use crate::paths::AppPaths;

pub fn preference(paths: &AppPaths, action: PreferenceAction) -> Result<()> {
    let store = FileStore::new(paths.preference_file());
    match action {
        PreferenceAction::Show => {
            match store.get() {
                None => println!("no interface variant stored"),
                Some(Preference::Known(variant)) => match store.updated_at() {
                    Some(updated) => println!("{variant} (updated {})", updated.to_rfc3339()),
                    None => println!("{variant}"),
                },
                Some(Preference::Unrecognized(raw)) => {
                    println!("unrecognised value '{raw}' (the default variant will be used)")
                }
            }
            Ok(())
        }
        PreferenceAction::Set { variant } => {
            store.set(variant).with_context(|| {
                format!("failed to store preference at {}", store.path().display())
            })?;
            println!("stored {variant}");
            Ok(())
        }
        PreferenceAction::Clear => {
            store.clear().with_context(|| {
                format!("failed to clear preference at {}", store.path().display())
            })?;
            println!("cleared stored interface variant");
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct CatalogReport<'a> {
    default: &'static str,
    variants: &'a [VariantInfo],
}

pub fn catalog(json: bool) -> Result<()> {
    let entries = variants::catalog();
    if json {
        let report = CatalogReport {
            default: Variant::DEFAULT.id(),
            variants: entries,
        };
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialise catalog")?;
        println!("{rendered}");
        return Ok(());
    }

    for info in entries {
        println!(
            "{:<7} {} {:<14} {}",
            info.id, info.glyph, info.display_name, info.description
        );
    }
    Ok(())
}

pub fn print_paths(paths: &AppPaths) -> Result<()> {
    println!("config:      {}", paths.config_dir().display());
    println!("data:        {}", paths.data_dir().display());
    println!("cache:       {}", paths.cache_dir().display());
    println!("config file: {}", paths.config_file().display());
    println!("preference:  {}", paths.preference_file().display());
    Ok(())
}
