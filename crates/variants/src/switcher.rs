use tracing::{info, warn};

use crate::preference::PreferenceStore;
use crate::variant::{catalog, Variant, VariantInfo};

/// Result of picking an entry in the switcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The active variant was picked; nothing was written.
    Unchanged,
    /// A different variant was stored; the experience must restart.
    Reinitialize(Variant),
}

/// One row of the switcher's option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchOption {
    pub info: &'static VariantInfo,
    pub variant: Variant,
    /// The active variant is shown but cannot be picked, unless the stored
    /// value needs repairing.
    pub disabled: bool,
}

/// Control for changing the variant after one is mounted.
#[derive(Debug)]
pub struct VariantSwitcher {
    active: Variant,
    open: bool,
    repair: bool,
}

impl VariantSwitcher {
    pub fn new(active: Variant) -> Self {
        Self {
            active,
            open: false,
            repair: false,
        }
    }

    /// Switcher for a fallback variant mounted because the stored value was
    /// unrecognised. Picking the active variant stores it.
    pub fn repairing(active: Variant) -> Self {
        Self {
            repair: true,
            ..Self::new(active)
        }
    }

    pub fn needs_repair(&self) -> bool {
        self.repair
    }

    pub fn active(&self) -> Variant {
        self.active
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn options(&self) -> Vec<SwitchOption> {
        catalog()
            .iter()
            .filter_map(|info| Variant::from_id(info.id).map(|variant| (info, variant)))
            .map(|(info, variant)| SwitchOption {
                info,
                variant,
                disabled: variant == self.active && !self.repair,
            })
            .collect()
    }

    /// Picks `variant`. The switcher closes either way.
    pub fn choose<S: PreferenceStore + ?Sized>(
        &mut self,
        variant: Variant,
        store: &S,
    ) -> SwitchOutcome {
        self.open = false;
        if variant == self.active {
            if self.repair {
                match store.set(variant) {
                    Ok(()) => {
                        self.repair = false;
                        info!(variant = variant.id(), "replaced unrecognised stored variant");
                    }
                    Err(err) => {
                        warn!(error = %err, variant = variant.id(), "failed to repair stored variant")
                    }
                }
            }
            return SwitchOutcome::Unchanged;
        }
        if let Err(err) = store.set(variant) {
            warn!(error = %err, variant = variant.id(), "failed to persist variant switch");
        }
        info!(from = self.active.id(), to = variant.id(), "switching variant");
        SwitchOutcome::Reinitialize(variant)
    }
}
