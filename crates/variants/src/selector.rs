use tracing::{info, warn};

use crate::preference::PreferenceStore;
use crate::variant::{catalog, Variant, VariantInfo};

/// First-run chooser, shown when no preference exists at boot completion.
#[derive(Debug, Default)]
pub struct VariantSelector {
    visible: bool,
}

impl VariantSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn options(&self) -> &'static [VariantInfo] {
        catalog()
    }

    /// Stores the choice and hides the selector. A failed write is logged
    /// and the choice still applies for this run.
    pub fn choose<S: PreferenceStore + ?Sized>(&mut self, variant: Variant, store: &S) -> Variant {
        if let Err(err) = store.set(variant) {
            warn!(error = %err, variant = variant.id(), "failed to persist variant choice");
        }
        self.visible = false;
        info!(variant = variant.id(), "variant selected");
        variant
    }
}
