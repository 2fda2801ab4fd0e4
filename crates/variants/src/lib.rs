//! Interface variants: the closed set of variants, the persisted choice
//! between them, and the selector and switcher that change it.

mod host;
mod preference;
mod selector;
mod switcher;
mod variant;
mod views;

pub use host::{MountedVariant, VariantHost};
pub use preference::{
    FileStore, MemoryStore, Preference, PreferenceError, PreferenceStore, PREFERENCE_FILE,
    PREFERENCE_KEY,
};
pub use selector::VariantSelector;
pub use switcher::{SwitchOption, SwitchOutcome, VariantSwitcher};
pub use variant::{catalog, Variant, VariantInfo};
pub use views::{CreatorView, MessengerView, Rendered, VariantView};
