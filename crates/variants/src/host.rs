use tracing::{info, warn};

use crate::preference::Preference;
use crate::variant::Variant;
use crate::views::{CreatorView, MessengerView, Rendered, VariantView};

/// The active variant's renderable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountedVariant {
    Messenger(MessengerView),
    Creator(CreatorView),
}

impl MountedVariant {
    pub fn variant(&self) -> Variant {
        match self {
            MountedVariant::Messenger(view) => view.variant(),
            MountedVariant::Creator(view) => view.variant(),
        }
    }

    pub fn render(&self) -> Rendered {
        match self {
            MountedVariant::Messenger(view) => view.render(),
            MountedVariant::Creator(view) => view.render(),
        }
    }
}

/// Maps a preference to the variant that should be shown.
pub struct VariantHost;

impl VariantHost {
    /// Unrecognised values fall back to [`Variant::DEFAULT`].
    pub fn resolve(preference: &Preference) -> Variant {
        match preference {
            Preference::Known(variant) => *variant,
            Preference::Unrecognized(raw) => {
                warn!(
                    value = %raw,
                    fallback = Variant::DEFAULT.id(),
                    "unrecognised interface variant; using default"
                );
                Variant::DEFAULT
            }
        }
    }

    pub fn mount(preference: &Preference) -> MountedVariant {
        let variant = Self::resolve(preference);
        info!(variant = variant.id(), name = variant.info().display_name, "mounting variant");
        match variant {
            Variant::Messenger => MountedVariant::Messenger(MessengerView::new()),
            Variant::Creator => MountedVariant::Creator(CreatorView::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_preferences_mount_their_variant() {
        for variant in Variant::ALL {
            let mounted = VariantHost::mount(&Preference::Known(variant));
            assert_eq!(mounted.variant(), variant);
            assert!(mounted.render().title.contains(variant.info().display_name));
        }
    }

    #[test]
    fn unrecognized_preference_falls_back_to_default() {
        let mounted = VariantHost::mount(&Preference::Unrecognized("0.9.0".into()));
        assert_eq!(mounted.variant(), Variant::DEFAULT);
    }
}
