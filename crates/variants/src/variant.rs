use std::fmt;

use serde::Serialize;

/// The mutually exclusive interface variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    Messenger,
    Creator,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Messenger, Variant::Creator];
    pub const DEFAULT: Variant = Variant::Messenger;

    pub fn id(self) -> &'static str {
        match self {
            Variant::Messenger => "1.0.0",
            Variant::Creator => "1.0.1",
        }
    }

    pub fn from_id(id: &str) -> Option<Variant> {
        Variant::ALL
            .into_iter()
            .find(|variant| variant.id() == id.trim())
    }

    pub fn info(self) -> &'static VariantInfo {
        match self {
            Variant::Messenger => &CATALOG[0],
            Variant::Creator => &CATALOG[1],
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{})", self.info().display_name, self.id())
    }
}

/// Static descriptive metadata for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantInfo {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub glyph: &'static str,
}

static CATALOG: [VariantInfo; 2] = [
    VariantInfo {
        id: "1.0.0",
        display_name: "Messenger UI",
        description: "Interactive messenger interface with channels and direct messages",
        glyph: "💬",
    },
    VariantInfo {
        id: "1.0.1",
        display_name: "Creator UI",
        description: "Clean creator page with posts, tiers and supporters",
        glyph: "🎨",
    },
];

/// Every variant's metadata, in catalog order.
pub fn catalog() -> &'static [VariantInfo] {
    &CATALOG
}
