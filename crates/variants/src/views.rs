use crate::variant::Variant;

/// Text produced by a variant view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub title: String,
    pub lines: Vec<String>,
}

/// A self-contained interface variant.
pub trait VariantView {
    fn variant(&self) -> Variant;
    fn render(&self) -> Rendered;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessengerView {
    channels: Vec<&'static str>,
}

impl MessengerView {
    pub fn new() -> Self {
        Self {
            channels: vec!["# general", "# showcase", "# off-topic"],
        }
    }
}

impl VariantView for MessengerView {
    fn variant(&self) -> Variant {
        Variant::Messenger
    }

    fn render(&self) -> Rendered {
        let info = self.variant().info();
        let mut lines = vec!["Channels".to_string()];
        lines.extend(self.channels.iter().map(|channel| format!("  {channel}")));
        lines.push("Direct messages".to_string());
        Rendered {
            title: format!("{} {}", info.glyph, info.display_name),
            lines,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatorView {
    tiers: Vec<(&'static str, u32)>,
}

impl CreatorView {
    pub fn new() -> Self {
        Self {
            tiers: vec![("Supporter", 3), ("Patron", 10), ("Collector", 25)],
        }
    }
}

impl VariantView for CreatorView {
    fn variant(&self) -> Variant {
        Variant::Creator
    }

    fn render(&self) -> Rendered {
        let info = self.variant().info();
        let mut lines = vec!["Recent posts".to_string(), "Membership tiers".to_string()];
        lines.extend(
            self.tiers
                .iter()
                .map(|(name, price)| format!("  {name}: ${price}/month")),
        );
        Rendered {
            title: format!("{} {}", info.glyph, info.display_name),
            lines,
        }
    }
}
