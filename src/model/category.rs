use serde::{Deserialize, Serialize};

/// The fixed set of expense categories.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Food,
    Shopping,
    Entertainment,
    Bills,
    Other,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Shopping,
        Category::Entertainment,
        Category::Bills,
        Category::Other,
    ];

    /// The human-readable label, as shown in messages and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Other => "Other",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Food => "🍔",
            Category::Shopping => "🛍️",
            Category::Entertainment => "🎮",
            Category::Bills => "💡",
            Category::Other => "❓",
        }
    }
}
