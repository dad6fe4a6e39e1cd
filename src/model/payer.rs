use serde::{Deserialize, Serialize};

/// One of the two people sharing expenses.
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
pub enum Payer {
    #[default]
    Tai,
    Thach,
}

serde_plain::derive_display_from_serialize!(Payer);
serde_plain::derive_fromstr_from_deserialize!(Payer);

impl Payer {
    pub const ALL: [Payer; 2] = [Payer::Tai, Payer::Thach];

    /// The person's name as it is shown to people.
    pub fn name(&self) -> &'static str {
        match self {
            Payer::Tai => "Tài",
            Payer::Thach => "Thạch",
        }
    }

    /// The other person.
    pub fn other(&self) -> Payer {
        match self {
            Payer::Tai => Payer::Thach,
            Payer::Thach => Payer::Tai,
        }
    }
}
