//! Phase/neutral/secondary configurations of a bus.
//!
//! Bus phase configurations come from the network model as strings such as
//! `"ABCN"` or `"S1S2"`. Several spellings name the same configuration (`"CA"`
//! and `"AC"` are one two-phase configuration), so the enum only carries the
//! canonical values and the spellings live in [`PHASE_ALIASES`]. Feature
//! encoders size their one-hot blocks from [`PhaseType::ALL`], which keeps the
//! width equal to the number of distinct configurations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DsgError;

/// Canonical phase configuration of a bus.
///
/// Variant order is the one-hot slot order used by feature encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PhaseType {
    A,
    B,
    C,
    N,
    AN,
    BN,
    CN,
    AB,
    BC,
    AC,
    ABN,
    BCN,
    ACN,
    ABC,
    ABCN,
    S1,
    S2,
    S1S2,
    S1N,
    S2N,
    S1S2N,
}

/// Alternative spellings that resolve to an existing canonical configuration.
pub const PHASE_ALIASES: [(&str, PhaseType); 7] = [
    ("BA", PhaseType::AB),
    ("CB", PhaseType::BC),
    ("CA", PhaseType::AC),
    ("BAN", PhaseType::ABN),
    ("CBN", PhaseType::BCN),
    ("CAN", PhaseType::ACN),
    ("NA", PhaseType::AN),
];

impl PhaseType {
    pub const ALL: [PhaseType; 21] = [
        PhaseType::A,
        PhaseType::B,
        PhaseType::C,
        PhaseType::N,
        PhaseType::AN,
        PhaseType::BN,
        PhaseType::CN,
        PhaseType::AB,
        PhaseType::BC,
        PhaseType::AC,
        PhaseType::ABN,
        PhaseType::BCN,
        PhaseType::ACN,
        PhaseType::ABC,
        PhaseType::ABCN,
        PhaseType::S1,
        PhaseType::S2,
        PhaseType::S1S2,
        PhaseType::S1N,
        PhaseType::S2N,
        PhaseType::S1S2N,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseType::A => "A",
            PhaseType::B => "B",
            PhaseType::C => "C",
            PhaseType::N => "N",
            PhaseType::AN => "AN",
            PhaseType::BN => "BN",
            PhaseType::CN => "CN",
            PhaseType::AB => "AB",
            PhaseType::BC => "BC",
            PhaseType::AC => "AC",
            PhaseType::ABN => "ABN",
            PhaseType::BCN => "BCN",
            PhaseType::ACN => "ACN",
            PhaseType::ABC => "ABC",
            PhaseType::ABCN => "ABCN",
            PhaseType::S1 => "S1",
            PhaseType::S2 => "S2",
            PhaseType::S1S2 => "S1S2",
            PhaseType::S1N => "S1N",
            PhaseType::S2N => "S2N",
            PhaseType::S1S2N => "S1S2N",
        }
    }

    /// Resolve a declared configuration name, canonical or alias.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    pub fn from_name(name: &str) -> Option<PhaseType> {
        let key = name.trim().to_ascii_uppercase();
        PhaseType::ALL
            .iter()
            .copied()
            .find(|phase| phase.as_str() == key)
            .or_else(|| {
                PHASE_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == key)
                    .map(|(_, phase)| *phase)
            })
    }

    /// Whether the configuration carries a neutral conductor.
    pub fn has_neutral(&self) -> bool {
        self.as_str().ends_with('N')
    }

    /// Whether the configuration is a split-phase secondary.
    pub fn is_secondary(&self) -> bool {
        self.as_str().starts_with('S')
    }
}

impl fmt::Display for PhaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseType {
    type Err = DsgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseType::from_name(s).ok_or_else(|| DsgError::UnknownPhase(s.to_string()))
    }
}

impl TryFrom<String> for PhaseType {
    type Error = DsgError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhaseType> for String {
    fn from(phase: PhaseType) -> Self {
        phase.as_str().to_string()
    }
}
