use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bucket edges; bucket `i` covers `POPULATION_BINS[i] <= population < POPULATION_BINS[i + 1]`.
pub const POPULATION_BINS: [u64; 7] = [
    0,
    1_000_000,
    10_000_000,
    50_000_000,
    100_000_000,
    1_000_000_000,
    20_000_000_000,
];

/// Population size class of a location.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum CountrySize {
    #[serde(rename = "Very small")]
    VerySmall,
    #[serde(rename = "Small")]
    Small,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Large")]
    Large,
    #[serde(rename = "Very Large")]
    VeryLarge,
    #[serde(rename = "Extra Large")]
    ExtraLarge,
}

impl CountrySize {
    /// All buckets in increasing order.
    pub const ALL: [CountrySize; 6] = [
        CountrySize::VerySmall,
        CountrySize::Small,
        CountrySize::Medium,
        CountrySize::Large,
        CountrySize::VeryLarge,
        CountrySize::ExtraLarge,
    ];

    /// Bin a population. `None` for a null population or one at/above the last edge.
    pub fn from_population(population: Option<u64>) -> Option<CountrySize> {
        let population = population?;
        POPULATION_BINS
            .windows(2)
            .position(|edges| edges[0] <= population && population < edges[1])
            .map(|index| CountrySize::ALL[index])
    }

    pub fn label(&self) -> &'static str {
        match self {
            CountrySize::VerySmall => "Very small",
            CountrySize::Small => "Small",
            CountrySize::Medium => "Medium",
            CountrySize::Large => "Large",
            CountrySize::VeryLarge => "Very Large",
            CountrySize::ExtraLarge => "Extra Large",
        }
    }

    /// Human-readable range shown next to the filter checkbox.
    pub fn range_hint(&self) -> &'static str {
        match self {
            CountrySize::VerySmall => "<1M",
            CountrySize::Small => "1M-10M",
            CountrySize::Medium => "10M-50M",
            CountrySize::Large => "50M-100M",
            CountrySize::VeryLarge => "100M-1B",
            CountrySize::ExtraLarge => ">1B",
        }
    }
}

impl fmt::Display for CountrySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CountrySize {
    type Err = String;

    /// Accepts the label ("Very Large") or a kebab-case form ("very-large").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', " ");
        CountrySize::ALL
            .iter()
            .find(|size| size.label().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| format!("unknown country size: {s}"))
    }
}
