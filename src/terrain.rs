//! Terrain vocabulary shared by bulletin regions and couloirs.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Compass octant a slope faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Aspect {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Aspect {
    pub const ALL: [Aspect; 8] = [
        Aspect::N,
        Aspect::NE,
        Aspect::E,
        Aspect::SE,
        Aspect::S,
        Aspect::SW,
        Aspect::W,
        Aspect::NW,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aspect::N => "N",
            Aspect::NE => "NE",
            Aspect::E => "E",
            Aspect::SE => "SE",
            Aspect::S => "S",
            Aspect::SW => "SW",
            Aspect::W => "W",
            Aspect::NW => "NW",
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Aspect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Aspect::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == upper)
            .ok_or_else(|| format!("unknown aspect: {:?}", s))
    }
}

/// Aspects a bulletin rating applies to.
///
/// `Unspecified` means the rating applies to every aspect. An explicit but
/// empty set carries no information either and behaves the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectSet {
    #[default]
    Unspecified,
    Only(BTreeSet<Aspect>),
}

impl AspectSet {
    pub fn only<I: IntoIterator<Item = Aspect>>(aspects: I) -> Self {
        AspectSet::Only(aspects.into_iter().collect())
    }

    /// Whether the set names specific aspects.
    pub fn is_specific(&self) -> bool {
        matches!(self, AspectSet::Only(set) if !set.is_empty())
    }

    /// Whether the rating applies to `aspect`.
    pub fn covers(&self, aspect: Aspect) -> bool {
        match self {
            AspectSet::Only(set) if !set.is_empty() => set.contains(&aspect),
            _ => true,
        }
    }
}

impl fmt::Display for AspectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectSet::Only(set) if !set.is_empty() => {
                let names: Vec<&str> = set.iter().map(Aspect::as_str).collect();
                write!(f, "{}", names.join(", "))
            }
            _ => write!(f, "unspecified"),
        }
    }
}

/// Elevation band of a bulletin rating, in meters.
///
/// `upper_bound` is the hazard threshold: terrain reaching above it is
/// affected by the rating. Either bound may be absent (unbounded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElevationBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<i32>,
}

impl ElevationBand {
    pub fn new(upper_bound: Option<i32>, lower_bound: Option<i32>) -> Self {
        Self {
            upper_bound,
            lower_bound,
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether terrain topping out at `elevation_max` stays below the
    /// hazard threshold. Always false without a threshold.
    pub fn tops_out_below(&self, elevation_max: i32) -> bool {
        self.upper_bound.map_or(false, |bound| elevation_max < bound)
    }
}
