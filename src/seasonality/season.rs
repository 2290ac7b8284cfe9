use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::ParamsError;

/// A named three-month bucket used to restrict the sales table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Season {
    /// No restriction.
    #[default]
    All,
    Winter,
    Spring,
    Summer,
    Autumn,
}

const WINTER_MONTHS: [u32; 3] = [12, 1, 2];
const SPRING_MONTHS: [u32; 3] = [3, 4, 5];
const SUMMER_MONTHS: [u32; 3] = [6, 7, 8];
const AUTUMN_MONTHS: [u32; 3] = [9, 10, 11];

impl Season {
    /// Every season, in the order a selection list presents them.
    pub const VARIANTS: [Season; 5] = [
        Season::All,
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Autumn,
    ];

    /// Calendar month numbers in the season. `None` for [`Season::All`].
    pub fn months(self) -> Option<&'static [u32; 3]> {
        match self {
            Season::All => None,
            Season::Winter => Some(&WINTER_MONTHS),
            Season::Spring => Some(&SPRING_MONTHS),
            Season::Summer => Some(&SUMMER_MONTHS),
            Season::Autumn => Some(&AUTUMN_MONTHS),
        }
    }

    /// Whether a calendar month number (1-12) falls in the season.
    pub fn contains(self, month: u32) -> bool {
        self.months().map_or(true, |months| months.contains(&month))
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::All => "All",
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Season {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::VARIANTS
            .into_iter()
            .find(|season| season.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParamsError::UnknownSeason(s.to_string()))
    }
}
