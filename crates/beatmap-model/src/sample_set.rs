use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BeatmapError;

/// Sample bank used for a hitsound. `Auto` defers to the governing control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleSet {
    #[default]
    Auto = 0,
    Normal = 1,
    Soft = 2,
    Drum = 3,
}

impl SampleSet {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Result<Self, BeatmapError> {
        match id {
            0 => Ok(Self::Auto),
            1 => Ok(Self::Normal),
            2 => Ok(Self::Soft),
            3 => Ok(Self::Drum),
            other => Err(BeatmapError::UnknownSampleSet(other)),
        }
    }
}

impl FromStr for SampleSet {
    type Err = BeatmapError;

    /// Accepts either the variant name or its numeric id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token {
            "Auto" => Ok(Self::Auto),
            "Normal" => Ok(Self::Normal),
            "Soft" => Ok(Self::Soft),
            "Drum" => Ok(Self::Drum),
            _ => {
                let id = token
                    .parse::<i32>()
                    .map_err(|_| BeatmapError::InvalidSampleSet(token.to_string()))?;
                Self::from_id(id)
            }
        }
    }
}

impl fmt::Display for SampleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
