use serde::{Deserialize, Serialize};

use crate::sample_set::SampleSet;

const WHISTLE_BIT: i32 = 1 << 1;
const FINISH_BIT: i32 = 1 << 2;
const CLAP_BIT: i32 = 1 << 3;

/// Whistle/finish/clap additions layered on top of the hit normal sample.
///
/// Packed as a 4-bit mask: bit 0 is the implicit hit normal and is never
/// set, bit 1 whistle, bit 2 finish, bit 3 clap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Additions {
    pub whistle: bool,
    pub finish: bool,
    pub clap: bool,
}

impl Additions {
    pub const NONE: Self = Self {
        whistle: false,
        finish: false,
        clap: false,
    };

    pub fn to_mask(self) -> i32 {
        let mut mask = 0;
        if self.whistle {
            mask |= WHISTLE_BIT;
        }
        if self.finish {
            mask |= FINISH_BIT;
        }
        if self.clap {
            mask |= CLAP_BIT;
        }
        mask
    }

    /// Bit 0 and anything above bit 3 is ignored.
    pub fn from_mask(mask: i32) -> Self {
        Self {
            whistle: mask & WHISTLE_BIT != 0,
            finish: mask & FINISH_BIT != 0,
            clap: mask & CLAP_BIT != 0,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

/// A timed sound selection produced by one edge of a hit object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hitsound {
    /// Time in milliseconds
    pub time: f64,
    /// Sample set of the hit normal
    pub sample_set: SampleSet,
    /// Sample set of the additions
    pub addition_set: SampleSet,
    pub additions: Additions,
    /// Custom sample index, 0 meaning the governing control point's index
    pub custom_index: i32,
}

impl Hitsound {
    pub fn new(
        time: f64,
        sample_set: SampleSet,
        addition_set: SampleSet,
        additions: Additions,
        custom_index: i32,
    ) -> Self {
        Self {
            time,
            sample_set,
            addition_set,
            additions,
            custom_index,
        }
    }

    /// An edge that makes no sound of its own.
    pub fn silent(time: f64) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    pub fn to_mask(&self) -> i32 {
        self.additions.to_mask()
    }

    pub fn with_time(self, time: f64) -> Self {
        Self { time, ..self }
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn is_silent(&self) -> bool {
        self.sample_set == SampleSet::Auto
            && self.addition_set == SampleSet::Auto
            && self.additions.is_empty()
            && self.custom_index == 0
    }
}
