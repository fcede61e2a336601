use serde::{Deserialize, Serialize};

use crate::error::{BeatmapError, ParseError, TimingPointField};
use crate::format::{format_f64, format_rounded, parse_f64, parse_i32};
use crate::sample_set::SampleSet;
use crate::timing::Timing;

const KIAI_BIT: i32 = 1 << 0;
const OMIT_FIRST_BAR_LINE_BIT: i32 = 1 << 3;

/// Beat length of a greenline at 1.0x slider velocity.
const UNIT_SV_BEAT_LENGTH: f64 = -100.0;

/// A control point from the `[TimingPoints]` section.
///
/// Uninherited points (redlines) set tempo and meter; `beat_length` is the
/// duration of one beat in milliseconds. Inherited points (greenlines) only
/// change sample defaults, volume and kiai; their `beat_length` is a negative
/// inverse slider velocity percentage, so -50 means 2.0x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    /// Time in milliseconds at which the point takes effect
    pub offset: f64,
    pub beat_length: f64,
    /// Beats per measure
    pub meter: i32,
    pub sample_set: SampleSet,
    pub sample_index: i32,
    /// Volume percentage (0..=100)
    pub volume: f64,
    /// True for greenlines
    pub inherited: bool,
    pub kiai: bool,
    pub omit_first_bar_line: bool,
}

/// Field layout of a control point as read out of a running editor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPointMirror {
    pub beat_length: f64,
    pub offset: f64,
    pub custom_samples: i32,
    pub sample_set: i32,
    pub time_signature: i32,
    pub volume: f64,
    pub effect_flags: i32,
    /// True when the point changes tempo
    pub timing_change: bool,
}

impl Default for TimingPoint {
    fn default() -> Self {
        Self {
            offset: 0.0,
            beat_length: 500.0,
            meter: 4,
            sample_set: SampleSet::Normal,
            sample_index: 0,
            volume: 100.0,
            inherited: false,
            kiai: false,
            omit_first_bar_line: false,
        }
    }
}

impl TimingPoint {
    pub fn redline(offset: f64, beat_length: f64) -> Self {
        Self {
            offset,
            beat_length,
            ..Self::default()
        }
    }

    /// `beat_length` follows the negative percentage convention.
    pub fn greenline(offset: f64, beat_length: f64) -> Self {
        Self {
            offset,
            beat_length,
            inherited: true,
            ..Self::default()
        }
    }

    /// Parse an `offset,beat length,meter,sample set,sample index,volume,uninherited,style` line.
    ///
    /// The first column that fails to parse is reported. The uninherited
    /// column is a flag: `1` marks a redline, anything else a greenline.
    pub fn from_text(line: &str) -> Result<Self, ParseError> {
        use TimingPointField as F;

        let values: Vec<&str> = line.split(',').collect();
        let fail = |field: TimingPointField| ParseError {
            field,
            line: line.to_string(),
        };
        let column = |index: usize, field: TimingPointField| {
            values.get(index).copied().ok_or_else(|| fail(field))
        };

        let offset = parse_f64(column(0, F::Offset)?).ok_or_else(|| fail(F::Offset))?;
        let beat_length = parse_f64(column(1, F::BeatLength)?).ok_or_else(|| fail(F::BeatLength))?;
        let meter = parse_i32(column(2, F::Meter)?).ok_or_else(|| fail(F::Meter))?;
        let sample_set = column(3, F::SampleSet)?
            .parse::<SampleSet>()
            .map_err(|_| fail(F::SampleSet))?;
        let sample_index =
            parse_i32(column(4, F::SampleIndex)?).ok_or_else(|| fail(F::SampleIndex))?;
        let volume = parse_f64(column(5, F::Volume)?).ok_or_else(|| fail(F::Volume))?;
        let inherited = column(6, F::Uninherited)?.trim() != "1";
        let style = parse_i32(column(7, F::Style)?).ok_or_else(|| fail(F::Style))?;

        Ok(Self {
            offset,
            beat_length,
            meter,
            sample_set,
            sample_index,
            volume,
            inherited,
            kiai: style & KIAI_BIT != 0,
            omit_first_bar_line: style & OMIT_FIRST_BAR_LINE_BIT != 0,
        })
    }

    /// Inverse of [`TimingPoint::from_text`]. Offset and volume are rounded
    /// to whole numbers, every other column keeps full precision.
    pub fn to_text(&self) -> String {
        let mut style = 0;
        if self.kiai {
            style |= KIAI_BIT;
        }
        if self.omit_first_bar_line {
            style |= OMIT_FIRST_BAR_LINE_BIT;
        }
        format!(
            "{},{},{},{},{},{},{},{}",
            format_rounded(self.offset),
            format_f64(self.beat_length),
            self.meter,
            self.sample_set.id(),
            self.sample_index,
            format_rounded(self.volume),
            i32::from(!self.inherited),
            style
        )
    }

    pub fn from_external(mirror: &ControlPointMirror) -> Result<Self, BeatmapError> {
        Ok(Self {
            offset: mirror.offset,
            beat_length: mirror.beat_length,
            meter: mirror.time_signature,
            sample_set: SampleSet::from_id(mirror.sample_set)?,
            sample_index: mirror.custom_samples,
            volume: mirror.volume,
            inherited: !mirror.timing_change,
            kiai: mirror.effect_flags & KIAI_BIT != 0,
            omit_first_bar_line: mirror.effect_flags & OMIT_FIRST_BAR_LINE_BIT != 0,
        })
    }

    pub fn is_redline(&self) -> bool {
        !self.inherited
    }

    /// BPM for redlines, slider velocity multiplier for greenlines.
    pub fn effective_bpm(&self) -> f64 {
        if self.inherited {
            -100.0 / self.beat_length
        } else {
            60000.0 / self.beat_length
        }
    }

    /// Whether both points sound and scroll the same, regardless of offset.
    ///
    /// A redline compared against a greenline only matches when its beat
    /// length is -100, i.e. it stands in for a 1.0x greenline. The bar line
    /// flag is ignored since it has no effect on playback.
    pub fn same_effect(&self, other: &TimingPoint) -> bool {
        let tempo_matches = if self.inherited == other.inherited {
            self.beat_length == other.beat_length
        } else {
            let redline = if self.inherited { other } else { self };
            redline.beat_length == UNIT_SV_BEAT_LENGTH
        };
        tempo_matches
            && self.meter == other.meter
            && self.sample_set == other.sample_set
            && self.sample_index == other.sample_index
            && self.volume == other.volume
            && self.kiai == other.kiai
    }

    /// Move the offset onto the beat grid of `timing`.
    ///
    /// Returns whether the offset changed; the new value is in `self.offset`.
    /// Clone first if the old value has to be restored.
    pub fn resnap(
        &mut self,
        timing: &Timing,
        snap1: i32,
        snap2: i32,
        floor: bool,
        redline: Option<&TimingPoint>,
        first: Option<&TimingPoint>,
    ) -> Result<bool, BeatmapError> {
        let new_offset = timing.resnap(self.offset, snap1, snap2, floor, redline, first)?;
        let changed = new_offset != self.offset;
        self.offset = new_offset;
        Ok(changed)
    }
}
