use serde::{Deserialize, Serialize};

use crate::error::BeatmapError;
use crate::format::{parse_f64, parse_i32};
use crate::hitsound::{Additions, Hitsound};
use crate::sample_set::SampleSet;

const TYPE_CIRCLE: i32 = 1 << 0;
const TYPE_SLIDER: i32 = 1 << 1;
const TYPE_SPINNER: i32 = 1 << 3;
const TYPE_HOLD_NOTE: i32 = 1 << 7;

/// Upper bound on slides read from a `[HitObjects]` line.
const MAX_SLIDES: i32 = 10_000;

/// The type of a hit object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitObjectKind {
    Circle,
    Slider,
    Spinner,
    HoldNote,
}

/// A placed gameplay object and the sounds attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitObject {
    pub kind: HitObjectKind,
    /// Start time in milliseconds
    pub time: f64,
    /// End time in milliseconds (spinners and hold notes only)
    pub end_time: f64,
    /// Number of slider passes; a slider has `repeat + 1` edges
    pub repeat: i32,
    /// Slider path length in osu! pixels
    pub pixel_length: f64,
    pub hitsounds: Additions,
    pub sample_set: SampleSet,
    pub addition_set: SampleSet,
    pub custom_index: i32,
    /// Per-edge sounds of a slider, one entry per edge
    pub edge_hitsounds: Vec<Additions>,
    pub edge_sample_sets: Vec<SampleSet>,
    pub edge_addition_sets: Vec<SampleSet>,
    /// Indices into the owning timeline's event list, rebuilt on every build
    #[serde(skip)]
    pub timeline_events: Vec<usize>,
}

impl HitObject {
    fn base(kind: HitObjectKind, time: f64, end_time: f64) -> Self {
        Self {
            kind,
            time,
            end_time,
            repeat: 0,
            pixel_length: 0.0,
            hitsounds: Additions::NONE,
            sample_set: SampleSet::Auto,
            addition_set: SampleSet::Auto,
            custom_index: 0,
            edge_hitsounds: Vec::new(),
            edge_sample_sets: Vec::new(),
            edge_addition_sets: Vec::new(),
            timeline_events: Vec::new(),
        }
    }

    pub fn circle(time: f64) -> Self {
        Self::base(HitObjectKind::Circle, time, time)
    }

    /// A slider whose edges all start out silent.
    pub fn slider(time: f64, repeat: i32, pixel_length: f64) -> Self {
        let edges = usize::try_from(repeat).map_or(0, |r| r + 1);
        Self {
            repeat,
            pixel_length,
            edge_hitsounds: vec![Additions::NONE; edges],
            edge_sample_sets: vec![SampleSet::Auto; edges],
            edge_addition_sets: vec![SampleSet::Auto; edges],
            ..Self::base(HitObjectKind::Slider, time, time)
        }
    }

    pub fn spinner(time: f64, end_time: f64) -> Self {
        Self::base(HitObjectKind::Spinner, time, end_time)
    }

    pub fn hold_note(time: f64, end_time: f64) -> Self {
        Self::base(HitObjectKind::HoldNote, time, end_time)
    }

    pub fn with_sound(
        mut self,
        sample_set: SampleSet,
        addition_set: SampleSet,
        hitsounds: Additions,
        custom_index: i32,
    ) -> Self {
        self.sample_set = sample_set;
        self.addition_set = addition_set;
        self.hitsounds = hitsounds;
        self.custom_index = custom_index;
        self
    }

    /// Replace the sound on slider edge `edge`. Out of range edges are ignored.
    pub fn with_edge_sound(
        mut self,
        edge: usize,
        sample_set: SampleSet,
        addition_set: SampleSet,
        hitsounds: Additions,
    ) -> Self {
        if let Some(slot) = self.edge_sample_sets.get_mut(edge) {
            *slot = sample_set;
        }
        if let Some(slot) = self.edge_addition_sets.get_mut(edge) {
            *slot = addition_set;
        }
        if let Some(slot) = self.edge_hitsounds.get_mut(edge) {
            *slot = hitsounds;
        }
        self
    }

    /// Parse a `[HitObjects]` line.
    ///
    /// Only the fields that matter for hitsounding are kept; positions and
    /// slider curves are skipped. Slider edges without explicit sounds fall
    /// back to the object's own sound.
    pub fn from_text(line: &str) -> Result<Self, BeatmapError> {
        let fail = |reason: &str| BeatmapError::InvalidHitObject {
            line: line.to_string(),
            reason: reason.to_string(),
        };
        let values: Vec<&str> = line.split(',').collect();
        if values.len() < 5 {
            return Err(fail("expected at least 5 fields"));
        }

        let time = parse_f64(values[2]).ok_or_else(|| fail("time"))?;
        let type_bits = parse_i32(values[3]).ok_or_else(|| fail("type"))?;
        let hitsounds = Additions::from_mask(parse_i32(values[4]).ok_or_else(|| fail("hitsound"))?);

        let mut object = if type_bits & TYPE_CIRCLE != 0 {
            let mut circle = Self::circle(time);
            apply_hit_sample(&mut circle, values.get(5).copied());
            circle
        } else if type_bits & TYPE_SLIDER != 0 {
            let repeat = values
                .get(6)
                .and_then(|v| parse_i32(v))
                .filter(|slides| (0..=MAX_SLIDES).contains(slides))
                .ok_or_else(|| fail("slides"))?;
            let pixel_length = values
                .get(7)
                .and_then(|v| parse_f64(v))
                .ok_or_else(|| fail("length"))?;
            let mut slider = Self::slider(time, repeat, pixel_length);
            apply_hit_sample(&mut slider, values.get(10).copied());
            slider.edge_hitsounds.fill(hitsounds);
            slider.edge_sample_sets.fill(slider.sample_set);
            slider.edge_addition_sets.fill(slider.addition_set);

            if let Some(edge_sounds) = values.get(8).filter(|v| !v.trim().is_empty()) {
                for (edge, token) in edge_sounds.split('|').enumerate() {
                    let mask = parse_i32(token).ok_or_else(|| fail("edge sounds"))?;
                    if let Some(slot) = slider.edge_hitsounds.get_mut(edge) {
                        *slot = Additions::from_mask(mask);
                    }
                }
            }
            if let Some(edge_sets) = values.get(9).filter(|v| !v.trim().is_empty()) {
                for (edge, token) in edge_sets.split('|').enumerate() {
                    let (normal, addition) =
                        token.split_once(':').ok_or_else(|| fail("edge sets"))?;
                    let normal = parse_sample_set(normal).ok_or_else(|| fail("edge sets"))?;
                    let addition = parse_sample_set(addition).ok_or_else(|| fail("edge sets"))?;
                    if let (Some(n), Some(a)) = (
                        slider.edge_sample_sets.get_mut(edge),
                        slider.edge_addition_sets.get_mut(edge),
                    ) {
                        *n = normal;
                        *a = addition;
                    }
                }
            }
            slider
        } else if type_bits & TYPE_SPINNER != 0 {
            let end_time = values
                .get(5)
                .and_then(|v| parse_f64(v))
                .ok_or_else(|| fail("end time"))?;
            let mut spinner = Self::spinner(time, end_time);
            apply_hit_sample(&mut spinner, values.get(6).copied());
            spinner
        } else if type_bits & TYPE_HOLD_NOTE != 0 {
            let params = values.get(5).copied().unwrap_or_default();
            let (end, sample) = match params.split_once(':') {
                Some((end, sample)) => (end, Some(sample)),
                None => (params, None),
            };
            let end_time = parse_f64(end).ok_or_else(|| fail("end time"))?;
            let mut hold = Self::hold_note(time, end_time);
            apply_hit_sample(&mut hold, sample);
            hold
        } else {
            return Err(fail("unknown object type"));
        };

        object.hitsounds = hitsounds;
        Ok(object)
    }

    pub fn is_circle(&self) -> bool {
        self.kind == HitObjectKind::Circle
    }

    pub fn is_slider(&self) -> bool {
        self.kind == HitObjectKind::Slider
    }

    pub fn is_spinner(&self) -> bool {
        self.kind == HitObjectKind::Spinner
    }

    pub fn is_hold_note(&self) -> bool {
        self.kind == HitObjectKind::HoldNote
    }

    /// Number of timed edges this object produces.
    pub fn edge_count(&self) -> usize {
        match self.kind {
            HitObjectKind::Circle => 1,
            HitObjectKind::Slider => usize::try_from(self.repeat).map_or(0, |r| r + 1),
            HitObjectKind::Spinner | HitObjectKind::HoldNote => 2,
        }
    }

    /// The object's own sound at `time`.
    pub fn own_hitsound(&self, time: f64) -> Hitsound {
        Hitsound::new(
            time,
            self.sample_set,
            self.addition_set,
            self.hitsounds,
            self.custom_index,
        )
    }

    /// Sound of slider edge `edge` at `time`. Edges share the object's custom index.
    pub fn edge_hitsound(&self, edge: usize, time: f64) -> Option<Hitsound> {
        Some(Hitsound::new(
            time,
            *self.edge_sample_sets.get(edge)?,
            *self.edge_addition_sets.get(edge)?,
            *self.edge_hitsounds.get(edge)?,
            self.custom_index,
        ))
    }

    /// Check the fields a timeline relies on.
    pub fn validate(&self) -> Result<(), BeatmapError> {
        if !self.is_slider() {
            return Ok(());
        }
        if self.repeat < 0 {
            return Err(self.malformed(format!("negative repeat count {}", self.repeat)));
        }
        let edges = self.edge_count();
        let lists = [
            ("edge hitsounds", self.edge_hitsounds.len()),
            ("edge sample sets", self.edge_sample_sets.len()),
            ("edge addition sets", self.edge_addition_sets.len()),
        ];
        for (name, len) in lists {
            if len != edges {
                return Err(self.malformed(format!(
                    "{name} has {len} entries but the slider has {edges} edges"
                )));
            }
        }
        Ok(())
    }

    fn malformed(&self, reason: String) -> BeatmapError {
        BeatmapError::MalformedObject {
            time: self.time,
            reason,
        }
    }
}

fn parse_sample_set(token: &str) -> Option<SampleSet> {
    parse_i32(token).and_then(|id| SampleSet::from_id(id).ok())
}

/// Apply `normalSet:additionSet:index:volume:filename`, keeping defaults for
/// missing or unreadable parts.
fn apply_hit_sample(object: &mut HitObject, sample: Option<&str>) {
    let Some(sample) = sample else {
        return;
    };
    let mut parts = sample.split(':');
    if let Some(set) = parts.next().and_then(parse_sample_set) {
        object.sample_set = set;
    }
    if let Some(set) = parts.next().and_then(parse_sample_set) {
        object.addition_set = set;
    }
    if let Some(index) = parts.next().and_then(parse_i32) {
        object.custom_index = index;
    }
}
