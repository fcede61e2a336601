// Beatmap data model: control points, hitsounds, hit objects, timing queries

mod error;
mod format;
mod hit_object;
mod hitsound;
mod sample_set;
mod section;
mod timing;
mod timing_point;

pub use error::{BeatmapError, ParseError, TimingPointField};
pub use hit_object::{HitObject, HitObjectKind};
pub use hitsound::{Additions, Hitsound};
pub use sample_set::SampleSet;
pub use section::{
    DEFAULT_SLIDER_MULTIPLIER, parse_hit_objects, parse_timing, write_timing_points,
};
pub use timing::Timing;
pub use timing_point::{ControlPointMirror, TimingPoint};
