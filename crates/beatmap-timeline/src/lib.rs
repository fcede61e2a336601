// Hitsound timeline: expands hit objects into time-ordered sound events and
// attaches the control points that govern each of them

mod config;
mod event;
mod timeline;

pub use beatmap_model::BeatmapError;
pub use config::{DEFAULT_HITSOUND_LOOKAHEAD_MS, TimelineConfig};
pub use event::TimelineEvent;
pub use timeline::Timeline;
