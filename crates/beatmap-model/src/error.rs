use std::fmt;

use thiserror::Error;

/// Column of a `[TimingPoints]` line, in the order they are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingPointField {
    Offset,
    BeatLength,
    Meter,
    SampleSet,
    SampleIndex,
    Volume,
    Uninherited,
    Style,
}

impl fmt::Display for TimingPointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Offset => "offset",
            Self::BeatLength => "beat length",
            Self::Meter => "meter",
            Self::SampleSet => "sample set",
            Self::SampleIndex => "sample index",
            Self::Volume => "volume",
            Self::Uninherited => "uninherited flag",
            Self::Style => "style",
        };
        f.write_str(name)
    }
}

/// A control-point line that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to parse {field} of timing point: {line}")]
pub struct ParseError {
    pub field: TimingPointField,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeatmapError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Failed to parse hit object ({reason}): {line}")]
    InvalidHitObject { line: String, reason: String },

    #[error("Malformed hit object at {time}ms: {reason}")]
    MalformedObject { time: f64, reason: String },

    #[error("Timing sequence has no control points")]
    EmptySequence,

    #[error("Timing sequence has no uninherited control point")]
    NoRedline,

    #[error("Invalid snap divisor: {0}")]
    InvalidSnapDivisor(i32),

    #[error("Unknown sample set id: {0}")]
    UnknownSampleSet(i32),

    #[error("Invalid sample set token: {0:?}")]
    InvalidSampleSet(String),
}
