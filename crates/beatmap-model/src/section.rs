// Reading and writing sections of a beatmap text file

use log::{debug, warn};

use crate::error::BeatmapError;
use crate::format::parse_f64;
use crate::hit_object::HitObject;
use crate::timing::Timing;
use crate::timing_point::TimingPoint;

/// Slider multiplier assumed when `[Difficulty]` does not specify one.
pub const DEFAULT_SLIDER_MULTIPLIER: f64 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Difficulty,
    TimingPoints,
    HitObjects,
    Other,
}

/// Iterate `(section, line)` pairs, skipping blank lines and comments.
fn section_lines(content: &str) -> impl Iterator<Item = (Section, &str)> {
    let mut section = Section::Other;
    content.lines().filter_map(move |line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return None;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = match &line[1..line.len() - 1] {
                "Difficulty" => Section::Difficulty,
                "TimingPoints" => Section::TimingPoints,
                "HitObjects" => Section::HitObjects,
                _ => Section::Other,
            };
            return None;
        }
        Some((section, line))
    })
}

/// Build a [`Timing`] from the `[TimingPoints]` and `[Difficulty]` sections
/// of a beatmap. Any malformed control-point line fails the whole document.
pub fn parse_timing(content: &str) -> Result<Timing, BeatmapError> {
    let mut slider_multiplier = DEFAULT_SLIDER_MULTIPLIER;
    let mut points = Vec::new();

    for (section, line) in section_lines(content) {
        match section {
            Section::TimingPoints => points.push(TimingPoint::from_text(line)?),
            Section::Difficulty => {
                if let Some(value) = line.strip_prefix("SliderMultiplier:") {
                    match parse_f64(value) {
                        Some(multiplier) if multiplier > 0.0 => slider_multiplier = multiplier,
                        _ => warn!("Ignoring invalid slider multiplier: {value}"),
                    }
                }
            }
            Section::HitObjects | Section::Other => {}
        }
    }

    debug!(
        "Parsed {} timing points (slider multiplier {slider_multiplier})",
        points.len()
    );
    Ok(Timing::new(points, slider_multiplier))
}

/// Read every line of the `[HitObjects]` section, in file order.
pub fn parse_hit_objects(content: &str) -> Result<Vec<HitObject>, BeatmapError> {
    let objects = section_lines(content)
        .filter(|(section, _)| *section == Section::HitObjects)
        .map(|(_, line)| HitObject::from_text(line))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Parsed {} hit objects", objects.len());
    Ok(objects)
}

/// Render control points as the body of a `[TimingPoints]` section.
pub fn write_timing_points<'a, I>(points: I) -> String
where
    I: IntoIterator<Item = &'a TimingPoint>,
{
    let mut out = String::new();
    for point in points {
        out.push_str(&point.to_text());
        out.push('\n');
    }
    out
}
