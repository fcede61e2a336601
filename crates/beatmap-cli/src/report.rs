// Text output of the CLI subcommands

use beatmap_model::{BeatmapError, Timing, TimingPoint};
use beatmap_timeline::{Timeline, TimelineEvent};

/// One line per control point; greenlines that change nothing compared to the
/// point before them are marked. Returns the report and the number of marks.
pub fn points_report(timing: &Timing) -> (String, usize) {
    let mut out = String::new();
    let mut redundant = 0;
    let mut previous: Option<&TimingPoint> = None;

    for point in timing.points() {
        let is_redundant =
            point.inherited && previous.is_some_and(|prev| prev.same_effect(point));
        if is_redundant {
            redundant += 1;
        }

        let tempo = if point.inherited {
            format!("{:.2}x", point.effective_bpm())
        } else {
            format!("{:.2} BPM {}/4", point.effective_bpm(), point.meter)
        };
        out.push_str(&format!(
            "{:>8} {} {} set {} idx {} vol {}{}{}\n",
            point.offset,
            if point.inherited { "green" } else { "red  " },
            tempo,
            point.sample_set,
            point.sample_index,
            point.volume,
            if point.kiai { " kiai" } else { "" },
            if is_redundant { " (redundant)" } else { "" },
        ));
        previous = Some(point);
    }

    (out, redundant)
}

/// Copies of all points with greenlines snapped to the grid of their redline.
/// Returns the points and how many of them moved.
pub fn resnap_greenlines(
    timing: &Timing,
    divisor: i32,
    divisor2: i32,
    floor: bool,
) -> Result<(Vec<TimingPoint>, usize), BeatmapError> {
    let mut points = timing.points().to_vec();
    let mut moved = 0;
    for point in points.iter_mut().filter(|p| p.inherited) {
        if point.resnap(timing, divisor, divisor2, floor, None, None)? {
            moved += 1;
        }
    }
    Ok((points, moved))
}

pub fn event_line(event: &TimelineEvent, timing: &Timing) -> String {
    let sound = &event.hitsound;
    let mut line = format!(
        "{:>8} {:?} edge {} set {}:{} additions {} idx {}",
        event.time,
        event.kind,
        event.edge_index,
        sound.sample_set,
        sound.addition_set,
        sound.to_mask(),
        sound.custom_index,
    );
    if let Some(redline) = event.redline(timing) {
        line.push_str(&format!(" | {:.2} BPM", redline.effective_bpm()));
    }
    if let Some(point) = event.hitsound_point(timing) {
        line.push_str(&format!(
            " | vol {} set {} idx {}",
            point.volume, point.sample_set, point.sample_index
        ));
    }
    if event.is_silent() {
        line.push_str(" (silent)");
    }
    line
}

pub fn events_report(timeline: &Timeline, timing: &Timing, start: f64, end: f64) -> String {
    let mut out = String::new();
    for event in timeline.events_in_range(start, end) {
        out.push_str(&event_line(event, timing));
        out.push('\n');
    }
    out
}
