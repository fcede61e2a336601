use beatmap_model::{HitObjectKind, Hitsound, Timing, TimingPoint};

/// One audible (or deliberately silent) edge of a hit object.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    /// Index of the originating object in the slice the timeline was built from
    pub object_index: usize,
    /// Time in milliseconds
    pub time: f64,
    pub kind: HitObjectKind,
    /// 0 for the head; sliders count up to `repeat`, spinners and hold notes end at 1
    pub edge_index: usize,
    /// Number of edges of the originating object
    pub edge_count: usize,
    pub hitsound: Hitsound,
    /// Whether this edge may serve as a nearest-neighbour lookup target
    pub can_copy: bool,
    /// Point governing the event time, set by `Timeline::attach_control_points`
    pub timing_point: Option<usize>,
    /// Point governing volume and samples, looked up slightly after the event time
    pub hitsound_point: Option<usize>,
    /// Redline governing the event time
    pub redline: Option<usize>,
}

impl TimelineEvent {
    pub(crate) fn new(
        object_index: usize,
        kind: HitObjectKind,
        edge_index: usize,
        edge_count: usize,
        hitsound: Hitsound,
    ) -> Self {
        let silent = is_silent_edge(kind, edge_index);
        let hitsound = if silent {
            Hitsound::silent(hitsound.time)
        } else {
            hitsound
        };
        Self {
            object_index,
            time: hitsound.time,
            kind,
            edge_index,
            edge_count,
            hitsound,
            can_copy: !silent,
            timing_point: None,
            hitsound_point: None,
            redline: None,
        }
    }

    pub fn is_head(&self) -> bool {
        self.edge_index == 0
    }

    pub fn is_tail(&self) -> bool {
        self.edge_index + 1 == self.edge_count
    }

    /// A slider edge that is neither its head nor its tail.
    pub fn is_repeat(&self) -> bool {
        self.kind == HitObjectKind::Slider && !self.is_head() && !self.is_tail()
    }

    /// Spinner heads and hold note tails never play a sound.
    pub fn is_silent(&self) -> bool {
        is_silent_edge(self.kind, self.edge_index)
    }

    pub fn timing_point<'a>(&self, timing: &'a Timing) -> Option<&'a TimingPoint> {
        timing.point(self.timing_point?)
    }

    pub fn hitsound_point<'a>(&self, timing: &'a Timing) -> Option<&'a TimingPoint> {
        timing.point(self.hitsound_point?)
    }

    pub fn redline<'a>(&self, timing: &'a Timing) -> Option<&'a TimingPoint> {
        timing.point(self.redline?)
    }
}

fn is_silent_edge(kind: HitObjectKind, edge_index: usize) -> bool {
    matches!(
        (kind, edge_index),
        (HitObjectKind::Spinner, 0) | (HitObjectKind::HoldNote, 1)
    )
}
