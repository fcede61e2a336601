use crate::error::BeatmapError;
use crate::timing_point::TimingPoint;

/// Slider velocity bounds applied by the game.
const MIN_SV: f64 = 0.1;
const MAX_SV: f64 = 10.0;

/// Absorbs float error so 124.99999999 floors to 125.
const SNAP_EPSILON: f64 = 1e-6;

/// All control points of a beatmap, sorted by offset, plus the beatmap-wide
/// slider multiplier needed to turn slider lengths into durations.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    points: Vec<TimingPoint>,
    slider_multiplier: f64,
}

impl Timing {
    /// Points sharing an offset keep their relative order, so a greenline
    /// written after a redline at the same time still governs that time.
    pub fn new(mut points: Vec<TimingPoint>, slider_multiplier: f64) -> Self {
        points.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self {
            points,
            slider_multiplier,
        }
    }

    pub fn points(&self) -> &[TimingPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&TimingPoint> {
        self.points.get(index)
    }

    pub fn slider_multiplier(&self) -> f64 {
        self.slider_multiplier
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points with `offset <= time`.
    fn count_at_or_before(&self, time: f64) -> usize {
        self.points.partition_point(|p| p.offset <= time)
    }

    /// Index of the latest point at or before `time`, or of the first point
    /// when `time` precedes all of them.
    pub fn governing_point_index(&self, time: f64) -> Result<usize, BeatmapError> {
        if self.points.is_empty() {
            return Err(BeatmapError::EmptySequence);
        }
        Ok(self.count_at_or_before(time).saturating_sub(1))
    }

    pub fn governing_point(&self, time: f64) -> Result<&TimingPoint, BeatmapError> {
        let index = self.governing_point_index(time)?;
        Ok(&self.points[index])
    }

    /// Index of the latest redline at or before `time`, falling back to the
    /// first redline of the sequence.
    pub fn governing_redline_index(&self, time: f64) -> Result<usize, BeatmapError> {
        if self.points.is_empty() {
            return Err(BeatmapError::EmptySequence);
        }
        let before = self.count_at_or_before(time);
        self.points[..before]
            .iter()
            .rposition(TimingPoint::is_redline)
            .or_else(|| self.points.iter().position(TimingPoint::is_redline))
            .ok_or(BeatmapError::NoRedline)
    }

    pub fn governing_redline(&self, time: f64) -> Result<&TimingPoint, BeatmapError> {
        let index = self.governing_redline_index(time)?;
        Ok(&self.points[index])
    }

    /// First redline strictly after `time`.
    pub fn redline_after(&self, time: f64) -> Option<&TimingPoint> {
        let before = self.count_at_or_before(time);
        self.points[before..].iter().find(|p| p.is_redline())
    }

    /// Slider velocity multiplier in effect at `time`.
    pub fn sv_at(&self, time: f64) -> Result<f64, BeatmapError> {
        let point = self.governing_point(time)?;
        if point.inherited {
            Ok((-100.0 / point.beat_length).clamp(MIN_SV, MAX_SV))
        } else {
            Ok(1.0)
        }
    }

    pub fn beat_length_at(&self, time: f64) -> Result<f64, BeatmapError> {
        Ok(self.governing_redline(time)?.beat_length)
    }

    pub fn bpm_at(&self, time: f64) -> Result<f64, BeatmapError> {
        Ok(60000.0 / self.beat_length_at(time)?)
    }

    /// Time one pass over a slider path of `pixel_length` takes when the
    /// slider starts at `start_time`.
    pub fn slider_segment_duration(
        &self,
        start_time: f64,
        pixel_length: f64,
    ) -> Result<f64, BeatmapError> {
        let beat_length = self.beat_length_at(start_time)?;
        let sv = self.sv_at(start_time)?;
        Ok(pixel_length * beat_length / (100.0 * self.slider_multiplier * sv))
    }

    /// Snap `time` to the closer of the 1/`snap1` and 1/`snap2` beat grids.
    ///
    /// The grid starts at `redline` when given, otherwise at the governing
    /// redline (or `first` if nothing precedes `time`). Without an explicit
    /// redline, the next redline's offset wins when it is at least as close
    /// as either grid line.
    pub fn resnap(
        &self,
        time: f64,
        snap1: i32,
        snap2: i32,
        floor: bool,
        redline: Option<&TimingPoint>,
        first: Option<&TimingPoint>,
    ) -> Result<f64, BeatmapError> {
        for divisor in [snap1, snap2] {
            if divisor <= 0 {
                return Err(BeatmapError::InvalidSnapDivisor(divisor));
            }
        }

        let (before, after) = match redline {
            Some(tp) => (tp, None),
            None => (self.redline_or(time, first)?, self.redline_after(time)),
        };

        let snapped1 = nearest_grid_time(time, before, snap1);
        let snapped2 = nearest_grid_time(time, before, snap2);
        let distance1 = (time - snapped1).abs();
        let distance2 = (time - snapped2).abs();

        let mut new_time = if distance2 < distance1 {
            snapped2
        } else {
            snapped1
        };
        if let Some(after) = after {
            if (after.offset - time).abs() <= distance1.min(distance2) {
                new_time = after.offset;
            }
        }

        if floor {
            Ok((new_time + SNAP_EPSILON).floor())
        } else {
            Ok(new_time)
        }
    }

    fn redline_or<'a>(
        &'a self,
        time: f64,
        fallback: Option<&'a TimingPoint>,
    ) -> Result<&'a TimingPoint, BeatmapError> {
        let before = self.count_at_or_before(time);
        if let Some(index) = self.points[..before].iter().rposition(TimingPoint::is_redline) {
            return Ok(&self.points[index]);
        }
        if let Some(first) = fallback {
            return Ok(first);
        }
        self.governing_redline(time)
    }
}

fn nearest_grid_time(time: f64, redline: &TimingPoint, divisor: i32) -> f64 {
    let step = redline.beat_length / f64::from(divisor);
    let beats = ((time - redline.offset) / step).round();
    redline.offset + beats * step
}
