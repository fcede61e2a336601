use beatmap_model::{BeatmapError, HitObject, HitObjectKind, Timing};
use log::{debug, trace};

use crate::config::TimelineConfig;
use crate::event::TimelineEvent;

/// Every sound event of a set of hit objects, sorted by time.
///
/// Built in two passes: [`Timeline::build`] expands objects into events, and
/// [`Timeline::attach_control_points`] records which control points govern
/// each event. The second pass can be repeated whenever the timing changes.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// Sorted by time; events at the same time keep their construction order.
    events: Vec<TimelineEvent>,
    config: TimelineConfig,
}

impl Timeline {
    pub fn build(objects: &mut [HitObject], timing: &Timing) -> Result<Self, BeatmapError> {
        Self::build_with_config(objects, timing, TimelineConfig::default())
    }

    /// Expand `objects` into events.
    ///
    /// Fails without touching `objects` if any object is malformed or a
    /// slider duration cannot be computed. On success each object's
    /// `timeline_events` holds the indices of its events in this timeline.
    pub fn build_with_config(
        objects: &mut [HitObject],
        timing: &Timing,
        config: TimelineConfig,
    ) -> Result<Self, BeatmapError> {
        let mut events = Vec::new();
        for (index, object) in objects.iter().enumerate() {
            expand_object(index, object, timing, &mut events)?;
        }
        sort_by_time(&mut events);

        for object in objects.iter_mut() {
            object.timeline_events.clear();
        }
        for (position, event) in events.iter().enumerate() {
            objects[event.object_index].timeline_events.push(position);
        }

        debug!(
            "Built timeline with {} events from {} hit objects",
            events.len(),
            objects.len()
        );
        Ok(Self { events, config })
    }

    /// Wrap already derived events. They are sorted by time, ties keeping
    /// their given order.
    pub fn from_events(mut events: Vec<TimelineEvent>) -> Self {
        sort_by_time(&mut events);
        Self {
            events,
            config: TimelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TimelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Record the governing timing point, hitsound point and redline of
    /// every event. Fails only on an empty sequence, in which case nothing is
    /// changed. Without any redline the events keep `redline` unset.
    pub fn attach_control_points(&mut self, timing: &Timing) -> Result<(), BeatmapError> {
        let lookahead = self.config.hitsound_lookahead_ms;
        let resolved = self
            .events
            .iter()
            .map(|event| {
                Ok((
                    timing.governing_point_index(event.time)?,
                    timing.governing_point_index(event.time + lookahead)?,
                    timing.governing_redline_index(event.time).ok(),
                ))
            })
            .collect::<Result<Vec<_>, BeatmapError>>()?;

        for (event, (timing_point, hitsound_point, redline)) in
            self.events.iter_mut().zip(resolved)
        {
            event.timing_point = Some(timing_point);
            event.hitsound_point = Some(hitsound_point);
            event.redline = redline;
        }

        debug!(
            "Attached control points to {} events (lookahead {}ms)",
            self.events.len(),
            lookahead
        );
        Ok(())
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events with `start <= time <= end`, in time order.
    pub fn events_in_range(&self, start: f64, end: f64) -> &[TimelineEvent] {
        let lower = self.events.partition_point(|e| e.time < start);
        let upper = self.events.partition_point(|e| e.time <= end);
        if lower >= upper {
            return &[];
        }
        &self.events[lower..upper]
    }

    /// Events derived from `object` during the build that produced this timeline.
    pub fn object_events<'a>(
        &'a self,
        object: &'a HitObject,
    ) -> impl Iterator<Item = &'a TimelineEvent> + 'a {
        object
            .timeline_events
            .iter()
            .filter_map(|&index| self.events.get(index))
    }

    /// The event closest in time to `time`.
    ///
    /// Scans forward and stops once the distance starts growing. Events at
    /// an equal distance do not end the scan but never replace the current
    /// best, so on a tie the earlier event wins. With `require_copyable`,
    /// events that cannot be copied are skipped entirely.
    pub fn nearest_event(&self, time: f64, require_copyable: bool) -> Option<&TimelineEvent> {
        let mut nearest = None;
        let mut nearest_distance = f64::INFINITY;
        for event in &self.events {
            if require_copyable && !event.can_copy {
                continue;
            }
            let distance = (event.time - time).abs();
            if distance < nearest_distance {
                nearest = Some(event);
                nearest_distance = distance;
            } else if distance > nearest_distance {
                break;
            }
        }
        nearest
    }
}

fn expand_object(
    index: usize,
    object: &HitObject,
    timing: &Timing,
    events: &mut Vec<TimelineEvent>,
) -> Result<(), BeatmapError> {
    object.validate()?;
    let edge_count = object.edge_count();

    match object.kind {
        HitObjectKind::Circle => {
            events.push(TimelineEvent::new(
                index,
                object.kind,
                0,
                edge_count,
                object.own_hitsound(object.time),
            ));
        }
        HitObjectKind::Slider => {
            let segment = timing.slider_segment_duration(object.time, object.pixel_length)?;
            trace!(
                "Slider at {}ms: {} edges, {}ms per segment",
                object.time, edge_count, segment
            );
            for edge in 0..edge_count {
                let time = (object.time + segment * edge as f64).floor();
                let hitsound = object.edge_hitsound(edge, time).ok_or_else(|| {
                    BeatmapError::MalformedObject {
                        time: object.time,
                        reason: format!("missing sound for edge {edge}"),
                    }
                })?;
                events.push(TimelineEvent::new(
                    index,
                    object.kind,
                    edge,
                    edge_count,
                    hitsound,
                ));
            }
        }
        HitObjectKind::Spinner | HitObjectKind::HoldNote => {
            events.push(TimelineEvent::new(
                index,
                object.kind,
                0,
                edge_count,
                object.own_hitsound(object.time),
            ));
            events.push(TimelineEvent::new(
                index,
                object.kind,
                1,
                edge_count,
                object.own_hitsound(object.end_time),
            ));
        }
    }
    Ok(())
}

/// Stable, so same-time events keep the order of their source objects.
fn sort_by_time(events: &mut [TimelineEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatmap_model::{Additions, SampleSet, TimingPoint};

    fn timing_120bpm() -> Timing {
        Timing::new(vec![TimingPoint::redline(0.0, 500.0)], 1.4)
    }

    fn times(timeline: &Timeline) -> Vec<f64> {
        timeline.events().iter().map(|e| e.time).collect()
    }

    fn event_at(time: f64, can_copy: bool) -> TimelineEvent {
        let mut event = TimelineEvent::new(
            0,
            HitObjectKind::Circle,
            0,
            1,
            beatmap_model::Hitsound::silent(time),
        );
        event.can_copy = can_copy;
        event
    }

    #[test]
    fn circle_yields_one_event_with_own_sound() {
        let mut objects = vec![HitObject::circle(250.5).with_sound(
            SampleSet::Soft,
            SampleSet::Drum,
            Additions::from_mask(10),
            4,
        )];
        let timeline = Timeline::build(&mut objects, &timing_120bpm()).unwrap();

        assert_eq!(timeline.len(), 1);
        let event = &timeline.events()[0];
        assert_eq!(event.time, 250.5);
        assert_eq!(event.edge_index, 0);
        assert_eq!(event.hitsound.sample_set, SampleSet::Soft);
        assert_eq!(event.hitsound.addition_set, SampleSet::Drum);
        assert_eq!(event.hitsound.to_mask(), 10);
        assert_eq!(event.hitsound.custom_index, 4);
        assert_eq!(objects[0].timeline_events, vec![0]);
    }

    #[test]
    fn slider_edges_are_floored() {
        let timing = Timing::new(vec![TimingPoint::redline(0.0, 333.333)], 1.4);
        let mut objects = vec![HitObject::slider(1000.0, 2, 70.0)];
        let timeline = Timeline::build(&mut objects, &timing).unwrap();

        // 70 * 333.333 / 140 = 166.6665ms per segment
        assert_eq!(times(&timeline), vec![1000.0, 1166.0, 1333.0]);
        let edges: Vec<usize> = timeline.events().iter().map(|e| e.edge_index).collect();
        assert_eq!(edges, vec![0, 1, 2]);
    }

    #[test]
    fn slider_edges_take_edge_sounds() {
        let mut objects = vec![HitObject::slider(0.0, 1, 140.0)
            .with_edge_sound(0, SampleSet::Normal, SampleSet::Auto, Additions::from_mask(2))
            .with_edge_sound(1, SampleSet::Drum, SampleSet::Soft, Additions::from_mask(4))];
        let timeline = Timeline::build(&mut objects, &timing_120bpm()).unwrap();

        let head = &timeline.events()[0];
        let tail = &timeline.events()[1];
        assert_eq!(tail.time, 500.0);
        assert!(head.hitsound.additions.whistle);
        assert_eq!(tail.hitsound.sample_set, SampleSet::Drum);
        assert!(tail.hitsound.additions.finish);
    }

    #[test]
    fn spinner_and_hold_note_have_one_silent_edge() {
        let sound = |o: HitObject| {
            o.with_sound(SampleSet::Soft, SampleSet::Soft, Additions::from_mask(8), 0)
        };
        let mut objects = vec![
            sound(HitObject::spinner(0.0, 1000.0)),
            sound(HitObject::hold_note(2000.0, 2500.0)),
        ];
        let timeline = Timeline::build(&mut objects, &timing_120bpm()).unwrap();
        let events = timeline.events();

        assert_eq!(times(&timeline), vec![0.0, 1000.0, 2000.0, 2500.0]);
        assert!(events[0].hitsound.is_silent() && !events[0].can_copy);
        assert!(events[1].hitsound.additions.clap && events[1].can_copy);
        assert!(events[2].hitsound.additions.clap && events[2].can_copy);
        assert!(events[3].hitsound.is_silent() && !events[3].can_copy);
        assert_eq!(events[1].edge_index, 1);
    }

    #[test]
    fn same_time_events_keep_input_order() {
        let mut objects = vec![
            HitObject::circle(500.0),
            HitObject::slider(0.0, 1, 140.0),
            HitObject::circle(500.0),
        ];
        let timeline = Timeline::build(&mut objects, &timing_120bpm()).unwrap();
        let at_500: Vec<usize> = timeline
            .events_in_range(500.0, 500.0)
            .iter()
            .map(|e| e.object_index)
            .collect();
        assert_eq!(at_500, vec![0, 1, 2]);
    }

    #[test]
    fn back_references_follow_sorted_positions() {
        let mut objects = vec![HitObject::circle(900.0), HitObject::slider(0.0, 2, 140.0)];
        let timeline = Timeline::build(&mut objects, &timing_120bpm()).unwrap();

        assert_eq!(times(&timeline), vec![0.0, 500.0, 900.0, 1000.0]);
        assert_eq!(objects[0].timeline_events, vec![2]);
        assert_eq!(objects[1].timeline_events, vec![0, 1, 3]);
        let slider_times: Vec<f64> = timeline.object_events(&objects[1]).map(|e| e.time).collect();
        assert_eq!(slider_times, vec![0.0, 500.0, 1000.0]);
    }

    #[test]
    fn rebuild_replaces_back_references() {
        let mut objects = vec![HitObject::circle(0.0)];
        Timeline::build(&mut objects, &timing_120bpm()).unwrap();
        Timeline::build(&mut objects, &timing_120bpm()).unwrap();
        assert_eq!(objects[0].timeline_events, vec![0]);
    }

    #[test]
    fn malformed_object_aborts_build_without_side_effects() {
        let mut broken = HitObject::slider(100.0, 3, 140.0);
        broken.edge_hitsounds.truncate(2);
        let mut objects = vec![HitObject::circle(0.0), broken];
        objects[0].timeline_events = vec![42];

        let err = Timeline::build(&mut objects, &timing_120bpm()).unwrap_err();
        assert!(matches!(err, BeatmapError::MalformedObject { .. }));
        assert_eq!(objects[0].timeline_events, vec![42]);
    }

    #[test]
    fn slider_without_timing_fails() {
        let mut objects = vec![HitObject::slider(0.0, 1, 100.0)];
        let err = Timeline::build(&mut objects, &Timing::new(Vec::new(), 1.4)).unwrap_err();
        assert_eq!(err, BeatmapError::EmptySequence);
    }

    #[test]
    fn attaches_tempo_and_hitsound_points() {
        let timing = Timing::new(
            vec![
                TimingPoint::redline(0.0, 500.0),
                TimingPoint::greenline(1003.0, -100.0),
                TimingPoint::redline(2000.0, 400.0),
            ],
            1.4,
        );
        let mut objects = vec![
            HitObject::circle(-50.0),
            HitObject::circle(1000.0),
            HitObject::circle(2500.0),
        ];
        let mut timeline = Timeline::build(&mut objects, &timing).unwrap();
        timeline.attach_control_points(&timing).unwrap();
        let events = timeline.events();

        assert_eq!(events[0].timing_point, Some(0));
        assert_eq!(events[0].hitsound_point, Some(0));

        // greenline at 1003 only governs the hitsound lookup at 1005
        assert_eq!(events[1].timing_point, Some(0));
        assert_eq!(events[1].hitsound_point, Some(1));
        assert_eq!(events[1].redline, Some(0));

        assert_eq!(events[2].timing_point, Some(2));
        assert_eq!(events[2].redline(&timing).unwrap().beat_length, 400.0);
    }

    #[test]
    fn lookahead_is_configurable() {
        let timing = Timing::new(
            vec![
                TimingPoint::redline(0.0, 500.0),
                TimingPoint::greenline(1003.0, -100.0),
            ],
            1.4,
        );
        let mut objects = vec![HitObject::circle(1000.0)];
        let config = TimelineConfig {
            hitsound_lookahead_ms: 0.0,
        };
        let mut timeline = Timeline::build_with_config(&mut objects, &timing, config).unwrap();
        timeline.attach_control_points(&timing).unwrap();
        assert_eq!(timeline.events()[0].hitsound_point, Some(0));
    }

    #[test]
    fn attach_is_repeatable_and_atomic() {
        let mut objects = vec![HitObject::circle(0.0), HitObject::circle(1500.0)];
        let first = Timing::new(vec![TimingPoint::redline(0.0, 500.0)], 1.4);
        let mut timeline = Timeline::build(&mut objects, &first).unwrap();
        timeline.attach_control_points(&first).unwrap();

        let second = Timing::new(
            vec![
                TimingPoint::redline(0.0, 500.0),
                TimingPoint::redline(1000.0, 250.0),
            ],
            1.4,
        );
        timeline.attach_control_points(&second).unwrap();
        assert_eq!(timeline.events()[1].timing_point, Some(1));
        assert_eq!(timeline.len(), 2);

        let empty = Timing::new(Vec::new(), 1.4);
        let err = timeline.attach_control_points(&empty).unwrap_err();
        assert_eq!(err, BeatmapError::EmptySequence);
        assert_eq!(timeline.events()[1].timing_point, Some(1));
    }

    #[test]
    fn attach_without_redline_keeps_tempo_and_hitsound_points() {
        let timing = Timing::new(
            vec![
                TimingPoint::greenline(0.0, -100.0),
                TimingPoint::greenline(103.0, -50.0),
            ],
            1.4,
        );
        let mut objects = vec![HitObject::circle(100.0)];
        let mut timeline = Timeline::build(&mut objects, &timing).unwrap();
        timeline.attach_control_points(&timing).unwrap();

        let event = &timeline.events()[0];
        assert_eq!(event.timing_point, Some(0));
        assert_eq!(event.hitsound_point, Some(1));
        assert_eq!(event.redline, None);
        assert!(event.redline(&timing).is_none());
    }

    #[test]
    fn range_is_inclusive() {
        let timeline = Timeline::from_events(vec![
            event_at(300.0, true),
            event_at(100.0, true),
            event_at(200.0, true),
        ]);
        assert_eq!(
            timeline.events_in_range(100.0, 200.0).iter().map(|e| e.time).collect::<Vec<_>>(),
            vec![100.0, 200.0]
        );
        assert_eq!(timeline.events_in_range(f64::NEG_INFINITY, f64::INFINITY).len(), 3);
        assert!(timeline.events_in_range(201.0, 299.0).is_empty());
        assert!(timeline.events_in_range(250.0, 150.0).is_empty());
    }

    #[test]
    fn nearest_picks_closest() {
        let timeline = Timeline::from_events(vec![
            event_at(0.0, true),
            event_at(100.0, true),
            event_at(250.0, true),
        ]);
        assert_eq!(timeline.nearest_event(120.0, false).unwrap().time, 100.0);
        assert_eq!(timeline.nearest_event(-40.0, false).unwrap().time, 0.0);
        assert_eq!(timeline.nearest_event(9000.0, false).unwrap().time, 250.0);
    }

    #[test]
    fn nearest_tie_goes_to_earlier_event() {
        let timeline = Timeline::from_events(vec![
            event_at(0.0, true),
            event_at(100.0, true),
            event_at(300.0, true),
        ]);
        assert_eq!(timeline.nearest_event(150.0, false).unwrap().time, 100.0);

        let timeline = Timeline::from_events(vec![
            event_at(0.0, true),
            event_at(100.0, true),
            event_at(250.0, true),
        ]);
        assert_eq!(timeline.nearest_event(175.0, false).unwrap().time, 100.0);
    }

    #[test]
    fn nearest_scans_past_same_time_events() {
        let timeline = Timeline::from_events(vec![
            event_at(250.0, true),
            event_at(250.0, true),
            event_at(500.0, true),
        ]);
        assert_eq!(timeline.nearest_event(480.0, false).unwrap().time, 500.0);
        assert_eq!(timeline.nearest_event(300.0, false).unwrap().time, 250.0);
    }

    #[test]
    fn nearest_over_slider_tail_and_head_at_same_time() {
        // The slider tail lands on 500ms together with the second circle.
        let mut objects = vec![
            HitObject::slider(0.0, 1, 140.0),
            HitObject::circle(500.0),
            HitObject::circle(700.0),
        ];
        let timeline = Timeline::build(&mut objects, &timing_120bpm()).unwrap();
        assert_eq!(times(&timeline), vec![0.0, 500.0, 500.0, 700.0]);

        let nearest = timeline.nearest_event(650.0, false).unwrap();
        assert_eq!(nearest.time, 700.0);
        assert_eq!(nearest.object_index, 2);

        let tie = timeline.nearest_event(600.0, false).unwrap();
        assert_eq!(tie.time, 500.0);
        assert_eq!(tie.object_index, 0);
        assert!(tie.is_tail());
    }

    #[test]
    fn nearest_can_skip_uncopyable_events() {
        let timeline = Timeline::from_events(vec![
            event_at(0.0, true),
            event_at(95.0, false),
            event_at(100.0, false),
            event_at(130.0, true),
        ]);
        assert_eq!(timeline.nearest_event(98.0, false).unwrap().time, 100.0);
        assert_eq!(timeline.nearest_event(98.0, true).unwrap().time, 130.0);
        assert_eq!(timeline.nearest_event(40.0, true).unwrap().time, 0.0);
    }

    #[test]
    fn empty_timeline_queries() {
        let timeline = Timeline::default();
        assert!(timeline.nearest_event(0.0, false).is_none());
        assert!(timeline.nearest_event(0.0, true).is_none());
        assert!(timeline.events_in_range(f64::NEG_INFINITY, f64::INFINITY).is_empty());
    }

    #[test]
    fn only_uncopyable_events_yield_none() {
        let timeline = Timeline::from_events(vec![event_at(10.0, false)]);
        assert!(timeline.nearest_event(10.0, true).is_none());
        assert!(timeline.nearest_event(10.0, false).is_some());
    }
}
