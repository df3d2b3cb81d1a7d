//! Unit tests for sig-control.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use sig_core::{
    Duration, GroupIndex, LightColor, SharedSink, SimTime, TrafficLightLookup, TrafficLightSink,
};
use sig_schedule::{EventQueue, ScheduleError};

use crate::{
    ConflictResolver, ControlError, ControlEvent, ControlEventKind, FixedTimeController, Flank,
    SignalGroup, SignalGroupRecipe, sort_flanks,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn d(secs: f64) -> Duration {
    Duration(secs)
}

fn recipe(id: &str, lights: &[&str], offset: f64, green: f64, yellow: f64) -> SignalGroupRecipe {
    SignalGroupRecipe::without_pre_green(id, lights.iter().copied(), d(offset), d(green), d(yellow))
}

fn groups(cycle: f64, recipes: Vec<SignalGroupRecipe>) -> Vec<SignalGroup> {
    recipes.into_iter().map(|r| SignalGroup::new(r, d(cycle)).unwrap()).collect()
}

/// A sink that remembers every color it was told to show.
#[derive(Default)]
struct RecordingSink {
    seen: RefCell<Vec<LightColor>>,
}

impl TrafficLightSink for RecordingSink {
    fn set_color(&self, color: LightColor) {
        self.seen.borrow_mut().push(color);
    }
}

#[derive(Default)]
struct RecordingLookup {
    sinks: HashMap<String, Rc<RecordingSink>>,
}

impl RecordingLookup {
    fn with(ids: &[&str]) -> Self {
        let sinks = ids.iter().map(|id| (id.to_string(), Rc::new(RecordingSink::default()))).collect();
        Self { sinks }
    }

    fn seen(&self, id: &str) -> Vec<LightColor> {
        self.sinks[id].seen.borrow().clone()
    }
}

impl TrafficLightLookup for RecordingLookup {
    fn resolve(&self, id: &str) -> Option<SharedSink> {
        let sink: SharedSink = self.sinks.get(id)?.clone();
        Some(sink)
    }
}

/// Drain every event due at or before `end`, returning `(time, color)` for
/// each color change shown by group 0.
fn run_until(
    controller: &mut FixedTimeController,
    queue:      &mut EventQueue<ControlEvent>,
    lookup:     &RecordingLookup,
    end:        SimTime,
) -> Vec<(SimTime, LightColor)> {
    let mut changes = Vec::new();
    while let Some((_, event)) = queue.pop_until(end) {
        for change in controller.handle_event(event, queue, lookup).unwrap() {
            if change.group == GroupIndex(0) {
                changes.push((change.at, change.color));
            }
        }
    }
    changes
}

// ── SignalGroup ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod signal_group {
    use super::*;

    #[test]
    fn red_fills_the_rest_of_the_cycle() {
        let g = SignalGroup::new(
            SignalGroupRecipe::new("a", ["l"], d(0.0), d(2.0), d(30.0), d(3.0)),
            d(100.0),
        )
        .unwrap();
        assert_eq!(g.red(), d(65.0));
        assert_eq!(g.pre_green() + g.green() + g.yellow() + g.red(), d(100.0));
        assert_eq!(g.current_color(), LightColor::Red);
        assert!(!g.is_bound());
    }

    #[test]
    fn round_off_below_zero_red_is_clamped() {
        let g = SignalGroup::new(
            SignalGroupRecipe::new("a", ["l"], d(0.0), d(0.1), d(0.2), d(99.7)),
            d(100.0),
        )
        .unwrap();
        assert!(g.red().0 >= 0.0 && g.red().0 < 1e-9);
    }

    #[test]
    fn rejects_phases_longer_than_the_cycle() {
        let err = SignalGroup::new(recipe("a", &["l"], 0.0, 90.0, 20.0), d(100.0)).unwrap_err();
        match err {
            ControlError::CycleTooShort { group, excess, .. } => {
                assert_eq!(group, "a");
                assert_eq!(excess, d(10.0));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_and_non_finite_durations() {
        let err = SignalGroup::new(recipe("a", &["l"], 0.0, -1.0, 3.0), d(100.0)).unwrap_err();
        assert!(matches!(err, ControlError::NegativeDuration { phase: "green", .. }));

        let err = SignalGroup::new(recipe("a", &["l"], 0.0, 10.0, f64::NAN), d(100.0)).unwrap_err();
        assert!(matches!(err, ControlError::NonFinite { what: "yellow", .. }));

        let err = SignalGroup::new(recipe("a", &["l"], f64::INFINITY, 10.0, 3.0), d(100.0)).unwrap_err();
        assert!(matches!(err, ControlError::NonFinite { what: "offset", .. }));
    }

    #[test]
    fn negative_offset_is_allowed() {
        let g = SignalGroup::new(recipe("a", &["l"], -10.0, 10.0, 3.0), d(100.0)).unwrap();
        assert_eq!(g.total_offset(d(0.0), d(100.0)), d(90.0));
    }

    #[test]
    fn rejects_empty_light_set() {
        let err = SignalGroup::new(recipe("a", &[], 0.0, 10.0, 3.0), d(100.0)).unwrap_err();
        assert!(matches!(err, ControlError::EmptyTrafficLights { .. }));
    }

    #[test]
    fn initial_state_green_then_red() {
        let g = SignalGroup::new(recipe("a", &["l"], 0.0, 30.0, 3.0), d(100.0)).unwrap();
        assert_eq!(g.red(), d(67.0));
        assert_eq!(g.initial_state(d(0.0), d(100.0), SimTime(0.0)), (LightColor::Green, d(30.0)));
        assert_eq!(g.initial_state(d(0.0), d(100.0), SimTime(50.0)), (LightColor::Red, d(50.0)));
    }

    #[test]
    fn initial_state_walks_every_phase() {
        let g = SignalGroup::new(
            SignalGroupRecipe::new("a", ["l"], d(0.0), d(2.0), d(10.0), d(3.0)),
            d(100.0),
        )
        .unwrap();
        let at = |t: f64| g.initial_state(d(0.0), d(100.0), SimTime(t));
        assert_eq!(at(1.0), (LightColor::PreGreen, d(1.0)));
        assert_eq!(at(2.0), (LightColor::Green, d(10.0)));
        assert_eq!(at(12.0), (LightColor::Yellow, d(3.0)));
        assert_eq!(at(15.0), (LightColor::Red, d(85.0)));
        assert_eq!(at(100.0), (LightColor::PreGreen, d(2.0)));
    }

    #[test]
    fn initial_state_handles_wrapping_window() {
        let g = SignalGroup::new(recipe("a", &["l"], 90.0, 20.0, 0.0), d(100.0)).unwrap();
        assert_eq!(g.initial_state(d(0.0), d(100.0), SimTime(5.0)), (LightColor::Green, d(5.0)));
        assert_eq!(g.initial_state(d(0.0), d(100.0), SimTime(50.0)), (LightColor::Red, d(40.0)));
        // Controller offset shifts the window the same way.
        let h = SignalGroup::new(recipe("b", &["l"], 10.0, 20.0, 0.0), d(100.0)).unwrap();
        assert_eq!(h.initial_state(d(-20.0), d(100.0), SimTime(5.0)), (LightColor::Green, d(5.0)));
    }

    #[test]
    fn offset_beyond_cycle_is_folded() {
        let g = SignalGroup::new(recipe("a", &["l"], 250.0, 20.0, 0.0), d(100.0)).unwrap();
        assert_eq!(g.total_offset(d(0.0), d(100.0)), d(50.0));
    }

    #[test]
    fn advance_follows_the_cycle() {
        let g = SignalGroup::new(
            SignalGroupRecipe::new("a", ["l"], d(0.0), d(2.0), d(10.0), d(3.0)),
            d(60.0),
        )
        .unwrap();
        assert_eq!(g.advance(LightColor::Red), (LightColor::PreGreen, d(2.0)));
        assert_eq!(g.advance(LightColor::PreGreen), (LightColor::Green, d(10.0)));
        assert_eq!(g.advance(LightColor::Green), (LightColor::Yellow, d(3.0)));
        assert_eq!(g.advance(LightColor::Yellow), (LightColor::Red, d(45.0)));
    }

    #[test]
    fn flanks_skip_empty_phases_and_wrap() {
        let g = SignalGroup::new(recipe("a", &["l"], 95.0, 10.0, 3.0), d(100.0)).unwrap();
        assert_eq!(
            g.flanks(d(100.0)),
            vec![
                Flank::new(d(95.0), LightColor::Green),
                Flank::new(d(5.0), LightColor::Yellow),
                Flank::new(d(8.0), LightColor::Red),
            ]
        );
    }

    #[test]
    fn group_without_red_has_no_red_flank() {
        let g = SignalGroup::new(recipe("a", &["l"], 30.0, 100.0, 0.0), d(100.0)).unwrap();
        assert_eq!(g.flanks(d(100.0)), vec![Flank::new(d(30.0), LightColor::Green)]);
    }
}

// ── Flank ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod flank {
    use std::cmp::Ordering;

    use super::*;

    const MARGIN: Duration = Duration(0.01);

    #[test]
    fn green_sorts_first_at_equal_offsets() {
        let mut flanks = vec![
            Flank::new(d(10.0), LightColor::Red),
            Flank::new(d(10.0), LightColor::Green),
            Flank::new(d(5.0), LightColor::Yellow),
        ];
        sort_flanks(&mut flanks, MARGIN);
        let colors: Vec<LightColor> = flanks.iter().map(|f| f.color).collect();
        assert_eq!(colors, vec![LightColor::Yellow, LightColor::Green, LightColor::Red]);
    }

    #[test]
    fn offsets_within_margin_count_as_equal() {
        let mut flanks = vec![
            Flank::new(d(10.0), LightColor::Red),
            Flank::new(d(10.005), LightColor::Green),
        ];
        sort_flanks(&mut flanks, MARGIN);
        assert_eq!(flanks[0].color, LightColor::Green);
        assert_eq!(flanks[1].color, LightColor::Red);
    }

    #[test]
    fn pairwise_comparison() {
        let red = Flank::new(d(10.0), LightColor::Red);
        let green = Flank::new(d(10.005), LightColor::Green);
        assert_eq!(red.cmp_with_margin(&green, MARGIN), Ordering::Greater);
        assert_eq!(green.cmp_with_margin(&red, MARGIN), Ordering::Less);
        assert_eq!(
            Flank::new(d(5.0), LightColor::Red).cmp_with_margin(&green, MARGIN),
            Ordering::Less
        );
        assert_eq!(red.cmp_with_margin(&red, MARGIN), Ordering::Equal);
    }
}

// ── ConflictResolver ──────────────────────────────────────────────────────────

#[cfg(test)]
mod resolver {
    use super::*;

    fn resolve(recipes: Vec<SignalGroupRecipe>) -> crate::Resolution {
        ConflictResolver::new(d(100.0)).resolve(groups(100.0, recipes)).unwrap()
    }

    fn recipes_of(groups: &[SignalGroup]) -> Vec<SignalGroupRecipe> {
        groups.iter().map(|g| g.recipe().clone()).collect()
    }

    #[test]
    fn touching_greens_merge_into_one_window() {
        let out = resolve(vec![recipe("a", &["L"], 0.0, 10.0, 0.0), recipe("b", &["L"], 10.0, 10.0, 0.0)]);
        assert_eq!(out.merged_lights, vec!["L".to_string()]);
        assert_eq!(out.groups.len(), 1);
        let g = &out.groups[0];
        assert_eq!(g.id(), "merged[a,b]#1");
        assert_eq!(g.offset(), d(0.0));
        assert_eq!(g.pre_green(), d(0.0));
        assert_eq!(g.green(), d(20.0));
        assert_eq!(g.yellow(), d(0.0));
        assert_eq!(g.red(), d(80.0));
    }

    #[test]
    fn overlapping_greens_merge_into_their_union() {
        let out = resolve(vec![recipe("a", &["L"], 0.0, 10.0, 0.0), recipe("b", &["L"], 5.0, 10.0, 0.0)]);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].offset(), d(0.0));
        assert_eq!(out.groups[0].green(), d(15.0));
    }

    #[test]
    fn yellow_waits_for_the_last_green_source() {
        let out = resolve(vec![recipe("a", &["L"], 0.0, 10.0, 3.0), recipe("b", &["L"], 5.0, 10.0, 3.0)]);
        let g = &out.groups[0];
        assert_eq!(g.green(), d(15.0));
        assert_eq!(g.yellow(), d(3.0));
        assert_eq!(g.red(), d(82.0));
    }

    #[test]
    fn green_during_yellow_opens_a_new_window() {
        // `a` turns yellow at 10, `b` turns green at 12 and red at 22.
        let out = resolve(vec![recipe("a", &["L"], 0.0, 10.0, 3.0), recipe("b", &["L"], 12.0, 10.0, 0.0)]);
        let summary: Vec<(&str, Duration, Duration, Duration)> =
            out.groups.iter().map(|g| (g.id(), g.offset(), g.green(), g.yellow())).collect();
        assert_eq!(
            summary,
            vec![
                ("merged[a,b]#1", d(0.0), d(10.0), d(2.0)),
                ("merged[a,b]#2", d(12.0), d(10.0), d(0.0)),
            ]
        );
    }

    #[test]
    fn touching_greens_filling_the_cycle_become_one_steady_green() {
        let out = resolve(vec![recipe("a", &["L"], 0.0, 50.0, 0.0), recipe("b", &["L"], 50.0, 50.0, 0.0)]);
        assert_eq!(out.merged_lights, vec!["L".to_string()]);
        assert_eq!(out.groups.len(), 1);
        let g = &out.groups[0];
        assert_eq!(g.id(), "merged[a,b]#1");
        assert_eq!(g.green(), d(100.0));
        assert_eq!(g.red(), d(0.0));
        assert_eq!(g.initial_state(d(0.0), d(100.0), SimTime(73.0)).0, LightColor::Green);
    }

    #[test]
    fn pre_green_during_yellow_starts_at_the_red() {
        // `b` enters pre-green at 11 while `a` is still yellow until 13.
        let out = resolve(vec![
            recipe("a", &["L"], 0.0, 10.0, 3.0),
            SignalGroupRecipe::new("b", ["L"], d(11.0), d(4.0), d(10.0), d(0.0)),
        ]);
        let summary: Vec<(Duration, Duration, Duration, Duration)> = out
            .groups
            .iter()
            .map(|g| (g.offset(), g.pre_green(), g.green(), g.yellow()))
            .collect();
        assert_eq!(
            summary,
            vec![(d(0.0), d(0.0), d(10.0), d(3.0)), (d(13.0), d(2.0), d(10.0), d(0.0))]
        );
    }

    #[test]
    fn other_lights_stay_with_their_groups() {
        let out = resolve(vec![
            recipe("a", &["L", "a1"], 0.0, 10.0, 0.0),
            recipe("b", &["L", "b1"], 5.0, 10.0, 0.0),
        ]);
        let ids: Vec<&str> = out.groups.iter().map(|g| g.id()).collect();
        assert_eq!(ids, vec!["a", "b", "merged[a,b]#1"]);
        assert_eq!(out.groups[0].traffic_light_ids().iter().collect::<Vec<_>>(), vec!["a1"]);
        assert_eq!(out.groups[1].traffic_light_ids().iter().collect::<Vec<_>>(), vec!["b1"]);
        assert_eq!(out.groups[2].traffic_light_ids().iter().collect::<Vec<_>>(), vec!["L"]);
    }

    #[test]
    fn window_wrapping_the_cycle_boundary() {
        let out = resolve(vec![recipe("a", &["L"], 95.0, 10.0, 0.0), recipe("b", &["L"], 0.0, 10.0, 0.0)]);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].offset(), d(95.0));
        assert_eq!(out.groups[0].green(), d(15.0));
    }

    #[test]
    fn separate_windows_become_separate_groups() {
        let out = resolve(vec![
            recipe("a", &["L"], 0.0, 10.0, 0.0),
            recipe("b", &["L"], 5.0, 10.0, 0.0),
            recipe("c", &["L"], 50.0, 10.0, 0.0),
        ]);
        let summary: Vec<(&str, Duration, Duration)> =
            out.groups.iter().map(|g| (g.id(), g.offset(), g.green())).collect();
        assert_eq!(
            summary,
            vec![
                ("merged[a,b,c]#1", d(0.0), d(15.0)),
                ("merged[a,b,c]#2", d(50.0), d(10.0)),
            ]
        );
    }

    #[test]
    fn disjoint_windows_on_a_shared_light_are_resynthesized() {
        let out = resolve(vec![
            recipe("a", &["L", "a1"], 0.0, 10.0, 3.0),
            recipe("b", &["L", "b1"], 50.0, 10.0, 3.0),
        ]);
        assert_eq!(out.merged_lights, vec!["L".to_string()]);
        let summary: Vec<(&str, Duration, Duration, Duration)> =
            out.groups.iter().map(|g| (g.id(), g.offset(), g.green(), g.yellow())).collect();
        assert_eq!(
            summary,
            vec![
                ("a", d(0.0), d(10.0), d(3.0)),
                ("b", d(50.0), d(10.0), d(3.0)),
                ("merged[a,b]#1", d(0.0), d(10.0), d(3.0)),
                ("merged[a,b]#2", d(50.0), d(10.0), d(3.0)),
            ]
        );
        assert!(!out.groups[0].traffic_light_ids().contains("L"));
    }

    #[test]
    fn single_light_groups_that_already_match_are_kept() {
        let input = vec![recipe("a", &["L"], 0.0, 10.0, 3.0), recipe("b", &["L"], 50.0, 10.0, 3.0)];
        let out = resolve(input.clone());
        assert!(out.merged_lights.is_empty());
        assert_eq!(recipes_of(&out.groups), input);
    }

    #[test]
    fn resolution_is_idempotent() {
        let first = resolve(vec![
            recipe("a", &["L", "a1"], 0.0, 10.0, 3.0),
            recipe("b", &["L"], 5.0, 10.0, 3.0),
        ]);
        let second = resolve(recipes_of(&first.groups));
        assert!(second.merged_lights.is_empty());
        assert_eq!(recipes_of(&second.groups), recipes_of(&first.groups));
    }

    #[test]
    fn split_windows_resolve_to_themselves() {
        let first = resolve(vec![recipe("a", &["L"], 0.0, 10.0, 3.0), recipe("b", &["L"], 12.0, 10.0, 0.0)]);
        assert_eq!(first.groups.len(), 2);
        let second = resolve(recipes_of(&first.groups));
        assert!(second.merged_lights.is_empty());
        assert_eq!(recipes_of(&second.groups), recipes_of(&first.groups));
    }

    #[test]
    fn output_does_not_depend_on_input_order() {
        let mut input = vec![
            recipe("x", &["L", "M"], 0.0, 10.0, 3.0),
            recipe("y", &["L"], 5.0, 20.0, 3.0),
            recipe("z", &["M"], 12.0, 10.0, 0.0),
        ];
        let forward = resolve(input.clone());
        input.reverse();
        let backward = resolve(input);
        assert_eq!(recipes_of(&forward.groups), recipes_of(&backward.groups));
        assert_eq!(forward.merged_lights, backward.merged_lights);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = ConflictResolver::new(d(100.0))
            .resolve(groups(100.0, vec![recipe("a", &["L"], 0.0, 10.0, 0.0), recipe("a", &["M"], 0.0, 10.0, 0.0)]))
            .unwrap_err();
        assert!(matches!(err, ControlError::DuplicateGroup(id) if id == "a"));
    }
}

// ── FixedTimeController ───────────────────────────────────────────────────────

#[cfg(test)]
mod controller {
    use super::*;

    fn single_group(pre_green: f64) -> FixedTimeController {
        FixedTimeController::new(
            "c",
            d(60.0),
            d(0.0),
            vec![SignalGroupRecipe::new("ns", ["n"], d(0.0), d(pre_green), d(25.0), d(3.0))],
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_positive_cycle() {
        let err = FixedTimeController::new("c", d(0.0), d(0.0), vec![]).unwrap_err();
        assert!(matches!(err, ControlError::CycleTime { .. }));
    }

    #[test]
    fn construction_resolves_conflicts() {
        let c = FixedTimeController::new(
            "c",
            d(100.0),
            d(0.0),
            vec![recipe("a", &["L"], 0.0, 10.0, 0.0), recipe("b", &["L"], 10.0, 10.0, 0.0)],
        )
        .unwrap();
        assert_eq!(c.signal_groups().len(), 1);
        assert_eq!(c.signal_group("merged[a,b]#1").unwrap().green(), d(20.0));
        assert_eq!(c.cycle_time(), d(100.0));
        assert_eq!(c.offset(), d(0.0));
    }

    #[test]
    fn colors_repeat_every_cycle() {
        let mut c = single_group(2.0);
        let lookup = RecordingLookup::with(&["n"]);
        let mut queue = EventQueue::new();
        c.schedule_startup(&mut queue).unwrap();

        let cycles = 3;
        let changes = run_until(&mut c, &mut queue, &lookup, SimTime(60.0 * cycles as f64));

        // Every full cycle adds four changes; the last one opens cycle N+1.
        assert_eq!(changes.len(), 4 * cycles + 1);
        for (i, &(_, color)) in changes.iter().enumerate() {
            assert_eq!(color, LightColor::CYCLE[i % 4]);
        }
        let times: Vec<f64> = changes.iter().take(4).map(|(t, _)| t.0).collect();
        assert_eq!(times, vec![0.0, 2.0, 27.0, 30.0]);
        assert_eq!(changes[4 * cycles].0, SimTime(60.0 * cycles as f64));
        assert_eq!(lookup.seen("n").len(), changes.len());
    }

    #[test]
    fn zero_pre_green_is_never_shown() {
        let mut c = single_group(0.0);
        let lookup = RecordingLookup::with(&["n"]);
        let mut queue = EventQueue::new();
        c.schedule_startup(&mut queue).unwrap();
        run_until(&mut c, &mut queue, &lookup, SimTime(600.0));

        let seen = lookup.seen("n");
        assert!(!seen.contains(&LightColor::PreGreen));
        assert_eq!(&seen[..4], &[LightColor::Green, LightColor::Yellow, LightColor::Red, LightColor::Green]);
        assert_eq!(c.group_at(GroupIndex(0)).unwrap().current_color(), *seen.last().unwrap());
    }

    #[test]
    fn startup_mid_cycle_shows_red_until_next_cycle() {
        let mut c = FixedTimeController::new(
            "c",
            d(100.0),
            d(0.0),
            vec![recipe("g", &["l"], 0.0, 30.0, 3.0)],
        )
        .unwrap();
        let lookup = RecordingLookup::with(&["l"]);
        let mut queue = EventQueue::starting_at(SimTime(50.0));

        let shown = c.startup(&mut queue, &lookup).unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].color, LightColor::Red);
        assert_eq!(queue.next_time(), Some(SimTime(100.0)));
        assert_eq!(lookup.seen("l"), vec![LightColor::Red]);
    }

    #[test]
    fn unknown_light_fails_startup_without_side_effects() {
        let mut c = single_group(0.0);
        let lookup = RecordingLookup::default();
        let mut queue = EventQueue::new();

        let err = c.startup(&mut queue, &lookup).unwrap_err();
        assert!(matches!(
            err,
            ControlError::UnknownTrafficLight { ref group, ref light } if group == "ns" && light == "n"
        ));
        assert!(queue.is_empty());
        assert!(!c.is_started());
    }

    #[test]
    fn second_startup_is_rejected() {
        let mut c = single_group(0.0);
        let lookup = RecordingLookup::with(&["n"]);
        let mut queue = EventQueue::new();
        c.startup(&mut queue, &lookup).unwrap();
        assert!(matches!(c.startup(&mut queue, &lookup), Err(ControlError::AlreadyStarted(_))));
    }

    #[test]
    fn transition_before_startup_fails() {
        let mut c = single_group(0.0);
        let mut queue = EventQueue::new();
        assert!(matches!(
            c.transition(GroupIndex(0), &mut queue),
            Err(ControlError::NotStarted(_))
        ));
    }

    #[test]
    fn startup_cannot_be_scheduled_in_the_past() {
        let c = single_group(0.0);
        let mut queue = EventQueue::starting_at(SimTime(5.0));
        assert!(matches!(
            c.schedule_startup(&mut queue),
            Err(ControlError::Schedule(ScheduleError::InPast { .. }))
        ));
    }

    #[test]
    fn stale_events_are_ignored() {
        let original = single_group(0.0);
        let mut copy = original.clone_for_new_run();
        assert_ne!(original.run_token(), copy.run_token());

        let lookup = RecordingLookup::with(&["n"]);
        let mut queue = EventQueue::new();
        let stale = ControlEvent { run: original.run_token(), kind: ControlEventKind::Startup };
        assert!(copy.handle_event(stale, &mut queue, &lookup).unwrap().is_empty());
        assert!(!copy.is_started());
        assert!(lookup.seen("n").is_empty());
    }

    #[test]
    fn clone_runs_independently() {
        let mut original = single_group(0.0);
        let lookup_a = RecordingLookup::with(&["n"]);
        let mut queue_a = EventQueue::new();
        original.schedule_startup(&mut queue_a).unwrap();
        run_until(&mut original, &mut queue_a, &lookup_a, SimTime(26.0));

        let mut queue_b = EventQueue::new();
        let mut copy = original.clone_onto(&mut queue_b).unwrap();
        assert_eq!(queue_b.len(), 1);
        assert_eq!(copy.group_at(GroupIndex(0)).unwrap().current_color(), LightColor::Red);
        assert_eq!(copy.config(), original.config());

        let lookup_b = RecordingLookup::with(&["n"]);
        run_until(&mut copy, &mut queue_b, &lookup_b, SimTime(0.0));
        assert_eq!(lookup_b.seen("n"), vec![LightColor::Green]);
        assert_eq!(lookup_a.seen("n"), vec![LightColor::Green, LightColor::Yellow]);
    }

    /// The strongest color any of `sources` shows at `at`.
    fn strongest_at(sources: &[SignalGroup], at: SimTime) -> LightColor {
        let colors: Vec<LightColor> =
            sources.iter().map(|g| g.initial_state(d(0.0), d(100.0), at).0).collect();
        [LightColor::Green, LightColor::Yellow, LightColor::PreGreen]
            .into_iter()
            .find(|c| colors.contains(c))
            .unwrap_or(LightColor::Red)
    }

    #[test]
    fn shared_light_shows_the_strongest_source_color() {
        let cases: Vec<(&str, Vec<SignalGroupRecipe>)> = vec![
            ("touching", vec![recipe("a", &["L"], 0.0, 10.0, 3.0), recipe("b", &["L"], 10.0, 10.0, 3.0)]),
            ("overlapping", vec![recipe("a", &["L"], 0.0, 10.0, 3.0), recipe("b", &["L"], 5.0, 10.0, 3.0)]),
            ("disjoint", vec![recipe("a", &["L"], 0.0, 10.0, 0.0), recipe("b", &["L"], 50.0, 10.0, 0.0)]),
            ("wrapping", vec![recipe("a", &["L"], 95.0, 10.0, 3.0), recipe("b", &["L"], 0.0, 10.0, 3.0)]),
            ("full cycle", vec![recipe("a", &["L"], 0.0, 50.0, 0.0), recipe("b", &["L"], 50.0, 50.0, 0.0)]),
            ("green in yellow", vec![recipe("a", &["L"], 0.0, 10.0, 3.0), recipe("b", &["L"], 12.0, 10.0, 0.0)]),
            (
                "pre-green in yellow",
                vec![
                    recipe("a", &["L"], 0.0, 10.0, 3.0),
                    SignalGroupRecipe::new("b", ["L"], d(11.0), d(4.0), d(10.0), d(0.0)),
                ],
            ),
        ];

        for (name, recipes) in cases {
            let sources = groups(100.0, recipes.clone());
            let mut c = FixedTimeController::new("c", d(100.0), d(0.0), recipes).unwrap();
            for g in c.signal_groups() {
                assert_eq!(g.pre_green() + g.green() + g.yellow() + g.red(), d(100.0), "{name}");
            }
            let lookup = RecordingLookup::with(&["L"]);
            let mut queue = EventQueue::new();
            c.schedule_startup(&mut queue).unwrap();

            // Every source flank over two and a half cycles.
            let mut times: Vec<f64> = sources
                .iter()
                .flat_map(|g| g.flanks(d(100.0)))
                .flat_map(|f| (0..3).map(move |k| f.offset.0 + 100.0 * k as f64))
                .filter(|&t| t <= 250.0)
                .collect();
            times.push(0.0);
            times.sort_by(f64::total_cmp);
            times.dedup();

            for t in times {
                while let Some((_, event)) = queue.pop_until(SimTime(t)) {
                    c.handle_event(event, &mut queue, &lookup).unwrap();
                }
                let shown = *lookup.seen("L").last().unwrap();
                assert_eq!(shown, strongest_at(&sources, SimTime(t)), "{name} at t={t}");
            }
        }
    }

    #[test]
    fn disjoint_groups_on_one_light_start_with_the_active_color() {
        let mut c = FixedTimeController::new(
            "c",
            d(100.0),
            d(0.0),
            vec![recipe("a", &["L"], 0.0, 10.0, 0.0), recipe("b", &["L"], 50.0, 10.0, 0.0)],
        )
        .unwrap();
        assert_eq!(c.signal_groups().len(), 2);
        let lookup = RecordingLookup::with(&["L"]);
        let mut queue = EventQueue::new();
        c.schedule_startup(&mut queue).unwrap();

        run_until(&mut c, &mut queue, &lookup, SimTime(5.0));
        assert_eq!(lookup.seen("L"), vec![LightColor::Green]);
        run_until(&mut c, &mut queue, &lookup, SimTime(55.0));
        assert_eq!(lookup.seen("L"), vec![LightColor::Green, LightColor::Red, LightColor::Green]);
    }

    #[test]
    fn light_held_green_all_cycle_never_changes() {
        let mut c = FixedTimeController::new(
            "c",
            d(100.0),
            d(0.0),
            vec![recipe("a", &["L"], 0.0, 50.0, 0.0), recipe("b", &["L"], 50.0, 50.0, 0.0)],
        )
        .unwrap();
        assert_eq!(c.signal_groups().len(), 1);
        let lookup = RecordingLookup::with(&["L"]);
        let mut queue = EventQueue::new();
        c.schedule_startup(&mut queue).unwrap();

        run_until(&mut c, &mut queue, &lookup, SimTime(250.0));
        assert!(lookup.seen("L").iter().all(|&color| color == LightColor::Green));
        assert_eq!(c.group_at(GroupIndex(0)).unwrap().current_color(), LightColor::Green);
    }

    #[test]
    fn config_rebuilds_an_equivalent_controller() {
        let c = FixedTimeController::new(
            "c",
            d(100.0),
            d(7.0),
            vec![recipe("a", &["L"], 0.0, 10.0, 3.0), recipe("b", &["L"], 5.0, 10.0, 3.0)],
        )
        .unwrap();
        let rebuilt = c.config().build().unwrap();
        assert_eq!(rebuilt.config(), c.config());
        assert_ne!(rebuilt.run_token(), c.run_token());
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use super::*;
    use crate::{load_timing_plan_csv, load_timing_plan_reader};

    const CSV: &str = "\
group_id,traffic_light_ids,offset,pre_green,green,yellow
north,n.1; n.2,0,1,30,3
east,e.1,45,,30,3
";

    #[test]
    fn parses_rows_in_file_order() {
        let recipes = load_timing_plan_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(
            recipes[0],
            SignalGroupRecipe::new("north", ["n.1", "n.2"], d(0.0), d(1.0), d(30.0), d(3.0))
        );
        assert_eq!(recipes[1].id, "east");
        assert_eq!(recipes[1].pre_green, Duration::ZERO);
        assert_eq!(recipes[1].offset, d(45.0));
    }

    #[test]
    fn bad_number_is_a_parse_error() {
        let csv = "group_id,traffic_light_ids,offset,pre_green,green,yellow\na,l,0,0,abc,3\n";
        let err = load_timing_plan_reader(Cursor::new(csv)).unwrap_err();
        assert!(matches!(err, ControlError::Parse(_)));
    }

    #[test]
    fn empty_light_list_is_a_parse_error() {
        let csv = "group_id,traffic_light_ids,offset,pre_green,green,yellow\na, ; ,0,0,10,3\n";
        let err = load_timing_plan_reader(Cursor::new(csv)).unwrap_err();
        assert!(matches!(err, ControlError::Parse(msg) if msg.contains("traffic_light_ids")));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("plan.csv");
        std::fs::File::create(&path).unwrap().write_all(CSV.as_bytes()).unwrap();

        let recipes = load_timing_plan_csv(&path).unwrap();
        let controller = FixedTimeController::new("c", d(90.0), d(0.0), recipes).unwrap();
        assert_eq!(controller.signal_groups().len(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = load_timing_plan_csv(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, ControlError::Io(_)));
    }
}
