//! The fixed-time controller.
//!
//! # Lifecycle
//!
//! ```text
//! new(id, cycle, offset, recipes)   validate + resolve conflicts
//!   └─ schedule_startup(scheduler)  Startup event at t = 0
//!        └─ startup(scheduler, lookup)
//!             bind sinks, show initial colors, one Transition per group
//!               └─ transition(group)   show next color, schedule successor
//!                    └─ … forever
//! ```
//!
//! Each group owns exactly one pending event at a time: the one its previous
//! transition scheduled.
//!
//! A light split into several merged windows is driven by one group per
//! window.  A group turning red leaves such a light alone while another of
//! its groups shows a color other than red.  Events carry the controller's [`RunToken`]; an
//! event whose token does not match is stale (its controller was replaced or
//! cloned) and is ignored.

use std::collections::BTreeMap;

use sig_core::time::validate_cycle;
use sig_core::{Duration, GroupIndex, LightColor, RunToken, SharedSink, SimTime, TrafficLightLookup};
use sig_schedule::Scheduler;

use crate::{
    ConflictResolver, ControlError, ControlResult, ControllerConfig, SignalGroup,
    SignalGroupRecipe,
};

/// Upper bound on zero-length phases skipped in one transition.  A cycle has
/// four phases and a positive length, so at most three can be zero.
pub const MAX_ZERO_PHASE_COLLAPSES: usize = 4;

// ── Events ────────────────────────────────────────────────────────────────────

/// What a scheduled controller event should do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlEventKind {
    /// Bind sinks and show initial colors.
    Startup,
    /// Move one group to its next non-empty phase.
    Transition(GroupIndex),
}

/// A scheduled event addressed to one controller instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ControlEvent {
    pub run:  RunToken,
    pub kind: ControlEventKind,
}

/// A color shown by a group at a point in time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorChange {
    pub group: GroupIndex,
    pub color: LightColor,
    pub at:    SimTime,
}

// ── FixedTimeController ───────────────────────────────────────────────────────

/// Drives a set of conflict-free signal groups on a shared cycle.
#[derive(Debug)]
pub struct FixedTimeController {
    id:         String,
    cycle_time: Duration,
    offset:     Duration,
    groups:     Vec<SignalGroup>,
    /// light id → indices of the groups driving it, for lights with several
    shared:     BTreeMap<String, Vec<usize>>,
    run:        RunToken,
    started:    bool,
}

impl FixedTimeController {
    /// Validate the recipes and resolve green-phase conflicts.
    ///
    /// Fails if `cycle_time` is not positive, if `offset` is not finite, or
    /// if any recipe is invalid (see [`SignalGroup::new`]).
    pub fn new(
        id:         impl Into<String>,
        cycle_time: Duration,
        offset:     Duration,
        recipes:    Vec<SignalGroupRecipe>,
    ) -> ControlResult<Self> {
        let id = id.into();
        let cycle_time = validate_cycle(cycle_time)
            .map_err(|source| ControlError::CycleTime { controller: id.clone(), source })?;
        if !offset.0.is_finite() {
            return Err(ControlError::NonFinite {
                owner: format!("controller {id}"),
                what:  "offset",
                value: offset.0,
            });
        }

        let groups = recipes
            .into_iter()
            .map(|r| SignalGroup::new(r, cycle_time))
            .collect::<ControlResult<Vec<_>>>()?;
        let resolution = ConflictResolver::new(cycle_time).resolve(groups)?;

        log::info!(
            "controller {id}: cycle {cycle_time}, offset {offset}, {} signal group(s), {} merged light(s)",
            resolution.groups.len(),
            resolution.merged_lights.len()
        );

        Ok(Self {
            id,
            cycle_time,
            offset,
            shared: shared_lights(&resolution.groups),
            groups: resolution.groups,
            run: RunToken::fresh(),
            started: false,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cycle_time(&self) -> Duration {
        self.cycle_time
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Conflict-resolved groups, in id order.
    pub fn signal_groups(&self) -> &[SignalGroup] {
        &self.groups
    }

    pub fn signal_group(&self, id: &str) -> Option<&SignalGroup> {
        self.groups.iter().find(|g| g.id() == id)
    }

    pub fn group_at(&self, index: GroupIndex) -> Option<&SignalGroup> {
        self.groups.get(index.index())
    }

    pub fn run_token(&self) -> RunToken {
        self.run
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The resolved timing as plain configuration.
    pub fn config(&self) -> ControllerConfig {
        ControllerConfig {
            id:            self.id.clone(),
            cycle_time:    self.cycle_time,
            offset:        self.offset,
            signal_groups: self.groups.iter().map(|g| g.recipe().clone()).collect(),
        }
    }

    // ── Cloning for a new run ─────────────────────────────────────────────

    /// An unstarted copy with the same resolved timing and a fresh token.
    ///
    /// The copy shares no runtime state with `self`; events scheduled by
    /// `self` are ignored by it.
    pub fn clone_for_new_run(&self) -> Self {
        Self {
            id:         self.id.clone(),
            cycle_time: self.cycle_time,
            offset:     self.offset,
            groups:     self.groups.iter().map(SignalGroup::unbound_copy).collect(),
            shared:     self.shared.clone(),
            run:        RunToken::fresh(),
            started:    false,
        }
    }

    /// [`clone_for_new_run`](Self::clone_for_new_run), with the copy's
    /// startup scheduled on `scheduler`.
    pub fn clone_onto<S>(&self, scheduler: &mut S) -> ControlResult<Self>
    where
        S: Scheduler<ControlEvent> + ?Sized,
    {
        let copy = self.clone_for_new_run();
        copy.schedule_startup(scheduler)?;
        Ok(copy)
    }

    // ── Startup ───────────────────────────────────────────────────────────

    /// Schedule this controller's startup at simulation time zero.
    ///
    /// Fails if the scheduler's clock has already passed zero.
    pub fn schedule_startup<S>(&self, scheduler: &mut S) -> ControlResult<()>
    where
        S: Scheduler<ControlEvent> + ?Sized,
    {
        scheduler
            .schedule_at(SimTime::ZERO, self.event(ControlEventKind::Startup))
            .inspect_err(|e| log::warn!("controller {}: cannot schedule startup: {e}", self.id))?;
        Ok(())
    }

    /// Bind every group to its sinks, show the initial colors, and schedule
    /// each group's first transition.
    ///
    /// All traffic-light ids are resolved before anything is shown or
    /// scheduled, so a failed startup leaves no trace.  May only be called
    /// once per controller.
    pub fn startup<S, L>(&mut self, scheduler: &mut S, lookup: &L) -> ControlResult<Vec<ColorChange>>
    where
        S: Scheduler<ControlEvent> + ?Sized,
        L: TrafficLightLookup + ?Sized,
    {
        if self.started {
            return Err(ControlError::AlreadyStarted(self.id.clone()));
        }

        let bindings = self
            .groups
            .iter()
            .map(|group| {
                group
                    .traffic_light_ids()
                    .iter()
                    .map(|light| {
                        lookup.resolve(light).ok_or_else(|| ControlError::UnknownTrafficLight {
                            group: group.id().to_owned(),
                            light: light.clone(),
                        })
                    })
                    .collect::<ControlResult<Vec<SharedSink>>>()
            })
            .collect::<ControlResult<Vec<_>>>()?;
        self.started = true;

        let now = scheduler.now();
        let initial: Vec<(LightColor, Duration)> = self
            .groups
            .iter()
            .map(|g| g.initial_state(self.offset, self.cycle_time, now))
            .collect();
        // Every group's color is recorded before any is shown, so a red
        // group can see which shared lights another group holds.
        for ((group, sinks), &(color, _)) in self.groups.iter_mut().zip(bindings).zip(&initial) {
            group.bind(sinks);
            group.set_current_color(color);
        }

        let mut shown = Vec::with_capacity(self.groups.len());
        for (i, &(color, wait)) in initial.iter().enumerate() {
            let index = GroupIndex(i as u32);
            self.display(i, color);
            scheduler.schedule_after(wait, self.event(ControlEventKind::Transition(index)))?;
            log::debug!(
                "controller {}: group {} starts {color} at {now}, next flank in {wait}",
                self.id,
                self.groups[i].id()
            );
            shown.push(ColorChange { group: index, color, at: now });
        }

        log::info!("controller {} started at {now}", self.id);
        Ok(shown)
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Move `group` to its next phase with a positive duration, show it, and
    /// schedule the following transition.
    ///
    /// # Panics
    ///
    /// Panics if [`MAX_ZERO_PHASE_COLLAPSES`] consecutive phases have zero
    /// length.  Validation makes this unreachable for a positive cycle.
    pub fn transition<S>(&mut self, group: GroupIndex, scheduler: &mut S) -> ControlResult<ColorChange>
    where
        S: Scheduler<ControlEvent> + ?Sized,
    {
        if !self.started {
            return Err(ControlError::NotStarted(self.id.clone()));
        }
        let event = self.event(ControlEventKind::Transition(group));
        let i = group.index();
        let Some(mut color) = self.groups.get(i).map(SignalGroup::current_color) else {
            return Err(ControlError::UnknownGroup { controller: self.id.clone(), group });
        };

        let now = scheduler.now();
        for _ in 0..MAX_ZERO_PHASE_COLLAPSES {
            let (next, duration) = self.groups[i].advance(color);
            color = next;
            if duration.is_non_positive() {
                continue;
            }
            self.display(i, color);
            scheduler.schedule_after(duration, event)?;
            log::debug!(
                "controller {}: group {} -> {color} at {now} for {duration}",
                self.id,
                self.groups[i].id()
            );
            return Ok(ColorChange { group, color, at: now });
        }

        panic!(
            "controller {}: signal group {} has no phase with a positive duration",
            self.id,
            self.groups[i].id()
        );
    }

    /// Show `color` on group `i`'s lights.  A red group skips every shared
    /// light another group shows a color other than red on.
    fn display(&mut self, i: usize, color: LightColor) {
        let held: Vec<bool> = if color == LightColor::Red {
            self.groups[i]
                .traffic_light_ids()
                .iter()
                .map(|light| {
                    self.shared.get(light).is_some_and(|drivers| {
                        drivers
                            .iter()
                            .any(|&j| j != i && self.groups[j].current_color() != LightColor::Red)
                    })
                })
                .collect()
        } else {
            Vec::new()
        };
        self.groups[i].show(color, &held);
    }

    /// Dispatch a scheduled event.
    ///
    /// Events addressed to another run token are ignored and yield no color
    /// changes.
    pub fn handle_event<S, L>(
        &mut self,
        event:     ControlEvent,
        scheduler: &mut S,
        lookup:    &L,
    ) -> ControlResult<Vec<ColorChange>>
    where
        S: Scheduler<ControlEvent> + ?Sized,
        L: TrafficLightLookup + ?Sized,
    {
        if event.run != self.run {
            log::debug!("controller {}: ignoring stale event {event:?}", self.id);
            return Ok(Vec::new());
        }
        match event.kind {
            ControlEventKind::Startup => self.startup(scheduler, lookup),
            ControlEventKind::Transition(group) => Ok(vec![self.transition(group, scheduler)?]),
        }
    }

    fn event(&self, kind: ControlEventKind) -> ControlEvent {
        ControlEvent { run: self.run, kind }
    }
}

/// Lights driven by more than one group, with the indices of those groups.
fn shared_lights(groups: &[SignalGroup]) -> BTreeMap<String, Vec<usize>> {
    let mut drivers: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, group) in groups.iter().enumerate() {
        for light in group.traffic_light_ids() {
            drivers.entry(light.clone()).or_default().push(i);
        }
    }
    drivers.retain(|_, groups| groups.len() > 1);
    drivers
}
