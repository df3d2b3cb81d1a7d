//! Signal groups: a timing recipe plus the color state machine it drives.
//!
//! # Cycle model
//!
//! A group's phases occupy one window at the start of its own cycle, then red
//! fills the rest:
//!
//! ```text
//! |<- pre_green ->|<- green ->|<- yellow ->|<------- red ------->|
//! ^ total offset                                                 ^ + cycle
//! red = cycle - pre_green - green - yellow
//! ```
//!
//! The total offset is `(group.offset + controller.offset) mod cycle`, so the
//! window may start anywhere in the controller cycle and wrap across its
//! boundary.  Zero-length phases are legal; the controller skips them.

use std::collections::BTreeSet;
use std::fmt;

use sig_core::{Duration, LightColor, SharedSink, SimTime};

use crate::flank::Flank;
use crate::{ControlError, ControlResult};

// ── SignalGroupRecipe ─────────────────────────────────────────────────────────

/// The configured timing of a signal group, before validation.
///
/// This is plain data: configuration layers build it, the conflict resolver
/// rewrites it, and cloning a controller for a new run copies it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalGroupRecipe {
    pub id: String,

    /// Ids of the traffic lights this group drives.  Must be non-empty.
    pub traffic_light_ids: BTreeSet<String>,

    /// Start of pre-green relative to the controller's cycle origin.  May be
    /// negative or longer than the cycle.
    pub offset: Duration,

    #[cfg_attr(feature = "serde", serde(default))]
    pub pre_green: Duration,

    pub green: Duration,

    pub yellow: Duration,
}

impl SignalGroupRecipe {
    pub fn new<I, S>(
        id:                impl Into<String>,
        traffic_light_ids: I,
        offset:            Duration,
        pre_green:         Duration,
        green:             Duration,
        yellow:            Duration,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            traffic_light_ids: traffic_light_ids.into_iter().map(Into::into).collect(),
            offset,
            pre_green,
            green,
            yellow,
        }
    }

    /// A recipe with no pre-green phase.
    pub fn without_pre_green<I, S>(
        id:                impl Into<String>,
        traffic_light_ids: I,
        offset:            Duration,
        green:             Duration,
        yellow:            Duration,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, traffic_light_ids, offset, Duration::ZERO, green, yellow)
    }

    /// Length of the pre-green + green + yellow window.
    pub fn active_time(&self) -> Duration {
        self.pre_green + self.green + self.yellow
    }
}

// ── SignalGroup ───────────────────────────────────────────────────────────────

/// A validated signal group bound to one cycle time.
///
/// Holds the immutable recipe, the derived red time, and the runtime color
/// state.  The color starts red and is only changed by the owning controller.
pub struct SignalGroup {
    recipe:        SignalGroupRecipe,
    red:           Duration,
    current_color: LightColor,
    /// Live sinks, filled in by the controller at startup.
    sinks:         Vec<SharedSink>,
}

impl SignalGroup {
    /// Validate `recipe` against `cycle_time` and derive the red duration.
    ///
    /// Fails if the traffic-light set is empty, if any duration is negative
    /// or not finite, or if the non-red phases do not fit in the cycle.
    pub fn new(recipe: SignalGroupRecipe, cycle_time: Duration) -> ControlResult<Self> {
        let group = &recipe.id;
        if recipe.traffic_light_ids.is_empty() {
            return Err(ControlError::EmptyTrafficLights { group: group.clone() });
        }
        if !recipe.offset.0.is_finite() {
            return Err(ControlError::NonFinite {
                owner: format!("signal group {group}"),
                what:  "offset",
                value: recipe.offset.0,
            });
        }
        for (phase, value) in [
            ("pre-green", recipe.pre_green),
            ("green", recipe.green),
            ("yellow", recipe.yellow),
        ] {
            if !value.0.is_finite() {
                return Err(ControlError::NonFinite {
                    owner: format!("signal group {group}"),
                    what:  phase,
                    value: value.0,
                });
            }
            if value.0 < 0.0 {
                return Err(ControlError::NegativeDuration {
                    group: group.clone(),
                    phase,
                    value: value.0,
                });
            }
        }

        let red = (cycle_time - recipe.active_time()).snap_to_zero();
        if red.0 < 0.0 {
            return Err(ControlError::CycleTooShort {
                group:  group.clone(),
                cycle:  cycle_time,
                excess: -red,
            });
        }

        Ok(Self { recipe, red, current_color: LightColor::Red, sinks: Vec::new() })
    }

    /// A copy of the timing with fresh, unbound runtime state.
    pub fn unbound_copy(&self) -> SignalGroup {
        SignalGroup {
            recipe:        self.recipe.clone(),
            red:           self.red,
            current_color: LightColor::Red,
            sinks:         Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.recipe.id
    }

    pub fn recipe(&self) -> &SignalGroupRecipe {
        &self.recipe
    }

    pub fn traffic_light_ids(&self) -> &BTreeSet<String> {
        &self.recipe.traffic_light_ids
    }

    pub fn offset(&self) -> Duration {
        self.recipe.offset
    }

    pub fn pre_green(&self) -> Duration {
        self.recipe.pre_green
    }

    pub fn green(&self) -> Duration {
        self.recipe.green
    }

    pub fn yellow(&self) -> Duration {
        self.recipe.yellow
    }

    pub fn red(&self) -> Duration {
        self.red
    }

    pub fn current_color(&self) -> LightColor {
        self.current_color
    }

    /// `true` once the controller has attached live sinks.
    pub fn is_bound(&self) -> bool {
        !self.sinks.is_empty()
    }

    // ── Timing ────────────────────────────────────────────────────────────

    /// Configured duration of `color`'s phase.
    pub fn phase_duration(&self, color: LightColor) -> Duration {
        match color {
            LightColor::PreGreen => self.recipe.pre_green,
            LightColor::Green    => self.recipe.green,
            LightColor::Yellow   => self.recipe.yellow,
            LightColor::Red      => self.red,
        }
    }

    /// The color after `color` and how long that next phase lasts.
    pub fn advance(&self, color: LightColor) -> (LightColor, Duration) {
        let next = color.next();
        (next, self.phase_duration(next))
    }

    /// Where this group's pre-green starts within the controller cycle.
    pub fn total_offset(&self, controller_offset: Duration, cycle_time: Duration) -> Duration {
        (self.recipe.offset + controller_offset).rem_cycle(cycle_time)
    }

    /// The color active at `now` and the time remaining until the next flank.
    ///
    /// The returned wait is always positive: a phase is only reported as
    /// active if `now` lies strictly before its end.
    pub fn initial_state(
        &self,
        controller_offset: Duration,
        cycle_time:        Duration,
        now:               SimTime,
    ) -> (LightColor, Duration) {
        let total_offset = self.total_offset(controller_offset, cycle_time);
        let in_cycle = (now.since_origin() - total_offset).rem_cycle(cycle_time);

        let pre_green_end = self.recipe.pre_green;
        let green_end = pre_green_end + self.recipe.green;
        let yellow_end = green_end + self.recipe.yellow;

        if in_cycle.0 >= yellow_end.0 {
            (LightColor::Red, cycle_time - in_cycle)
        } else if in_cycle.0 < pre_green_end.0 {
            (LightColor::PreGreen, pre_green_end - in_cycle)
        } else if in_cycle.0 < green_end.0 {
            (LightColor::Green, green_end - in_cycle)
        } else {
            (LightColor::Yellow, yellow_end - in_cycle)
        }
    }

    /// The transitions this group makes within one cycle, at offsets folded
    /// into `[0, cycle)`.
    ///
    /// Zero-length pre-green, yellow and red phases produce no flank; green
    /// always does.  A group without a red flank never leaves its
    /// pre-green..yellow window.
    pub fn flanks(&self, cycle_time: Duration) -> Vec<Flank> {
        let mut flanks = Vec::with_capacity(4);
        let mut at = self.recipe.offset;
        if !self.recipe.pre_green.is_non_positive() {
            flanks.push(Flank::new(at.rem_cycle(cycle_time), LightColor::PreGreen));
            at += self.recipe.pre_green;
        }
        flanks.push(Flank::new(at.rem_cycle(cycle_time), LightColor::Green));
        at += self.recipe.green;
        if !self.recipe.yellow.is_non_positive() {
            flanks.push(Flank::new(at.rem_cycle(cycle_time), LightColor::Yellow));
            at += self.recipe.yellow;
        }
        if !self.red.is_non_positive() {
            flanks.push(Flank::new(at.rem_cycle(cycle_time), LightColor::Red));
        }
        flanks
    }

    // ── Runtime (controller only) ─────────────────────────────────────────

    pub(crate) fn bind(&mut self, sinks: Vec<SharedSink>) {
        self.sinks = sinks;
    }

    /// Record `color` without showing it.
    pub(crate) fn set_current_color(&mut self, color: LightColor) {
        self.current_color = color;
    }

    /// Record `color` and push it to every bound sink except those whose
    /// entry in `held` is `true`.  A short `held` holds nothing past its end.
    pub(crate) fn show(&mut self, color: LightColor, held: &[bool]) {
        self.current_color = color;
        for (i, sink) in self.sinks.iter().enumerate() {
            if !held.get(i).copied().unwrap_or(false) {
                sink.set_color(color);
            }
        }
    }
}

impl fmt::Debug for SignalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalGroup")
            .field("id", &self.recipe.id)
            .field("traffic_light_ids", &self.recipe.traffic_light_ids)
            .field("offset", &self.recipe.offset)
            .field("pre_green", &self.recipe.pre_green)
            .field("green", &self.recipe.green)
            .field("yellow", &self.recipe.yellow)
            .field("red", &self.red)
            .field("current_color", &self.current_color)
            .field("bound_sinks", &self.sinks.len())
            .finish()
    }
}
