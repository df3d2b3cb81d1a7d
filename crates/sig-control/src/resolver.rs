//! Green-phase conflict resolution.
//!
//! A traffic light listed in several signal groups would receive colors from
//! each of them.  [`ConflictResolver`] removes every such light from its
//! groups and gives it synthetic group(s) of its own, derived from what the
//! sources show together.
//!
//! # Per-light merge
//!
//! ```text
//! 1. flatten every referencing group into flanks        (PG? G Y? R?)
//! 2. sort with the flank margin; flanks within the margin are one instant
//! 3. each source starts in the color of its last flank
//! 4. replay the flanks, counting sources per color; after each instant the
//!    light shows the strongest color held:  GREEN > YELLOW > PREGREEN > RED
//! 5. cut the light's changes into PG? G Y? R windows, one group each:
//!      a change to RED closes the window
//!      a change back to an earlier phase (YELLOW → GREEN, … → PREGREEN)
//!      closes the window and opens the next one at the same instant
//! ```
//!
//! A light held green by touching windows for the entire cycle becomes one
//! group that is green for the whole cycle.
//!
//! If the sources already are single-light groups with exactly the merged
//! windows, the light keeps them, so resolving a resolved set changes
//! nothing.

use std::collections::{BTreeMap, BTreeSet};

use sig_core::{Duration, LightColor};

use crate::flank::{FLANK_COMPARE_MARGIN, Flank, coincident_runs, sort_flanks_by};
use crate::{ControlError, ControlResult, SignalGroup, SignalGroupRecipe};

// ── Output ────────────────────────────────────────────────────────────────────

/// The outcome of a resolution pass.
#[derive(Debug)]
pub struct Resolution {
    /// Conflict-free groups in id order: configured groups minus any lights
    /// moved out of them, plus the synthetic groups.
    pub groups: Vec<SignalGroup>,

    /// Lights that were given synthetic groups, in id order.
    pub merged_lights: Vec<String>,
}

/// One merged window for a single light.
#[derive(Clone, Copy, Debug)]
struct Window {
    offset:    Duration,
    pre_green: Duration,
    green:     Duration,
    yellow:    Duration,
}

// ── ConflictResolver ──────────────────────────────────────────────────────────

/// Rewrites a set of signal groups so every light shared by several groups
/// follows one merged schedule.
#[derive(Clone, Debug)]
pub struct ConflictResolver {
    cycle_time: Duration,
    margin:     Duration,
}

impl ConflictResolver {
    pub fn new(cycle_time: Duration) -> Self {
        Self { cycle_time, margin: FLANK_COMPARE_MARGIN }
    }

    /// Override the flank comparison margin.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }

    /// Resolve `groups`.  Output is independent of input order.
    ///
    /// Fails on duplicate group ids, including a configured id that clashes
    /// with a synthetic name.
    pub fn resolve(&self, mut groups: Vec<SignalGroup>) -> ControlResult<Resolution> {
        groups.sort_by(|a, b| a.id().cmp(b.id()));
        if let Some(pair) = groups.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(ControlError::DuplicateGroup(pair[0].id().to_owned()));
        }

        // light id → indices of the groups that drive it
        let mut users: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, group) in groups.iter().enumerate() {
            for light in group.traffic_light_ids() {
                users.entry(light.as_str()).or_default().push(i);
            }
        }

        let mut moved: Vec<BTreeSet<String>> = vec![BTreeSet::new(); groups.len()];
        let mut synthetic: Vec<SignalGroupRecipe> = Vec::new();
        let mut merged_lights = Vec::new();
        let mut seq = 0u32;

        for (light, indices) in &users {
            if indices.len() < 2 {
                continue;
            }
            let sources: Vec<&SignalGroup> = indices.iter().map(|&i| &groups[i]).collect();
            let Some(windows) = self.merge_light(&sources) else {
                continue;
            };

            let contributors: Vec<&str> = sources.iter().map(|g| g.id()).collect();
            if windows.is_empty() {
                log::warn!(
                    "traffic light {light}: groups [{}] never show it anything but red",
                    contributors.join(", ")
                );
            } else {
                log::info!(
                    "traffic light {light} is driven by groups [{}]; replacing with {} merged group(s)",
                    contributors.join(", "),
                    windows.len()
                );
            }
            for &i in indices {
                moved[i].insert((*light).to_owned());
            }
            for w in windows {
                seq += 1;
                synthetic.push(SignalGroupRecipe::new(
                    format!("merged[{}]#{seq}", contributors.join(",")),
                    [*light],
                    w.offset,
                    w.pre_green,
                    w.green,
                    w.yellow,
                ));
            }
            merged_lights.push((*light).to_owned());
        }

        if merged_lights.is_empty() {
            return Ok(Resolution { groups, merged_lights });
        }

        let mut resolved = Vec::with_capacity(groups.len() + synthetic.len());
        for (group, moved) in groups.into_iter().zip(&moved) {
            if moved.is_empty() {
                resolved.push(group);
                continue;
            }
            let mut recipe = group.recipe().clone();
            recipe.traffic_light_ids.retain(|id| !moved.contains(id));
            if recipe.traffic_light_ids.is_empty() {
                log::debug!("signal group {} has no traffic lights left; dropped", recipe.id);
                continue;
            }
            resolved.push(SignalGroup::new(recipe, self.cycle_time)?);
        }
        for recipe in synthetic {
            resolved.push(SignalGroup::new(recipe, self.cycle_time)?);
        }
        resolved.sort_by(|a, b| a.id().cmp(b.id()));
        if let Some(pair) = resolved.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(ControlError::DuplicateGroup(pair[0].id().to_owned()));
        }

        Ok(Resolution { groups: resolved, merged_lights })
    }

    // ── Per-light merge ───────────────────────────────────────────────────

    /// Merged windows for one light, or `None` if its sources already are
    /// those windows.
    fn merge_light(&self, sources: &[&SignalGroup]) -> Option<Vec<Window>> {
        let (steady, changes) = self.merged_changes(sources);
        let windows = if changes.is_empty() {
            Window::steady(steady, self.cycle_time).into_iter().collect()
        } else {
            self.cut_windows(&changes)
        };
        if self.already_resolved(sources, &windows) {
            return None;
        }
        Some(windows)
    }

    /// Replay every source's flanks and return the color the light shows at
    /// the start of the replay plus each instant that color changes.
    fn merged_changes(&self, sources: &[&SignalGroup]) -> (LightColor, Vec<Flank>) {
        let mut tagged: Vec<(usize, Flank)> = sources
            .iter()
            .enumerate()
            .flat_map(|(s, g)| g.flanks(self.cycle_time).into_iter().map(move |f| (s, f)))
            .collect();
        sort_flanks_by(&mut tagged, self.margin, |&(_, f)| f);

        let mut state = vec![LightColor::Red; sources.len()];
        for &(s, flank) in &tagged {
            state[s] = flank.color;
        }
        let mut held = ColorCount::default();
        for &color in &state {
            held.add(color);
        }

        let start = held.strongest();
        let mut current = start;
        let mut changes = Vec::new();
        for run in coincident_runs(&tagged, self.margin, |&(_, f)| f) {
            let at = tagged[run.clone()]
                .iter()
                .map(|(_, f)| f.offset.0)
                .fold(f64::INFINITY, f64::min);
            for &(s, flank) in &tagged[run] {
                held.remove(state[s]);
                held.add(flank.color);
                state[s] = flank.color;
            }
            let color = held.strongest();
            if color != current {
                changes.push(Flank::new(Duration(at), color));
                current = color;
            }
        }
        (start, changes)
    }

    /// Cut a cyclic list of color changes into windows, in offset order.
    fn cut_windows(&self, changes: &[Flank]) -> Vec<Window> {
        let n = changes.len();
        let prev = |i: usize| changes[(i + n - 1) % n].color;
        let first = (0..n)
            .find(|&i| changes[i].color == LightColor::Red)
            .or_else(|| (0..n).find(|&i| !advances(prev(i), changes[i].color)))
            .unwrap_or(0);

        let mut windows = Vec::new();
        let mut open: Option<OpenWindow> = None;
        let mut last = prev(first);
        for i in 0..n {
            let change = changes[(first + i) % n];
            let extends = open.is_some() && advances(last, change.color);
            if extends {
                if let Some(window) = open.as_mut() {
                    window.enter(change);
                }
            } else {
                if let Some(window) = open.take() {
                    windows.push(window.close(change.offset, self.cycle_time));
                }
                open = OpenWindow::open(change);
            }
            last = change.color;
        }
        if let Some(window) = open {
            windows.push(window.close(changes[first].offset, self.cycle_time));
        }
        windows.sort_by(|a, b| a.offset.0.total_cmp(&b.offset.0));
        windows
    }

    /// `true` if every source drives only this light and the sources' timings
    /// are exactly `windows`.
    fn already_resolved(&self, sources: &[&SignalGroup], windows: &[Window]) -> bool {
        sources.len() == windows.len()
            && sources.iter().all(|g| g.traffic_light_ids().len() == 1)
            && windows.iter().all(|w| {
                sources.iter().any(|g| self.same_timing(w, &Window::of(g, self.cycle_time)))
            })
    }

    fn same_timing(&self, a: &Window, b: &Window) -> bool {
        let near = |x: Duration, y: Duration| (x.0 - y.0).abs() < self.margin.0;
        let shift = Duration::cyclic_distance(a.offset, b.offset, self.cycle_time)
            .0
            .min(Duration::cyclic_distance(b.offset, a.offset, self.cycle_time).0);
        shift < self.margin.0
            && near(a.pre_green, b.pre_green)
            && near(a.green, b.green)
            && near(a.yellow, b.yellow)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

impl Window {
    fn of(group: &SignalGroup, cycle: Duration) -> Self {
        Self {
            offset:    group.offset().rem_cycle(cycle),
            pre_green: group.pre_green(),
            green:     group.green(),
            yellow:    group.yellow(),
        }
    }

    /// A window showing `color` for the whole cycle; `None` for red.
    fn steady(color: LightColor, cycle: Duration) -> Option<Self> {
        let mut window = Self {
            offset:    Duration::ZERO,
            pre_green: Duration::ZERO,
            green:     Duration::ZERO,
            yellow:    Duration::ZERO,
        };
        match color {
            LightColor::PreGreen => window.pre_green = cycle,
            LightColor::Green    => window.green = cycle,
            LightColor::Yellow   => window.yellow = cycle,
            LightColor::Red      => return None,
        }
        Some(window)
    }
}

/// A window whose closing instant is not known yet.
struct OpenWindow {
    start:     Duration,
    green_at:  Option<Duration>,
    yellow_at: Option<Duration>,
}

impl OpenWindow {
    /// A window opened by `change`; `None` if the change is to red.
    fn open(change: Flank) -> Option<Self> {
        let at = Some(change.offset);
        let (green_at, yellow_at) = match change.color {
            LightColor::PreGreen => (None, None),
            LightColor::Green    => (at, None),
            LightColor::Yellow   => (at, at),
            LightColor::Red      => return None,
        };
        Some(Self { start: change.offset, green_at, yellow_at })
    }

    fn enter(&mut self, change: Flank) {
        match change.color {
            LightColor::Green  => self.green_at = Some(change.offset),
            LightColor::Yellow => self.yellow_at = Some(change.offset),
            _ => {}
        }
    }

    fn close(self, end: Duration, cycle: Duration) -> Window {
        let span = |from: Duration, to: Duration| Duration::cyclic_distance(from, to, cycle);
        let green_from = self.green_at.or(self.yellow_at).unwrap_or(end);
        let yellow_from = self.yellow_at.unwrap_or(end);
        Window {
            offset:    self.start,
            pre_green: span(self.start, green_from),
            green:     span(green_from, yellow_from),
            yellow:    span(yellow_from, end),
        }
    }
}

/// `true` if going from `from` to `to` moves forward within one
/// PREGREEN → GREEN → YELLOW window.
fn advances(from: LightColor, to: LightColor) -> bool {
    let rank = |c: LightColor| match c {
        LightColor::PreGreen => Some(0),
        LightColor::Green    => Some(1),
        LightColor::Yellow   => Some(2),
        LightColor::Red      => None,
    };
    matches!((rank(from), rank(to)), (Some(a), Some(b)) if b > a)
}

/// How many sources currently show each color.
#[derive(Default)]
struct ColorCount([usize; 4]);

impl ColorCount {
    fn slot(color: LightColor) -> usize {
        match color {
            LightColor::PreGreen => 0,
            LightColor::Green    => 1,
            LightColor::Yellow   => 2,
            LightColor::Red      => 3,
        }
    }

    fn add(&mut self, color: LightColor) {
        self.0[Self::slot(color)] += 1;
    }

    fn remove(&mut self, color: LightColor) {
        self.0[Self::slot(color)] -= 1;
    }

    /// The color the light shows: green over yellow over pre-green over red.
    fn strongest(&self) -> LightColor {
        [LightColor::Green, LightColor::Yellow, LightColor::PreGreen]
            .into_iter()
            .find(|&c| self.0[Self::slot(c)] > 0)
            .unwrap_or(LightColor::Red)
    }
}
