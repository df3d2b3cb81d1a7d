//! The `Simulation` struct and its event loop.

use sig_control::{ControlEvent, FixedTimeController};
use sig_core::{RunToken, SimTime, TrafficLightLookup};
use sig_schedule::{EventQueue, Scheduler};

use crate::{SimObserver, SimResult, SimulationBuilder};

#[cfg(feature = "fx-hash")]
pub(crate) type TokenMap = rustc_hash::FxHashMap<RunToken, usize>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type TokenMap = std::collections::HashMap<RunToken, usize>;

// ── Simulation ────────────────────────────────────────────────────────────────

/// Owns an event queue and the controllers whose events it carries.
///
/// Each event is routed to the controller holding its [`RunToken`].  Events
/// whose token has no owner (the controller was removed) are dropped.
///
/// Create via [`SimulationBuilder`].
pub struct Simulation<L: TrafficLightLookup> {
    lookup:      L,
    queue:       EventQueue<ControlEvent>,
    controllers: Vec<FixedTimeController>,
    /// Run token → index into `controllers`.
    by_token:    TokenMap,
    /// Events delivered so far, stale ones included.
    delivered:   u64,
}

impl<L: TrafficLightLookup> Simulation<L> {
    pub(crate) fn from_parts(
        lookup:      L,
        queue:       EventQueue<ControlEvent>,
        controllers: Vec<FixedTimeController>,
        by_token:    TokenMap,
    ) -> Self {
        Self { lookup, queue, controllers, by_token, delivered: 0 }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn controllers(&self) -> &[FixedTimeController] {
        &self.controllers
    }

    pub fn controller(&self, id: &str) -> Option<&FixedTimeController> {
        self.controllers.iter().find(|c| c.id() == id)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn delivered_events(&self) -> u64 {
        self.delivered
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Deliver the next pending event.  Returns its time, or `None` if the
    /// queue is empty.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<Option<SimTime>> {
        let Some((time, event)) = self.queue.pop_next() else {
            return Ok(None);
        };
        self.dispatch(time, event, observer)?;
        Ok(Some(time))
    }

    /// Deliver every event due at or before `end`, then move the clock to
    /// `end`.
    pub fn run_until<O: SimObserver>(&mut self, end: SimTime, observer: &mut O) -> SimResult<()> {
        while let Some((time, event)) = self.queue.pop_until(end) {
            self.dispatch(time, event, observer)?;
        }
        self.queue.advance_to(end);
        observer.on_run_end(self.now());
        Ok(())
    }

    fn dispatch<O: SimObserver>(
        &mut self,
        time:     SimTime,
        event:    ControlEvent,
        observer: &mut O,
    ) -> SimResult<()> {
        self.delivered += 1;
        observer.on_event(time);

        let Some(&index) = self.by_token.get(&event.run) else {
            log::debug!("{time}: no controller owns {event:?}; dropped");
            return Ok(());
        };
        let controller = &mut self.controllers[index];
        let changes = controller.handle_event(event, &mut self.queue, &self.lookup)?;
        for change in changes {
            if let Some(group) = controller.group_at(change.group) {
                observer.on_color_change(change.at, controller.id(), group.id(), change.color);
            }
        }
        Ok(())
    }

    // ── Controller management ─────────────────────────────────────────────

    /// Remove the controller named `id` and cancel its pending events.
    ///
    /// The lights it drove keep their last color.
    pub fn remove_controller(&mut self, id: &str) -> Option<FixedTimeController> {
        let index = self.controllers.iter().position(|c| c.id() == id)?;
        let removed = self.controllers.remove(index);
        let token = removed.run_token();
        self.queue.retain(|event| event.run != token);
        self.by_token = index_tokens(&self.controllers);

        log::info!("controller {id} removed at {}", self.now());
        Some(removed)
    }

    /// A fresh simulation at time zero driving copies of every controller
    /// against `lookup`.
    ///
    /// The copies share no runtime state with this simulation, so both can be
    /// run independently.
    pub fn replicate<M: TrafficLightLookup>(&self, lookup: M) -> SimResult<Simulation<M>> {
        SimulationBuilder::new(lookup)
            .controllers(self.controllers.iter().map(FixedTimeController::clone_for_new_run))
            .build()
    }
}

fn index_tokens(controllers: &[FixedTimeController]) -> TokenMap {
    controllers.iter().enumerate().map(|(i, c)| (c.run_token(), i)).collect()
}
