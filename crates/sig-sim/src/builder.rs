//! Fluent builder for constructing a [`Simulation`].

use sig_control::{ControllerConfig, FixedTimeController};
use sig_core::TrafficLightLookup;
use sig_schedule::EventQueue;

use crate::sim::TokenMap;
use crate::{SimError, SimResult, Simulation};

/// Fluent builder for [`Simulation<L>`].
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimulationBuilder::new(network)
///     .controller(FixedTimeController::new("a", cycle, offset, recipes)?)
///     .config(config)?
///     .build()?;
/// sim.run_until(SimTime(3600.0), &mut NoopObserver)?;
/// ```
pub struct SimulationBuilder<L: TrafficLightLookup> {
    lookup:      L,
    controllers: Vec<FixedTimeController>,
}

impl<L: TrafficLightLookup> SimulationBuilder<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup, controllers: Vec::new() }
    }

    /// Add a constructed controller.  It must not have been started.
    pub fn controller(mut self, controller: FixedTimeController) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Add several controllers at once.
    pub fn controllers<I>(mut self, controllers: I) -> Self
    where
        I: IntoIterator<Item = FixedTimeController>,
    {
        self.controllers.extend(controllers);
        self
    }

    /// Build a controller from `config` and add it.
    pub fn config(self, config: ControllerConfig) -> SimResult<Self> {
        Ok(self.controller(config.build()?))
    }

    /// Check controller ids, schedule every startup at time zero, and return
    /// a ready-to-run [`Simulation`].
    pub fn build(self) -> SimResult<Simulation<L>> {
        let mut ids: Vec<&str> = self.controllers.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(SimError::DuplicateController(pair[0].to_owned()));
        }

        let mut queue = EventQueue::new();
        let mut by_token = TokenMap::default();
        for (i, controller) in self.controllers.iter().enumerate() {
            controller.schedule_startup(&mut queue)?;
            by_token.insert(controller.run_token(), i);
        }

        log::info!("simulation built with {} controller(s)", self.controllers.len());
        Ok(Simulation::from_parts(self.lookup, queue, self.controllers, by_token))
    }
}
