//! Plain-data controller configuration.

use sig_core::Duration;

use crate::{ControlResult, FixedTimeController, SignalGroupRecipe};

/// Everything needed to construct a [`FixedTimeController`].
///
/// With the `serde` feature this round-trips through any serde format, e.g.
///
/// ```json
/// {
///   "id": "crossroads",
///   "cycle_time": 90.0,
///   "offset": 0.0,
///   "signal_groups": [
///     { "id": "north", "traffic_light_ids": ["n.1"], "offset": 0.0,
///       "pre_green": 1.0, "green": 30.0, "yellow": 3.0 }
///   ]
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerConfig {
    pub id:            String,
    pub cycle_time:    Duration,
    #[cfg_attr(feature = "serde", serde(default))]
    pub offset:        Duration,
    pub signal_groups: Vec<SignalGroupRecipe>,
}

impl ControllerConfig {
    pub fn new(id: impl Into<String>, cycle_time: Duration) -> Self {
        Self {
            id: id.into(),
            cycle_time,
            offset: Duration::ZERO,
            signal_groups: Vec::new(),
        }
    }

    pub fn with_offset(mut self, offset: Duration) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_group(mut self, recipe: SignalGroupRecipe) -> Self {
        self.signal_groups.push(recipe);
        self
    }

    /// Validate and resolve into a ready controller.
    pub fn build(self) -> ControlResult<FixedTimeController> {
        FixedTimeController::new(self.id, self.cycle_time, self.offset, self.signal_groups)
    }
}
