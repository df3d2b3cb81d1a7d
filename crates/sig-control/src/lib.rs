//! `sig-control`: fixed-time traffic signal control.
//!
//! # Crate layout
//!
//! | Module             | Contents                                               |
//! |--------------------|--------------------------------------------------------|
//! | [`signal_group`]   | `SignalGroupRecipe`, `SignalGroup` (timing + color)    |
//! | [`flank`]          | `Flank`, margin-tolerant flank sorting                 |
//! | [`resolver`]       | `ConflictResolver`: merges overlapping green phases    |
//! | [`controller`]     | `FixedTimeController`, `ControlEvent`, `ColorChange`   |
//! | [`config`]         | `ControllerConfig` (serde-able with the `serde` flag)  |
//! | [`loader`]         | CSV timing-plan loader                                 |
//! | [`error`]          | `ControlError`, `ControlResult<T>`                     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sig_control::{FixedTimeController, SignalGroupRecipe};
//! use sig_core::Duration;
//! use sig_schedule::EventQueue;
//!
//! let mut controller = FixedTimeController::new(
//!     "crossroads",
//!     Duration(60.0),
//!     Duration::ZERO,
//!     vec![
//!         SignalGroupRecipe::without_pre_green("ns", ["n", "s"], Duration(0.0),  Duration(25.0), Duration(3.0)),
//!         SignalGroupRecipe::without_pre_green("ew", ["e", "w"], Duration(30.0), Duration(25.0), Duration(3.0)),
//!     ],
//! )?;
//!
//! let mut queue = EventQueue::new();
//! controller.schedule_startup(&mut queue)?;
//! while let Some((_, event)) = queue.pop_until(end) {
//!     controller.handle_event(event, &mut queue, &network)?;
//! }
//! ```
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                        |
//! |---------|---------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on recipes and `ControllerConfig`.  |

pub mod config;
pub mod controller;
pub mod error;
pub mod flank;
pub mod loader;
pub mod resolver;
pub mod signal_group;

#[cfg(test)]
mod tests;

pub use config::ControllerConfig;
pub use controller::{
    ColorChange, ControlEvent, ControlEventKind, FixedTimeController, MAX_ZERO_PHASE_COLLAPSES,
};
pub use error::{ControlError, ControlResult};
pub use flank::{FLANK_COMPARE_MARGIN, Flank, sort_flanks};
pub use loader::{load_timing_plan_csv, load_timing_plan_reader};
pub use resolver::{ConflictResolver, Resolution};
pub use signal_group::{SignalGroup, SignalGroupRecipe};
