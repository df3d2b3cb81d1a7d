//! `sig-core`: foundational types for the fixed-time signal control workspace.
//!
//! This crate is a dependency of every other `sig-*` crate.  It has no
//! `sig-*` dependencies and only `thiserror` (plus optional `serde`) from the
//! outside world.
//!
//! # What lives here
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`time`]    | `SimTime`, `Duration`, cyclic offset arithmetic            |
//! | [`light`]   | `LightColor`, `TrafficLightSink`, `TrafficLightLookup`     |
//! | [`ids`]     | `RunToken`, `GroupIndex`                                   |
//! | [`error`]   | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to time and color types.    |

pub mod error;
pub mod ids;
pub mod light;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{GroupIndex, RunToken};
pub use light::{LightColor, SharedSink, TrafficLightLookup, TrafficLightSink};
pub use time::{Duration, SimTime, TIME_EPSILON};
