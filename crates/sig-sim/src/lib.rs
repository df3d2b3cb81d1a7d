//! `sig-sim`: event loop for fixed-time signal controllers.
//!
//! # Event loop
//!
//! ```text
//! build():      schedule Startup for every controller at t = 0
//! run_until(end):
//!   while next event time ≤ end:
//!     ① pop the event; the queue clock jumps to its time
//!     ② find the controller owning the event's RunToken (drop if none)
//!     ③ controller.handle_event → colors shown, successor scheduled
//!     ④ report each color change to the observer
//!   advance the clock to end
//! ```
//!
//! # Cargo features
//!
//! | Feature   | Effect                                             |
//! |-----------|----------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for the run-token index. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sig_sim::{NoopObserver, SimulationBuilder};
//!
//! let mut sim = SimulationBuilder::new(network).controller(controller).build()?;
//! sim.run_until(SimTime(3600.0), &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimulationBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Simulation;
