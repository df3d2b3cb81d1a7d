//! Simulation observer trait for progress reporting and data collection.

use sig_core::{LightColor, SimTime};

/// Callbacks invoked by [`Simulation`][crate::Simulation] while it delivers
/// events.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: timeline printer
///
/// ```rust,ignore
/// struct Timeline;
///
/// impl SimObserver for Timeline {
///     fn on_color_change(&mut self, at: SimTime, controller: &str, group: &str, color: LightColor) {
///         println!("{at} {controller}/{group} -> {color}");
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before each event is handled.  The clock already reads `time`.
    fn on_event(&mut self, _time: SimTime) {}

    /// Called for every color a signal group shows, including the initial
    /// colors set at startup.
    fn on_color_change(
        &mut self,
        _time:       SimTime,
        _controller: &str,
        _group:      &str,
        _color:      LightColor,
    ) {}

    /// Called once when [`run_until`][crate::Simulation::run_until] returns.
    fn on_run_end(&mut self, _time: SimTime) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
