//! Light colors and the two collaborator seams of the control layer.
//!
//! The controller never owns traffic lights.  At startup it asks a
//! [`TrafficLightLookup`] for each configured id and keeps the returned
//! [`SharedSink`]s; from then on `set_color` is the only call it makes.

use std::fmt;
use std::rc::Rc;

/// The color shown by a traffic light, in cycle order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightColor {
    PreGreen,
    Green,
    Yellow,
    Red,
}

impl LightColor {
    /// All colors in the order a signal group cycles through them.
    pub const CYCLE: [LightColor; 4] =
        [LightColor::PreGreen, LightColor::Green, LightColor::Yellow, LightColor::Red];

    /// The color that follows `self` in the fixed cycle.
    #[inline]
    pub fn next(self) -> LightColor {
        match self {
            LightColor::PreGreen => LightColor::Green,
            LightColor::Green    => LightColor::Yellow,
            LightColor::Yellow   => LightColor::Red,
            LightColor::Red      => LightColor::PreGreen,
        }
    }

    /// Lowercase name, matching the `Display` output.
    pub fn as_str(self) -> &'static str {
        match self {
            LightColor::PreGreen => "pregreen",
            LightColor::Green    => "green",
            LightColor::Yellow   => "yellow",
            LightColor::Red      => "red",
        }
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that displays a light color.
///
/// Sinks are shared between the network that owns them and every controller
/// that drives them, so `set_color` takes `&self`; implementations use
/// interior mutability.
pub trait TrafficLightSink {
    fn set_color(&self, color: LightColor);
}

/// A reference-counted handle to a sink.
pub type SharedSink = Rc<dyn TrafficLightSink>;

/// Resolves configured traffic-light ids to live sinks.
pub trait TrafficLightLookup {
    /// Return the sink registered under `id`, or `None` if there is none.
    fn resolve(&self, id: &str) -> Option<SharedSink>;
}
