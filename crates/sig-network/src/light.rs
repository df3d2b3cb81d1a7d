//! A single physical traffic light.

use std::cell::Cell;

use sig_core::{LightColor, TrafficLightSink};

/// A traffic light that remembers what it shows.
///
/// Lights start out red.  The color is kept in a [`Cell`] so the light can be
/// shared (`Rc<TrafficLight>`) between the network and the controllers that
/// drive it.
#[derive(Debug)]
pub struct TrafficLight {
    id:      String,
    color:   Cell<LightColor>,
    /// Number of `set_color` calls that actually changed the color.
    changes: Cell<u64>,
}

impl TrafficLight {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id:      id.into(),
            color:   Cell::new(LightColor::Red),
            changes: Cell::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The color currently shown.
    pub fn color(&self) -> LightColor {
        self.color.get()
    }

    /// How many times the shown color has changed.
    pub fn change_count(&self) -> u64 {
        self.changes.get()
    }
}

impl TrafficLightSink for TrafficLight {
    fn set_color(&self, color: LightColor) {
        if self.color.replace(color) != color {
            self.changes.set(self.changes.get() + 1);
            log::trace!("traffic light {} -> {}", self.id, color);
        }
    }
}
