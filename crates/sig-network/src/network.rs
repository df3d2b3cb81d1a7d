//! Traffic-light registry and builder.
//!
//! # Id resolution
//!
//! Configurations name lights either by their bare id (`"08.1"`) or by a
//! network-qualified id (`"crossroads.08.1"`).  [`TrafficLightNetwork`]
//! registers lights under their bare id.  When a lookup misses, a leading
//! `"{network_id}."` is stripped and the bare id is tried.  Both spellings
//! resolve to the same light.

use std::collections::BTreeMap;
use std::rc::Rc;

use sig_core::{SharedSink, TrafficLightLookup};

use crate::{NetworkError, NetworkResult, TrafficLight};

// ── TrafficLightNetwork ───────────────────────────────────────────────────────

/// An immutable set of traffic lights keyed by id.
///
/// Do not construct directly; use [`TrafficLightNetworkBuilder`].
pub struct TrafficLightNetwork {
    id:     String,
    lights: BTreeMap<String, Rc<TrafficLight>>,
}

impl TrafficLightNetwork {
    /// A network with no lights.  Every lookup fails.
    pub fn empty(id: impl Into<String>) -> Self {
        Self { id: id.into(), lights: BTreeMap::new() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// The light registered under `id`, trying the network-qualified form
    /// if the bare id is unknown.
    pub fn light(&self, id: &str) -> Option<&Rc<TrafficLight>> {
        self.lights.get(id).or_else(|| {
            id.strip_prefix(self.id.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|bare| self.lights.get(bare))
        })
    }

    /// All lights in id order.
    pub fn lights(&self) -> impl Iterator<Item = &Rc<TrafficLight>> {
        self.lights.values()
    }
}

impl TrafficLightLookup for TrafficLightNetwork {
    fn resolve(&self, id: &str) -> Option<SharedSink> {
        let sink: SharedSink = self.light(id)?.clone();
        Some(sink)
    }
}

// ── TrafficLightNetworkBuilder ────────────────────────────────────────────────

/// Incrementally registers lights, then freezes them into a network.
pub struct TrafficLightNetworkBuilder {
    id:     String,
    lights: BTreeMap<String, Rc<TrafficLight>>,
}

impl TrafficLightNetworkBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), lights: BTreeMap::new() }
    }

    /// Register a new red light under `id` and return a handle to it.
    pub fn add_light(&mut self, id: impl Into<String>) -> NetworkResult<Rc<TrafficLight>> {
        let id = id.into();
        if id.is_empty() {
            return Err(NetworkError::EmptyId);
        }
        if self.lights.contains_key(&id) {
            return Err(NetworkError::DuplicateLight(id));
        }
        let light = Rc::new(TrafficLight::new(id.clone()));
        self.lights.insert(id, Rc::clone(&light));
        Ok(light)
    }

    /// Register every id in `ids`.
    pub fn add_lights<I, S>(mut self, ids: I) -> NetworkResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.add_light(id)?;
        }
        Ok(self)
    }

    pub fn build(self) -> TrafficLightNetwork {
        log::debug!("network {} built with {} traffic lights", self.id, self.lights.len());
        TrafficLightNetwork { id: self.id, lights: self.lights }
    }
}
