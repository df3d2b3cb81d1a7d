//! `sig-network`: the traffic lights a controller drives.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`light`]   | `TrafficLight`: a color sink with change bookkeeping        |
//! | [`network`] | `TrafficLightNetwork`, `TrafficLightNetworkBuilder`         |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                          |
//!
//! `TrafficLightNetwork` implements [`sig_core::TrafficLightLookup`], so a
//! controller can bind to it at startup without knowing anything else about
//! the network.

pub mod error;
pub mod light;
pub mod network;

#[cfg(test)]
mod tests;

pub use error::{NetworkError, NetworkResult};
pub use light::TrafficLight;
pub use network::{TrafficLightNetwork, TrafficLightNetworkBuilder};
