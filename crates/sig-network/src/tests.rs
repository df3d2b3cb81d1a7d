//! Unit tests for sig-network.

use sig_core::{LightColor, TrafficLightLookup, TrafficLightSink};

use crate::{NetworkError, TrafficLight, TrafficLightNetworkBuilder};

#[cfg(test)]
mod light {
    use super::*;

    #[test]
    fn starts_red_and_counts_real_changes() {
        let light = TrafficLight::new("08.1");
        assert_eq!(light.color(), LightColor::Red);
        light.set_color(LightColor::Red);
        assert_eq!(light.change_count(), 0);
        light.set_color(LightColor::Green);
        light.set_color(LightColor::Green);
        light.set_color(LightColor::Yellow);
        assert_eq!(light.color(), LightColor::Yellow);
        assert_eq!(light.change_count(), 2);
    }
}

#[cfg(test)]
mod network {
    use super::*;

    #[test]
    fn resolves_bare_and_qualified_ids() {
        let net = TrafficLightNetworkBuilder::new("crossroads")
            .add_lights(["08.1", "08.2"])
            .unwrap()
            .build();
        assert_eq!(net.light_count(), 2);
        assert_eq!(net.light("08.1").unwrap().id(), "08.1");
        assert_eq!(net.light("crossroads.08.2").unwrap().id(), "08.2");
        assert!(net.light("other.08.2").is_none());
        assert!(net.light("crossroads08.2").is_none());
    }

    #[test]
    fn resolved_sink_drives_registered_light() {
        let mut builder = TrafficLightNetworkBuilder::new("n");
        let light = builder.add_light("a").unwrap();
        let net = builder.build();

        let sink = net.resolve("a").unwrap();
        sink.set_color(LightColor::PreGreen);
        assert_eq!(light.color(), LightColor::PreGreen);
        assert!(net.resolve("missing").is_none());
    }

    #[test]
    fn lookup_trait_object_resolves_qualified_ids() {
        let mut builder = TrafficLightNetworkBuilder::new("grid");
        let light = builder.add_light("n.turn").unwrap();
        let net = builder.build();
        let lookup: &dyn TrafficLightLookup = &net;

        lookup.resolve("grid.n.turn").unwrap().set_color(LightColor::Green);
        assert_eq!(light.color(), LightColor::Green);
        assert_eq!(light.change_count(), 1);
    }

    #[test]
    fn rejects_duplicates_and_empty_ids() {
        let mut builder = TrafficLightNetworkBuilder::new("n");
        builder.add_light("a").unwrap();
        assert_eq!(builder.add_light("a").unwrap_err(), NetworkError::DuplicateLight("a".into()));
        assert_eq!(builder.add_light("").unwrap_err(), NetworkError::EmptyId);
    }

    #[test]
    fn lights_iterate_in_id_order() {
        let net = TrafficLightNetworkBuilder::new("n")
            .add_lights(["c", "a", "b"])
            .unwrap()
            .build();
        let ids: Vec<&str> = net.lights().map(|l| l.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(net.id(), "n");
    }

    #[test]
    fn empty_network_resolves_nothing() {
        assert!(crate::TrafficLightNetwork::empty("e").resolve("a").is_none());
    }
}
