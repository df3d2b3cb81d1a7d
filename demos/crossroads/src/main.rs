//! crossroads: two fixed-time controllers on a small grid.
//!
//! The main intersection is described in JSON (pass a path as the first
//! argument to use your own).  Its left-turn light `n.turn` is listed in two
//! signal groups with overlapping greens, so construction merges it into a
//! group of its own.  A second intersection down the avenue loads its timing
//! plan from CSV and runs 15 s behind the first.
//!
//! Run with `RUST_LOG=debug` to see every transition.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use sig_control::{ControllerConfig, FixedTimeController, load_timing_plan_reader};
use sig_core::{Duration, LightColor, SimTime};
use sig_network::{TrafficLightNetwork, TrafficLightNetworkBuilder};
use sig_sim::{NoopObserver, SimObserver, SimulationBuilder};

// ── Constants ─────────────────────────────────────────────────────────────────

const NETWORK_ID:     &str = "grid";
const TIMELINE_SECS:  f64  = 60.0;
const RUN_SECS:       f64  = 3_600.0;

// ── Inputs ────────────────────────────────────────────────────────────────────

const CROSSROADS_JSON: &str = r#"{
  "id": "crossroads",
  "cycle_time": 60.0,
  "offset": 0.0,
  "signal_groups": [
    { "id": "ns",      "traffic_light_ids": ["n", "s", "n.turn"], "offset": 0.0,
      "pre_green": 1.0, "green": 25.0, "yellow": 3.0 },
    { "id": "ns_turn", "traffic_light_ids": ["n.turn", "s.turn"], "offset": 20.0,
      "green": 10.0, "yellow": 3.0 },
    { "id": "ew",      "traffic_light_ids": ["e", "w"], "offset": 30.0,
      "pre_green": 1.0, "green": 25.0, "yellow": 3.0 }
  ]
}"#;

// Light ids are network-qualified here; the network strips its own prefix.
const AVENUE_CSV: &str = "\
group_id,traffic_light_ids,offset,pre_green,green,yellow\n\
main,grid.avenue.e;grid.avenue.w,0,,50,4\n\
side,grid.avenue.n;grid.avenue.s,60,,24,4\n\
";

// ── Observers ─────────────────────────────────────────────────────────────────

/// Prints every color change.
struct Timeline;

impl SimObserver for Timeline {
    fn on_color_change(&mut self, time: SimTime, controller: &str, group: &str, color: LightColor) {
        println!("{:>7.1}  {controller:<12} {group:<22} {color}", time.0);
    }
}

/// Counts how long each group spends green.
#[derive(Default)]
struct GreenTime {
    /// (controller, group) → (green since, total green seconds)
    groups: BTreeMap<(String, String), (Option<f64>, f64)>,
}

impl SimObserver for GreenTime {
    fn on_color_change(&mut self, time: SimTime, controller: &str, group: &str, color: LightColor) {
        let entry = self
            .groups
            .entry((controller.to_owned(), group.to_owned()))
            .or_default();
        match (color, entry.0) {
            (LightColor::Green, None) => entry.0 = Some(time.0),
            (LightColor::Green, Some(_)) => {}
            (_, Some(since)) => {
                entry.1 += time.0 - since;
                entry.0 = None;
            }
            (_, None) => {}
        }
    }

    fn on_run_end(&mut self, time: SimTime) {
        for (since, total) in self.groups.values_mut() {
            if let Some(start) = since.take() {
                *total += time.0 - start;
            }
        }
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn crossroads_config() -> Result<ControllerConfig> {
    let json = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
        None => CROSSROADS_JSON.to_owned(),
    };
    serde_json::from_str(&json).context("parsing intersection JSON")
}

fn avenue_controller() -> Result<FixedTimeController> {
    let recipes = load_timing_plan_reader(Cursor::new(AVENUE_CSV))?;
    log::info!("avenue timing plan: {} signal group(s)", recipes.len());
    Ok(FixedTimeController::new("avenue", Duration(90.0), Duration(15.0), recipes)?)
}

/// A network holding every light either controller refers to.
fn build_network(controllers: &[&FixedTimeController]) -> Result<TrafficLightNetwork> {
    let prefix = format!("{NETWORK_ID}.");
    let mut ids: Vec<&str> = controllers
        .iter()
        .flat_map(|c| c.signal_groups())
        .flat_map(|g| g.traffic_light_ids())
        .map(|id| id.strip_prefix(prefix.as_str()).unwrap_or(id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(TrafficLightNetworkBuilder::new(NETWORK_ID).add_lights(ids)?.build())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();

    println!("=== crossroads: fixed-time signal control ===");

    // 1. Controllers.
    let crossroads = crossroads_config()?.build()?;
    let avenue = avenue_controller()?;
    for c in [&crossroads, &avenue] {
        println!(
            "{:<12} cycle {}  offset {}  {} group(s)",
            c.id(),
            c.cycle_time(),
            c.offset(),
            c.signal_groups().len()
        );
        for g in c.signal_groups() {
            println!(
                "    {:<22} offset {:>5}  pre {:>4}  green {:>5}  yellow {:>4}  red {:>5}",
                g.id(),
                g.offset().0,
                g.pre_green().0,
                g.green().0,
                g.yellow().0,
                g.red().0
            );
        }
    }
    println!();

    // 2. Network and simulation.
    let network = build_network(&[&crossroads, &avenue])?;
    println!("Network {NETWORK_ID}: {} traffic lights", network.light_count());
    let mut sim = SimulationBuilder::new(network)
        .controller(crossroads)
        .controller(avenue)
        .build()?;

    // 3. First cycle, change by change.
    println!();
    println!("{:>7}  {:<12} {:<22} color", "time", "controller", "group");
    println!("{}", "-".repeat(50));
    sim.run_until(SimTime(TIMELINE_SECS), &mut Timeline)?;

    // 4. Replicate onto a fresh network; both runs must agree.
    let controllers: Vec<&FixedTimeController> = sim.controllers().iter().collect();
    let mut replica = sim.replicate(build_network(&controllers)?)?;

    let mut green = GreenTime::default();
    let t0 = Instant::now();
    replica.run_until(SimTime(RUN_SECS), &mut green)?;
    let elapsed = t0.elapsed();
    sim.run_until(SimTime(RUN_SECS), &mut NoopObserver)?;

    // 5. Summary.
    println!();
    println!(
        "Replica ran to {} in {:.3} ms ({} events)",
        replica.now(),
        elapsed.as_secs_f64() * 1e3,
        replica.delivered_events()
    );
    println!("{:<12} {:<22} {:>10}", "controller", "group", "green s");
    println!("{}", "-".repeat(46));
    for ((controller, group), (_, total)) in &green.groups {
        println!("{controller:<12} {group:<22} {total:>10.1}");
    }

    println!();
    println!("{:<14} {:<9} {:>8}", "light", "color", "changes");
    println!("{}", "-".repeat(33));
    for light in replica.lookup().lights() {
        println!("{:<14} {:<9} {:>8}", light.id(), light.color(), light.change_count());
        let twin = sim.lookup().light(light.id()).map(|l| (l.color(), l.change_count()));
        if twin != Some((light.color(), light.change_count())) {
            bail!("light {} diverged between the original and the replica", light.id());
        }
    }

    if replica.lookup().lights().all(|l| l.change_count() == 0) {
        bail!("no traffic light changed color");
    }
    Ok(())
}
