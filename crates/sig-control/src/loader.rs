//! CSV timing-plan loader.
//!
//! # CSV format
//!
//! One row per signal group.  Times are in seconds; `pre_green` may be left
//! empty for groups without a pre-green phase.  A group driving several
//! lights lists their ids separated by `;`.
//!
//! ```csv
//! group_id,traffic_light_ids,offset,pre_green,green,yellow
//! north,n.1;n.2,0,1,30,3
//! east,e.1,45,,30,3
//! ```
//!
//! The loader only parses.  Durations are validated when the recipes are
//! handed to [`FixedTimeController::new`](crate::FixedTimeController::new).

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use sig_core::Duration;

use crate::{ControlError, ControlResult, SignalGroupRecipe};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TimingRecord {
    group_id:          String,
    traffic_light_ids: String,
    offset:            f64,
    pre_green:         Option<f64>,
    green:             f64,
    yellow:            f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load signal-group recipes from a CSV file, in file order.
pub fn load_timing_plan_csv(path: &Path) -> ControlResult<Vec<SignalGroupRecipe>> {
    let file = std::fs::File::open(path)?;
    load_timing_plan_reader(file)
}

/// Like [`load_timing_plan_csv`] but accepts any `Read` source.
pub fn load_timing_plan_reader<R: Read>(reader: R) -> ControlResult<Vec<SignalGroupRecipe>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut recipes = Vec::new();
    for result in csv_reader.deserialize::<TimingRecord>() {
        let row = result.map_err(|e| ControlError::Parse(e.to_string()))?;
        recipes.push(into_recipe(row)?);
    }
    log::debug!("loaded {} signal group recipe(s) from timing plan", recipes.len());
    Ok(recipes)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn into_recipe(row: TimingRecord) -> ControlResult<SignalGroupRecipe> {
    if row.group_id.is_empty() {
        return Err(ControlError::Parse("empty group_id".to_owned()));
    }
    let light_ids = parse_light_ids(&row.traffic_light_ids);
    if light_ids.is_empty() {
        return Err(ControlError::Parse(format!(
            "signal group {}: traffic_light_ids is empty",
            row.group_id
        )));
    }
    Ok(SignalGroupRecipe::new(
        row.group_id,
        light_ids,
        Duration(row.offset),
        Duration(row.pre_green.unwrap_or(0.0)),
        Duration(row.green),
        Duration(row.yellow),
    ))
}

fn parse_light_ids(field: &str) -> Vec<&str> {
    field.split(';').map(str::trim).filter(|id| !id.is_empty()).collect()
}
