//! Brute-force fallback: neighbor counting over the sparse cell set. Slower
//! than the quadtree path but structureless, which makes it the recovery
//! target for any internal engine fault.

use crate::constants::PERIOD_PROBE_INTERVAL;
use itertools::Itertools;
use life_engine_core::cell::{Cell, CellSet};
use log::debug;
use std::collections::HashMap;

/// Computes the next generation of the B3/S23 rule: a cell is live in the
/// next state iff it has exactly 3 live neighbors, or exactly 2 and was
/// already live.
pub fn next_generation(current: &CellSet) -> CellSet {
    let mut neighbor_counts: HashMap<Cell, u32> = HashMap::with_capacity(current.len() * 4);
    for cell in current {
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                *neighbor_counts.entry(cell.translated(dx, dy)).or_insert(0) += 1;
            }
        }
    }
    neighbor_counts
        .into_iter()
        .filter(|(cell, count)| *count == 3 || (*count == 2 && current.contains(cell)))
        .map(|(cell, _)| cell)
        .collect()
}

/// Runs `generations` steps. When `detect_period` is set, the state is
/// fingerprinted every [`PERIOD_PROBE_INTERVAL`] generations; a repeated
/// fingerprint yields the period (at probe granularity) and the rest of the
/// run is resolved modulo that period instead of being simulated in full.
///
/// Returns the final state and the detected period (zero when none).
pub fn simulate(live_cells: &CellSet, generations: u64, detect_period: bool) -> (CellSet, u64) {
    let mut current = live_cells.clone();
    let mut visited: HashMap<String, u64> = HashMap::new();
    let mut period = 0u64;

    let mut generation = 0u64;
    while generation < generations {
        if detect_period && generation % PERIOD_PROBE_INTERVAL == 0 {
            let fingerprint = state_fingerprint(&current);
            if let Some(&previous) = visited.get(&fingerprint) {
                period = generation - previous;
                debug!("direct path detected period {} at generation {}", period, generation);
                let remaining = (generations - generation) % period;
                for _ in 0..remaining {
                    current = next_generation(&current);
                }
                break;
            }
            visited.insert(fingerprint, generation);
        }
        current = next_generation(&current);
        generation += 1;
    }
    (current, period)
}

/// Deterministic textual snapshot of a state: cells sorted by x then y,
/// rendered `x,y` and joined with `;`.
pub fn state_fingerprint(cells: &CellSet) -> String {
    cells.iter().sorted().map(|cell| format!("{},{}", cell.x, cell.y)).join(";")
}
