use crate::{cell::CellSet, errors::SimulationResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a single simulate call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Live cells after the requested number of generations.
    pub live_cells: CellSet,
    /// Engine-lifetime running total of generations advanced, including this
    /// call. Callers needing per-call deltas must track them themselves.
    pub step_num: u64,
    /// Detected period length, or zero when no period was found.
    pub period: u64,
}

/// Abstracts the simulation engine external API
pub trait EngineApi: Send + Sync {
    /// Advances `live_cells` by `generations` steps of the standard B3/S23
    /// rule and returns the resulting board.
    ///
    /// `is_final` enables periodicity search: when a state recurrence is
    /// detected mid-run, the remaining generations collapse modulo the period
    /// instead of being simulated in full. Callers wanting the exact
    /// step-by-step state should pass `false`.
    ///
    /// Rejects negative `generations`; `generations == 0` returns the input
    /// unchanged.
    fn simulate(&self, live_cells: CellSet, generations: i64, is_final: bool) -> SimulationResult<GenerationResult>;
}

pub type DynEngine = Arc<dyn EngineApi>;
