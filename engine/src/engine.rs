//! The engine facade: routing, the hashlife driver loop, periodicity
//! detection and cache maintenance.

use crate::{
    constants::{
        CACHE_CLEANUP_INTERVAL, DIRECT_GENERATIONS_THRESHOLD, DIRECT_POPULATION_THRESHOLD,
        EXTREME_COORDINATE, MAX_CACHE_SIZE, MAX_EXPANSION_LEVEL, MIN_UNIVERSE_LEVEL,
        SPARSITY_FACTOR,
    },
    errors::EngineResult,
    model::{
        cache::Cache,
        node::{NodeId, QuadNode},
        store::NodeStore,
    },
    processes::{
        advance::{AdvanceManager, ResultKey},
        direct,
        universe::{self, UniverseBuilder},
    },
};
use itertools::Itertools;
use log::{debug, warn};
use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use life_engine_core::{
    api::{EngineApi, GenerationResult},
    cell::CellSet,
    errors::{SimulationError, SimulationResult},
};

pub struct HashlifeEngine {
    store: NodeStore,
    results: Cache<ResultKey, Arc<QuadNode>>,
    advance: AdvanceManager,
    universe: UniverseBuilder,
    max_cache_size: u64,
    current_step: AtomicU64,
    call_counter: AtomicU64,
}

impl HashlifeEngine {
    pub fn new() -> Self {
        Self::with_cache_size(MAX_CACHE_SIZE)
    }

    /// Same engine with a custom cache bound. Mostly useful for exercising
    /// eviction behavior without allocating a hundred thousand entries.
    pub fn with_cache_size(max_cache_size: u64) -> Self {
        let store = NodeStore::with_capacity(max_cache_size);
        let results = Cache::new(max_cache_size);
        let advance = AdvanceManager::new(store.clone(), results.clone());
        let universe = UniverseBuilder::new(store.clone());
        Self {
            store,
            results,
            advance,
            universe,
            max_cache_size,
            current_step: AtomicU64::new(0),
            call_counter: AtomicU64::new(0),
        }
    }

    /// Every `CACHE_CLEANUP_INTERVAL` calls, any cache sitting at its bound is
    /// trimmed to half. Random insert-time eviction keeps inserts cheap in
    /// between; this pass reclaims memory in bulk on long-running sessions.
    fn maintain_caches(&self) {
        let calls = self.call_counter.fetch_add(1, Ordering::SeqCst) + 1;
        if !calls.is_multiple_of(CACHE_CLEANUP_INTERVAL) {
            return;
        }
        let target = (self.max_cache_size / 2) as usize;
        if self.store.len() as u64 >= self.max_cache_size {
            debug!("trimming node store from {} to {} entries", self.store.len(), target);
            self.store.trim_to(target);
        }
        if self.results.len() as u64 >= self.max_cache_size {
            debug!("trimming result cache from {} to {} entries", self.results.len(), target);
            self.results.trim_to(target);
        }
    }

    /// True when the board is better served by the direct simulator: short
    /// runs, tiny populations, coordinates outside the quadtree's comfortable
    /// range, or boards too sparse for sub-pattern sharing to pay off. The
    /// coordinate check runs before the area check so the width-by-height
    /// product cannot overflow.
    fn should_use_direct(&self, live_cells: &CellSet, generations: u64) -> bool {
        if generations <= DIRECT_GENERATIONS_THRESHOLD {
            return true;
        }
        if live_cells.len() < DIRECT_POPULATION_THRESHOLD {
            return true;
        }
        if live_cells.iter().any(|c| c.x.abs() > EXTREME_COORDINATE || c.y.abs() > EXTREME_COORDINATE) {
            return true;
        }
        let (Some((min_x, max_x)), Some((min_y, max_y))) = (
            live_cells.iter().map(|c| c.x).minmax().into_option(),
            live_cells.iter().map(|c| c.y).minmax().into_option(),
        ) else {
            return true;
        };
        let area = (max_x - min_x + 1) * (max_y - min_y + 1);
        (live_cells.len() as i64) * SPARSITY_FACTOR < area
    }

    /// Grows the universe until the content sits in the centered quarter of
    /// the root. The advance result is the centered half; content spreads at
    /// most one cell per generation, so quarter containment keeps every live
    /// cell inside the result window for steps up to `2^(level - 3)`.
    /// Expansion stops past `MAX_EXPANSION_LEVEL`.
    fn ensure_slack(
        &self,
        mut root: Arc<QuadNode>,
        mut origin_x: i64,
        mut origin_y: i64,
    ) -> EngineResult<(Arc<QuadNode>, i64, i64)> {
        while root.level() < MIN_UNIVERSE_LEVEL
            || (root.level() <= MAX_EXPANSION_LEVEL && self.universe.needs_expansion(&root)?)
        {
            let half = (root.size() / 2) as i64;
            root = self.store.expand(&root)?;
            origin_x -= half;
            origin_y -= half;
        }
        if root.level() <= MAX_EXPANSION_LEVEL {
            let half = (root.size() / 2) as i64;
            root = self.store.expand(&root)?;
            origin_x -= half;
            origin_y -= half;
        }
        Ok((root, origin_x, origin_y))
    }

    /// The hashlife driver. Normalizes the board near the origin, builds the
    /// padded universe and advances it in power-of-two steps capped at half
    /// the root's memoization horizon. When `detect_period` is set, each
    /// iteration's `(node identity, origin)` is recorded; seeing the same pair
    /// again is an exact recurrence of the whole board (identity alone is not
    /// enough, a glider recurs as the same node at a shifted origin), so the
    /// remaining generations collapse modulo the gap.
    fn simulate_hashlife(
        &self,
        live_cells: &CellSet,
        generations: u64,
        detect_period: bool,
    ) -> EngineResult<(CellSet, u64)> {
        let (normalized, shift_x, shift_y) = universe::normalize(live_cells);
        let (mut root, mut origin_x, mut origin_y) = self.universe.with_padding(&normalized, generations)?;

        let mut remaining = generations;
        let mut period = 0u64;
        let mut seen: HashMap<(NodeId, i64, i64), u64> = HashMap::new();

        while remaining > 0 {
            (root, origin_x, origin_y) = self.ensure_slack(root, origin_x, origin_y)?;

            if detect_period && period == 0 {
                let elapsed = generations - remaining;
                match seen.entry((root.node_id(), origin_x, origin_y)) {
                    Entry::Occupied(entry) => {
                        period = elapsed - entry.get();
                        debug!("board recurrence after {elapsed} generations, period {period}");
                        remaining %= period;
                        if remaining == 0 {
                            break;
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(elapsed);
                    }
                }
            }

            let step_cap = 1u64 << (root.level() - 3);
            let step = largest_power_of_two(remaining).min(step_cap);
            let quarter = (root.size() / 4) as i64;
            root = self.advance.advance(&root, step)?;
            origin_x += quarter;
            origin_y += quarter;
            remaining -= step;
        }

        let cells = universe::to_live_cells(&root, origin_x, origin_y);
        Ok((universe::translate(&cells, shift_x, shift_y), period))
    }
}

impl EngineApi for HashlifeEngine {
    fn simulate(
        &self,
        live_cells: CellSet,
        generations: i64,
        is_final: bool,
    ) -> SimulationResult<GenerationResult> {
        if generations < 0 {
            return Err(SimulationError::NegativeGenerations(generations));
        }
        let generations = generations as u64;
        if generations == 0 {
            return Ok(GenerationResult {
                live_cells,
                step_num: self.current_step.load(Ordering::SeqCst),
                period: 0,
            });
        }
        if live_cells.is_empty() {
            // a dead board stays dead; reporting the probe interval as its
            // period would be meaningless
            let step_num = self.current_step.fetch_add(generations, Ordering::SeqCst) + generations;
            return Ok(GenerationResult { live_cells, step_num, period: 0 });
        }
        self.maintain_caches();

        let (cells, period) = if self.should_use_direct(&live_cells, generations) {
            direct::simulate(&live_cells, generations, is_final)
        } else {
            match self.simulate_hashlife(&live_cells, generations, is_final) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("hashlife path failed ({err}), falling back to direct simulation");
                    direct::simulate(&live_cells, generations, is_final)
                }
            }
        };

        let step_num = self.current_step.fetch_add(generations, Ordering::SeqCst) + generations;
        Ok(GenerationResult { live_cells: cells, step_num, period })
    }
}

impl Default for HashlifeEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest power of two not exceeding `n`. `n` must be nonzero.
fn largest_power_of_two(n: u64) -> u64 {
    1u64 << (63 - n.leading_zeros())
}
