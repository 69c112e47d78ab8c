//! The memoized advance engine.
//!
//! `advance(node, g)` returns the centered child-level node `g` generations
//! later. The contract holds for `g <= 2^(level - 2)` because the ring around
//! the center insulates it from outside content for exactly that horizon.
//! Results are cached per `(node identity, g)`, which is what turns repeated
//! sub-patterns into cache hits instead of re-simulation.

use crate::{
    errors::{EngineError, EngineResult},
    model::{
        cache::Cache,
        node::{NodeId, QuadNode},
        store::NodeStore,
    },
};
use std::sync::Arc;

/// Key of the advance result cache: node identity plus generation count.
pub type ResultKey = (NodeId, u64);

#[derive(Clone)]
pub struct AdvanceManager {
    store: NodeStore,
    results: Cache<ResultKey, Arc<QuadNode>>,
}

impl AdvanceManager {
    pub fn new(store: NodeStore, results: Cache<ResultKey, Arc<QuadNode>>) -> Self {
        Self { store, results }
    }

    /// The level-(k-1) center of a level-k node (k >= 2).
    pub fn centered_subnode(&self, node: &Arc<QuadNode>) -> EngineResult<Arc<QuadNode>> {
        let q = node.inner()?;
        let (nw, ne, sw, se) = (q.nw.inner()?, q.ne.inner()?, q.sw.inner()?, q.se.inner()?);
        self.store.compose(nw.se.clone(), ne.sw.clone(), sw.ne.clone(), se.nw.clone())
    }

    /// Advances `node` by `generations` and returns its centered child-level
    /// result. `generations` must not exceed the node's safe horizon; the
    /// driver guarantees this by expanding the universe first.
    pub fn advance(&self, node: &Arc<QuadNode>, generations: u64) -> EngineResult<Arc<QuadNode>> {
        if node.level() < 2 {
            return Err(EngineError::InsufficientLevel(node.level()));
        }
        if generations == 0 {
            return self.centered_subnode(node);
        }
        let horizon = node.safe_horizon();
        if generations > horizon {
            return Err(EngineError::HorizonExceeded {
                id: node.node_id(),
                level: node.level(),
                generations,
                horizon,
            });
        }

        let key = (node.node_id(), generations);
        if let Some(cached) = self.results.get(&key) {
            return Ok(cached);
        }

        let result = if node.level() == 2 {
            self.advance_base(node, generations)?
        } else {
            self.advance_recursive(node, generations)?
        };

        self.results.insert(key, result.clone());
        Ok(result)
    }

    /// Base case: run the 4x4 block literally with the B3/S23 rule (outside
    /// the block counts as dead) and return its 2x2 center.
    fn advance_base(&self, node: &Arc<QuadNode>, generations: u64) -> EngineResult<Arc<QuadNode>> {
        let mut grid = extract_grid(node)?;
        for _ in 0..generations {
            grid = step_grid(&grid);
        }
        self.store.compose(
            self.store.leaf(grid[1][1]),
            self.store.leaf(grid[1][2]),
            self.store.leaf(grid[2][1]),
            self.store.leaf(grid[2][2]),
        )
    }

    /// Recursive case: decompose into the nine overlapping child-level
    /// sub-squares, advance them by `j1`, recompose the four overlapping
    /// intermediates per the fixed pattern and advance those by the remaining
    /// `j2`. `j1 = min(g, 2^(k-3))` makes the split cover the single-step
    /// (1 + 0), maximal (half + half) and partial cases alike.
    fn advance_recursive(&self, node: &Arc<QuadNode>, generations: u64) -> EngineResult<Arc<QuadNode>> {
        let half_horizon = 1u64 << (node.level() - 3);
        let j1 = generations.min(half_horizon);
        let j2 = generations - j1;

        let q = node.inner()?;
        let (nw, ne, sw, se) = (q.nw.inner()?, q.ne.inner()?, q.sw.inner()?, q.se.inner()?);

        // the four edge-midpoint overlaps and the center
        let sub_n = self.store.compose(nw.ne.clone(), ne.nw.clone(), nw.se.clone(), ne.sw.clone())?;
        let sub_w = self.store.compose(nw.sw.clone(), nw.se.clone(), sw.nw.clone(), sw.ne.clone())?;
        let sub_c = self.store.compose(nw.se.clone(), ne.sw.clone(), sw.ne.clone(), se.nw.clone())?;
        let sub_e = self.store.compose(ne.sw.clone(), ne.se.clone(), se.nw.clone(), se.ne.clone())?;
        let sub_s = self.store.compose(sw.ne.clone(), se.nw.clone(), sw.se.clone(), se.sw.clone())?;

        let r_nw = self.advance(&q.nw, j1)?;
        let r_n = self.advance(&sub_n, j1)?;
        let r_ne = self.advance(&q.ne, j1)?;
        let r_w = self.advance(&sub_w, j1)?;
        let r_c = self.advance(&sub_c, j1)?;
        let r_e = self.advance(&sub_e, j1)?;
        let r_sw = self.advance(&q.sw, j1)?;
        let r_s = self.advance(&sub_s, j1)?;
        let r_se = self.advance(&q.se, j1)?;

        let mid_nw = self.store.compose(r_nw, r_n.clone(), r_w.clone(), r_c.clone())?;
        let mid_ne = self.store.compose(r_n, r_ne, r_c.clone(), r_e.clone())?;
        let mid_sw = self.store.compose(r_w, r_c.clone(), r_sw, r_s.clone())?;
        let mid_se = self.store.compose(r_c, r_e, r_s, r_se)?;

        let (out_nw, out_ne, out_sw, out_se) = if j2 == 0 {
            (
                self.centered_subnode(&mid_nw)?,
                self.centered_subnode(&mid_ne)?,
                self.centered_subnode(&mid_sw)?,
                self.centered_subnode(&mid_se)?,
            )
        } else {
            (
                self.advance(&mid_nw, j2)?,
                self.advance(&mid_ne, j2)?,
                self.advance(&mid_sw, j2)?,
                self.advance(&mid_se, j2)?,
            )
        };
        self.store.compose(out_nw, out_ne, out_sw, out_se)
    }
}

fn extract_grid(node: &Arc<QuadNode>) -> EngineResult<[[bool; 4]; 4]> {
    if node.level() != 2 {
        return Err(EngineError::InsufficientLevel(node.level()));
    }
    let mut grid = [[false; 4]; 4];
    fill_grid(node, 0, 0, &mut grid);
    Ok(grid)
}

fn fill_grid(node: &QuadNode, x: usize, y: usize, grid: &mut [[bool; 4]; 4]) {
    match node.parts() {
        None => grid[y][x] = node.alive(),
        Some(q) => {
            let half = (node.size() / 2) as usize;
            fill_grid(&q.nw, x, y, grid);
            fill_grid(&q.ne, x + half, y, grid);
            fill_grid(&q.sw, x, y + half, grid);
            fill_grid(&q.se, x + half, y + half, grid);
        }
    }
}

fn step_grid(grid: &[[bool; 4]; 4]) -> [[bool; 4]; 4] {
    let mut next = [[false; 4]; 4];
    for y in 0..4i32 {
        for x in 0..4i32 {
            let mut neighbors = 0;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if (0..4).contains(&nx) && (0..4).contains(&ny) && grid[ny as usize][nx as usize] {
                        neighbors += 1;
                    }
                }
            }
            next[y as usize][x as usize] =
                if grid[y as usize][x as usize] { neighbors == 2 || neighbors == 3 } else { neighbors == 3 };
        }
    }
    next
}
