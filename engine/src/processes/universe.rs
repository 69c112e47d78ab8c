//! Mapping between sparse cell sets and padded quadtrees, plus universe
//! growth management for the advance driver.

use crate::{
    constants::{MAX_BUILD_LEVEL, MAX_PADDING, MIN_UNIVERSE_LEVEL},
    errors::EngineResult,
    model::{node::QuadNode, store::NodeStore},
};
use itertools::Itertools;
use log::debug;
use std::sync::Arc;

use life_engine_core::cell::{Cell, CellSet};

/// Builds padded universes over a shared node store.
#[derive(Clone)]
pub struct UniverseBuilder {
    store: NodeStore,
}

impl UniverseBuilder {
    pub fn new(store: NodeStore) -> Self {
        Self { store }
    }

    /// Builds the smallest power-of-two universe covering `live_cells` with
    /// enough padding that no activity can reach the border within
    /// `generations` steps, subject to the padding and level caps. Returns
    /// the root and the absolute coordinates of its north-west corner.
    ///
    /// An empty input yields a dead universe sized for the horizon.
    pub fn with_padding(&self, live_cells: &CellSet, generations: u64) -> EngineResult<(Arc<QuadNode>, i64, i64)> {
        let (Some((min_x, max_x)), Some((min_y, max_y))) = (
            live_cells.iter().map(|c| c.x).minmax().into_option(),
            live_cells.iter().map(|c| c.y).minmax().into_option(),
        ) else {
            let level = empty_universe_level(generations);
            let root = self.store.empty(level)?;
            let half = (root.size() / 2) as i64;
            return Ok((root, -half, -half));
        };

        let width = (max_x - min_x + 1) as u64;
        let height = (max_y - min_y + 1) as u64;
        let max_dimension = width.max(height);
        let padding = generations.saturating_add(4).max(max_dimension / 4).min(MAX_PADDING);
        let needed = max_dimension + 2 * padding;

        let mut level = MIN_UNIVERSE_LEVEL;
        while (1u64 << level) < needed && level < MAX_BUILD_LEVEL {
            level += 1;
        }
        if (1u64 << level) < needed {
            debug!("universe clamped to level {} ({} cells needed)", level, needed);
        }

        let origin_x = min_x - padding as i64;
        let origin_y = min_y - padding as i64;
        let size = 1i64 << level;
        // cells beyond a clamped universe are dropped, a documented
        // approximation for extreme inputs
        let cells: Vec<Cell> = live_cells
            .iter()
            .copied()
            .filter(|c| c.x < origin_x + size && c.y < origin_y + size)
            .collect();
        if cells.len() < live_cells.len() {
            debug!("dropped {} cells outside the clamped universe", live_cells.len() - cells.len());
        }

        let root = self.build(&cells, origin_x, origin_y, level)?;
        Ok((root, origin_x, origin_y))
    }

    /// Recursively partitions the region with north-west corner `(x, y)` into
    /// quadrants down to leaves. Regions containing no cells short-circuit to
    /// the shared empty node.
    fn build(&self, cells: &[Cell], x: i64, y: i64, level: u8) -> EngineResult<Arc<QuadNode>> {
        if cells.is_empty() {
            return self.store.empty(level);
        }
        if level == 0 {
            // a non-empty unit region is exactly one live cell
            return Ok(self.store.leaf(true));
        }
        let half = 1i64 << (level - 1);
        let (mut nw, mut ne, mut sw, mut se) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for &cell in cells {
            match (cell.y >= y + half, cell.x >= x + half) {
                (false, false) => nw.push(cell),
                (false, true) => ne.push(cell),
                (true, false) => sw.push(cell),
                (true, true) => se.push(cell),
            }
        }
        let nw = self.build(&nw, x, y, level - 1)?;
        let ne = self.build(&ne, x + half, y, level - 1)?;
        let sw = self.build(&sw, x, y + half, level - 1)?;
        let se = self.build(&se, x + half, y + half, level - 1)?;
        self.store.compose(nw, ne, sw, se)
    }

    /// Whether any activity sits in the border ring of the node, i.e. outside
    /// its centered half-size square. True means the node must be expanded
    /// before it can be advanced by its full safe horizon.
    pub fn needs_expansion(&self, node: &Arc<QuadNode>) -> EngineResult<bool> {
        if node.level() < 2 {
            return Ok(!node.is_empty());
        }
        let q = node.inner()?;
        let (nw, ne, sw, se) = (q.nw.inner()?, q.ne.inner()?, q.sw.inner()?, q.se.inner()?);
        // the twelve border-touching grandchild quadrants; the four interior
        // ones (nw.se, ne.sw, sw.ne, se.nw) form the centered half
        Ok(!nw.nw.is_empty()
            || !nw.ne.is_empty()
            || !nw.sw.is_empty()
            || !ne.nw.is_empty()
            || !ne.ne.is_empty()
            || !ne.se.is_empty()
            || !sw.nw.is_empty()
            || !sw.sw.is_empty()
            || !sw.se.is_empty()
            || !se.ne.is_empty()
            || !se.sw.is_empty()
            || !se.se.is_empty())
    }
}

/// Inverse traversal: emits the absolute coordinate of every alive leaf,
/// skipping dead subtrees outright.
pub fn to_live_cells(node: &Arc<QuadNode>, origin_x: i64, origin_y: i64) -> CellSet {
    let mut cells = CellSet::with_capacity(node.population() as usize);
    collect(node, origin_x, origin_y, &mut cells);
    cells
}

fn collect(node: &QuadNode, x: i64, y: i64, out: &mut CellSet) {
    if node.is_empty() {
        return;
    }
    match node.parts() {
        None => {
            out.insert(Cell::new(x, y));
        }
        Some(q) => {
            let half = (node.size() / 2) as i64;
            collect(&q.nw, x, y, out);
            collect(&q.ne, x + half, y, out);
            collect(&q.sw, x, y + half, out);
            collect(&q.se, x + half, y + half, out);
        }
    }
}

/// Shifts cells so the minimum coordinates land at the origin, keeping the
/// coordinate space the quadtree works in small. Returns the shifted set and
/// the applied offset.
pub fn normalize(live_cells: &CellSet) -> (CellSet, i64, i64) {
    let (Some(min_x), Some(min_y)) =
        (live_cells.iter().map(|c| c.x).min(), live_cells.iter().map(|c| c.y).min())
    else {
        return (live_cells.clone(), 0, 0);
    };
    (translate(live_cells, -min_x, -min_y), min_x, min_y)
}

/// Every cell translated by `(dx, dy)`.
pub fn translate(cells: &CellSet, dx: i64, dy: i64) -> CellSet {
    cells.iter().map(|cell| cell.translated(dx, dy)).collect()
}

/// Smallest level whose universe can hold `generations` steps of growth from
/// an empty center, clamped to the build caps.
fn empty_universe_level(generations: u64) -> u8 {
    let needed = generations.saturating_add(8);
    let level = (64 - (needed - 1).leading_zeros()) as u8;
    level.clamp(MIN_UNIVERSE_LEVEL, MAX_BUILD_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[(i64, i64)]) -> CellSet {
        coords.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    #[test]
    fn build_and_convert_round_trip() {
        let builder = UniverseBuilder::new(NodeStore::new());
        let board = cells(&[(5, 7), (6, 8), (4, 9), (5, 9), (6, 9)]);
        let (root, origin_x, origin_y) = builder.with_padding(&board, 10).unwrap();
        assert!(root.level() >= MIN_UNIVERSE_LEVEL);
        assert_eq!(root.population(), board.len() as u64);
        assert_eq!(to_live_cells(&root, origin_x, origin_y), board);
    }

    #[test]
    fn negative_coordinates_round_trip() {
        let builder = UniverseBuilder::new(NodeStore::new());
        let board = cells(&[(-3, -8), (-2, -8), (0, 4)]);
        let (root, origin_x, origin_y) = builder.with_padding(&board, 1).unwrap();
        assert_eq!(to_live_cells(&root, origin_x, origin_y), board);
    }

    #[test]
    fn empty_input_builds_a_dead_universe() {
        let builder = UniverseBuilder::new(NodeStore::new());
        let (root, _, _) = builder.with_padding(&CellSet::new(), 100).unwrap();
        assert!(root.is_empty());
        assert!(root.level() >= MIN_UNIVERSE_LEVEL);
        assert!(root.level() <= MAX_BUILD_LEVEL);
    }

    #[test]
    fn padding_is_capped() {
        let builder = UniverseBuilder::new(NodeStore::new());
        let board = cells(&[(0, 0), (0, 1), (1, 0), (1, 1)]);
        let (root, _, _) = builder.with_padding(&board, 1_000_000).unwrap();
        assert!(root.level() <= MAX_BUILD_LEVEL);
        assert_eq!(root.population(), 4);
    }

    #[test]
    fn expansion_detection_tracks_border_activity() {
        let store = NodeStore::new();
        let builder = UniverseBuilder::new(store.clone());
        // content in the exact center of a level-3 universe: no growth needed
        let centered = builder.build(&[Cell::new(3, 3), Cell::new(4, 4)], 0, 0, 3).unwrap();
        assert!(!builder.needs_expansion(&centered).unwrap());
        // content in a corner: growth needed
        let cornered = builder.build(&[Cell::new(0, 0)], 0, 0, 3).unwrap();
        assert!(builder.needs_expansion(&cornered).unwrap());
        // and expansion re-centers it
        let expanded = store.expand(&cornered).unwrap();
        assert!(!builder.needs_expansion(&expanded).unwrap());
    }

    #[test]
    fn expand_keeps_content_in_place() {
        let store = NodeStore::new();
        let builder = UniverseBuilder::new(store.clone());
        let board = cells(&[(1, 2), (2, 2), (3, 2), (3, 1)]);
        let (root, origin_x, origin_y) = builder.with_padding(&board, 1).unwrap();
        let half = (root.size() / 2) as i64;
        let expanded = store.expand(&root).unwrap();
        assert_eq!(to_live_cells(&expanded, origin_x - half, origin_y - half), board);
    }

    #[test]
    fn normalize_round_trips() {
        let board = cells(&[(13, -7), (15, -7), (13, -5)]);
        let (normalized, offset_x, offset_y) = normalize(&board);
        assert_eq!(normalized, cells(&[(0, 2), (2, 2), (0, 0)]));
        assert_eq!(translate(&normalized, offset_x, offset_y), board);
    }

    #[test]
    fn empty_universe_levels() {
        assert_eq!(empty_universe_level(0), 3);
        assert_eq!(empty_universe_level(8), 4);
        assert_eq!(empty_universe_level(1000), 10);
        assert_eq!(empty_universe_level(u64::MAX), MAX_BUILD_LEVEL);
    }
}
