//! End-to-end simulation tests through the public engine API.

use life_engine::{engine::HashlifeEngine, processes::direct};
use life_engine_core::{
    api::EngineApi,
    cell::{Cell, CellSet},
};

fn cells(coords: &[(i64, i64)]) -> CellSet {
    coords.iter().map(|&(x, y)| Cell::new(x, y)).collect()
}

fn translate(board: &CellSet, dx: i64, dy: i64) -> CellSet {
    board.iter().map(|c| Cell::new(c.x + dx, c.y + dy)).collect()
}

/// The period-3 pulsar, 48 cells in a 13x13 box. Dense and populous enough
/// to route through the hashlife path for any run longer than five
/// generations.
fn pulsar() -> CellSet {
    let mut board = CellSet::new();
    for &a in &[-4i64, -3, -2, 2, 3, 4] {
        for &b in &[-6i64, -1, 1, 6] {
            board.insert(Cell::new(a, b));
            board.insert(Cell::new(b, a));
        }
    }
    board
}

#[test]
fn blinker_oscillates() {
    let engine = HashlifeEngine::new();
    let horizontal = cells(&[(0, 0), (1, 0), (2, 0)]);
    let vertical = cells(&[(1, -1), (1, 0), (1, 1)]);
    let result = engine.simulate(horizontal.clone(), 1, false).unwrap();
    assert_eq!(result.live_cells, vertical);
    let result = engine.simulate(result.live_cells, 1, false).unwrap();
    assert_eq!(result.live_cells, horizontal);
}

#[test]
fn still_life_is_fixed() {
    let engine = HashlifeEngine::new();
    let block = cells(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
    let result = engine.simulate(block.clone(), 10, false).unwrap();
    assert_eq!(result.live_cells, block);
}

#[test]
fn glider_translates_one_cell_per_four_generations() {
    let engine = HashlifeEngine::new();
    let glider = cells(&[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
    let result = engine.simulate(glider.clone(), 8, false).unwrap();
    assert_eq!(result.live_cells, translate(&glider, 2, 2));
}

#[test]
fn empty_board_stays_empty() {
    let engine = HashlifeEngine::new();
    let result = engine.simulate(CellSet::new(), 250, true).unwrap();
    assert!(result.live_cells.is_empty());
    assert_eq!(result.period, 0);
    assert_eq!(result.step_num, 250);
}

#[test]
fn pulsar_hashlife_matches_direct() {
    let engine = HashlifeEngine::new();
    let board = pulsar();
    let (expected, _) = direct::simulate(&board, 64, false);
    let result = engine.simulate(board, 64, false).unwrap();
    assert_eq!(result.live_cells, expected);
}

#[test]
fn pulsar_period_is_detected() {
    let engine = HashlifeEngine::new();
    let board = pulsar();
    let (expected, _) = direct::simulate(&board, 1000, false);
    let result = engine.simulate(board, 1000, true).unwrap();
    assert_eq!(result.live_cells, expected);
    assert!(result.period > 0);
    assert_eq!(result.period % 3, 0);
}

#[test]
fn random_dense_board_matches_direct() {
    use rand::{Rng, SeedableRng};
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
    let mut board = CellSet::new();
    while board.len() < 40 {
        board.insert(Cell::new(rng.gen_range(0..12), rng.gen_range(0..12)));
    }
    let engine = HashlifeEngine::new();
    let (expected, _) = direct::simulate(&board, 32, false);
    let result = engine.simulate(board, 32, false).unwrap();
    assert_eq!(result.live_cells, expected);
}

#[test]
fn step_counter_is_monotonic() {
    let engine = HashlifeEngine::new();
    let mut board = cells(&[(0, 0), (1, 0), (2, 0)]);
    let mut last_step = 0;
    for generations in [1i64, 5, 2, 10] {
        let result = engine.simulate(board, generations, false).unwrap();
        assert_eq!(result.step_num, last_step + generations as u64);
        last_step = result.step_num;
        board = result.live_cells;
    }
}

#[test]
fn results_are_stable_under_a_tiny_cache() {
    let board = pulsar();
    let reference = HashlifeEngine::new().simulate(board.clone(), 64, false).unwrap();
    let constrained = HashlifeEngine::with_cache_size(64).simulate(board, 64, false).unwrap();
    assert_eq!(constrained.live_cells, reference.live_cells);
}
