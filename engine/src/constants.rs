/// Soft cap shared by the canonical node store and the advance result cache.
pub const MAX_CACHE_SIZE: u64 = 100_000;

/// Every this many simulate calls, caches at capacity are trimmed to half.
pub const CACHE_CLEANUP_INTERVAL: u64 = 1000;

/// Smallest root level the driver will advance.
pub const MIN_UNIVERSE_LEVEL: u8 = 3;

/// Largest level the universe builder will construct.
pub const MAX_BUILD_LEVEL: u8 = 15;

/// Expansion past this level is aborted to bound memory on pathological inputs.
pub const MAX_EXPANSION_LEVEL: u8 = 10;

/// Upper bound on the padding added around the input bounding box.
pub const MAX_PADDING: u64 = 1000;

/// Requests of at most this many generations take the direct path.
pub const DIRECT_GENERATIONS_THRESHOLD: u64 = 5;

/// Boards with fewer live cells than this take the direct path.
pub const DIRECT_POPULATION_THRESHOLD: usize = 20;

/// Coordinates beyond this magnitude route the request to the direct path.
pub const EXTREME_COORDINATE: i64 = 10_000;

/// A board is sparse (and routed to the direct path) when
/// `live_cells * SPARSITY_FACTOR < bounding_box_area`.
pub const SPARSITY_FACTOR: i64 = 10;

/// Period probe interval (in generations) on the direct path.
pub const PERIOD_PROBE_INTERVAL: u64 = 100;
