//! Game constants: board limits, generation densities, solver budgets.
//!
//! Densities are expressed in percent of the total cell count so that
//! generation stays integer-only and reproducible for a given seed.

/// Smallest board side accepted at game creation.
pub const MIN_BOARD_SIDE: usize = 3;

/// Largest board side accepted at game creation.
pub const MAX_BOARD_SIDE: usize = 50;

/// Default number of flowers the robot can carry at once.
pub const DEFAULT_MAX_CAPACITY: u32 = 12;

/// Share of cells seeded with flowers (at least one flower is always placed).
pub const FLOWER_DENSITY_PERCENT: usize = 10;

/// Share of cells seeded with obstacles.
pub const OBSTACLE_DENSITY_PERCENT: usize = 15;

/// Greedy step budget per cell: `rows * cols * GREEDY_STEPS_PER_CELL`.
pub const GREEDY_STEPS_PER_CELL: usize = 8;

/// Optimal step budget per cell.
pub const OPTIMAL_STEPS_PER_CELL: usize = 8;

/// ML proxy step budget per cell. Each step is a remote round trip.
pub const ML_STEPS_PER_CELL: usize = 4;

/// Extra A* cost for routing through an obstacle in the optimal solver's
/// cleaning fallback.
pub const OBSTACLE_PENALTY: usize = 4;

/// Default permutation depth for the optimal planner's pickup ordering.
pub const DEFAULT_LOOKAHEAD_DEPTH: usize = 3;

/// How many nearest flowers the optimal planner permutes over.
pub const DEFAULT_CANDIDATE_WIDTH: usize = 6;

/// Rejected predictions in a row before the ML proxy gives up.
pub const MAX_CONSECUTIVE_REJECTIONS: usize = 3;

/// Number of flowers placed on a freshly generated `rows x cols` board.
#[inline]
pub fn flower_count_for(rows: usize, cols: usize) -> usize {
    (rows * cols * FLOWER_DENSITY_PERCENT / 100).max(1)
}

/// Number of obstacles placed on a freshly generated `rows x cols` board.
#[inline]
pub fn obstacle_count_for(rows: usize, cols: usize) -> usize {
    rows * cols * OBSTACLE_DENSITY_PERCENT / 100
}
