/// Blocking and obstruction rules — pure queries, no side effects.
///
/// Two distinct questions, answered from the same single source of
/// truth (terrain + hazards + obstacles + collectibles):
///
///   * `is_blocked`      — can the PLAYER enter this cell?
///     Blocked by: out of bounds, solid terrain, a hazard's housing,
///     a placed obstacle. An uncollected collectible does NOT block
///     the player (walking onto it is the pickup).
///
///   * `obstructs_shot`  — does this cell stop a beam or cannonball?
///     Everything that blocks the player, PLUS uncollected
///     collectibles (a chest soaks up shots until it is picked up).
///
/// The ghost-path simulation lives here too: planning previews and
/// obstacle placement both replay the pending-move queue against
/// these rules instead of reading the player's live position.

use super::entity::{Cell, Collectible, Direction, Hazard};
use super::tile::{Terrain, GRID_SIZE};

/// Immutable view of everything that occupies the board.
pub struct GridView<'a> {
    pub terrain: &'a Vec<Vec<Terrain>>,
    pub hazards: &'a [Hazard],
    pub obstacles: &'a [Cell],
    pub collectibles: &'a [Collectible],
}

impl<'a> GridView<'a> {
    pub fn in_bounds(&self, (x, y): Cell) -> bool {
        x < GRID_SIZE && y < GRID_SIZE
    }

    pub fn terrain_at(&self, (x, y): Cell) -> Terrain {
        if x < GRID_SIZE && y < GRID_SIZE {
            self.terrain[y][x]
        } else {
            Terrain::Tree // out of bounds = wall
        }
    }

    pub fn has_obstacle_at(&self, cell: Cell) -> bool {
        self.obstacles.iter().any(|&b| b == cell)
    }

    pub fn has_hazard_origin_at(&self, cell: Cell) -> bool {
        self.hazards.iter().any(|h| h.origin == cell)
    }

    fn has_uncollected_item_at(&self, cell: Cell) -> bool {
        self.collectibles.iter().any(|c| !c.collected && c.pos == cell)
    }

    /// Can the player NOT enter this cell?
    pub fn is_blocked(&self, cell: Cell) -> bool {
        !self.in_bounds(cell)
            || self.terrain_at(cell).is_solid()
            || self.has_hazard_origin_at(cell)
            || self.has_obstacle_at(cell)
    }

    /// Does this cell terminate a beam or destroy a projectile?
    pub fn obstructs_shot(&self, cell: Cell) -> bool {
        self.is_blocked(cell) || self.has_uncollected_item_at(cell)
    }

    /// Length of the unobstructed run from `origin` along `dir`,
    /// first obstruction exclusive. The origin cell itself is not
    /// part of the run.
    pub fn open_run(&self, origin: Cell, dir: Direction) -> usize {
        let (dx, dy) = dir.delta();
        let mut run = 0;
        let (mut x, mut y) = (origin.0 as i32, origin.1 as i32);
        loop {
            x += dx;
            y += dy;
            if x < 0 || y < 0 {
                return run;
            }
            let cell = (x as usize, y as usize);
            if self.obstructs_shot(cell) {
                return run;
            }
            run += 1;
        }
    }
}

// ── Ghost-path simulation ──

/// Replay the pending moves from `start` with boundary clamping,
/// stopping as soon as a step lands on a blocked cell. Returns the
/// final ghost position — which IS that blocked cell when the walk
/// was cut short, so callers placing a block must re-check
/// `is_blocked` on the result.
pub fn ghost_target(
    view: &GridView,
    start: Cell,
    moves: impl IntoIterator<Item = Direction>,
) -> Cell {
    let mut pos = start;
    for dir in moves {
        pos = dir.step(pos);
        if view.is_blocked(pos) {
            break;
        }
    }
    pos
}

/// Every cell the ghost visits, in order, for the planning preview.
/// Includes the blocked cell that cut the walk short (the renderer
/// highlights it differently).
pub fn ghost_path(
    view: &GridView,
    start: Cell,
    moves: impl IntoIterator<Item = Direction>,
) -> Vec<Cell> {
    let mut pos = start;
    let mut path = Vec::new();
    for dir in moves {
        pos = dir.step(pos);
        path.push(pos);
        if view.is_blocked(pos) {
            break;
        }
    }
    path
}
