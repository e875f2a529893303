/// Entities: Player (with its planned-move queue), Hazards, Projectiles,
/// Collectibles, and the planning-action records used by undo.

use std::collections::VecDeque;

use super::tile::GRID_SIZE;

/// A board cell, (x, y) with 0 <= x, y < GRID_SIZE.
pub type Cell = (usize, usize);

/// Fixed player spawn: bottom-left corner, regardless of any `P`
/// marker in the level text.
pub const START_CELL: Cell = (0, GRID_SIZE - 1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Apply this direction to a cell, clamped to the board.
    /// A step into the edge yields the same cell (the move is a no-op,
    /// not an error).
    pub fn step(self, (x, y): Cell) -> Cell {
        match self {
            Direction::Up if y > 0 => (x, y - 1),
            Direction::Down if y < GRID_SIZE - 1 => (x, y + 1),
            Direction::Left if x > 0 => (x - 1, y),
            Direction::Right if x < GRID_SIZE - 1 => (x + 1, y),
            _ => (x, y),
        }
    }

    /// Unit delta for ray walks (beams, projectiles).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// One recorded planning action, pushed for every accepted command
/// and popped (and reversed) by undo. Stack order matches the causal
/// order of the player's commands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Move(Direction),
    BlockPlacement(Cell),
}

// ── Player ──

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Cell,
    /// Pending planned moves, consumed front-first during execution.
    /// Undo removes from the tail.
    pub moves: VecDeque<Direction>,
    pub facing: Direction,
}

impl Player {
    pub fn new() -> Self {
        Player {
            pos: START_CELL,
            moves: VecDeque::new(),
            facing: Direction::Up,
        }
    }

    pub fn enqueue_move(&mut self, dir: Direction) {
        self.moves.push_back(dir);
    }

    /// The cell the front pending move would reach. Does not mutate.
    /// Empty queue yields the current cell.
    pub fn peek_next_move(&self) -> Cell {
        match self.moves.front() {
            Some(d) => d.step(self.pos),
            None => self.pos,
        }
    }

    /// Pop and apply the front pending move (boundary-clamped), updating
    /// facing. No-op on an empty queue.
    pub fn execute_next_move(&mut self) {
        if let Some(d) = self.moves.pop_front() {
            self.pos = d.step(self.pos);
            self.facing = d;
        }
    }

    /// Remove the most recently enqueued, not-yet-executed move.
    /// No-op when the queue is empty.
    pub fn undo_last_move(&mut self) {
        self.moves.pop_back();
    }

    /// Clear pending moves and return to the fixed start cell.
    pub fn reset_position(&mut self) {
        self.moves.clear();
        self.pos = START_CELL;
    }
}

// ── Collectibles ──

#[derive(Clone, Copy, Debug)]
pub struct Collectible {
    pub pos: Cell,
    pub collected: bool,
}

impl Collectible {
    pub fn new(pos: Cell) -> Self {
        Collectible { pos, collected: false }
    }
}

// ── Hazards ──

/// Hazard behavior is dispatched by tagged kind — the set is closed
/// and small, so no trait object is involved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HazardKind {
    CannonLeft,
    CannonRight,
    LaserUp,
    LaserDown,
}

impl HazardKind {
    pub fn facing(self) -> Direction {
        match self {
            HazardKind::CannonLeft => Direction::Left,
            HazardKind::CannonRight => Direction::Right,
            HazardKind::LaserUp => Direction::Up,
            HazardKind::LaserDown => Direction::Down,
        }
    }

    pub fn is_laser(self) -> bool {
        matches!(self, HazardKind::LaserUp | HazardKind::LaserDown)
    }

    pub fn is_cannon(self) -> bool {
        !self.is_laser()
    }
}

/// A fixed-origin danger source. Origin and kind never change after
/// level load; `beam_progress` is only meaningful for lasers and
/// advances one cell per hazard tick (clamping down instantly when an
/// obstruction appears closer).
#[derive(Clone, Copy, Debug)]
pub struct Hazard {
    pub origin: Cell,
    pub kind: HazardKind,
    pub beam_progress: usize,
}

impl Hazard {
    pub fn new(origin: Cell, kind: HazardKind) -> Self {
        Hazard { origin, kind, beam_progress: 0 }
    }
}

/// A cannonball in flight. Advances one cell per hazard tick in its
/// stored direction; removed when it would leave the board or enter
/// an obstructed cell.
#[derive(Clone, Copy, Debug)]
pub struct Projectile {
    pub pos: Cell,
    pub dir: Direction,
    pub alive: bool,
}

impl Projectile {
    pub fn new(pos: Cell, dir: Direction) -> Self {
        Projectile { pos, dir, alive: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_clamps_at_edges() {
        assert_eq!(Direction::Left.step((0, 5)), (0, 5));
        assert_eq!(Direction::Up.step((5, 0)), (5, 0));
        assert_eq!(Direction::Right.step((GRID_SIZE - 1, 5)), (GRID_SIZE - 1, 5));
        assert_eq!(Direction::Down.step((5, GRID_SIZE - 1)), (5, GRID_SIZE - 1));
        assert_eq!(Direction::Right.step((3, 3)), (4, 3));
    }

    #[test]
    fn peek_does_not_mutate() {
        let mut p = Player::new();
        p.enqueue_move(Direction::Up);
        let before = p.pos;
        assert_eq!(p.peek_next_move(), (0, GRID_SIZE - 2));
        assert_eq!(p.pos, before);
        assert_eq!(p.moves.len(), 1);
    }

    #[test]
    fn peek_at_boundary_yields_current_cell() {
        let mut p = Player::new();
        p.enqueue_move(Direction::Left); // already at x = 0
        assert_eq!(p.peek_next_move(), p.pos);
    }

    #[test]
    fn execute_consumes_front_and_updates_facing() {
        let mut p = Player::new();
        p.enqueue_move(Direction::Up);
        p.enqueue_move(Direction::Right);
        p.execute_next_move();
        assert_eq!(p.pos, (0, GRID_SIZE - 2));
        assert_eq!(p.facing, Direction::Up);
        p.execute_next_move();
        assert_eq!(p.pos, (1, GRID_SIZE - 2));
        assert!(p.moves.is_empty());
    }

    #[test]
    fn undo_removes_tail_only() {
        let mut p = Player::new();
        p.enqueue_move(Direction::Up);
        p.enqueue_move(Direction::Right);
        p.enqueue_move(Direction::Down);
        p.undo_last_move();
        assert_eq!(
            p.moves.iter().copied().collect::<Vec<_>>(),
            vec![Direction::Up, Direction::Right]
        );
        p.undo_last_move();
        p.undo_last_move();
        p.undo_last_move(); // empty: no-op
        assert!(p.moves.is_empty());
    }

    #[test]
    fn reset_returns_to_start() {
        let mut p = Player::new();
        p.enqueue_move(Direction::Up);
        p.execute_next_move();
        p.enqueue_move(Direction::Right);
        p.reset_position();
        assert_eq!(p.pos, START_CELL);
        assert!(p.moves.is_empty());
    }
}
