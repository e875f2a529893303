/// WorldState: the complete snapshot of a running game.
///
/// Single source of truth: terrain + hazards + obstacles + collectibles.
/// Beam cells and danger cells are always DERIVED from this state (see
/// sim::hazard), never cached across a mutation — any change to the
/// obstacle set or to collectible state is immediately visible to the
/// next beam query.
///
/// All per-instance timers (planning countdown, hazard/execution
/// accumulators) are owned fields here, so independent worlds — one per
/// test, say — never share clock state.

use crate::config::{Difficulty, TimingConfig};
use crate::domain::entity::{
    Action, Cell, Collectible, Hazard, Player, Projectile,
};
use crate::domain::rules::GridView;
use crate::domain::tile::{Terrain, GRID_SIZE};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Settings,
    /// Timed window: queue moves, place obstacles, undo.
    Planning,
    /// Tick-driven window: queued moves resolve one per tick.
    Executing,
    /// Terminal for the level; the menu layer decides retry/advance.
    LevelFailed,
    LevelComplete,
    GameComplete,
}

pub struct WorldState {
    // ── Board (immutable after level load) ──
    pub terrain: Vec<Vec<Terrain>>,

    // ── Entities ──
    pub player: Player,
    pub collectibles: Vec<Collectible>,
    pub hazards: Vec<Hazard>,
    pub projectiles: Vec<Projectile>,
    /// Player-placed blockers, in placement order. At most one per cell.
    pub obstacles: Vec<Cell>,

    // ── Planning bookkeeping ──
    /// Undo stack; order matches the causal order of commands.
    pub history: Vec<Action>,
    pub blocks_left: u32,

    // ── Turn budget ──
    /// -1 = unlimited.
    pub initial_turns: i32,
    pub turns_remaining: i32,

    // ── Configuration (copied in at startup) ──
    pub difficulty: Difficulty,
    pub timing: TimingConfig,

    // ── Phase & clocks ──
    pub phase: Phase,
    pub paused: bool,
    pub planning_left_ms: u64,
    pub hazard_accum_ms: u64,
    pub exec_accum_ms: u64,

    // ── Level progression ──
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,

    // ── UI ──
    pub message: String,
    pub message_left_ms: u64,
    /// Free-running counter for blink effects, advanced on hazard ticks.
    pub anim_tick: u32,
    pub settings_cursor: usize,
}

impl WorldState {
    pub fn new() -> Self {
        let timing = TimingConfig::default();
        let difficulty = Difficulty::Normal;
        WorldState {
            terrain: vec![vec![Terrain::Open; GRID_SIZE]; GRID_SIZE],
            player: Player::new(),
            collectibles: vec![],
            hazards: vec![],
            projectiles: vec![],
            obstacles: vec![],
            history: vec![],
            blocks_left: difficulty.blocks_per_turn(),
            initial_turns: difficulty.turn_limit(),
            turns_remaining: difficulty.turn_limit(),
            difficulty,
            timing,
            phase: Phase::Title,
            paused: false,
            planning_left_ms: 0,
            hazard_accum_ms: 0,
            exec_accum_ms: 0,
            current_level: 0,
            total_levels: 0,
            level_name: String::new(),
            message: String::new(),
            message_left_ms: 0,
            anim_tick: 0,
            settings_cursor: 1,
        }
    }

    /// Borrow the board as a rules view.
    pub fn view(&self) -> GridView<'_> {
        GridView {
            terrain: &self.terrain,
            hazards: &self.hazards,
            obstacles: &self.obstacles,
            collectibles: &self.collectibles,
        }
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.view().is_blocked(cell)
    }

    // ── Collectibles ──

    /// Pick up the item at `cell`, if one is there and uncollected.
    pub fn collect_at(&mut self, cell: Cell) -> bool {
        for item in &mut self.collectibles {
            if !item.collected && item.pos == cell {
                item.collected = true;
                return true;
            }
        }
        false
    }

    pub fn all_items_collected(&self) -> bool {
        self.collectibles.iter().all(|c| c.collected)
    }

    /// Uncollected item cells, for the renderer.
    pub fn uncollected_cells(&self) -> Vec<Cell> {
        self.collectibles
            .iter()
            .filter(|c| !c.collected)
            .map(|c| c.pos)
            .collect()
    }

    pub fn restore_collectibles(&mut self) {
        for item in &mut self.collectibles {
            item.collected = false;
        }
    }

    // ── Turn budget ──

    pub fn turns_unlimited(&self) -> bool {
        self.initial_turns < 0
    }

    /// Reset the per-turn transient state: obstacles, projectiles,
    /// undo history, obstacle budget. Pending moves are the caller's
    /// business (death clears them, a normal turn end has none left).
    pub fn reset_turn_state(&mut self) {
        self.obstacles.clear();
        self.projectiles.clear();
        self.history.clear();
        self.blocks_left = self.difficulty.blocks_per_turn();
    }

    /// Enter the Planning phase with a fresh countdown.
    pub fn enter_planning(&mut self) {
        self.phase = Phase::Planning;
        self.planning_left_ms = self.timing.planning_ms;
        self.exec_accum_ms = 0;
    }

    pub fn set_message(&mut self, msg: &str, duration_ms: u64) {
        self.message = msg.to_string();
        self.message_left_ms = duration_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_flips_once() {
        let mut world = WorldState::new();
        world.collectibles = vec![Collectible::new((3, 3)), Collectible::new((4, 4))];
        assert!(world.collect_at((3, 3)));
        assert!(!world.collect_at((3, 3))); // already taken
        assert!(!world.all_items_collected());
        assert!(world.collect_at((4, 4)));
        assert!(world.all_items_collected());
        assert!(world.uncollected_cells().is_empty());
    }

    #[test]
    fn reset_turn_state_refills_budget() {
        let mut world = WorldState::new();
        world.obstacles.push((1, 1));
        world.blocks_left = 0;
        world.history.push(Action::BlockPlacement((1, 1)));
        world.reset_turn_state();
        assert!(world.obstacles.is_empty());
        assert!(world.history.is_empty());
        assert_eq!(world.blocks_left, world.difficulty.blocks_per_turn());
    }
}
