/// Turn/phase controller: clock feed, execution ticks, death and
/// level-outcome resolution.
///
/// The host loop calls `advance_clock` once per frame with the
/// elapsed wall-clock milliseconds. Per-instance accumulators on the
/// world decide when a hazard tick (fixed cadence, runs even while
/// paused) or an execution tick (Executing phase only) fires; each
/// tick function is a no-op when its preconditions do not hold, so
/// spurious calls are harmless.
///
/// Execution tick ordering, which later steps depend on:
///   peek → blocked? discard move, done
///        → move, then pickup, then danger check
///   empty queue → turn bookkeeping → Planning / Failed / Complete

use crate::config::Difficulty;
use crate::sim::event::GameEvent;
use crate::sim::hazard;
use crate::sim::world::{Phase, WorldState};

/// Feed elapsed wall-clock time into the simulation.
pub fn advance_clock(world: &mut WorldState, dt_ms: u64) -> Vec<GameEvent> {
    let mut events = vec![];

    world.message_left_ms = world.message_left_ms.saturating_sub(dt_ms);
    if world.message_left_ms == 0 && !world.message.is_empty() {
        world.message.clear();
    }

    // Hazards animate on a fixed cadence in every in-level phase,
    // pause included. Collision is only evaluated below, during
    // Executing, so this is visual continuity only.
    if in_level(world.phase) {
        world.hazard_accum_ms += dt_ms;
        while world.hazard_accum_ms >= world.timing.hazard_tick_ms {
            world.hazard_accum_ms -= world.timing.hazard_tick_ms;
            hazard::hazard_tick(world);
        }
    }

    if world.paused {
        return events;
    }

    if world.phase == Phase::Planning {
        world.planning_left_ms = world.planning_left_ms.saturating_sub(dt_ms);
        if world.planning_left_ms == 0 {
            begin_execution(world);
            events.push(GameEvent::ExecutionStarted);
        }
    }

    if world.phase == Phase::Executing {
        world.exec_accum_ms += dt_ms;
        while world.exec_accum_ms >= world.timing.exec_tick_ms {
            world.exec_accum_ms -= world.timing.exec_tick_ms;
            exec_tick(world, &mut events);
            if world.phase != Phase::Executing {
                world.exec_accum_ms = 0;
                break;
            }
        }
    }

    events
}

fn in_level(phase: Phase) -> bool {
    matches!(
        phase,
        Phase::Planning | Phase::Executing | Phase::LevelFailed | Phase::LevelComplete
    )
}

/// Planning countdown hit zero: hand the plan to the executor.
/// The undo history belongs to the planning window and dies with it.
pub fn begin_execution(world: &mut WorldState) {
    world.phase = Phase::Executing;
    world.history.clear();
    world.exec_accum_ms = 0;
}

/// Resolve one queued move, or wrap up the turn when the plan is
/// spent. No-op outside the Executing phase.
pub fn exec_tick(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Executing {
        return;
    }

    if !world.player.moves.is_empty() {
        let next = world.player.peek_next_move();
        if world.is_blocked(next) {
            // The move is consumed but goes nowhere.
            world.player.moves.pop_front();
            events.push(GameEvent::MoveBlocked { pos: next });
            return;
        }

        world.player.execute_next_move();
        let pos = world.player.pos;

        let picked = world.collect_at(pos);
        if picked {
            events.push(GameEvent::ItemCollected { pos });
        }

        // Danger is checked after pickup but outranks completion.
        if hazard::cell_is_dangerous(world, pos) {
            events.push(GameEvent::PlayerKilled { pos });
            resolve_death(world, events);
            return;
        }

        if picked && world.all_items_collected() {
            events.push(GameEvent::AllItemsCollected);
            events.push(GameEvent::LevelCompleted);
            world.phase = Phase::LevelComplete;
        }
        return;
    }

    // Plan fully executed: the turn is over.
    if !world.turns_unlimited() {
        world.turns_remaining -= 1;
    }
    events.push(GameEvent::TurnEnded);

    if world.all_items_collected() {
        events.push(GameEvent::LevelCompleted);
        world.phase = Phase::LevelComplete;
    } else if !world.turns_unlimited() && world.turns_remaining <= 0 {
        events.push(GameEvent::LevelFailed);
        world.phase = Phase::LevelFailed;
    } else {
        world.reset_turn_state();
        world.enter_planning();
    }
}

/// The player stepped into a beam or a cannonball.
/// Penalty: one turn, two on Normal/Hard. Everything transient is
/// reset — position, plan, obstacles, projectiles, collectibles,
/// budget — and the level either fails or re-enters Planning.
fn resolve_death(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.turns_unlimited() {
        world.turns_remaining -= 1;
        if world.difficulty != Difficulty::Easy {
            world.turns_remaining -= 1;
        }
    }

    world.player.reset_position();
    world.reset_turn_state();
    world.restore_collectibles();

    if !world.turns_unlimited() && world.turns_remaining <= 0 {
        events.push(GameEvent::LevelFailed);
        world.phase = Phase::LevelFailed;
    } else {
        world.enter_planning();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{
        Collectible, Direction, Hazard, HazardKind, Projectile, START_CELL,
    };
    use crate::domain::tile::Terrain;
    use crate::sim::plan;

    fn executing_world(difficulty: Difficulty) -> WorldState {
        let mut world = WorldState::new();
        world.difficulty = difficulty;
        world.blocks_left = difficulty.blocks_per_turn();
        world.initial_turns = difficulty.turn_limit();
        world.turns_remaining = difficulty.turn_limit();
        // Something left to collect so turns don't auto-complete.
        world.collectibles = vec![Collectible::new((9, 9))];
        world.phase = Phase::Executing;
        world
    }

    fn tick(world: &mut WorldState) -> Vec<GameEvent> {
        let mut events = vec![];
        exec_tick(world, &mut events);
        events
    }

    #[test]
    fn countdown_expiry_starts_execution_and_drops_history() {
        let mut world = executing_world(Difficulty::Normal);
        world.phase = Phase::Planning;
        world.planning_left_ms = 100;
        plan::queue_move(&mut world, Direction::Up);
        assert_eq!(world.history.len(), 1);

        advance_clock(&mut world, 100);
        assert_eq!(world.phase, Phase::Executing);
        assert!(world.history.is_empty());
        assert_eq!(world.player.moves.len(), 1); // the plan survives
    }

    #[test]
    fn blocked_move_is_consumed_without_moving() {
        let mut world = executing_world(Difficulty::Normal);
        let (sx, sy) = START_CELL;
        world.terrain[sy - 1][sx] = Terrain::Tree;
        world.player.enqueue_move(Direction::Up);
        world.player.enqueue_move(Direction::Right);

        tick(&mut world);
        assert_eq!(world.player.pos, START_CELL);
        assert_eq!(world.player.moves.len(), 1); // one discarded, one left
        assert_eq!(world.phase, Phase::Executing);
    }

    #[test]
    fn edge_move_is_consumed_in_place() {
        let mut world = executing_world(Difficulty::Normal);
        world.player.enqueue_move(Direction::Left); // already at x = 0
        tick(&mut world);
        assert_eq!(world.player.pos, START_CELL);
        assert!(world.player.moves.is_empty());
    }

    #[test]
    fn final_pickup_completes_on_the_move_tick() {
        let mut world = executing_world(Difficulty::Normal);
        let (sx, sy) = START_CELL;
        world.collectibles = vec![Collectible::new((sx, sy - 1))];
        world.player.enqueue_move(Direction::Up);

        let turns_before = world.turns_remaining;
        let events = tick(&mut world);

        // Completion fires on the pickup tick itself, never via the
        // queue-empty end-of-turn branch: no turn was deducted.
        assert_eq!(world.phase, Phase::LevelComplete);
        assert_eq!(world.turns_remaining, turns_before);
        assert!(matches!(events[0], GameEvent::ItemCollected { .. }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelCompleted)));
    }

    #[test]
    fn danger_outranks_completion() {
        let mut world = executing_world(Difficulty::Easy);
        let (sx, sy) = START_CELL;
        let cell = (sx, sy - 1);
        world.collectibles = vec![Collectible::new(cell)];
        world.projectiles = vec![Projectile::new(cell, Direction::Right)];
        world.player.enqueue_move(Direction::Up);

        tick(&mut world);
        assert_eq!(world.phase, Phase::Planning); // died, Easy never fails
        assert!(!world.all_items_collected()); // pickup was rolled back
    }

    #[test]
    fn hard_death_costs_two_turns_and_second_death_fails() {
        let mut world = executing_world(Difficulty::Hard); // 3 turns
        let (sx, sy) = START_CELL;
        let danger = (sx, sy - 1);
        world.projectiles = vec![Projectile::new(danger, Direction::Right)];
        world.player.enqueue_move(Direction::Up);
        world.player.enqueue_move(Direction::Up);

        tick(&mut world);
        assert_eq!(world.turns_remaining, 1);
        assert_eq!(world.phase, Phase::Planning);
        assert_eq!(world.player.pos, START_CELL);
        assert!(world.player.moves.is_empty());
        assert!(world.projectiles.is_empty());
        assert_eq!(world.blocks_left, 1);

        // Second run into danger: 1 - 2 <= 0, the level fails.
        world.phase = Phase::Executing;
        world.projectiles = vec![Projectile::new(danger, Direction::Right)];
        world.player.enqueue_move(Direction::Up);
        tick(&mut world);
        assert_eq!(world.phase, Phase::LevelFailed);
    }

    #[test]
    fn death_resets_obstacles_collectibles_and_budget() {
        let mut world = executing_world(Difficulty::Normal);
        let (sx, sy) = START_CELL;
        world.collectibles = vec![Collectible::new((5, 5)), Collectible::new((6, 6))];
        world.collectibles[0].collected = true;
        world.obstacles = vec![(8, 8)];
        world.blocks_left = 0;
        world.projectiles = vec![Projectile::new((sx, sy - 1), Direction::Left)];
        world.player.enqueue_move(Direction::Up);

        tick(&mut world);
        assert!(world.obstacles.is_empty());
        assert!(world.collectibles.iter().all(|c| !c.collected));
        assert_eq!(world.blocks_left, Difficulty::Normal.blocks_per_turn());
        assert_eq!(world.turns_remaining, 3); // 5 - 2
    }

    #[test]
    fn empty_plan_ends_the_turn_back_to_planning() {
        let mut world = executing_world(Difficulty::Normal);
        world.obstacles = vec![(4, 4)];
        world.blocks_left = 0;

        tick(&mut world);
        assert_eq!(world.turns_remaining, 4);
        assert_eq!(world.phase, Phase::Planning);
        assert!(world.obstacles.is_empty());
        assert_eq!(world.blocks_left, Difficulty::Normal.blocks_per_turn());
        assert_eq!(world.planning_left_ms, world.timing.planning_ms);
    }

    #[test]
    fn turn_exhaustion_fails_the_level() {
        let mut world = executing_world(Difficulty::Normal);
        world.turns_remaining = 1;
        tick(&mut world);
        assert_eq!(world.phase, Phase::LevelFailed);
    }

    #[test]
    fn unlimited_turns_never_fail() {
        let mut world = executing_world(Difficulty::Easy);
        for _ in 0..10 {
            tick(&mut world);
            world.phase = Phase::Executing;
        }
        assert_eq!(world.turns_remaining, -1);
    }

    #[test]
    fn exec_tick_is_a_no_op_outside_executing() {
        let mut world = executing_world(Difficulty::Normal);
        world.phase = Phase::Planning;
        world.player.enqueue_move(Direction::Up);
        tick(&mut world);
        assert_eq!(world.player.pos, START_CELL);
        assert_eq!(world.player.moves.len(), 1);
    }

    #[test]
    fn clock_drives_hazard_cadence_during_planning() {
        let mut world = executing_world(Difficulty::Normal);
        world.phase = Phase::Planning;
        world.planning_left_ms = 60_000;
        world.hazards = vec![Hazard::new((10, 2), HazardKind::LaserDown)];

        let cadence = world.timing.hazard_tick_ms;
        advance_clock(&mut world, cadence * 3);
        assert_eq!(world.hazards[0].beam_progress, 3);

        // Pause freezes the countdown but not the hazards.
        world.paused = true;
        let left_before = world.planning_left_ms;
        advance_clock(&mut world, cadence);
        assert_eq!(world.hazards[0].beam_progress, 4);
        assert_eq!(world.planning_left_ms, left_before);
    }
}
