/// Planning-phase commands: queue a move, place an obstacle at the
/// ghost cell, undo the latest action.
///
/// Every accepted command pushes exactly one `Action` record; undo
/// pops and reverses the newest one. All commands are silently
/// ignored outside the Planning phase — invalid input is a no-op,
/// never an error.
///
/// Obstacle placement targets the GHOST position: the pending-move
/// queue is replayed from the player's current cell and the block
/// lands where that simulated walk ends. Placing a block there is
/// read as "seal the cell my plan was about to enter", so the move
/// that led into the sealed cell is retracted along with its record.

use crate::domain::entity::{Action, Cell, Direction};
use crate::domain::rules;
use crate::sim::world::{Phase, WorldState};

/// Append a move to the plan.
pub fn queue_move(world: &mut WorldState, dir: Direction) {
    if world.phase != Phase::Planning || world.paused {
        return;
    }
    world.player.enqueue_move(dir);
    world.history.push(Action::Move(dir));
}

/// Place an obstacle at the ghost cell. Returns the cell on success;
/// `None` when the budget is spent or the target is unusable.
pub fn place_block(world: &mut WorldState) -> Option<Cell> {
    if world.phase != Phase::Planning || world.paused {
        return None;
    }
    if world.blocks_left == 0 {
        return None;
    }

    let target = rules::ghost_target(
        &world.view(),
        world.player.pos,
        world.player.moves.iter().copied(),
    );
    // The ghost walk ends ON a blocked cell when it was cut short;
    // also covers a cell that already holds an obstacle.
    if world.view().is_blocked(target) {
        return None;
    }

    world.obstacles.push(target);
    world.blocks_left -= 1;
    world.history.push(Action::BlockPlacement(target));

    // Retract the move that walked into the freshly sealed cell.
    if world.history.len() >= 2 {
        let prev_idx = world.history.len() - 2;
        if matches!(world.history[prev_idx], Action::Move(_)) {
            world.history.remove(prev_idx);
            world.player.undo_last_move();
        }
    }

    Some(target)
}

/// Reverse the most recent planning action.
pub fn undo(world: &mut WorldState) {
    if world.phase != Phase::Planning || world.paused {
        return;
    }
    let last = match world.history.pop() {
        Some(a) => a,
        None => return,
    };
    match last {
        Action::Move(_) => world.player.undo_last_move(),
        Action::BlockPlacement(pos) => {
            // Most recent occurrence at that position; positions are
            // unique anyway since placement rejects occupied cells.
            if let Some(idx) = world.obstacles.iter().rposition(|&b| b == pos) {
                world.obstacles.remove(idx);
            }
            world.blocks_left += 1;
        }
    }
}
