/// Events emitted during a simulation step.
/// The presentation layer consumes these for HUD messages.

use crate::domain::entity::Cell;

#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    ItemCollected { pos: Cell },
    AllItemsCollected,
    MoveBlocked { pos: Cell },
    PlayerKilled { pos: Cell },
    TurnEnded,
    ExecutionStarted,
    LevelFailed,
    LevelCompleted,
}
