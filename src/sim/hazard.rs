/// Hazard evolution: laser beam growth and cannon projectiles.
///
/// One hazard tick = `step_beams` + `step_projectiles`, driven on a
/// fixed wall-clock cadence regardless of phase — hazards keep
/// animating while the game sits on a pause screen. That is purely
/// visual: collision is only evaluated during the Executing phase
/// (see sim::step).
///
/// Beam cells are DERIVED from `beam_progress` on every query, never
/// stored: `compute_beams` re-walks each ray and re-stops at the first
/// obstruction, so a just-placed obstacle or a just-collected chest is
/// reflected immediately, without waiting for the next tick.

use crate::domain::entity::{Cell, Projectile};
use crate::domain::tile::GRID_SIZE;
use crate::sim::world::WorldState;

/// Advance beam growth for every laser:
/// grow one cell toward the nearest obstruction, or clamp straight
/// down to it if an obstruction appeared closer than the current
/// reach. A beam never animates a retraction.
pub fn step_beams(world: &mut WorldState) {
    let max_runs: Vec<Option<usize>> = {
        let view = world.view();
        world
            .hazards
            .iter()
            .map(|h| {
                if h.kind.is_laser() {
                    Some(view.open_run(h.origin, h.kind.facing()))
                } else {
                    None
                }
            })
            .collect()
    };

    for (hazard, max) in world.hazards.iter_mut().zip(max_runs) {
        if let Some(max) = max {
            if hazard.beam_progress < max {
                hazard.beam_progress += 1;
            } else if hazard.beam_progress > max {
                hazard.beam_progress = max;
            }
        }
    }
}

/// The currently active beam cells, derived from each laser's
/// progress and the board's obstructions at this instant.
pub fn compute_beams(world: &WorldState) -> Vec<Cell> {
    let view = world.view();
    let mut cells = vec![];

    for hazard in &world.hazards {
        if !hazard.kind.is_laser() {
            continue;
        }
        let (dx, dy) = hazard.kind.facing().delta();
        let (mut x, mut y) = (hazard.origin.0 as i32, hazard.origin.1 as i32);
        for _ in 0..hazard.beam_progress {
            x += dx;
            y += dy;
            if x < 0 || y < 0 {
                break;
            }
            let cell = (x as usize, y as usize);
            if view.obstructs_shot(cell) {
                break;
            }
            cells.push(cell);
        }
    }

    cells
}

/// Advance and spawn cannonballs. Order matters:
///   1. every existing projectile moves one cell (dying on the edge
///      of the board or at an obstruction),
///   2. only then does each cannon try to spawn into the cell beside
///      its muzzle,
///   3. dead projectiles are pruned.
/// A ball spawned this call is never also moved this call.
pub fn step_projectiles(world: &mut WorldState) {
    let mut projectiles = std::mem::take(&mut world.projectiles);

    {
        let view = world.view();

        for p in &mut projectiles {
            let (dx, dy) = p.dir.delta();
            let nx = p.pos.0 as i32 + dx;
            let ny = p.pos.1 as i32 + dy;
            if nx < 0 || ny < 0 || nx >= GRID_SIZE as i32 || ny >= GRID_SIZE as i32 {
                p.alive = false;
                continue;
            }
            let dest = (nx as usize, ny as usize);
            if view.obstructs_shot(dest) {
                p.alive = false;
            } else {
                p.pos = dest;
            }
        }

        for hazard in &world.hazards {
            if !hazard.kind.is_cannon() {
                continue;
            }
            let dir = hazard.kind.facing();
            let spawn = dir.step(hazard.origin);
            if spawn == hazard.origin {
                continue; // muzzle flush against the board edge
            }
            if !view.obstructs_shot(spawn) {
                projectiles.push(Projectile::new(spawn, dir));
            }
        }
    }

    projectiles.retain(|p| p.alive);
    world.projectiles = projectiles;
}

/// One hazard tick: beams then projectiles.
pub fn hazard_tick(world: &mut WorldState) {
    step_beams(world);
    step_projectiles(world);
    world.anim_tick = world.anim_tick.wrapping_add(1);
}

/// Is `cell` harmful right now? Beam cells and live cannonballs.
pub fn cell_is_dangerous(world: &WorldState, cell: Cell) -> bool {
    world.projectiles.iter().any(|p| p.alive && p.pos == cell)
        || compute_beams(world).contains(&cell)
}

/// Every harmful cell, for the renderer.
pub fn danger_cells(world: &WorldState) -> Vec<Cell> {
    let mut cells = compute_beams(world);
    cells.extend(world.projectiles.iter().filter(|p| p.alive).map(|p| p.pos));
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Collectible, Hazard, HazardKind};
    use crate::domain::tile::Terrain;

    fn world_with(hazards: Vec<Hazard>) -> WorldState {
        let mut world = WorldState::new();
        world.hazards = hazards;
        world
    }

    #[test]
    fn beam_grows_one_cell_per_tick_and_clamps_at_obstruction() {
        let mut world = world_with(vec![Hazard::new((10, 7), HazardKind::LaserDown)]);
        world.terrain[13][10] = Terrain::Tree; // 5 open cells below the laser

        for _ in 0..5 {
            step_beams(&mut world);
        }
        assert_eq!(
            compute_beams(&world),
            vec![(10, 8), (10, 9), (10, 10), (10, 11), (10, 12)]
        );

        // Sixth tick: clamped, no further growth.
        step_beams(&mut world);
        assert_eq!(world.hazards[0].beam_progress, 5);
        assert_eq!(compute_beams(&world).len(), 5);
    }

    #[test]
    fn beam_growth_is_monotonic_up_to_the_open_run() {
        let mut world = world_with(vec![Hazard::new((3, 10), HazardKind::LaserUp)]);
        let mut last = 0;
        for _ in 0..20 {
            step_beams(&mut world);
            let progress = world.hazards[0].beam_progress;
            assert!(progress >= last);
            assert!(progress <= world.view().open_run((3, 10), crate::domain::entity::Direction::Up));
            last = progress;
        }
        // Ray runs to the top edge: rows 9..=0.
        assert_eq!(last, 10);
    }

    #[test]
    fn beam_retracts_instantly_when_obstruction_appears_closer() {
        let mut world = world_with(vec![Hazard::new((10, 7), HazardKind::LaserDown)]);
        for _ in 0..5 {
            step_beams(&mut world);
        }
        assert_eq!(world.hazards[0].beam_progress, 5);

        // An obstacle lands right under the muzzle. The derived beam
        // shortens with no tick at all...
        world.obstacles.push((10, 9));
        assert_eq!(compute_beams(&world), vec![(10, 8)]);
        // ...and the next tick clamps the stored progress down.
        step_beams(&mut world);
        assert_eq!(world.hazards[0].beam_progress, 1);
    }

    #[test]
    fn compute_beams_is_idempotent() {
        let mut world = world_with(vec![
            Hazard::new((10, 7), HazardKind::LaserDown),
            Hazard::new((2, 15), HazardKind::LaserUp),
        ]);
        for _ in 0..3 {
            step_beams(&mut world);
        }
        assert_eq!(compute_beams(&world), compute_beams(&world));
    }

    #[test]
    fn uncollected_chest_stops_a_beam_until_picked_up() {
        let mut world = world_with(vec![Hazard::new((5, 0), HazardKind::LaserDown)]);
        world.collectibles = vec![Collectible::new((5, 3))];

        for _ in 0..6 {
            step_beams(&mut world);
        }
        assert_eq!(compute_beams(&world), vec![(5, 1), (5, 2)]);

        world.collect_at((5, 3));
        for _ in 0..2 {
            step_beams(&mut world);
        }
        assert_eq!(world.hazards[0].beam_progress, 4);
        assert!(compute_beams(&world).contains(&(5, 3)));
    }

    #[test]
    fn cannon_spawns_after_moving_existing_balls() {
        let mut world = world_with(vec![Hazard::new((2, 2), HazardKind::CannonRight)]);

        step_projectiles(&mut world);
        assert_eq!(world.projectiles.len(), 1);
        // A ball spawned this call has not also been displaced this call.
        assert_eq!(world.projectiles[0].pos, (3, 2));

        step_projectiles(&mut world);
        let mut positions: Vec<_> = world.projectiles.iter().map(|p| p.pos).collect();
        positions.sort();
        assert_eq!(positions, vec![(3, 2), (4, 2)]);
    }

    #[test]
    fn projectile_dies_at_obstruction_and_board_edge() {
        let mut world = world_with(vec![Hazard::new((17, 4), HazardKind::CannonRight)]);
        // Spawn at (18,4); the next advance would leave the board.
        step_projectiles(&mut world);
        step_projectiles(&mut world);
        let mut positions: Vec<_> = world.projectiles.iter().map(|p| p.pos).collect();
        positions.sort();
        assert_eq!(positions, vec![(18, 4), (19, 4)]);
        step_projectiles(&mut world);
        // The ball at (19,4) fell off the edge; the one behind it moved up.
        let mut positions: Vec<_> = world.projectiles.iter().map(|p| p.pos).collect();
        positions.sort();
        assert_eq!(positions, vec![(18, 4), (19, 4)]);

        // An obstacle in front of a muzzle suppresses the spawn too.
        let mut world = world_with(vec![Hazard::new((8, 8), HazardKind::CannonLeft)]);
        world.obstacles.push((7, 8));
        step_projectiles(&mut world);
        assert!(world.projectiles.is_empty());
    }

    #[test]
    fn danger_covers_beams_and_balls() {
        let mut world = world_with(vec![
            Hazard::new((0, 0), HazardKind::LaserDown),
            Hazard::new((10, 10), HazardKind::CannonRight),
        ]);
        hazard_tick(&mut world);
        assert!(cell_is_dangerous(&world, (0, 1)));
        assert!(cell_is_dangerous(&world, (11, 10)));
        assert!(!cell_is_dangerous(&world, (5, 5)));
        let cells = danger_cells(&world);
        assert!(cells.contains(&(0, 1)) && cells.contains(&(11, 10)));
    }
}
