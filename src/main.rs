/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::{Difficulty, GameConfig};
use domain::entity::Direction;
use sim::event::GameEvent;
use sim::level::{load_level, load_levels};
use sim::plan;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let mut world = WorldState::new();
    world.difficulty = config.difficulty;
    world.timing = config.timing.clone();
    world.total_levels = load_levels(&config).len();

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Ten Seconds Ahead!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, config) {
            break;
        }

        let dt = last_frame.elapsed().as_millis() as u64;
        last_frame = Instant::now();

        let events = step::advance_clock(world, dt);
        process_events(world, &events);

        // Menus still want their blink cadence.
        if matches!(world.phase, Phase::Title | Phase::Settings | Phase::GameComplete) {
            world.anim_tick = world.anim_tick.wrapping_add(1);
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_events(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::ExecutionStarted => world.set_message("Executing plan...", 1500),
            GameEvent::ItemCollected { .. } => world.set_message("Chest secured!", 1200),
            GameEvent::MoveBlocked { .. } => world.set_message("Bumped into something", 1200),
            GameEvent::PlayerKilled { .. } => world.set_message("Zapped! Back to the start", 2000),
            GameEvent::TurnEnded => world.set_message("Turn over, plan again", 1500),
            _ => {}
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_BLOCK: &[KeyCode] = &[KeyCode::Char('b'), KeyCode::Char('B')];
const KEYS_UNDO: &[KeyCode] = &[KeyCode::Char('k'), KeyCode::Char('K'), KeyCode::Backspace];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

fn queued_direction(kb: &InputState) -> Option<Direction> {
    if kb.any_pressed(KEYS_UP) {
        Some(Direction::Up)
    } else if kb.any_pressed(KEYS_DOWN) {
        Some(Direction::Down)
    } else if kb.any_pressed(KEYS_LEFT) {
        Some(Direction::Left)
    } else if kb.any_pressed(KEYS_RIGHT) {
        Some(Direction::Right)
    } else {
        None
    }
}

/// Reset to title screen, preserving config-derived state.
fn return_to_title(world: &mut WorldState) {
    let difficulty = world.difficulty;
    let timing = world.timing.clone();
    let total = world.total_levels;
    *world = WorldState::new();
    world.difficulty = difficulty;
    world.timing = timing;
    world.total_levels = total;
    world.phase = Phase::Title;
}

fn handle_meta(world: &mut WorldState, kb: &InputState, config: &GameConfig) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.was_pressed(KeyCode::Esc);

    let in_level = matches!(world.phase, Phase::Planning | Phase::Executing);

    if in_level {
        // F1: Pause / Resume
        if kb.was_pressed(KeyCode::F(1)) {
            world.paused = !world.paused;
            return false;
        }

        if world.paused {
            if kb.was_pressed(KeyCode::F(2)) {
                world.paused = false;
                load_level(world, world.current_level, config);
            } else if esc {
                world.paused = false;
                return_to_title(world);
            }
            return false; // block everything else while paused
        }

        // F2: Restart level
        if kb.was_pressed(KeyCode::F(2)) {
            load_level(world, world.current_level, config);
            return false;
        }
    }

    match world.phase {
        // ── Title Screen ──
        Phase::Title => {
            if confirm {
                load_level(world, 0, config);
            } else if kb.any_pressed(&[KeyCode::Char('s'), KeyCode::Char('S')]) {
                world.settings_cursor = Difficulty::ALL
                    .iter()
                    .position(|d| *d == world.difficulty)
                    .unwrap_or(1);
                world.phase = Phase::Settings;
            } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) || esc {
                return true;
            }
        }

        // ── Settings ──
        Phase::Settings => {
            if kb.was_pressed(KeyCode::Up) && world.settings_cursor > 0 {
                world.settings_cursor -= 1;
            } else if kb.was_pressed(KeyCode::Down)
                && world.settings_cursor + 1 < Difficulty::ALL.len()
            {
                world.settings_cursor += 1;
            }
            for (i, d) in Difficulty::ALL.iter().enumerate() {
                let digit = KeyCode::Char(char::from(b'1' + i as u8));
                if kb.was_pressed(digit) {
                    world.settings_cursor = i;
                    world.difficulty = *d;
                }
            }
            if confirm {
                world.difficulty = Difficulty::ALL[world.settings_cursor];
                world.phase = Phase::Title;
            } else if esc {
                world.phase = Phase::Title;
            }
        }

        // ── Planning ──
        Phase::Planning => {
            if let Some(dir) = queued_direction(kb) {
                plan::queue_move(world, dir);
            } else if kb.any_pressed(KEYS_BLOCK) {
                match plan::place_block(world) {
                    Some(_) => world.set_message("Blocker placed", 1200),
                    None if world.blocks_left == 0 => {
                        world.set_message("No blockers left this turn", 1500)
                    }
                    None => world.set_message("Can't block that cell", 1500),
                }
            } else if kb.any_pressed(KEYS_UNDO) {
                plan::undo(world);
            } else if esc {
                return_to_title(world);
            }
        }

        // ── Executing ──
        Phase::Executing => {
            if esc {
                return_to_title(world);
            }
        }

        // ── Level Failed ──
        Phase::LevelFailed => {
            if confirm {
                load_level(world, world.current_level, config);
            } else if esc {
                return_to_title(world);
            }
        }

        // ── Level Complete ──
        Phase::LevelComplete => {
            if confirm {
                load_level(world, world.current_level + 1, config);
            } else if esc {
                return_to_title(world);
            }
        }

        // ── Game Complete ──
        Phase::GameComplete => {
            if confirm || esc {
                return_to_title(world);
            }
        }
    }

    false
}
