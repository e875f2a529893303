/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::Difficulty;
use crate::domain::entity::{Cell as GridCell, HazardKind};
use crate::domain::rules;
use crate::domain::tile::{Terrain, GRID_SIZE};
use crate::sim::hazard;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap pixels match the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 20, b: 28 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer: differs from any
    /// real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
    }
}

// ── Renderer ──

/// Each board cell occupies 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const RED: Color = Color::Rgb { r: 255, g: 70, b: 60 };
const CYAN: Color = Color::Rgb { r: 90, g: 210, b: 255 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 24, b: 56 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → full clear for a clean transition
        let phase_changed = self.last_phase != Some(world.phase);
        if phase_changed {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Settings => self.compose_settings(world),
            Phase::GameComplete => self.compose_game_complete(world),
            Phase::Planning
            | Phase::Executing
            | Phase::LevelFailed
            | Phase::LevelComplete => self.compose_game(world),
        }

        if world.paused {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                let mut buf = [0u8; 4];
                queue!(self.writer, Print(cell.ch.encode_utf8(&mut buf) as &str))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Game view ──

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_hud(w);

        let beams = hazard::compute_beams(w);
        let ghost = if w.phase == Phase::Planning {
            rules::ghost_path(&w.view(), w.player.pos, w.player.moves.iter().copied())
        } else {
            vec![]
        };

        for gy in 0..GRID_SIZE {
            let row = MAP_ROW + gy;
            if row >= self.front.height {
                break;
            }
            for gx in 0..GRID_SIZE {
                let col = gx * CELL_W;
                if col + 1 >= self.front.width {
                    break;
                }
                self.compose_board_cell(w, (gx, gy), &beams, &ghost, col, row);
            }
        }

        self.compose_side_panel(w);
        self.compose_message_bar(w);
        self.compose_help_bar(w);

        match w.phase {
            Phase::LevelFailed => self.compose_failed_overlay(),
            Phase::LevelComplete => self.compose_complete_overlay(w),
            _ => {}
        }
    }

    /// One board cell, highest-priority occupant wins.
    fn compose_board_cell(
        &mut self,
        w: &WorldState,
        cell: GridCell,
        beams: &[GridCell],
        ghost: &[GridCell],
        col: usize,
        row: usize,
    ) {
        let in_beam = beams.contains(&cell);
        let beam_bg = if in_beam {
            Color::Rgb { r: 70, g: 10, b: 10 }
        } else {
            Cell::BASE_BG
        };

        // Player
        if w.player.pos == cell {
            self.put_pair(col, row, ('@', ' '), CYAN, beam_bg);
            return;
        }

        // Cannonballs
        if w.projectiles.iter().any(|p| p.alive && p.pos == cell) {
            self.put_pair(col, row, ('●', ' '), Color::Rgb { r: 255, g: 150, b: 40 }, beam_bg);
            return;
        }

        // Hazard emitters
        if let Some(h) = w.hazards.iter().find(|h| h.origin == cell) {
            let glyph = match h.kind {
                HazardKind::CannonRight => ('C', '▸'),
                HazardKind::CannonLeft => ('◂', 'C'),
                HazardKind::LaserDown => ('L', '▾'),
                HazardKind::LaserUp => ('L', '▴'),
            };
            let flash = h.kind.is_cannon() && w.anim_tick % 2 == 0;
            let fg = if flash { Color::Rgb { r: 255, g: 120, b: 100 } } else { RED };
            self.put_pair(col, row, glyph, fg, Color::Rgb { r: 50, g: 14, b: 14 });
            return;
        }

        // Chests
        if w.collectibles.iter().any(|c| !c.collected && c.pos == cell) {
            self.put_pair(col, row, ('◆', ' '), GOLD, beam_bg);
            return;
        }

        // Player-placed blockers
        if w.obstacles.contains(&cell) {
            self.put_pair(col, row, ('▓', '▓'), Color::Rgb { r: 170, g: 170, b: 180 }, Cell::BASE_BG);
            return;
        }

        // Laser beam over open ground
        if in_beam {
            let hot = w.anim_tick % 2 == 0;
            let fg = if hot { RED } else { Color::Rgb { r: 170, g: 40, b: 30 } };
            self.put_pair(col, row, ('║', ' '), fg, beam_bg);
            return;
        }

        // Ghost preview of the pending plan (endpoint emphasized)
        if let Some(idx) = ghost.iter().position(|g| *g == cell) {
            let last = idx + 1 == ghost.len();
            let glyph = if last { ('◎', ' ') } else { ('○', ' ') };
            self.put_pair(col, row, glyph, Color::Rgb { r: 60, g: 140, b: 170 }, Cell::BASE_BG);
            return;
        }

        // Terrain
        let (glyph, fg, bg) = match w.terrain[cell.1][cell.0] {
            Terrain::Open => (('·', ' '), Color::Rgb { r: 55, g: 60, b: 72 }, Cell::BASE_BG),
            Terrain::Tree => (
                ('▲', '▲'),
                Color::Rgb { r: 60, g: 160, b: 70 },
                Color::Rgb { r: 16, g: 44, b: 20 },
            ),
            Terrain::Water => (
                ('~', '~'),
                Color::Rgb { r: 80, g: 140, b: 230 },
                Color::Rgb { r: 14, g: 30, b: 70 },
            ),
        };
        self.put_pair(col, row, glyph, fg, bg);
    }

    fn put_pair(&mut self, col: usize, row: usize, glyph: (char, char), fg: Color, bg: Color) {
        self.front.set(col, row, Cell::new(glyph.0, fg, bg));
        self.front.set(col + 1, row, Cell::new(glyph.1, fg, bg));
    }

    fn compose_hud(&mut self, w: &WorldState) {
        self.front.fill_row(HUD_ROW, Color::White, HUD_BG);

        let phase_str = match w.phase {
            Phase::Planning => {
                let secs = (w.planning_left_ms + 999) / 1000;
                format!("PLAN {:>2}s", secs)
            }
            Phase::Executing => "RUN     ".to_string(),
            _ => "        ".to_string(),
        };
        let turns = if w.turns_unlimited() {
            "∞".to_string()
        } else {
            format!("{}", w.turns_remaining.max(0))
        };
        let hud = format!(
            " {}/{} {}  {}  Turns:{}  Blocks:{}  [{}] ",
            w.current_level + 1,
            w.total_levels,
            w.level_name,
            phase_str,
            turns,
            w.blocks_left,
            w.difficulty.name(),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_side_panel(&mut self, w: &WorldState) {
        let x = GRID_SIZE * CELL_W + 3;
        if x + 20 >= self.front.width {
            return;
        }
        let dim = Color::DarkGrey;

        let left = w.collectibles.iter().filter(|c| !c.collected).count();
        self.front.put_str(x, MAP_ROW, &format!("◆ Chests left: {}", left), GOLD, Color::Reset);
        self.front.put_str(
            x,
            MAP_ROW + 2,
            &format!("Queued moves: {}", w.player.moves.len()),
            Color::White,
            Color::Reset,
        );

        let legend_top = MAP_ROW + 5;
        self.front.put_str(x, legend_top, "Legend", GOLD, Color::Reset);
        self.front.put_str(x, legend_top + 1, "@  you      ◆ chest", dim, Color::Reset);
        self.front.put_str(x, legend_top + 2, "▓  blocker  ● cannonball", dim, Color::Reset);
        self.front.put_str(x, legend_top + 3, "║  laser    ○ planned path", dim, Color::Reset);
        self.front.put_str(x, legend_top + 4, "▲  tree     ~ water", dim, Color::Reset);
    }

    fn compose_message_bar(&mut self, w: &WorldState) {
        let row = MAP_ROW + GRID_SIZE + 1;
        if row < self.front.height && !w.message.is_empty() {
            self.front.fill_row(row, Color::Black, GOLD);
            self.front.put_str(0, row, &format!(" ◈ {} ", w.message), Color::Black, GOLD);
        }
    }

    fn compose_help_bar(&mut self, w: &WorldState) {
        let row = MAP_ROW + GRID_SIZE + 3;
        if row >= self.front.height {
            return;
        }
        let help = match w.phase {
            Phase::Planning => " WASD/arrows: queue move  B: place block  K: undo  F1: pause  F2: restart",
            Phase::Executing => " Plan running...  F1: pause  F2: restart",
            _ => "",
        };
        self.front.put_str(0, row, help, Color::DarkGrey, Color::Reset);
    }

    // ── Overlays ──

    fn overlay_box(&mut self, lines: &[&str], fg: Color, bg: Color) {
        let box_w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let cx = (GRID_SIZE * CELL_W).saturating_sub(box_w) / 2;
        let cy = MAP_ROW + GRID_SIZE / 2 - lines.len() / 2;
        for (i, line) in lines.iter().enumerate() {
            if cy + i >= self.front.height {
                break;
            }
            self.front.put_str(cx, cy + i, line, fg, bg);
        }
    }

    fn compose_failed_overlay(&mut self) {
        let lines = [
            "╔══════════════════════════╗",
            "║    ✕ OUT OF TURNS ✕      ║",
            "║  ENTER: Retry  ESC: Menu ║",
            "╚══════════════════════════╝",
        ];
        self.overlay_box(&lines, RED, Color::Rgb { r: 50, g: 12, b: 12 });
    }

    fn compose_complete_overlay(&mut self, w: &WorldState) {
        let last = w.current_level + 1 >= w.total_levels;
        let prompt = if last {
            "║  ENTER: Finish           ║"
        } else {
            "║  ENTER: Next level       ║"
        };
        let lines = [
            "╔══════════════════════════╗",
            "║   ★ LEVEL CLEARED ★      ║",
            prompt,
            "╚══════════════════════════╝",
        ];
        self.overlay_box(&lines, GOLD, Color::Rgb { r: 16, g: 50, b: 16 });
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let blink = (w.anim_tick / 4) % 2 == 0;
        let label = if blink {
            "║  ▶  PAUSED  ◀  ║"
        } else {
            "║     PAUSED     ║"
        };
        let lines = [
            "╔════════════════╗",
            label,
            "║ F1 Resume      ║",
            "║ F2 Restart     ║",
            "║ ESC Title      ║",
            "╚════════════════╝",
        ];
        self.overlay_box(&lines, GOLD, Color::Rgb { r: 36, g: 36, b: 40 });
    }

    // ── Static screens ──

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            "╔═══════════════════════════════════╗",
            "║   T E N   S E C O N D S           ║",
            "║             A H E A D             ║",
            "╚═══════════════════════════════════╝",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "◈◈  Plan ten seconds. Survive the replay.  ◈◈";
        self.front.put_str(4, 8, subtitle, GREEN, Color::Reset);

        let menu_base = 11;
        self.front.put_str(8, menu_base, "ENTER   Start", GREEN, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  S     Settings", Color::White, Color::Reset);
        self.front.put_str(8, menu_base + 2, "  Q     Quit", Color::White, Color::Reset);

        let info = format!(
            "      Difficulty: {}   ({} levels)",
            w.difficulty.name(),
            w.total_levels
        );
        self.front.put_str(8, menu_base + 4, &info, Color::DarkGrey, Color::Reset);

        let help = [
            "How it plays",
            "  Queue moves during a 10 second planning window,",
            "  then watch the plan execute against the hazards.",
            "  B drops a blocker at the end of your planned path.",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, menu_base + 6 + i, line, color, Color::Reset);
        }
    }

    fn compose_settings(&mut self, w: &WorldState) {
        self.front.put_str(4, 2, "╔═══════════════════════╗", GOLD, Color::Reset);
        self.front.put_str(4, 3, "║      SETTINGS         ║", GOLD, Color::Reset);
        self.front.put_str(4, 4, "╚═══════════════════════╝", GOLD, Color::Reset);

        for (i, d) in Difficulty::ALL.iter().enumerate() {
            let row = 6 + i * 2;
            let selected = i == w.settings_cursor;
            let turns = if d.turn_limit() < 0 {
                "unlimited turns".to_string()
            } else {
                format!("{} turns", d.turn_limit())
            };
            let line = format!(
                "{} {}. {:<7} {} blocks/turn, {}",
                if selected { "▸" } else { " " },
                i + 1,
                d.name(),
                d.blocks_per_turn(),
                turns,
            );
            let fg = if selected { GREEN } else { Color::White };
            let bg = if selected {
                Color::Rgb { r: 24, g: 48, b: 24 }
            } else {
                Cell::BASE_BG
            };
            self.front.put_str(6, row, &line, fg, bg);
        }

        self.front.put_str(
            6,
            13,
            "1/2/3 or ↑↓: choose   ENTER/ESC: back",
            Color::DarkGrey,
            Color::Reset,
        );
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        let box_art = [
            "╔══════════════════════════════════════╗",
            "║   ★ ALL LEVELS CLEARED — WELL RUN ★  ║",
            "╚══════════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, GOLD, Color::Reset);
        }
        let line = format!("◈ {} levels survived on {}", w.total_levels, w.difficulty.name());
        self.front.put_str(6, 9, &line, Color::White, Color::Reset);
        self.front.put_str(6, 11, "▸ ENTER / ESC: Back to Title", GREEN, Color::Reset);
    }
}
