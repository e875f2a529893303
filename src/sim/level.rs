/// Level loading and parsing.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Line 1: `# Level Name`
///   Lines: 20 map rows of 20 symbols
///
/// ## Symbol legend:
///   '.' = open ground          'T' = tree (impassable)
///   '~' = water (impassable)   'I' = collectible chest
///   'C>' / 'C<' = cannon facing right/left   (two-character token)
///   'Lv' / 'L^' = laser facing down/up       (two-character token)
///   'P' = spawn marker — parsed and ignored; the spawn is fixed at
///         the bottom-left corner regardless of where `P` appears
///
/// A hazard token consumes two input columns but the hazard occupies
/// one logical cell (the first column); both columns are stored as
/// open ground in the terrain grid. Rows of the wrong length are
/// padded with open ground or truncated — never an error.

use std::path::Path;

use crate::config::GameConfig;
use crate::domain::entity::{Collectible, Hazard, HazardKind, Player};
use crate::domain::tile::{Terrain, GRID_SIZE};
use crate::sim::world::WorldState;

/// Runtime level data (owned strings, loaded from file or embedded).
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

/// Board content produced by parsing one level's rows.
pub struct ParsedLevel {
    pub terrain: Vec<Vec<Terrain>>,
    pub collectibles: Vec<Collectible>,
    pub hazards: Vec<Hazard>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load all available levels: levels/ directory if it holds any
/// `.txt` files, otherwise the embedded set.
pub fn load_levels(config: &GameConfig) -> Vec<LevelDef> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let mut found = load_from_directory(dir);
        if !found.is_empty() {
            found.sort_by(|a, b| a.0.cmp(&b.0));
            return found.into_iter().map(|(_, def)| def).collect();
        }
    }
    embedded_levels()
}

/// Load level `level_idx` into the world. Past the last level the
/// game is complete.
pub fn load_level(world: &mut WorldState, level_idx: usize, config: &GameConfig) {
    let levels = load_levels(config);

    if level_idx >= levels.len() {
        world.phase = crate::sim::world::Phase::GameComplete;
        return;
    }

    let def = &levels[level_idx];
    let parsed = parse_rows(&def.rows);

    world.current_level = level_idx;
    world.total_levels = levels.len();
    world.level_name = def.name.clone();

    world.terrain = parsed.terrain;
    world.collectibles = parsed.collectibles;
    world.hazards = parsed.hazards;
    world.projectiles.clear();
    world.obstacles.clear();
    world.history.clear();
    world.player = Player::new();

    world.blocks_left = world.difficulty.blocks_per_turn();
    world.initial_turns = world.difficulty.turn_limit();
    world.turns_remaining = world.initial_turns;

    world.hazard_accum_ms = 0;
    world.anim_tick = 0;
    world.enter_planning();
    world.set_message(&def.name, 2500);
}

// ══════════════════════════════════════════════════════════════
// Row parsing
// ══════════════════════════════════════════════════════════════

/// Parse terrain, collectibles, and hazards from level rows.
/// Missing rows and short rows are padded with open ground; long
/// rows are truncated.
pub fn parse_rows(rows: &[String]) -> ParsedLevel {
    let mut terrain = vec![vec![Terrain::Open; GRID_SIZE]; GRID_SIZE];
    let mut collectibles = vec![];
    let mut hazards = vec![];

    for y in 0..GRID_SIZE {
        let mut chars: Vec<char> = rows
            .get(y)
            .map(|r| r.chars().collect())
            .unwrap_or_default();
        chars.resize(GRID_SIZE, '.');

        let mut x = 0;
        while x < GRID_SIZE {
            let kind = match (chars[x], chars.get(x + 1)) {
                ('C', Some('>')) => Some(HazardKind::CannonRight),
                ('C', Some('<')) => Some(HazardKind::CannonLeft),
                ('L', Some('v')) => Some(HazardKind::LaserDown),
                ('L', Some('^')) => Some(HazardKind::LaserUp),
                _ => None,
            };
            if let Some(kind) = kind {
                // One logical hazard cell; both source columns stay open.
                hazards.push(Hazard::new((x, y), kind));
                x += 2;
                continue;
            }
            match chars[x] {
                'T' => terrain[y][x] = Terrain::Tree,
                '~' => terrain[y][x] = Terrain::Water,
                'I' => collectibles.push(Collectible::new((x, y))),
                // 'P' is a layout annotation only; the spawn is fixed.
                _ => {}
            }
            x += 1;
        }
    }

    ParsedLevel { terrain, collectibles, hazards }
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
fn parse_level_file(content: &str) -> Option<LevelDef> {
    let mut name = String::new();
    let mut rows = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.to_string());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if rows.is_empty() {
        return None;
    }

    if name.is_empty() {
        name = "Unnamed Level".to_string();
    }

    Some(LevelDef { name, rows })
}

fn load_from_directory(dir: &Path) -> Vec<(String, LevelDef)> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return results,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            if let Ok(content) = std::fs::read_to_string(&path) {
                if let Some(def) = parse_level_file(&content) {
                    let filename = path
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string();
                    results.push((filename, def));
                }
            }
        }
    }

    results
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Crossfire Path", &[
            "..............T.....",
            "....................",
            "....C>......I.......",
            "....................",
            "..I....I....C<......",
            "....................",
            "....................",
            ".........Lv.........",
            "....................",
            "....TTT.............",
            "....T~T.............",
            "P...T~T......I......",
            "....T~T.............",
            "....TTT.............",
            "....................",
            "...........Lv.......",
            "....................",
            "......C>............",
            ".................TT.",
            "....T.......I.......",
        ]),
        make_embedded("Riptide Row", &[
            "....................",
            ".C>..............I..",
            "....................",
            "....~~~~~~~~~~~~....",
            "....................",
            "..I.........Lv......",
            "....................",
            "....................",
            "......TTTT..........",
            "......T..T....I.....",
            "......T..T..........",
            "......TTTT.....C<...",
            "....................",
            "..L^................",
            "....................",
            "....I..........~~...",
            "...............~~...",
            "....................",
            ".............C>.....",
            "P...................",
        ]),
        make_embedded("Crossfire Court", &[
            "......Lv............",
            "....................",
            "..I............C<...",
            "....................",
            "........TT..........",
            ".C>.....TT.....I....",
            "....................",
            "....................",
            "............Lv......",
            "....I...............",
            "....................",
            "..........~~~.......",
            "..L^......~.~.......",
            "..........~~~.......",
            "....................",
            "...............C<...",
            "......I.............",
            "....................",
            "....C>.........I....",
            "P...................",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::START_CELL;

    fn rows(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hazard_token_consumes_two_columns() {
        let mut r = vec!["....................".to_string(); GRID_SIZE];
        r[2] = "....C>......I.......".to_string();
        let parsed = parse_rows(&r);
        assert_eq!(parsed.hazards.len(), 1);
        assert_eq!(parsed.hazards[0].origin, (4, 2));
        assert_eq!(parsed.hazards[0].kind, HazardKind::CannonRight);
        assert_eq!(parsed.hazards[0].beam_progress, 0);
        // Both source columns are stored as open ground.
        assert_eq!(parsed.terrain[2][4], Terrain::Open);
        assert_eq!(parsed.terrain[2][5], Terrain::Open);
        assert_eq!(parsed.collectibles.len(), 1);
        assert_eq!(parsed.collectibles[0].pos, (12, 2));
    }

    #[test]
    fn all_four_hazard_kinds_parse() {
        let r = rows(&["C>..C<..Lv..L^......"]);
        let parsed = parse_rows(&r);
        let kinds: Vec<_> = parsed.hazards.iter().map(|h| (h.origin, h.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ((0, 0), HazardKind::CannonRight),
                ((4, 0), HazardKind::CannonLeft),
                ((8, 0), HazardKind::LaserDown),
                ((12, 0), HazardKind::LaserUp),
            ]
        );
    }

    #[test]
    fn dangling_hazard_prefix_degrades_to_open() {
        // 'C' not followed by a facing symbol is not a hazard.
        let r = rows(&["C...L..............."]);
        let parsed = parse_rows(&r);
        assert!(parsed.hazards.is_empty());
        assert_eq!(parsed.terrain[0][0], Terrain::Open);
    }

    #[test]
    fn short_long_and_missing_rows_never_error() {
        let r = rows(&[
            "TT",                          // short: padded with open
            "TTTTTTTTTTTTTTTTTTTTTTTTTT",  // long: truncated
        ]);
        let parsed = parse_rows(&r);
        assert_eq!(parsed.terrain[0][0], Terrain::Tree);
        assert_eq!(parsed.terrain[0][2], Terrain::Open);
        assert_eq!(parsed.terrain[1][GRID_SIZE - 1], Terrain::Tree);
        // Rows 2..20 were absent entirely: all open.
        assert!(parsed.terrain[5].iter().all(|t| *t == Terrain::Open));
    }

    #[test]
    fn p_marker_is_not_authoritative() {
        // 'P' in the middle of the board parses as open ground; the
        // spawn stays pinned to the bottom-left corner.
        let mut r = vec!["....................".to_string(); GRID_SIZE];
        r[4] = ".........P..........".to_string();
        let parsed = parse_rows(&r);
        assert_eq!(parsed.terrain[4][9], Terrain::Open);
        assert_eq!(Player::new().pos, START_CELL);
    }

    #[test]
    fn crossfire_path_inventory() {
        let levels = embedded_levels();
        let parsed = parse_rows(&levels[0].rows);
        assert_eq!(parsed.hazards.len(), 5);
        assert_eq!(parsed.collectibles.len(), 5);
        assert_eq!(parsed.terrain[10][5], Terrain::Water);
        assert_eq!(parsed.terrain[9][4], Terrain::Tree);
        // Spawn corner is open in every embedded level.
        for def in &levels {
            let p = parse_rows(&def.rows);
            let (sx, sy) = START_CELL;
            assert_eq!(p.terrain[sy][sx], Terrain::Open, "level {}", def.name);
        }
    }

    #[test]
    fn level_file_name_line_and_blank_trailing_rows() {
        let content = "# Test Pit\n....................\nT...................\n\n\n";
        let def = parse_level_file(content).unwrap();
        assert_eq!(def.name, "Test Pit");
        assert_eq!(def.rows.len(), 2);
    }
}
