/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Difficulty table ──
//
// The difficulty maps to a per-turn obstacle budget and a turn limit
// (-1 = unlimited). Read-only to the sim core.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub fn blocks_per_turn(self) -> u32 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Normal => 2,
            Difficulty::Hard => 1,
        }
    }

    /// -1 = unlimited.
    pub fn turn_limit(self) -> i32 {
        match self {
            Difficulty::Easy => -1,
            Difficulty::Normal => 5,
            Difficulty::Hard => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub const ALL: [Difficulty; 3] =
        [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub difficulty: Difficulty,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    /// Planning phase duration.
    pub planning_ms: u64,
    /// Cadence of beam growth / projectile steps.
    pub hazard_tick_ms: u64,
    /// Cadence of queued-move resolution while Executing.
    pub exec_tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            planning_ms: default_planning_ms(),
            hazard_tick_ms: default_hazard_tick_ms(),
            exec_tick_ms: default_exec_tick_ms(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    game: TomlGame,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_planning_ms")]
    planning_ms: u64,
    #[serde(default = "default_hazard_tick_ms")]
    hazard_tick_ms: u64,
    #[serde(default = "default_exec_tick_ms")]
    exec_tick_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

fn default_planning_ms() -> u64 { 10_000 }
fn default_hazard_tick_ms() -> u64 { 220 }
fn default_exec_tick_ms() -> u64 { 250 }
fn default_difficulty() -> String { "normal".into() }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            planning_ms: default_planning_ms(),
            hazard_tick_ms: default_hazard_tick_ms(),
            exec_tick_ms: default_exec_tick_ms(),
        }
    }
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            difficulty: default_difficulty(),
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let difficulty = match Difficulty::parse(&toml_cfg.game.difficulty) {
            Some(d) => d,
            None => {
                eprintln!(
                    "Warning: unknown difficulty {:?} in config.toml, using normal",
                    toml_cfg.game.difficulty
                );
                Difficulty::Normal
            }
        };

        let levels_dir_str = &toml_cfg.game.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            timing: TimingConfig {
                planning_ms: toml_cfg.timing.planning_ms,
                hazard_tick_ms: toml_cfg.timing.hazard_tick_ms,
                exec_tick_ms: toml_cfg.timing.exec_tick_ms,
            },
            difficulty,
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_table_matches_settings() {
        assert_eq!(Difficulty::Easy.blocks_per_turn(), 3);
        assert_eq!(Difficulty::Easy.turn_limit(), -1);
        assert_eq!(Difficulty::Normal.blocks_per_turn(), 2);
        assert_eq!(Difficulty::Normal.turn_limit(), 5);
        assert_eq!(Difficulty::Hard.blocks_per_turn(), 1);
        assert_eq!(Difficulty::Hard.turn_limit(), 3);
    }

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("Easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("nightmare"), None);
    }

    #[test]
    fn partial_toml_falls_back_to_field_defaults() {
        let cfg: TomlConfig = toml::from_str("[timing]\nplanning_ms = 5000\n").unwrap();
        assert_eq!(cfg.timing.planning_ms, 5000);
        assert_eq!(cfg.timing.hazard_tick_ms, 220);
        assert_eq!(cfg.timing.exec_tick_ms, 250);
        assert_eq!(cfg.game.difficulty, "normal");
    }
}
