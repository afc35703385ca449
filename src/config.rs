/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub spawner: SpawnerConfig,
    pub garden: GardenConfig,
    pub score: ScoreConfig,
    pub characters: HashMap<String, CharacterAnimConfig>,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    pub tick_rate_ms: u64,
    pub log_file: Option<PathBuf>,
    pub seed: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingKind {
    Constant,
    Curve,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpawnerConfig {
    #[serde(default = "default_spawn_interval")]
    pub interval_ms: f64,
    #[serde(default = "default_character_duration")]
    pub character_duration_ms: f64,
    #[serde(default = "default_pacing")]
    pub pacing: PacingKind,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GardenConfig {
    #[serde(default = "default_garden_side")]
    pub rows: usize,
    #[serde(default = "default_garden_side")]
    pub cols: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_hit_reward")]
    pub hit_reward: f32,
    #[serde(default = "default_miss_penalty")]
    pub miss_penalty: f32,
    #[serde(default = "default_bonus_streak")]
    pub bonus_streak: u32,
    #[serde(default = "default_round_ms")]
    pub round_ms: f64,
    #[serde(default = "default_time_bonus")]
    pub time_bonus_ms: f64,
}

/// Clip durations for one character, in milliseconds.
#[derive(Clone, Debug, Deserialize)]
pub struct CharacterAnimConfig {
    #[serde(default = "default_raise_ms")]
    pub raise_ms: f64,
    #[serde(default = "default_alive_ms")]
    pub alive_ms: f64,
    #[serde(default = "default_miss_ms")]
    pub miss_ms: f64,
    #[serde(default = "default_hit_ms")]
    pub hit_ms: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GamepadConfig {
    #[serde(default = "default_whack")]
    pub whack: Vec<String>,
    #[serde(default = "default_confirm")]
    pub confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    spawner: SpawnerConfig,
    #[serde(default)]
    garden: GardenConfig,
    #[serde(default)]
    score: ScoreConfig,
    #[serde(default)]
    characters: HashMap<String, CharacterAnimConfig>,
    #[serde(default)]
    gamepad: GamepadConfig,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default)]
    log_file: Option<String>,
    #[serde(default = "default_seed")]
    seed: u64,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_seed() -> u64 { 0x5EED_F00D }
fn default_spawn_interval() -> f64 { 2000.0 }
fn default_character_duration() -> f64 { 2000.0 }
fn default_pacing() -> PacingKind { PacingKind::Constant }
fn default_garden_side() -> usize { 3 }
fn default_hit_reward() -> f32 { 0.1 }
fn default_miss_penalty() -> f32 { 0.2 }
fn default_bonus_streak() -> u32 { 5 }
fn default_round_ms() -> f64 { 60_000.0 }
fn default_time_bonus() -> f64 { 5_000.0 }
fn default_raise_ms() -> f64 { 250.0 }
fn default_alive_ms() -> f64 { 600.0 }  // loop period
fn default_miss_ms() -> f64 { 400.0 }
fn default_hit_ms() -> f64 { 350.0 }

fn default_whack() -> Vec<String> { vec!["A".into(), "B".into(), "X".into(), "Y".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

/// Keyboard taps map holes to keys 1-9, so the garden is at most 3 x 3.
const MAX_GARDEN_SIDE: usize = 3;

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
            log_file: None,
            seed: default_seed(),
        }
    }
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        SpawnerConfig {
            interval_ms: default_spawn_interval(),
            character_duration_ms: default_character_duration(),
            pacing: default_pacing(),
        }
    }
}

impl Default for GardenConfig {
    fn default() -> Self {
        GardenConfig { rows: default_garden_side(), cols: default_garden_side() }
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        ScoreConfig {
            hit_reward: default_hit_reward(),
            miss_penalty: default_miss_penalty(),
            bonus_streak: default_bonus_streak(),
            round_ms: default_round_ms(),
            time_bonus_ms: default_time_bonus(),
        }
    }
}

impl Default for CharacterAnimConfig {
    fn default() -> Self {
        CharacterAnimConfig {
            raise_ms: default_raise_ms(),
            alive_ms: default_alive_ms(),
            miss_ms: default_miss_ms(),
            hit_ms: default_hit_ms(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            whack: default_whack(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) ~/.local/share/molegarden.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config document directly (no file search).
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Relative log paths land next to the first candidate directory
        let log_file = cfg.general.log_file.map(|name| {
            let path = PathBuf::from(&name);
            match search_dirs.first() {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            }
        });

        let mut garden = cfg.garden;
        garden.rows = garden.rows.clamp(1, MAX_GARDEN_SIDE);
        garden.cols = garden.cols.clamp(1, MAX_GARDEN_SIDE);

        let mut spawner = cfg.spawner;
        if spawner.interval_ms <= 0.0 {
            spawner.interval_ms = default_spawn_interval();
        }

        GameConfig {
            general: GeneralConfig {
                tick_rate_ms: cfg.general.tick_rate_ms.max(1),
                log_file,
                seed: cfg.general.seed,
            },
            spawner,
            garden,
            score: cfg.score,
            characters: cfg.characters,
            gamepad: cfg.gamepad,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data home (deduplicated).
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

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/molegarden");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
///
/// Runs before the logger exists, so problems go to stderr.
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
