use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub(crate) const CONFIG_ENV_VAR: &str = "ROBOT_RUMBLE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "game.json";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path} at {field_path}: {source}")]
    Parse {
        path: PathBuf,
        field_path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) window_title: String,
    pub(crate) target_tps: u32,
    pub(crate) max_render_fps: Option<u32>,
    pub(crate) tutorial_enabled: bool,
    pub(crate) gravity: f32,
    pub(crate) player: PlayerTuning,
    pub(crate) enemy: EnemyTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_title: "Robot Rumble".to_string(),
            target_tps: 60,
            max_render_fps: None,
            tutorial_enabled: true,
            gravity: 800.0,
            player: PlayerTuning::default(),
            enemy: EnemyTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerTuning {
    pub(crate) max_health: u32,
    pub(crate) move_speed: f32,
    pub(crate) jump_speed: f32,
    pub(crate) melee_range: f32,
    pub(crate) melee_damage: u32,
    pub(crate) melee_cooldown_ms: u64,
    pub(crate) shot_speed: f32,
    pub(crate) shot_damage: u32,
    pub(crate) shot_cooldown_ms: u64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100,
            move_speed: 160.0,
            jump_speed: 380.0,
            melee_range: 30.0,
            melee_damage: 25,
            melee_cooldown_ms: 400,
            shot_speed: 420.0,
            shot_damage: 10,
            shot_cooldown_ms: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EnemyTuning {
    pub(crate) max_health: u32,
    pub(crate) move_speed: f32,
    pub(crate) aggro_radius: f32,
    pub(crate) contact_damage: u32,
    pub(crate) invulnerability_ms: u64,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            max_health: 50,
            move_speed: 70.0,
            aggro_radius: 260.0,
            contact_damage: 10,
            invulnerability_ms: 1000,
        }
    }
}

/// Reads `$ROBOT_RUMBLE_CONFIG`, else `<config_dir>/game.json`. Only the
/// default location may be absent; defaults are used then.
pub(crate) fn load_game_config(config_dir: Option<&Path>) -> Result<GameConfig, ConfigError> {
    if let Some(explicit) = env::var_os(CONFIG_ENV_VAR) {
        let path = PathBuf::from(explicit);
        return read_config_file(&path);
    }
    let Some(config_dir) = config_dir else {
        info!("game_config_defaults");
        return Ok(GameConfig::default());
    };
    let path = config_dir.join(DEFAULT_CONFIG_FILE);
    if !path.is_file() {
        info!(path = %path.display(), "game_config_defaults");
        return Ok(GameConfig::default());
    }
    read_config_file(&path)
}

fn read_config_file(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_game_config(&raw).map_err(|(field_path, source)| ConfigError::Parse {
        path: path.to_path_buf(),
        field_path,
        source,
    })?;
    info!(path = %path.display(), tutorial_enabled = config.tutorial_enabled, "game_config_loaded");
    Ok(config)
}

fn parse_game_config(raw: &str) -> Result<GameConfig, (String, serde_json::Error)> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let path = if path.is_empty() { ".".to_string() } else { path };
        (path, error.into_inner())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = parse_game_config("{}").expect("parse");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = parse_game_config(
            r#"{ "tutorial_enabled": false, "player": { "max_health": 80 } }"#,
        )
        .expect("parse");
        assert!(!config.tutorial_enabled);
        assert_eq!(config.player.max_health, 80);
        assert_eq!(config.player.move_speed, PlayerTuning::default().move_speed);
        assert_eq!(config.enemy, EnemyTuning::default());
    }

    #[test]
    fn parse_error_reports_field_path() {
        let (path, _) = parse_game_config(r#"{ "enemy": { "contact_damage": "lots" } }"#)
            .expect_err("type error");
        assert_eq!(path, "enemy.contact_damage");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let (path, error) = parse_game_config(r#"{ "player": { "mana": 3 } }"#)
            .expect_err("unknown field");
        assert!(path.starts_with("player"), "path={path}");
        assert!(error.to_string().contains("mana"));
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        if env::var_os(CONFIG_ENV_VAR).is_some() {
            return;
        }
        let config = load_game_config(Some(temp.path())).expect("defaults");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn config_file_in_config_dir_is_read() {
        let temp = tempfile::tempdir().expect("tempdir");
        if env::var_os(CONFIG_ENV_VAR).is_some() {
            return;
        }
        fs::write(temp.path().join("game.json"), r#"{ "target_tps": 30 }"#).expect("write");
        let config = load_game_config(Some(temp.path())).expect("config");
        assert_eq!(config.target_tps, 30);
    }

    #[test]
    fn broken_file_surfaces_parse_error_with_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.json");
        fs::write(&path, r#"{ "gravity": true }"#).expect("write");
        match read_config_file(&path) {
            Err(ConfigError::Parse { field_path, .. }) => assert_eq!(field_path, "gravity"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
