use anyhow::Context;
use lixi_core::GameConfig;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub const GAME_CONFIG_FILE: &str = "game.json";

/// Reads `game.json` from `dir`. A missing file yields the built-in defaults;
/// a present file is parsed, merged over defaults and validated.
pub fn load_game_config(dir: &Path) -> anyhow::Result<GameConfig> {
    let path = dir.join(GAME_CONFIG_FILE);
    let config: GameConfig = if path.exists() {
        load_json(&path)?
    } else {
        tracing::info!("no {} in {}, using defaults", GAME_CONFIG_FILE, dir.display());
        GameConfig::default()
    };
    config
        .validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(config)
}

pub fn default_assets_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("LIXI_ASSETS") {
        return PathBuf::from(path);
    }
    PathBuf::from("assets")
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
