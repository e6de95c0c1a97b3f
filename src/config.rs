use crate::model::PersistedState;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "kurenai";
const STATE_FILE: &str = "state.json";
const LOG_DIR: &str = "logs";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("KURENAI_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let base = dirs::config_dir().context("no config directory for this platform")?;
    Ok(base.join(APP_DIR))
}

pub fn state_path() -> Result<PathBuf> {
    Ok(config_root()?.join(STATE_FILE))
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(config_root()?.join(LOG_DIR))
}

pub fn load_state_from(path: &Path) -> Result<PersistedState> {
    if !path.exists() {
        return Ok(PersistedState::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let mut state: PersistedState = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse state file {}", path.display()))?;
    state.saved_volume = sanitize_volume(state.saved_volume);
    Ok(state)
}

pub fn save_state_to(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn sanitize_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        1.0
    }
}
