//! Simulator configuration stored in `fsm.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::simulation::SimulationLimits;
use crate::core::speed::Speed;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "fsm.toml";

/// Simulator configuration (TOML).
///
/// Missing fields take the built-in defaults, which are also the limits
/// every simulation starts with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Playback speed setting in `-5..=9`.
    pub speed: Speed,

    pub limits: SimulationLimits,
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_active_paths == 0 {
            return Err(anyhow!("limits.max_active_paths must be > 0"));
        }
        if self.limits.step_cap == 0 {
            return Err(anyhow!("limits.step_cap must be > 0"));
        }
        if self.limits.loop_step_allowance == 0 {
            return Err(anyhow!("limits.loop_step_allowance must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SimulatorConfig::default()`.
pub fn load_config(path: &Path) -> Result<SimulatorConfig> {
    if !path.exists() {
        let cfg = SimulatorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SimulatorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SimulatorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
