use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;
use crate::executor::types::EndpointKind;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOCAL_CONFIG_FILE_NAME: &str = "tagflow.toml";

/// Get the default tagflow data directory: ~/.tagflow
pub fn get_tagflow_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".tagflow"))
}

/// Load configuration.
///
/// Priority: explicit path, then `~/.tagflow/config.toml`, then
/// `./tagflow.toml`, then built-in defaults. Environment overrides are
/// applied last.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut cfg = match explicit {
        Some(path) => load_from_path(path)?,
        None => {
            let home_config = get_tagflow_data_dir()
                .ok()
                .map(|d| d.join(CONFIG_FILE_NAME))
                .filter(|p| p.exists());
            let local_config = Path::new(LOCAL_CONFIG_FILE_NAME);

            if let Some(p) = home_config {
                load_from_path(&p)?
            } else if local_config.exists() {
                load_from_path(local_config)?
            } else {
                AppConfig::default()
            }
        }
    };

    apply_env_overrides(&mut cfg);
    cfg.run.normalize();
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse(&s).with_context(|| format!("parse config {}", path.display()))
}

pub fn parse(s: &str) -> anyhow::Result<AppConfig> {
    Ok(toml::from_str::<AppConfig>(s)?)
}

/// Write configuration as TOML, creating parent directories.
pub fn save_to_path(cfg: &AppConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let s = toml::to_string_pretty(cfg)?;
    std::fs::write(path, s).with_context(|| format!("write config {}", path.display()))?;
    Ok(())
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("TAGFLOW_CONCURRENCY") {
        match v.trim().parse::<usize>() {
            Ok(n) => cfg.run.concurrency = n,
            Err(_) => tracing::warn!("ignoring invalid TAGFLOW_CONCURRENCY: {}", v),
        }
    }
    if let Ok(v) = std::env::var("TAGFLOW_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            for ep in cfg
                .run
                .endpoints
                .iter_mut()
                .filter(|e| e.kind == EndpointKind::Gemini && e.api_key.trim().is_empty())
            {
                ep.api_key = key.clone();
            }
        }
    }
}
