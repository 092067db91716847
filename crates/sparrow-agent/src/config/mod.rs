//! Agent config loader (strict parsing) and file reload watcher.

pub mod reload;
pub mod schema;

use std::fs;

use sparrow_core::error::{Result, SparrowError};

pub use schema::{AgentConfig, AgentSection, CheckConfig, ChecksConfig};

pub fn load_from_file(path: &str) -> Result<AgentConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SparrowError::Io(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AgentConfig> {
    let cfg: AgentConfig = serde_yaml::from_str(s)
        .map_err(|e| SparrowError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
