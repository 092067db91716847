use std::time::Duration;

use serde::Deserialize;
use sparrow_core::error::{Result, SparrowError};

use crate::checks::{CheckKind, CheckSettings};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub checks: ChecksConfig,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SparrowError::UnsupportedVersion);
        }
        self.agent.validate()?;
        self.checks.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_reload_interval_ms")]
    pub reload_interval_ms: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            reload_interval_ms: default_reload_interval_ms(),
        }
    }
}

impl AgentSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(SparrowError::BadConfig(
                "agent.listen must be a valid SocketAddr".into(),
            ));
        }
        if !(1000..=600000).contains(&self.reload_interval_ms) {
            return Err(SparrowError::BadConfig(
                "agent.reload_interval_ms must be between 1000 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_millis(self.reload_interval_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_reload_interval_ms() -> u64 {
    10000
}

/// One optional section per check kind; an absent section means the check
/// does not run.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecksConfig {
    #[serde(default)]
    pub health: Option<CheckConfig>,

    #[serde(default)]
    pub latency: Option<CheckConfig>,
}

impl ChecksConfig {
    pub fn get(&self, kind: CheckKind) -> Option<&CheckConfig> {
        match kind {
            CheckKind::Health => self.health.as_ref(),
            CheckKind::Latency => self.latency.as_ref(),
        }
    }

    /// Configured kinds with their runtime settings.
    pub fn enabled(&self) -> Vec<(CheckKind, CheckSettings)> {
        CheckKind::ALL
            .iter()
            .filter_map(|k| self.get(*k).map(|c| (*k, c.settings())))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.health.is_none() && self.latency.is_none() {
            return Err(SparrowError::BadConfig("checks must configure at least one check".into()));
        }
        for kind in CheckKind::ALL {
            if let Some(c) = self.get(kind) {
                c.validate(kind)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    #[serde(default)]
    pub targets: Vec<String>,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl CheckConfig {
    pub fn validate(&self, kind: CheckKind) -> Result<()> {
        if let Some(i) = self.targets.iter().position(|t| t.trim().is_empty()) {
            return Err(SparrowError::BadConfig(format!(
                "checks.{kind}.targets[{i}] must not be empty"
            )));
        }
        if !(1000..=3600000).contains(&self.interval_ms) {
            return Err(SparrowError::BadConfig(format!(
                "checks.{kind}.interval_ms must be between 1000 and 3600000"
            )));
        }
        if self.timeout_ms < 100 || self.timeout_ms >= self.interval_ms {
            return Err(SparrowError::BadConfig(format!(
                "checks.{kind}.timeout_ms must be at least 100 and less than interval_ms"
            )));
        }
        Ok(())
    }

    pub fn settings(&self) -> CheckSettings {
        CheckSettings {
            targets: self.targets.clone(),
            interval: Duration::from_millis(self.interval_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

fn default_interval_ms() -> u64 {
    20000
}
fn default_timeout_ms() -> u64 {
    5000
}
