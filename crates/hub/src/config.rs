//! Hub configuration: connection settings from the environment and the
//! analysis/node settings from a TOML file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Where the hub connects and listens.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub db_url: String,
    pub web_port: u16,
    pub config_path: String,
}

/// Read `key` from the environment, falling back to `default` when unset.
/// A value that is set but does not parse is an error.
pub fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        _ => Ok(default),
    }
}

impl ConnectionSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            mqtt_host: env_or("MQTT_HOST", "127.0.0.1".to_string())?,
            mqtt_port: env_or("MQTT_PORT", 1883)?,
            db_url: env_or("DB_URL", "sqlite:greenhouse.db?mode=rwc".to_string())?,
            web_port: env_or("WEB_PORT", 8080)?,
            config_path: env_or("CONFIG_PATH", "config.toml".to_string())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Moving-average window used when a request does not name one.
    pub smoothing_window: usize,
    /// Fewest readings a node must have before its trend is analysed.
    pub min_points: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smoothing_window: greenhouse_core::analysis::DEFAULT_WINDOW,
            // A span shorter than the window cannot be smoothed.
            min_points: greenhouse_core::analysis::DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeEntry {
    pub node_id: String,
    pub name: String,
}

/// Characters with special meaning in MQTT topics.
const TOPIC_RESERVED: &[char] = &['/', '+', '#'];

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        self.validate_analysis(&mut errors);
        self.validate_nodes(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_analysis(&self, errors: &mut Vec<String>) {
        let a = &self.analysis;
        if a.smoothing_window < 1 {
            errors.push("analysis: smoothing_window must be at least 1".to_string());
        }
        if a.min_points < 2 {
            errors.push(format!(
                "analysis: min_points must be at least 2 to fit a trend, got {}",
                a.min_points
            ));
        }
        if a.smoothing_window > a.min_points {
            errors.push(format!(
                "analysis: smoothing_window ({}) exceeds min_points ({})",
                a.smoothing_window, a.min_points
            ));
        }
    }

    fn validate_nodes(&self, errors: &mut Vec<String>) {
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for (i, n) in self.nodes.iter().enumerate() {
            let ctx = || {
                if n.node_id.is_empty() {
                    format!("nodes[{i}]")
                } else {
                    format!("node '{}'", n.node_id)
                }
            };

            if n.node_id.trim().is_empty() {
                errors.push(format!("{}: node_id is empty", ctx()));
            } else if !seen_ids.insert(&n.node_id) {
                errors.push(format!("{}: duplicate node_id", ctx()));
            }

            if n.node_id.contains(TOPIC_RESERVED) {
                errors.push(format!(
                    "{}: node_id must not contain MQTT topic characters '/', '+' or '#'",
                    ctx()
                ));
            }

            if n.name.trim().is_empty() {
                errors.push(format!("{}: name is empty", ctx()));
            }
        }
    }

    /// Display name for a node, if one is configured.
    pub fn node_name(&self, node_id: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.node_id == node_id)
            .map(|n| n.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.  A missing file yields the
/// defaults.
pub fn load(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        tracing::warn!(path, "config file not found, using defaults");
        return Ok(Config::default());
    }

    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;

    tracing::info!(
        smoothing_window = config.analysis.smoothing_window,
        min_points = config.analysis.min_points,
        nodes = config.nodes.len(),
        "config loaded"
    );

    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
