use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

use invtrack_core::TrackerConfig;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerSection,
    #[serde(default)]
    pub replay: ReplayConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TrackerSection {
    /// Track a single guild only.
    pub guild_id: Option<i64>,
    /// Track only guilds advertising all of these features.
    #[serde(default)]
    pub required_features: Vec<String>,
    /// Publish a delete outcome even when the code was never cached.
    #[serde(default = "default_true")]
    pub emit_unknown_deletes: bool,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            guild_id: None,
            required_features: Vec::new(),
            emit_unknown_deletes: true,
            event_capacity: default_event_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReplayConfig {
    #[serde(default = "default_fixture_path")]
    pub fixture: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            fixture: default_fixture_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    1024
}

fn default_fixture_path() -> String {
    "fixtures/session.json".into()
}

fn generate_config_template(config: &Config) -> String {
    format!(
        r#"# invtrack configuration
# Generated automatically on first run. Edit as needed.

[tracker]
# Restrict tracking to one guild:
# guild_id = 123456789012345678
# Only track guilds that have every listed feature:
required_features = []
# Publish invite_delete with an empty payload for codes that were never cached.
emit_unknown_deletes = {emit_unknown_deletes}
event_capacity = {event_capacity}

[replay]
fixture = "{fixture}"
"#,
        emit_unknown_deletes = config.tracker.emit_unknown_deletes,
        event_capacity = config.tracker.event_capacity,
        fixture = config.replay.fixture,
    )
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if std::path::Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::info!(
                "Config file not found at '{}', generating defaults...",
                path
            );
            let config = Config::default();

            if let Some(parent) = std::path::Path::new(path).parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(path, generate_config_template(&config))?;
            tracing::info!("Generated default config at '{}'", path);
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("INVTRACK_GUILD_ID") {
            match value.trim().parse::<i64>() {
                Ok(parsed) => self.tracker.guild_id = Some(parsed),
                Err(_) => tracing::warn!(
                    "Ignoring invalid INVTRACK_GUILD_ID value '{}'; expected a numeric guild id",
                    value
                ),
            }
        }
        if let Ok(value) = std::env::var("INVTRACK_REQUIRED_FEATURES") {
            self.tracker.required_features = value
                .split(',')
                .map(|feature| feature.trim().to_ascii_uppercase())
                .filter(|feature| !feature.is_empty())
                .collect();
        }
        if let Ok(value) = std::env::var("INVTRACK_EMIT_UNKNOWN_DELETES") {
            match value.trim().parse::<bool>() {
                Ok(parsed) => self.tracker.emit_unknown_deletes = parsed,
                Err(_) => tracing::warn!(
                    "Ignoring invalid INVTRACK_EMIT_UNKNOWN_DELETES value '{}'; expected a boolean",
                    value
                ),
            }
        }
        if let Ok(value) = std::env::var("INVTRACK_FIXTURE") {
            self.replay.fixture = value;
        }
    }

    /// Build the tracker configuration. `required_features` turns into a
    /// guild filter that admits guilds holding every listed feature.
    pub fn tracker_config(&self) -> TrackerConfig {
        let mut tracker = TrackerConfig {
            guild_id: self.tracker.guild_id,
            emit_unknown_deletes: self.tracker.emit_unknown_deletes,
            event_capacity: self.tracker.event_capacity,
            ..TrackerConfig::default()
        };
        if !self.tracker.required_features.is_empty() {
            let required = self.tracker.required_features.clone();
            tracker = tracker.with_filter(move |guild| {
                required.iter().all(|feature| guild.has_feature(feature))
            });
        }
        tracker
    }
}
