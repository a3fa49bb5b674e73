use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Subjects config (`subjects.yaml`): who to report on and where the
/// adapter-materialized event JSON lives. No credentials belong here; the
/// adapters that fetch events are a separate concern.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Tracker root used for item links in the tracker report.
    #[serde(default = "default_tracker_base_url")]
    pub tracker_base_url: String,
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Deserialize)]
pub struct Subject {
    pub name: String,
    /// Forge login, matched against pull-request authors for the
    /// first-person reframing. Defaults to `name`.
    #[serde(default)]
    pub forge_login: Option<String>,
    /// Path of the subject's forge event JSON (array of raw events).
    #[serde(default)]
    pub forge_events: Option<PathBuf>,
    /// Path of the subject's tracker field-change JSON.
    #[serde(default)]
    pub tracker_events: Option<PathBuf>,
}

impl Subject {
    pub fn forge_login(&self) -> &str {
        self.forge_login.as_deref().unwrap_or(&self.name)
    }
}

fn default_tracker_base_url() -> String {
    "https://bugzilla.mozilla.org".to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
        if config.subjects.is_empty() {
            anyhow::bail!("config {} lists no subjects", path.display());
        }
        Ok(config)
    }
}
