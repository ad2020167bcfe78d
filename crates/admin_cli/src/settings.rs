//! Settings for the admin CLI, read from `settings.toml` and overridden by
//! `REMESAS_*` environment variables (e.g. `REMESAS_DATABASE__URL`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    /// Log level for the `remesas_admin` and `engine` targets.
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite:./remesas.db?mode=rwc".to_string(),
        }
    }
}

/// User the CLI acts as. The role is always read back from the users table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActorSettings {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub actor: ActorSettings,
}

impl Settings {
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(
                Environment::with_prefix("REMESAS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let settings = Settings::load(Some("does-not-exist")).unwrap();
        assert_eq!(settings.app.level, "info");
        assert!(settings.database.url.starts_with("sqlite:"));
        assert_eq!(settings.actor.user_id, None);
    }
}
