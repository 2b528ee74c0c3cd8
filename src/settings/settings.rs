use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub store: Store,
    pub log: Log,
    #[serde(default)]
    pub session: Session,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "redis"
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Session {
    pub username: Option<String>,
}

fn default_key_prefix() -> String {
    "relationships".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Loads the TOML file, then applies `RAPPORT__SECTION__KEY` environment overrides.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("RAPPORT").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_an_error() {
        assert!(parse_settings(Some("")).is_err());
    }

    #[test]
    fn dev_settings_load() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/settings/dev.toml");
        let settings = parse_settings(Some(path)).unwrap();
        assert_eq!(settings.store.backend, "memory");
        assert_eq!(settings.store.key_prefix, "relationships");
    }
}
