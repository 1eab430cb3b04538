use crate::game_logic::errors::{ChaseError, ChaseResult};
use crate::resources::GameConfig;
use bevy::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub mod range_types;

const APP_DIR: &str = "chaser";
const CONFIG_FILE: &str = "config.toml";

pub fn get_config_path() -> ChaseResult<PathBuf> {
    let mut path = dirs::config_dir().ok_or(ChaseError::ConfigDirNotFound)?;
    path.push(APP_DIR);
    fs::create_dir_all(&path)?;
    path.push(CONFIG_FILE);
    Ok(path)
}

/// Read a config file, re-clamping every tuning value
pub fn read_config(path: &Path) -> ChaseResult<GameConfig> {
    if !path.exists() {
        return Err(ChaseError::ConfigFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = fs::read_to_string(path)?;
    let mut config = toml::from_str::<GameConfig>(&contents)?;
    config.settings = config.settings.clamped();
    Ok(config)
}

pub fn write_config(path: &Path, config: &GameConfig) -> ChaseResult<()> {
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load the user's config, falling back to defaults on any failure
pub fn load_config() -> GameConfig {
    match get_config_path().and_then(|path| read_config(&path)) {
        Ok(config) => config,
        Err(ChaseError::ConfigFileNotFound { path }) => {
            info!("No config at {}, using defaults", path.display());
            GameConfig::default()
        }
        Err(e) => {
            warn!("Failed to load config, using defaults: {e}");
            GameConfig::default()
        }
    }
}

pub fn save_config(config: &GameConfig) -> ChaseResult<()> {
    write_config(&get_config_path()?, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_logic::chaser::ChaseMode;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("chaser-config-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_write_then_read_config() {
        let path = temp_path("roundtrip.toml");
        let mut config = GameConfig::default();
        config.username = "runner".to_string();
        config.settings.chase_mode = ChaseMode::Catch;

        write_config(&path, &config).unwrap();
        let loaded = read_config(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.username, "runner");
        assert_eq!(loaded.settings.chase_mode, ChaseMode::Catch);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = temp_path("missing.toml");
        match read_config(&path) {
            Err(ChaseError::ConfigFileNotFound { path: reported }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_file_is_deserialization_error() {
        let path = temp_path("broken.toml");
        fs::write(&path, "settings = [").unwrap();
        let result = read_config(&path);
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ChaseError::DeserializationFailed(_))));
    }
}
