use std::{collections::HashMap, env, fs, path::PathBuf};

use tracing::debug;

use super::{ContainerConfig, CONFIG_FILE_NAME, ENV_COMPONENT_MODEL_AWARENESS, ENV_DEFAULT_LIFESTYLE};
use crate::errors::ConfigError;

/// Configuration loader responsible for loading config from files and environment
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader that reads `ioc.toml` from the working directory
    pub fn new() -> Self {
        Self { base_path: None }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        match &self.base_path {
            Some(base_path) => base_path.join(CONFIG_FILE_NAME),
            None => PathBuf::from(CONFIG_FILE_NAME),
        }
    }

    /// Load the file (when present) and apply environment overrides
    pub fn load(&self) -> Result<ContainerConfig, ConfigError> {
        let config = self.load_file()?;
        config.apply_env(&self.collect_env_vars())
    }

    /// Load the file only; a missing file yields defaults
    pub fn load_file(&self) -> Result<ContainerConfig, ConfigError> {
        let path = self.config_path();
        if !path.exists() {
            debug!(path = %path.display(), "No container config file, using defaults");
            return Ok(ContainerConfig::default());
        }
        let shown = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(shown.clone(), e))?;
        debug!(path = %shown, "Loaded container config");
        ContainerConfig::from_toml_str(&content, &shown)
    }

    fn collect_env_vars(&self) -> HashMap<String, String> {
        [ENV_DEFAULT_LIFESTYLE, ENV_COMPONENT_MODEL_AWARENESS]
            .into_iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LifestyleKind;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let loader = ConfigLoader::with_base_path(dir.path().to_path_buf());
        assert_eq!(loader.load_file().expect("loaded"), ContainerConfig::default());
    }

    #[test]
    fn reads_config_from_base_path() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "default_lifestyle = \"contextual\"\ncomponent_model_awareness = false\n",
        )
        .expect("write config");

        let config = ConfigLoader::with_base_path(dir.path().to_path_buf())
            .load_file()
            .expect("loaded");
        assert_eq!(config.default_lifestyle, LifestyleKind::Contextual);
        assert!(!config.component_model_awareness);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join(CONFIG_FILE_NAME), "default_lifestyle = [").expect("write config");

        let error = ConfigLoader::with_base_path(dir.path().to_path_buf())
            .load_file()
            .expect_err("malformed");
        assert!(matches!(error, ConfigError::TomlParse(path, _) if path.ends_with(CONFIG_FILE_NAME)));
    }
}
