//! 容器配置

pub mod loader;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::lifestyle::{Contextual, Lifestyle, Singleton, Transient};

pub use loader::ConfigLoader;

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "ioc.toml";

pub const ENV_DEFAULT_LIFESTYLE: &str = "IOC_DEFAULT_LIFESTYLE";
pub const ENV_COMPONENT_MODEL_AWARENESS: &str = "IOC_COMPONENT_MODEL_AWARENESS";

/// 未显式指定生命周期的组件使用的生命周期
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifestyleKind {
    #[default]
    Singleton,
    Transient,
    Contextual,
}

impl LifestyleKind {
    /// 每个组件拿到独立的生命周期实例
    pub fn create(self) -> Arc<dyn Lifestyle> {
        match self {
            LifestyleKind::Singleton => Singleton::new(),
            LifestyleKind::Transient => Arc::new(Transient::new()),
            LifestyleKind::Contextual => Contextual::new(),
        }
    }
}

impl FromStr for LifestyleKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(LifestyleKind::Singleton),
            "transient" => Ok(LifestyleKind::Transient),
            "contextual" => Ok(LifestyleKind::Contextual),
            _ => Err(ConfigError::InvalidValue {
                field: "default_lifestyle".to_string(),
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub default_lifestyle: LifestyleKind,
    /// 是否安装组件模型感知策略
    pub component_model_awareness: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            default_lifestyle: LifestyleKind::Singleton,
            component_model_awareness: true,
        }
    }
}

impl ContainerConfig {
    /// 从 TOML 文本解析，`source` 用于错误信息
    pub fn from_toml_str(content: &str, source: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse(source.to_string(), e))
    }

    /// 用环境变量覆盖文件中的值
    pub fn apply_env(mut self, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        if let Some(value) = env.get(ENV_DEFAULT_LIFESTYLE) {
            self.default_lifestyle = value.parse()?;
        }
        if let Some(value) = env.get(ENV_COMPONENT_MODEL_AWARENESS) {
            self.component_model_awareness = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "component_model_awareness".to_string(),
                        value: value.clone(),
                    })
                }
            };
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = ContainerConfig::from_toml_str("default_lifestyle = \"transient\"", "inline")
            .expect("parsed");
        assert_eq!(config.default_lifestyle, LifestyleKind::Transient);
        assert!(config.component_model_awareness);
    }

    #[test]
    fn unknown_lifestyle_is_rejected() {
        let error = ContainerConfig::from_toml_str("default_lifestyle = \"pooled\"", "inline")
            .expect_err("invalid lifestyle");
        assert!(matches!(error, ConfigError::TomlParse(source, _) if source == "inline"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env = HashMap::from([
            (ENV_DEFAULT_LIFESTYLE.to_string(), "Contextual".to_string()),
            (ENV_COMPONENT_MODEL_AWARENESS.to_string(), "off".to_string()),
        ]);
        let config = ContainerConfig::default().apply_env(&env).expect("applied");
        assert_eq!(config.default_lifestyle, LifestyleKind::Contextual);
        assert!(!config.component_model_awareness);
    }

    #[test]
    fn invalid_environment_value_is_reported() {
        let env = HashMap::from([(ENV_DEFAULT_LIFESTYLE.to_string(), "forever".to_string())]);
        let error = ContainerConfig::default().apply_env(&env).expect_err("invalid");
        assert!(matches!(
            error,
            ConfigError::InvalidValue { field, value } if field == "default_lifestyle" && value == "forever"
        ));
    }

    #[test]
    fn kinds_create_matching_lifestyles() {
        assert_eq!(LifestyleKind::Singleton.create().name(), "singleton");
        assert_eq!(LifestyleKind::Transient.create().name(), "transient");
        assert_eq!(LifestyleKind::Contextual.create().name(), "contextual");
    }
}
