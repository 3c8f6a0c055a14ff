use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::key::Key;
use crate::model::ComponentModel;
use crate::resolution::DependencyResolution;
use crate::validation::ValidationResults;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 容器错误
///
/// 所有变体均可克隆，以便同一个失败结果可以被多个等待者共享。
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// 组件模型未通过校验
    #[error(transparent)]
    InvalidModel(#[from] ModelError),

    /// 必需依赖无法解析
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// 依赖要求 Child，但值不支持创建子实例
    #[error("Dependency `{key}` does not support creating a child")]
    ChildUnsupported { key: String },

    /// Every 与 Child 组合使用
    #[error("Dependency `{key}` cannot combine Every with Child")]
    ChildWithEvery { key: Key },

    /// 受管实例的上下文只能被解除，不能被更换
    #[error("Container managed instances cannot change context")]
    ContextReassigned,

    /// 类型转换失败
    #[error("Type cast failed: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// 参数位置没有值
    #[error("Argument {index} of facet '{facet}' was not resolved")]
    MissingArgument { facet: String, index: usize },

    /// 组件创建失败
    #[error("Component creation failed: {0}")]
    Creation(String),
}

impl Error {
    /// 创建失败的便捷构造
    pub fn creation(message: impl Into<String>) -> Self {
        Error::Creation(message.into())
    }

    /// 是否为解析失败（相对于契约错误）
    pub fn is_resolution(&self) -> bool {
        matches!(self, Error::Resolution(_))
    }

    pub fn as_resolution(&self) -> Option<&ResolutionError> {
        match self {
            Error::Resolution(error) => Some(error),
            _ => None,
        }
    }
}

/// Raised when a component model fails validation at registration time.
#[derive(Debug, Clone)]
pub struct ModelError {
    model: Arc<ComponentModel>,
    results: ValidationResults,
}

impl ModelError {
    pub fn new(model: ComponentModel, results: ValidationResults) -> Self {
        Self {
            model: Arc::new(model),
            results,
        }
    }

    /// The rejected model.
    pub fn model(&self) -> &ComponentModel {
        &self.model
    }

    pub fn results(&self) -> &ValidationResults {
        &self.results
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Component model `{}` is invalid: {}",
            self.model.describe(),
            self.results
        )
    }
}

impl std::error::Error for ModelError {}

/// 解析失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// 没有处理器提供该依赖
    Unresolved,
    /// 即时解析遇到了异步结果
    Asynchronous,
}

/// A required dependency could not be satisfied.
///
/// Carries the failing request node; walking its parents reconstructs the
/// dependency chain back to the root request.
#[derive(Debug, Clone)]
pub struct ResolutionError {
    dependency: Arc<DependencyResolution>,
    reason: FailureReason,
}

impl ResolutionError {
    pub fn new(dependency: Arc<DependencyResolution>) -> Self {
        Self {
            dependency,
            reason: FailureReason::Unresolved,
        }
    }

    pub fn asynchronous(dependency: Arc<DependencyResolution>) -> Self {
        Self {
            dependency,
            reason: FailureReason::Asynchronous,
        }
    }

    pub fn dependency(&self) -> &Arc<DependencyResolution> {
        &self.dependency
    }

    pub fn key(&self) -> &Key {
        self.dependency.key()
    }

    pub fn reason(&self) -> FailureReason {
        self.reason
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            FailureReason::Unresolved => write!(
                f,
                "Dependency {} could not be resolved",
                self.dependency.formatted_dependency_chain()
            ),
            FailureReason::Asynchronous => write!(
                f,
                "Dependency {} resolved asynchronously during an instant resolution",
                self.dependency.formatted_dependency_chain()
            ),
        }
    }
}

impl std::error::Error for ResolutionError {}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for '{field}'")]
    InvalidValue { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_names_failing_key() {
        let root = Arc::new(DependencyResolution::new(Key::named("car")));
        assert!(root.claim(crate::resolution::HandlerId::next(), "Car"));
        let engine = Arc::new(DependencyResolution::new(Key::named("engine")).with_parent(Some(root)));

        let error = Error::from(ResolutionError::new(engine));
        let resolution = error.as_resolution().expect("resolution error");
        assert_eq!(resolution.key(), &Key::named("engine"));
        assert_eq!(
            resolution
                .dependency()
                .parent()
                .and_then(|parent| parent.claimed_type())
                .as_deref(),
            Some("Car")
        );
        assert!(error.to_string().contains("(engine) <= (car <- Car)"));
    }

    #[test]
    fn contract_errors_are_not_resolution_errors() {
        assert!(!Error::ContextReassigned.is_resolution());
        assert!(!Error::creation("boom").is_resolution());
    }
}
