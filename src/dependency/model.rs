use super::{DependencyModifier, DynamicFn, RawDependency};
use crate::instance::Instance;
use crate::key::Key;

/// 去掉修饰后的依赖
#[derive(Clone, Debug)]
pub enum Dependency {
    Key(Key),
    Value(Instance),
    Function(DynamicFn),
    Nothing,
}

impl Dependency {
    pub fn key(&self) -> Option<&Key> {
        match self {
            Dependency::Key(key) => Some(key),
            _ => None,
        }
    }
}

/// 归一化的依赖：剥离所有包装并合并修饰标志
#[derive(Clone, Debug)]
pub struct DependencyModel {
    dependency: Dependency,
    modifiers: DependencyModifier,
}

impl DependencyModel {
    pub fn new(raw: impl Into<RawDependency>) -> Self {
        let mut modifiers = DependencyModifier::NONE;
        let mut raw = raw.into();
        let dependency = loop {
            raw = match raw {
                RawDependency::Modified(modifier, inner) => {
                    modifiers |= modifier;
                    *inner
                }
                RawDependency::Key(key) => break Dependency::Key(key),
                RawDependency::Value(value) => break Dependency::Value(value),
                RawDependency::Function(function) => break Dependency::Function(function),
                RawDependency::Nothing => break Dependency::Nothing,
            };
        };
        Self {
            dependency,
            modifiers,
        }
    }

    /// 缺失值保持缺失，其余归一化
    pub fn coerce<R: Into<RawDependency>>(raw: Option<R>) -> Option<Self> {
        raw.map(Self::new)
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub fn key(&self) -> Option<&Key> {
        self.dependency.key()
    }

    pub fn modifiers(&self) -> DependencyModifier {
        self.modifiers
    }

    pub fn test(&self, modifier: DependencyModifier) -> bool {
        self.modifiers.contains(modifier)
    }

    pub(crate) fn without(&self, modifier: DependencyModifier) -> Self {
        Self {
            dependency: self.dependency.clone(),
            modifiers: self.modifiers.without(modifier),
        }
    }
}

impl From<RawDependency> for DependencyModel {
    fn from(raw: RawDependency) -> Self {
        Self::new(raw)
    }
}
