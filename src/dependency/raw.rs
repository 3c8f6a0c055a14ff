use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::DependencyModifier;
use crate::composer::ContainerView;
use crate::errors::Result;
use crate::instance::Instance;
use crate::key::Key;

/// 动态依赖函数，在解析时以容器视图调用
#[derive(Clone)]
pub struct DynamicFn(Arc<dyn Fn(&ContainerView) -> Result<Instance> + Send + Sync>);

impl DynamicFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ContainerView) -> Result<Instance> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, container: &ContainerView) -> Result<Instance> {
        (self.0)(container)
    }
}

impl fmt::Debug for DynamicFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DynamicFn")
    }
}

/// 用户书写的依赖，可以层层包裹修饰
#[derive(Clone, Debug)]
pub enum RawDependency {
    Key(Key),
    Value(Instance),
    Function(DynamicFn),
    /// 空值
    Nothing,
    Modified(DependencyModifier, Box<RawDependency>),
}

impl RawDependency {
    pub fn modify(self, modifier: DependencyModifier) -> Self {
        RawDependency::Modified(modifier, Box::new(self))
    }
}

impl From<Key> for RawDependency {
    fn from(key: Key) -> Self {
        RawDependency::Key(key)
    }
}

impl From<&str> for RawDependency {
    fn from(name: &str) -> Self {
        RawDependency::Key(Key::named(name))
    }
}

impl From<Instance> for RawDependency {
    fn from(instance: Instance) -> Self {
        RawDependency::Value(instance)
    }
}

impl From<DynamicFn> for RawDependency {
    fn from(function: DynamicFn) -> Self {
        RawDependency::Function(function)
    }
}

/// 字面值依赖
pub fn literal<T: Any + Send + Sync>(value: T) -> RawDependency {
    RawDependency::Value(Instance::new(value)).modify(DependencyModifier::USE)
}

pub fn use_value(dependency: impl Into<RawDependency>) -> RawDependency {
    dependency.into().modify(DependencyModifier::USE)
}

pub fn lazy(dependency: impl Into<RawDependency>) -> RawDependency {
    dependency.into().modify(DependencyModifier::LAZY)
}

pub fn every(dependency: impl Into<RawDependency>) -> RawDependency {
    dependency.into().modify(DependencyModifier::EVERY)
}

pub fn dynamic<F>(f: F) -> RawDependency
where
    F: Fn(&ContainerView) -> Result<Instance> + Send + Sync + 'static,
{
    RawDependency::Function(DynamicFn::new(f)).modify(DependencyModifier::DYNAMIC)
}

pub fn optional(dependency: impl Into<RawDependency>) -> RawDependency {
    dependency.into().modify(DependencyModifier::OPTIONAL)
}

pub fn promise(dependency: impl Into<RawDependency>) -> RawDependency {
    dependency.into().modify(DependencyModifier::PROMISE)
}

pub fn invariant(dependency: impl Into<RawDependency>) -> RawDependency {
    dependency.into().modify(DependencyModifier::INVARIANT)
}

pub fn container(dependency: impl Into<RawDependency>) -> RawDependency {
    dependency.into().modify(DependencyModifier::CONTAINER)
}

pub fn child(dependency: impl Into<RawDependency>) -> RawDependency {
    dependency.into().modify(DependencyModifier::CHILD)
}
