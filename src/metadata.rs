//! 类型元数据：类与协议的区分、协议继承、构造参数推断

use dashmap::{DashMap, DashSet};

use crate::dependency::RawDependency;
use crate::key::Key;
use crate::model::Injectable;

/// 容器查询类型信息的接口
pub trait Metadata: Send + Sync {
    fn is_class(&self, key: &Key) -> bool;

    fn is_protocol(&self, key: &Key) -> bool;

    /// 类实现的全部协议
    fn protocols_of(&self, key: &Key) -> Vec<Key>;

    /// 推断的构造参数，`None` 表示该位置无法推断
    fn constructor_parameters(&self, key: &Key) -> Vec<Option<RawDependency>>;
}

#[derive(Debug, Default, Clone)]
struct ClassMetadata {
    protocols: Vec<Key>,
    parameters: Vec<Option<RawDependency>>,
}

/// 基于注册表的元数据
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    classes: DashMap<Key, ClassMetadata>,
    protocols: DashSet<Key>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录可注入类型声明的协议
    pub fn register<T: Injectable>(&self) -> &Self {
        self.declare_class(Key::of::<T>(), T::protocols())
    }

    pub fn declare_class(&self, key: Key, protocols: Vec<Key>) -> &Self {
        for protocol in &protocols {
            self.protocols.insert(protocol.clone());
        }
        let mut class = self.classes.entry(key).or_default();
        for protocol in protocols {
            if !class.protocols.contains(&protocol) {
                class.protocols.push(protocol);
            }
        }
        self
    }

    pub fn declare_protocol(&self, key: Key) -> &Self {
        self.protocols.insert(key);
        self
    }

    /// 为构造参数的某个位置声明依赖
    pub fn declare_parameter(&self, class: Key, index: usize, dependency: RawDependency) -> &Self {
        let mut class = self.classes.entry(class).or_default();
        if index >= class.parameters.len() {
            class.parameters.resize(index + 1, None);
        }
        class.parameters[index] = Some(dependency);
        self
    }
}

impl Metadata for MetadataRegistry {
    fn is_class(&self, key: &Key) -> bool {
        self.classes.contains_key(key)
    }

    fn is_protocol(&self, key: &Key) -> bool {
        self.protocols.contains(key)
    }

    fn protocols_of(&self, key: &Key) -> Vec<Key> {
        self.classes
            .get(key)
            .map(|class| class.protocols.clone())
            .unwrap_or_default()
    }

    fn constructor_parameters(&self, key: &Key) -> Vec<Option<RawDependency>> {
        self.classes
            .get(key)
            .map(|class| class.parameters.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Engine {}
    struct V12;

    #[test]
    fn classes_and_protocols() {
        let metadata = MetadataRegistry::new();
        metadata.declare_class(Key::of::<V12>(), vec![Key::of::<dyn Engine>()]);

        assert!(metadata.is_class(&Key::of::<V12>()));
        assert!(metadata.is_protocol(&Key::of::<dyn Engine>()));
        assert!(!metadata.is_protocol(&Key::of::<V12>()));
        assert_eq!(metadata.protocols_of(&Key::of::<V12>()), vec![Key::of::<dyn Engine>()]);
    }

    #[test]
    fn declared_parameters_leave_holes() {
        let metadata = MetadataRegistry::new();
        metadata.declare_parameter(Key::of::<V12>(), 1, Key::named("fuel").into());

        let parameters = metadata.constructor_parameters(&Key::of::<V12>());
        assert_eq!(parameters.len(), 2);
        assert!(parameters[0].is_none());
        assert!(parameters[1].is_some());
    }
}
