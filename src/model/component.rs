use std::fmt;
use std::sync::Arc;

use super::{Burden, Facet, Factory, Implementation, Injectable};
use crate::dependency::{DependencyManager, DependencyModel, DependencyModifier, RawDependency};
use crate::interception::ProxyBuilder;
use crate::key::Key;
use crate::lifestyle::Lifestyle;
use crate::metadata::Metadata;
use crate::policy::ComponentPolicy;

/// 组件模型
///
/// 注册前的可变描述，注册后以 `Arc` 共享且不再修改。
#[derive(Clone, Default)]
pub struct ComponentModel {
    key: Option<Key>,
    implementation: Option<Implementation>,
    invariant: bool,
    lifestyle: Option<Arc<dyn Lifestyle>>,
    factory: Option<Factory>,
    burden: Burden,
    policies: Vec<Arc<dyn ComponentPolicy>>,
}

impl ComponentModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以可注入类型为实现的模型
    pub fn of<T: Injectable>() -> Self {
        Self::new().with_implementation(Implementation::of::<T>())
    }

    /// 显式键，缺省时为实现类型的键
    pub fn key(&self) -> Option<Key> {
        self.key
            .clone()
            .or_else(|| self.implementation.as_ref().map(|i| i.key().clone()))
    }

    pub fn set_key(&mut self, key: impl Into<Key>) -> &mut Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.set_key(key);
        self
    }

    pub fn implementation(&self) -> Option<&Implementation> {
        self.implementation.as_ref()
    }

    pub fn set_implementation(&mut self, implementation: Implementation) -> &mut Self {
        self.implementation = Some(implementation);
        self
    }

    pub fn with_implementation(mut self, implementation: Implementation) -> Self {
        self.set_implementation(implementation);
        self
    }

    pub fn is_invariant(&self) -> bool {
        self.invariant
    }

    pub fn set_invariant(&mut self, invariant: bool) -> &mut Self {
        self.invariant = invariant;
        self
    }

    pub fn invariant(mut self) -> Self {
        self.invariant = true;
        self
    }

    pub fn lifestyle(&self) -> Option<&Arc<dyn Lifestyle>> {
        self.lifestyle.as_ref()
    }

    pub fn set_lifestyle(&mut self, lifestyle: Arc<dyn Lifestyle>) -> &mut Self {
        self.lifestyle = Some(lifestyle);
        self
    }

    pub fn with_lifestyle(mut self, lifestyle: Arc<dyn Lifestyle>) -> Self {
        self.set_lifestyle(lifestyle);
        self
    }

    pub fn explicit_factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    pub fn set_factory(&mut self, factory: Factory) -> &mut Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_factory(mut self, factory: Factory) -> Self {
        self.set_factory(factory);
        self
    }

    /// 确定工厂：显式工厂优先，其次是带拦截器的代理，最后是实现的构造函数
    pub fn factory(&self, proxies: &dyn ProxyBuilder, metadata: &dyn Metadata) -> Option<Factory> {
        if let Some(factory) = &self.factory {
            return Some(factory.clone());
        }
        if self.has_interceptors() {
            let protocol = self.key().filter(|key| metadata.is_protocol(key));
            return Some(proxies.build_factory(self.implementation.as_ref(), protocol.as_ref()));
        }
        self.implementation.clone().map(Factory::constructor)
    }

    pub fn burden(&self) -> &Burden {
        &self.burden
    }

    pub fn dependencies(&self, facet: &Facet) -> Option<&[Option<DependencyModel>]> {
        self.burden.get(facet).map(Vec::as_slice)
    }

    /// 替换某个分组的全部依赖
    pub fn set_dependencies<I>(&mut self, facet: Facet, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<RawDependency>,
    {
        let models = values
            .into_iter()
            .map(|value| Some(DependencyModel::new(value)))
            .collect();
        self.burden.insert(facet, models);
        self
    }

    /// 设置构造参数
    pub fn depends_on<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RawDependency>,
    {
        self.set_dependencies(Facet::Parameters, values);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<RawDependency>) -> Self {
        self.set_dependencies(Facet::property(name), [value.into()]);
        self
    }

    /// 通过编辑器修改分组；结果为空时不写回
    pub fn manage_dependencies<F>(&mut self, facet: Facet, f: F) -> &mut Self
    where
        F: FnOnce(&mut DependencyManager),
    {
        let existing = self.burden.get(&facet).cloned().unwrap_or_default();
        let mut manager = DependencyManager::new(existing);
        f(&mut manager);
        let dependencies = manager.into_dependencies();
        if !dependencies.is_empty() {
            self.burden.insert(facet, dependencies);
        }
        self
    }

    /// 分组存在且没有空洞
    pub fn all_dependencies_defined(&self, facet: &Facet) -> bool {
        self.burden
            .get(facet)
            .is_some_and(|dependencies| dependencies.iter().all(Option::is_some))
    }

    pub fn has_interceptors(&self) -> bool {
        self.burden
            .get(&Facet::Interceptors)
            .is_some_and(|interceptors| !interceptors.is_empty())
    }

    pub fn key_can_be_determined(&self) -> bool {
        self.key.is_some() || self.implementation.is_some()
    }

    pub fn factory_can_be_determined(&self) -> bool {
        self.factory.is_some() || self.has_interceptors() || self.implementation.is_some()
    }

    /// 依赖中出现 Every 与 Child 组合的位置
    pub(crate) fn every_child_violations(&self) -> Vec<String> {
        let both = DependencyModifier::EVERY | DependencyModifier::CHILD;
        self.burden
            .iter()
            .flat_map(|(facet, dependencies)| {
                dependencies
                    .iter()
                    .enumerate()
                    .filter_map(move |(index, dependency)| match dependency {
                        Some(model) if model.test(both) => Some(format!("{facet}[{index}]")),
                        _ => None,
                    })
            })
            .collect()
    }

    pub fn policies(&self) -> &[Arc<dyn ComponentPolicy>] {
        &self.policies
    }

    pub fn add_policy(&mut self, policy: Arc<dyn ComponentPolicy>) -> &mut Self {
        self.policies.push(policy);
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn ComponentPolicy>) -> Self {
        self.add_policy(policy);
        self
    }

    /// 诊断用的名称
    pub fn describe(&self) -> String {
        self.key()
            .map(|key| key.to_string())
            .unwrap_or_else(|| "<unknown>".to_string())
    }
}

impl fmt::Debug for ComponentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentModel")
            .field("key", &self.key())
            .field("implementation", &self.implementation)
            .field("invariant", &self.invariant)
            .field("lifestyle", &self.lifestyle.as_ref().map(|l| l.name()))
            .field("factory", &self.factory.is_some())
            .field("burden", &self.burden)
            .field("policies", &self.policies.len())
            .finish()
    }
}
