use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use super::burden::{resolve_dependency, ResolutionContext};
use crate::composer::ComposerRef;
use crate::dependency::{DependencyModel, DependencyModifier};
use crate::errors::{Error, Result};
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::model::Facet;

/// 一个依赖位置的解析结果
#[derive(Clone, Debug, Default)]
pub enum Slot {
    /// 未定义或可选依赖缺失
    #[default]
    Empty,
    Instance(Instance),
    /// Every 依赖
    Many(Vec<Instance>),
    Lazy(Lazy),
    Promise(Deferred),
}

impl Slot {
    pub fn instance(&self) -> Option<&Instance> {
        match self {
            Slot::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub(crate) fn from_option(instance: Option<Instance>) -> Self {
        instance.map_or(Slot::Empty, Slot::Instance)
    }

    pub(crate) fn into_option(self) -> Option<Instance> {
        match self {
            Slot::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

struct LazyInner {
    dependency: DependencyModel,
    composer: ComposerRef,
    memo: Mutex<Option<Slot>>,
}

/// 首次访问时才解析的依赖，成功结果会被缓存
#[derive(Clone)]
pub struct Lazy {
    inner: Arc<LazyInner>,
}

impl Lazy {
    pub(crate) fn new(dependency: &DependencyModel, composer: ComposerRef) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                dependency: dependency.without(DependencyModifier::LAZY),
                composer,
                memo: Mutex::new(None),
            }),
        }
    }

    /// 解析（或取回缓存的）依赖
    ///
    /// 延迟解析没有父请求，也不是即时解析。
    pub fn get(&self) -> Eventual<Result<Slot>> {
        if let Some(slot) = self.inner.memo.lock().clone() {
            return Eventual::Ready(Ok(slot));
        }
        let context = ResolutionContext::new(None, false, self.inner.composer.clone());
        let inner = self.inner.clone();
        resolve_dependency(&self.inner.dependency, &context).map(move |result| {
            if let Ok(slot) = &result {
                *inner.memo.lock() = Some(slot.clone());
            }
            result
        })
    }

    pub async fn instance(&self) -> Result<Option<Instance>> {
        Ok(self.get().await?.into_option())
    }

    pub async fn get_as<T: Any + Send + Sync>(&self) -> Result<Option<Arc<T>>> {
        match self.instance().await? {
            Some(instance) => downcast(&instance).map(Some),
            None => Ok(None),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.memo.lock().is_some()
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("dependency", &self.inner.dependency)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// 以 promise 形式交付的依赖，可被多次等待
#[derive(Clone)]
pub struct Deferred {
    future: Shared<BoxFuture<'static, Result<Slot>>>,
}

impl Deferred {
    pub(crate) fn new(future: BoxFuture<'static, Result<Slot>>) -> Self {
        Self {
            future: future.shared(),
        }
    }

    pub(crate) fn settled(result: Result<Slot>) -> Self {
        Self::new(future::ready(result).boxed())
    }

    pub async fn get(&self) -> Result<Slot> {
        self.future.clone().await
    }

    pub async fn instance(&self) -> Result<Option<Instance>> {
        Ok(self.get().await?.into_option())
    }

    pub async fn get_as<T: Any + Send + Sync>(&self) -> Result<Option<Arc<T>>> {
        match self.instance().await? {
            Some(instance) => downcast(&instance).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred")
    }
}

fn downcast<T: Any + Send + Sync>(instance: &Instance) -> Result<Arc<T>> {
    instance.downcast::<T>().ok_or(Error::TypeMismatch {
        expected: type_name::<T>(),
        actual: instance.type_name(),
    })
}

/// 组件的已解析依赖，按分组存放
#[derive(Clone, Debug, Default)]
pub struct Dependencies {
    groups: BTreeMap<Facet, Vec<Slot>>,
}

impl Dependencies {
    pub fn facet(&self, facet: &Facet) -> &[Slot] {
        self.groups.get(facet).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parameters(&self) -> Arguments<'_> {
        self.arguments(Facet::Parameters)
    }

    pub fn arguments(&self, facet: Facet) -> Arguments<'_> {
        Arguments {
            dependencies: self,
            facet,
        }
    }

    /// 属性分组的第一个值
    pub fn property(&self, name: &str) -> Option<&Slot> {
        self.groups
            .get(&Facet::property(name))
            .and_then(|slots| slots.first())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Facet, &[Slot])> {
        self.groups
            .iter()
            .map(|(facet, slots)| (facet, slots.as_slice()))
    }

    pub(crate) fn insert(&mut self, facet: Facet, slots: Vec<Slot>) {
        self.groups.insert(facet, slots);
    }

    pub(crate) fn set(&mut self, facet: &Facet, index: usize, slot: Slot) {
        if let Some(slots) = self.groups.get_mut(facet) {
            if let Some(target) = slots.get_mut(index) {
                *target = slot;
            }
        }
    }
}

/// 对某个分组的类型化访问
#[derive(Clone)]
pub struct Arguments<'a> {
    dependencies: &'a Dependencies,
    facet: Facet,
}

impl<'a> Arguments<'a> {
    fn slots(&self) -> &'a [Slot] {
        self.dependencies.facet(&self.facet)
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&'a Slot> {
        self.slots().get(index)
    }

    fn missing(&self, index: usize) -> Error {
        Error::MissingArgument {
            facet: self.facet.to_string(),
            index,
        }
    }

    pub fn instance(&self, index: usize) -> Result<&'a Instance> {
        self.slot(index)
            .and_then(Slot::instance)
            .ok_or_else(|| self.missing(index))
    }

    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        downcast(self.instance(index)?)
    }

    pub fn value<T: Any + Send + Sync + Clone>(&self, index: usize) -> Result<T> {
        Ok(T::clone(&*self.get::<T>(index)?))
    }

    /// 缺失时返回 `None`，类型不符仍然报错
    pub fn optional<T: Any + Send + Sync>(&self, index: usize) -> Result<Option<Arc<T>>> {
        match self.slot(index) {
            Some(Slot::Instance(instance)) => downcast(instance).map(Some),
            _ => Ok(None),
        }
    }

    pub fn many<T: Any + Send + Sync>(&self, index: usize) -> Result<Vec<Arc<T>>> {
        match self.slot(index) {
            Some(Slot::Many(instances)) => instances.iter().map(downcast::<T>).collect(),
            _ => Err(self.missing(index)),
        }
    }

    pub fn lazy(&self, index: usize) -> Result<&'a Lazy> {
        match self.slot(index) {
            Some(Slot::Lazy(lazy)) => Ok(lazy),
            _ => Err(self.missing(index)),
        }
    }

    pub fn promise(&self, index: usize) -> Result<&'a Deferred> {
        match self.slot(index) {
            Some(Slot::Promise(deferred)) => Ok(deferred),
            _ => Err(self.missing(index)),
        }
    }

    pub fn property<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
        match self.dependencies.property(name) {
            Some(Slot::Instance(instance)) => downcast(instance).map(Some),
            _ => Ok(None),
        }
    }

    pub fn dependencies(&self) -> &'a Dependencies {
        self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameters(slots: Vec<Slot>) -> Dependencies {
        let mut dependencies = Dependencies::default();
        dependencies.insert(Facet::Parameters, slots);
        dependencies
    }

    #[test]
    fn typed_access_to_parameters() {
        let dependencies = parameters(vec![
            Slot::Instance(Instance::new(917u32)),
            Slot::Empty,
            Slot::Many(vec![Instance::new(1u8), Instance::new(2u8)]),
        ]);
        let args = dependencies.parameters();

        assert_eq!(args.len(), 3);
        assert_eq!(args.value::<u32>(0).ok(), Some(917));
        assert!(matches!(args.get::<String>(0), Err(Error::TypeMismatch { .. })));
        assert!(matches!(args.get::<u32>(1), Err(Error::MissingArgument { index: 1, .. })));
        assert!(matches!(args.optional::<u32>(1), Ok(None)));
        assert_eq!(args.many::<u8>(2).map(|v| v.len()).ok(), Some(2));
    }

    #[test]
    fn properties_live_in_their_own_facet() {
        let mut dependencies = Dependencies::default();
        dependencies.insert(Facet::property("color"), vec![Slot::Instance(Instance::new("red"))]);
        let args = dependencies.parameters();
        assert!(args.is_empty());
        assert_eq!(
            args.property::<&str>("color").ok().flatten().as_deref(),
            Some(&"red")
        );
    }

    #[tokio::test]
    async fn deferred_can_be_awaited_repeatedly() {
        let deferred = Deferred::settled(Ok(Slot::Instance(Instance::new(7i64))));
        assert_eq!(deferred.get_as::<i64>().await.ok().flatten().as_deref(), Some(&7));
        assert_eq!(deferred.get_as::<i64>().await.ok().flatten().as_deref(), Some(&7));
    }
}
