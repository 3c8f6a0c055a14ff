//! 控制反转容器
//!
//! 容器是一个处理器：组件注册后变成组件提供者，按注册顺序尝试满足请求。
//! 解析总是通过组合器（通常是上下文）进入，容器本身不保存上下文。

mod builder;
mod provider;
mod registration;
mod stats;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::composer::{resolve_every, resolve_first, ComposerRef, ContainerView, Handler, Resolved, ResolvedAll};
use crate::config::ContainerConfig;
use crate::context::Context;
use crate::errors::{ModelError, Result};
use crate::eventual::Eventual;
use crate::interception::ProxyBuilder;
use crate::key::Key;
use crate::metadata::Metadata;
use crate::model::{ComponentModel, Injectable};
use crate::policy::{apply_policies, ComponentPolicy, InitializationPolicy};
use crate::resolution::{DependencyResolution, HandlerId};
use crate::validation::{ValidationResults, Validator};

pub use builder::ContainerBuilder;
pub use registration::Registration;
pub use stats::ContainerStats;

use provider::ComponentProvider;
use stats::InnerStats;

#[derive(Clone)]
pub struct IocContainer {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    providers: RwLock<Vec<Arc<ComponentProvider>>>,
    policies: RwLock<Vec<Arc<dyn ComponentPolicy>>>,
    default_policies: Vec<Arc<dyn ComponentPolicy>>,
    validator: Arc<dyn Validator>,
    metadata: Arc<dyn Metadata>,
    proxy_builder: Arc<dyn ProxyBuilder>,
    config: ContainerConfig,
    stats: Arc<InnerStats>,
}

impl IocContainer {
    /// 使用默认配置创建容器
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    pub fn metadata(&self) -> &Arc<dyn Metadata> {
        &self.inner.metadata
    }

    /// 追加容器级策略，只影响之后注册的组件
    pub fn add_policies<I>(&self, policies: I) -> &Self
    where
        I: IntoIterator<Item = Arc<dyn ComponentPolicy>>,
    {
        self.inner.policies.write().extend(policies);
        self
    }

    /// 注册组件
    ///
    /// 依次应用默认策略、容器策略和模型自带的策略，校验失败时同步返回
    /// `Error::InvalidModel`。
    pub fn add_component(&self, mut model: ComponentModel) -> Result<Registration> {
        let inner = &self.inner;

        let mut policies = inner.default_policies.clone();
        policies.extend(inner.policies.read().iter().cloned());
        policies.extend(model.policies().iter().cloned());
        apply_policies(&mut model, &mut policies)?;

        let results = inner.validator.validate(&model);
        if !results.is_valid() {
            warn!(component = %model.describe(), errors = %results, "Rejected invalid component model");
            return Err(ModelError::new(model, results).into());
        }
        policies.push(Arc::new(InitializationPolicy));

        let key = model.key();
        let factory = model.factory(inner.proxy_builder.as_ref(), inner.metadata.as_ref());
        let (Some(key), Some(factory)) = (key, factory) else {
            let mut results = ValidationResults::new();
            results.add("factory", "Factory could not be determined");
            return Err(ModelError::new(model, results).into());
        };

        let lifestyle = model
            .lifestyle()
            .cloned()
            .unwrap_or_else(|| inner.config.default_lifestyle.create());
        let protocols = self.protocols_of(&model, &key);

        debug!(
            component = %key,
            lifestyle = lifestyle.name(),
            protocols = protocols.len(),
            policies = policies.len(),
            "Component registered"
        );

        let provider = Arc::new(ComponentProvider::new(
            key.clone(),
            protocols,
            Arc::new(model),
            lifestyle,
            factory,
            policies,
            inner.stats.clone(),
        ));
        let id = provider.id();
        inner.providers.write().push(provider);
        InnerStats::record(&inner.stats.registrations);

        Ok(Registration::new(id, key, Arc::downgrade(&self.inner)))
    }

    /// 以可注入类型注册
    pub fn register<T: Injectable>(&self) -> Result<Registration> {
        self.add_component(ComponentModel::of::<T>())
    }

    /// 以该容器为处理器的根上下文
    pub fn context(&self) -> Context {
        let context = Context::named("root");
        context.add_handler(Arc::new(self.clone()));
        context
    }

    pub fn view(&self) -> ContainerView {
        self.context().view()
    }

    pub fn len(&self) -> usize {
        self.inner.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.providers.read().is_empty()
    }

    pub fn is_registered(&self, key: &Key) -> bool {
        self.inner
            .providers
            .read()
            .iter()
            .any(|provider| provider.key() == key)
    }

    pub fn stats(&self) -> ContainerStats {
        self.inner.stats.snapshot()
    }

    /// 移除所有组件并释放其生命周期
    pub fn dispose(&self) {
        let providers = std::mem::take(&mut *self.inner.providers.write());
        debug!(components = providers.len(), "Disposing container");
        for provider in providers {
            provider.lifestyle().dispose();
        }
        self.inner.stats.registrations.store(0, std::sync::atomic::Ordering::Relaxed);
    }

    fn protocols_of(&self, model: &ComponentModel, key: &Key) -> Vec<Key> {
        let metadata = &self.inner.metadata;
        let mut protocols: Vec<Key> = Vec::new();
        let mut add = |candidate: Key| {
            if &candidate != key && !protocols.contains(&candidate) {
                protocols.push(candidate);
            }
        };
        if let Some(implementation) = model.implementation() {
            implementation.protocols().iter().cloned().for_each(&mut add);
            metadata.protocols_of(implementation.key()).into_iter().for_each(&mut add);
        }
        metadata.protocols_of(key).into_iter().for_each(&mut add);
        protocols
    }

    fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.inner
            .providers
            .read()
            .iter()
            .map(|provider| provider.clone() as Arc<dyn Handler>)
            .collect()
    }
}

impl ContainerInner {
    fn unregister(&self, id: HandlerId) -> bool {
        let removed = {
            let mut providers = self.providers.write();
            let position = providers.iter().position(|provider| provider.id() == id);
            position.map(|position| providers.remove(position))
        };
        match removed {
            Some(provider) => {
                debug!(component = %provider.key(), "Component unregistered");
                provider.lifestyle().dispose();
                self.stats
                    .registrations
                    .fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
                true
            }
            None => false,
        }
    }
}

impl Default for IocContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for IocContainer {
    fn resolve(&self, request: &Arc<DependencyResolution>, composer: &ComposerRef) -> Eventual<Resolved> {
        resolve_first(self.handlers(), request.clone(), composer.clone())
    }

    fn resolve_all(
        &self,
        request: &Arc<DependencyResolution>,
        composer: &ComposerRef,
    ) -> Eventual<ResolvedAll> {
        resolve_every(self.handlers(), request.clone(), composer.clone())
    }
}

impl std::fmt::Debug for IocContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IocContainer")
            .field("providers", &*self.inner.providers.read())
            .field("config", &self.inner.config)
            .finish()
    }
}
