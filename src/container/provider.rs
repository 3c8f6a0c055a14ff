//! 组件提供者：把一个注册的组件接入处理器链

use std::sync::Arc;

use tracing::{debug, trace};

use super::stats::InnerStats;
use crate::composer::{ComposerRef, Handler, Resolved, ResolvedAll};
use crate::eventual::Eventual;
use crate::key::Key;
use crate::lifestyle::{Commit, Committed, Creation, Lifestyle};
use crate::model::{ComponentModel, Factory};
use crate::policy::{run_component_created, ComponentPolicy};
use crate::resolution::{resolve_burden, DependencyResolution, HandlerId, ResolutionContext};

pub(crate) struct ComponentProvider {
    id: HandlerId,
    key: Key,
    invariant: bool,
    protocols: Vec<Key>,
    type_name: Arc<str>,
    model: Arc<ComponentModel>,
    lifestyle: Arc<dyn Lifestyle>,
    factory: Factory,
    policies: Arc<[Arc<dyn ComponentPolicy>]>,
    stats: Arc<InnerStats>,
}

impl ComponentProvider {
    pub(crate) fn new(
        key: Key,
        protocols: Vec<Key>,
        model: Arc<ComponentModel>,
        lifestyle: Arc<dyn Lifestyle>,
        factory: Factory,
        policies: Vec<Arc<dyn ComponentPolicy>>,
        stats: Arc<InnerStats>,
    ) -> Self {
        let type_name: Arc<str> = model
            .implementation()
            .map(|implementation| implementation.name())
            .unwrap_or_else(|| key.to_string())
            .into();
        Self {
            id: HandlerId::next(),
            invariant: model.is_invariant(),
            key,
            protocols,
            type_name,
            model,
            lifestyle,
            factory,
            policies: Arc::from(policies),
            stats,
        }
    }

    pub(crate) fn id(&self) -> HandlerId {
        self.id
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn lifestyle(&self) -> &Arc<dyn Lifestyle> {
        &self.lifestyle
    }

    /// 键完全相同，或双方都不要求精确匹配时按协议匹配
    fn matches(&self, request: &DependencyResolution) -> bool {
        let key = request.key();
        if key == &self.key {
            return true;
        }
        !self.invariant && !request.is_invariant() && self.protocols.contains(key)
    }

    /// 解析依赖、构造、提交，然后执行策略
    fn creation(&self, request: &Arc<DependencyResolution>, composer: &ComposerRef) -> Creation {
        let context = ResolutionContext::for_request(request, composer.clone());
        let model = self.model.clone();
        let factory = self.factory.clone();
        let policies = self.policies.clone();
        let stats = self.stats.clone();
        let composer = composer.clone();

        Box::new(move |commit: Commit| {
            resolve_burden(model.burden(), &context).and_then(move |dependencies| {
                factory
                    .create(&dependencies, &composer)
                    .and_then(move |instance| match commit(instance) {
                        Committed::Existing(existing) => Eventual::ok(Some(existing)),
                        Committed::Accepted(instance) => {
                            InnerStats::record(&stats.creations);
                            trace!(instance = instance.type_name(), "Component created");
                            run_component_created(
                                instance,
                                model,
                                Arc::new(dependencies),
                                composer,
                                policies,
                            )
                            .map_ok(Some)
                        }
                    })
            })
        })
    }
}

/// 未处理时撤销认领，失败时计数
fn settle(
    id: HandlerId,
    request: &DependencyResolution,
    stats: &InnerStats,
    result: Resolved,
) -> Resolved {
    match &result {
        Ok(None) => request.release_claim(id),
        Err(_) => InnerStats::record(&stats.failures),
        Ok(Some(_)) => {}
    }
    result
}

impl Handler for ComponentProvider {
    fn resolve(&self, request: &Arc<DependencyResolution>, composer: &ComposerRef) -> Eventual<Resolved> {
        if !self.matches(request) {
            return Eventual::ok(None);
        }
        if !request.claim(self.id, self.type_name.clone()) {
            InnerStats::record(&self.stats.declined);
            debug!(
                component = %self.type_name,
                chain = %request.formatted_dependency_chain(),
                "Circular dependency, declining request"
            );
            return Eventual::ok(None);
        }
        InnerStats::record(&self.stats.resolutions);

        let creation = self.creation(request, composer);
        let id = self.id;
        let stats = self.stats.clone();
        let request = request.clone();
        self.lifestyle
            .resolve(creation, composer)
            .map(move |result| settle(id, &request, &stats, result))
    }

    fn resolve_all(
        &self,
        request: &Arc<DependencyResolution>,
        composer: &ComposerRef,
    ) -> Eventual<ResolvedAll> {
        self.resolve(request, composer)
            .map_ok(|instance| instance.into_iter().collect())
    }
}

impl std::fmt::Debug for ComponentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentProvider")
            .field("key", &self.key)
            .field("type", &self.type_name)
            .field("lifestyle", &self.lifestyle.name())
            .field("protocols", &self.protocols)
            .finish()
    }
}
