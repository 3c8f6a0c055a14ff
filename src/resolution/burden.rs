//! 依赖负担解析
//!
//! 全部同步完成时结果立即可用；只要有一个依赖挂起，整体就变为异步，
//! 并在所有挂起的依赖完成后按原位置填回。

use std::sync::Arc;

use futures_util::future::{try_join_all, BoxFuture};
use tracing::trace;

use super::{Deferred, Dependencies, DependencyResolution, Lazy, Slot};
use crate::composer::{ComposerRef, ContainerView};
use crate::dependency::{Dependency, DependencyModel, DependencyModifier};
use crate::errors::{Error, ResolutionError, Result};
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::key::Key;
use crate::model::{Burden, Facet};

/// 解析依赖时的环境
#[derive(Clone)]
pub struct ResolutionContext {
    parent: Option<Arc<DependencyResolution>>,
    instant: bool,
    composer: ComposerRef,
}

impl ResolutionContext {
    pub fn new(
        parent: Option<Arc<DependencyResolution>>,
        instant: bool,
        composer: ComposerRef,
    ) -> Self {
        Self {
            parent,
            instant,
            composer,
        }
    }

    /// 以请求为父节点，继承其即时性
    pub fn for_request(request: &Arc<DependencyResolution>, composer: ComposerRef) -> Self {
        Self::new(Some(request.clone()), request.is_instant(), composer)
    }

    pub fn parent(&self) -> Option<&Arc<DependencyResolution>> {
        self.parent.as_ref()
    }

    pub fn is_instant(&self) -> bool {
        self.instant
    }

    pub fn composer(&self) -> &ComposerRef {
        &self.composer
    }
}

type PendingSlot = (Facet, usize, BoxFuture<'static, Result<Slot>>);

/// 解析组件的全部依赖
pub fn resolve_burden(burden: &Burden, context: &ResolutionContext) -> Eventual<Result<Dependencies>> {
    let mut dependencies = Dependencies::default();
    let mut pending: Vec<PendingSlot> = Vec::new();

    for (facet, models) in burden {
        if models.is_empty() {
            continue;
        }
        let mut slots = Vec::with_capacity(models.len());
        for (index, model) in models.iter().enumerate() {
            let Some(model) = model else {
                slots.push(Slot::Empty);
                continue;
            };
            match resolve_dependency(model, context) {
                Eventual::Ready(Ok(slot)) => slots.push(slot),
                Eventual::Ready(Err(error)) => return Eventual::err(error),
                Eventual::Pending(future) => {
                    slots.push(Slot::Empty);
                    pending.push((facet.clone(), index, future));
                }
            }
        }
        dependencies.insert(facet.clone(), slots);
    }

    if pending.is_empty() {
        return Eventual::ok(dependencies);
    }

    trace!(pending = pending.len(), "Dependencies resolving asynchronously");

    if pending.len() == 1 {
        if let Some((facet, index, future)) = pending.pop() {
            return Eventual::pending(async move {
                let slot = future.await?;
                dependencies.set(&facet, index, slot);
                Ok(dependencies)
            });
        }
    }

    Eventual::pending(async move {
        let (positions, futures): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .map(|(facet, index, future)| ((facet, index), future))
            .unzip();
        let slots = try_join_all(futures).await?;
        for ((facet, index), slot) in positions.into_iter().zip(slots) {
            dependencies.set(&facet, index, slot);
        }
        Ok(dependencies)
    })
}

/// 解析单个依赖
pub(crate) fn resolve_dependency(
    model: &DependencyModel,
    context: &ResolutionContext,
) -> Eventual<Result<Slot>> {
    let modifiers = model.modifiers();

    let key = match model.dependency() {
        Dependency::Key(key) if !modifiers.intersects(DependencyModifier::USE | DependencyModifier::DYNAMIC) => key,
        _ => return Eventual::Ready(resolve_literal(model, context)),
    };

    match key {
        Key::Composer => return Eventual::ok(Slot::Instance(Instance::new(context.composer.clone()))),
        Key::Container => {
            return Eventual::ok(Slot::Instance(Instance::new(ContainerView::new(
                context.composer.clone(),
            ))))
        }
        _ => {}
    }

    if modifiers.contains(DependencyModifier::EVERY | DependencyModifier::CHILD) {
        return Eventual::err(Error::ChildWithEvery { key: key.clone() });
    }

    if modifiers.contains(DependencyModifier::LAZY) {
        return Eventual::ok(Slot::Lazy(Lazy::new(model, context.composer.clone())));
    }

    resolve_key(key, modifiers, context)
}

fn resolve_literal(model: &DependencyModel, context: &ResolutionContext) -> Result<Slot> {
    let modifiers = model.modifiers();
    let value = match model.dependency() {
        Dependency::Key(key) => Some(Instance::new(key.clone())),
        Dependency::Value(instance) => Some(instance.clone()),
        Dependency::Function(function) if modifiers.contains(DependencyModifier::DYNAMIC) => {
            Some(function.call(&ContainerView::new(context.composer.clone()))?)
        }
        Dependency::Function(function) => Some(Instance::new(function.clone())),
        Dependency::Nothing => None,
    };

    let value = if modifiers.contains(DependencyModifier::CHILD) {
        Some(new_child(value, || describe(model))?)
    } else {
        value
    };

    let slot = Slot::from_option(value);
    if modifiers.contains(DependencyModifier::PROMISE) {
        Ok(Slot::Promise(Deferred::settled(Ok(slot))))
    } else {
        Ok(slot)
    }
}

fn resolve_key(
    key: &Key,
    modifiers: DependencyModifier,
    context: &ResolutionContext,
) -> Eventual<Result<Slot>> {
    let request = Arc::new(
        DependencyResolution::new(key.clone())
            .with_parent(context.parent.clone())
            .many(modifiers.contains(DependencyModifier::EVERY))
            .invariant(modifiers.contains(DependencyModifier::INVARIANT))
            .instant(context.instant),
    );

    let outcome = if request.is_many() {
        context.composer.resolve_all(request.clone()).map_ok(Slot::Many)
    } else {
        let optional = modifiers.contains(DependencyModifier::OPTIONAL);
        let child = modifiers.contains(DependencyModifier::CHILD);
        let failed = request.clone();
        context
            .composer
            .resolve(request.clone())
            .map(move |result| match result? {
                Some(instance) if child => {
                    new_child(Some(instance), || failed.key().to_string()).map(Slot::Instance)
                }
                Some(instance) => Ok(Slot::Instance(instance)),
                None if optional => Ok(Slot::Empty),
                None => Err(ResolutionError::new(failed).into()),
            })
    };

    settle(
        outcome,
        modifiers.contains(DependencyModifier::PROMISE),
        context.instant,
        request,
    )
}

/// 按 Promise 与即时性决定结果的交付形式
fn settle(
    outcome: Eventual<Result<Slot>>,
    promise: bool,
    instant: bool,
    request: Arc<DependencyResolution>,
) -> Eventual<Result<Slot>> {
    match outcome {
        Eventual::Ready(result) if promise => Eventual::ok(Slot::Promise(Deferred::settled(result))),
        Eventual::Pending(future) if promise => Eventual::ok(Slot::Promise(Deferred::new(future))),
        Eventual::Ready(Ok(slot)) => Eventual::ok(slot),
        Eventual::Ready(Err(error)) if instant || !error.is_resolution() => Eventual::err(error),
        Eventual::Ready(Err(error)) => Eventual::pending(async move { Err(error) }),
        Eventual::Pending(_) if instant => Eventual::err(ResolutionError::asynchronous(request).into()),
        Eventual::Pending(future) => Eventual::Pending(future),
    }
}

fn new_child(value: Option<Instance>, label: impl FnOnce() -> String) -> Result<Instance> {
    match value.as_ref().and_then(Instance::parenting) {
        Some(parent) => parent.new_child(),
        None => Err(Error::ChildUnsupported { key: label() }),
    }
}

fn describe(model: &DependencyModel) -> String {
    match model.dependency() {
        Dependency::Key(key) => key.to_string(),
        Dependency::Value(instance) => crate::key::short_name(instance.type_name()),
        Dependency::Function(_) => "function".to_string(),
        Dependency::Nothing => "nothing".to_string(),
    }
}
