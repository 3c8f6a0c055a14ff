use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::{debug, trace};
use uuid::Uuid;

use super::cell::InstanceCell;
use super::tracking::track;
use super::{Commit, Committed, Creation, Lifestyle};
use crate::composer::{ComposerRef, Resolved};
use crate::context::{Context, ContextBinding};
use crate::eventual::Eventual;
use crate::instance::{Instance, InstanceId};
use crate::key::Key;
use crate::resolution::DependencyResolution;

/// 上下文生命周期：每个上下文一个实例
///
/// 实例与创建它的上下文绑定，上下文结束时释放；无法解析到上下文时
/// 视为未处理，而不是失败。
pub struct Contextual {
    me: Weak<Contextual>,
    cache: DashMap<Uuid, Arc<InstanceCell>>,
}

impl Contextual {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            cache: DashMap::new(),
        })
    }

    /// 指定上下文缓存的实例
    pub fn instance(&self, context: &Context) -> Option<Instance> {
        self.cache
            .get(&context.id())
            .and_then(|cell| cell.cached())
    }

    /// 缓存的上下文数量
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn lookup_context(composer: &ComposerRef) -> Option<Context> {
        let request = Arc::new(DependencyResolution::new(Key::of::<Context>()));
        match composer.resolve(request) {
            Eventual::Ready(Ok(Some(instance))) => {
                instance.downcast::<Context>().map(|context| (*context).clone())
            }
            _ => None,
        }
    }

    /// 跟踪释放并绑定上下文
    fn bind(owner: Weak<Contextual>, context: &Context, instance: Instance) -> Instance {
        let lifestyle: Weak<dyn Lifestyle> = owner.clone();
        let tracked = track(instance, lifestyle);

        let context_id = context.id();
        let instance_id = tracked.id();
        let binding = ContextBinding::new(context.clone(), move || {
            if let Some(contextual) = owner.upgrade() {
                contextual.detach(context_id, instance_id);
            }
        });

        let weak_binding = Arc::downgrade(&binding);
        context.on_ended(move |_| {
            if let Some(binding) = weak_binding.upgrade() {
                let _ = binding.set_context(None);
            }
        });

        tracked.with_binding(binding)
    }

    /// 上下文解除后释放实例
    fn detach(&self, context_id: Uuid, id: InstanceId) {
        let taken = self
            .cache
            .get(&context_id)
            .and_then(|cell| cell.take_if(id));
        if let Some(instance) = taken {
            debug!(context = %context_id, instance = instance.type_name(), "Releasing contextual instance");
            instance.release();
        }
        self.evict_unused(context_id);
    }

    /// 移除空的、且没有解析正在使用的缓存格
    fn evict_unused(&self, context_id: Uuid) {
        self.cache
            .remove_if(&context_id, |_, cell| cell.is_empty() && Arc::strong_count(cell) == 1);
    }

    /// 创建完成时上下文已经结束：结束回调找不到缓存的实例，
    /// 因此提交后由这里取出并释放
    fn release_if_ended(creation: Creation, cell: Arc<InstanceCell>) -> Creation {
        Box::new(move |commit: Commit| {
            creation(Box::new(move |instance| match commit(instance) {
                Committed::Accepted(instance) if instance.context().is_none() => {
                    if let Some(stale) = cell.take_if(instance.id()) {
                        debug!(instance = stale.type_name(), "Context ended during creation, releasing");
                        stale.release();
                    }
                    Committed::Accepted(instance)
                }
                committed => committed,
            }))
        })
    }
}

impl Lifestyle for Contextual {
    fn resolve(&self, creation: Creation, composer: &ComposerRef) -> Eventual<Resolved> {
        let Some(context) = Self::lookup_context(composer) else {
            trace!("No context available, contextual component not resolved");
            return Eventual::ok(None);
        };

        let context_id = context.id();
        let outcome = {
            let cell = self.cache.entry(context_id).or_default().clone();
            let owner = self.me.clone();
            let creation = Self::release_if_ended(creation, cell.clone());
            cell.resolve(
                creation,
                Arc::new(move |instance| Contextual::bind(owner.clone(), &context, instance)),
            )
        };

        let owner = self.me.clone();
        outcome.map(move |result| {
            if let Some(contextual) = owner.upgrade() {
                contextual.evict_unused(context_id);
            }
            result
        })
    }

    fn dispose_instance(&self, id: InstanceId, disposing: bool) -> bool {
        let found = self
            .cache
            .iter()
            .find(|entry| entry.value().holds(id))
            .map(|entry| (*entry.key(), entry.value().clone()));

        let Some((context_id, cell)) = found else {
            return false;
        };
        let taken = cell.take_if(id);
        drop(cell);
        if let Some(instance) = taken {
            if disposing {
                instance.release();
            }
        }
        self.evict_unused(context_id);
        true
    }

    fn dispose(&self) {
        let cells: Vec<Arc<InstanceCell>> = self
            .cache
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.cache.clear();
        for cell in cells {
            if let Some(instance) = cell.take() {
                instance.release();
            }
        }
    }

    fn name(&self) -> &'static str {
        "contextual"
    }
}
