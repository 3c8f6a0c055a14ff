use std::sync::{Arc, Weak};

use tracing::debug;

use super::cell::InstanceCell;
use super::tracking::track;
use super::{Creation, Lifestyle};
use crate::composer::{ComposerRef, Resolved};
use crate::eventual::Eventual;
use crate::instance::{Instance, InstanceId};

/// 单例：首次解析创建，之后始终返回同一个实例
///
/// 并发的首次解析只会产生一个被缓存的实例。
pub struct Singleton {
    me: Weak<Singleton>,
    cell: Arc<InstanceCell>,
}

impl Singleton {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            cell: Arc::new(InstanceCell::default()),
        })
    }

    /// 当前缓存的实例
    pub fn instance(&self) -> Option<Instance> {
        self.cell.cached()
    }
}

impl Lifestyle for Singleton {
    fn resolve(&self, creation: Creation, _composer: &ComposerRef) -> Eventual<Resolved> {
        let owner: Weak<dyn Lifestyle> = self.me.clone();
        self.cell
            .resolve(creation, Arc::new(move |instance| track(instance, owner.clone())))
    }

    fn dispose_instance(&self, id: InstanceId, disposing: bool) -> bool {
        match self.cell.take_if(id) {
            Some(instance) => {
                if disposing {
                    instance.release();
                }
                true
            }
            None => false,
        }
    }

    fn dispose(&self) {
        if let Some(instance) = self.cell.take() {
            debug!(instance = instance.type_name(), "Disposing singleton");
            instance.release();
        }
    }

    fn name(&self) -> &'static str {
        "singleton"
    }
}
