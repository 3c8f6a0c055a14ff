use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;

use super::Lifestyle;
use crate::instance::{Disposable, Instance, InstanceId};

/// 受生命周期管理的释放
///
/// 外部的释放请求先征询生命周期；生命周期内部的释放直接执行，且只执行一次。
/// 内部释放之后包装失效，释放请求直接转给实例。
pub(crate) struct TrackedDisposal {
    inner: Arc<dyn Disposable>,
    owner: Weak<dyn Lifestyle>,
    id: InstanceId,
    released: AtomicBool,
}

impl TrackedDisposal {
    pub(crate) fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.inner.dispose();
        }
    }
}

impl Disposable for TrackedDisposal {
    fn dispose(&self) {
        if self.released.load(Ordering::Acquire) {
            self.inner.dispose();
            return;
        }
        let permitted = match self.owner.upgrade() {
            Some(owner) => owner.dispose_instance(self.id, false),
            None => true,
        };
        if permitted {
            self.release();
        } else {
            debug!(instance = ?self.id, "Disposal of managed instance refused");
        }
    }
}

/// 为可释放实例挂上生命周期的释放包装
pub(crate) fn track(instance: Instance, owner: Weak<dyn Lifestyle>) -> Instance {
    match instance.disposer() {
        Some(inner) => {
            let tracker = Arc::new(TrackedDisposal {
                inner,
                owner,
                id: instance.id(),
                released: AtomicBool::new(false),
            });
            instance.with_tracker(tracker)
        }
        None => instance,
    }
}
