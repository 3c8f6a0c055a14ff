use std::fmt;
use std::sync::Weak;

use super::ContainerInner;
use crate::key::Key;
use crate::resolution::HandlerId;

/// 注册句柄，可用于注销组件
#[derive(Clone)]
pub struct Registration {
    id: HandlerId,
    key: Key,
    container: Weak<ContainerInner>,
}

impl Registration {
    pub(super) fn new(id: HandlerId, key: Key, container: Weak<ContainerInner>) -> Self {
        Self { id, key, container }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// 移除组件并释放其生命周期；已注销或容器已销毁时返回 `false`
    pub fn unregister(&self) -> bool {
        match self.container.upgrade() {
            Some(container) => container.unregister(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("active", &(self.container.strong_count() > 0))
            .finish()
    }
}
