use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::key::Key;

/// 处理器标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        HandlerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
struct Claim {
    handler: HandlerId,
    type_name: Arc<str>,
}

/// 依赖解析请求
///
/// 每个节点指向发起它的父节点，整条链用于循环检测和错误诊断。
pub struct DependencyResolution {
    key: Key,
    many: bool,
    instant: bool,
    invariant: bool,
    parent: Option<Arc<DependencyResolution>>,
    claim: Mutex<Option<Claim>>,
}

impl DependencyResolution {
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            many: false,
            instant: false,
            invariant: false,
            parent: None,
            claim: Mutex::new(None),
        }
    }

    pub fn with_parent(mut self, parent: Option<Arc<DependencyResolution>>) -> Self {
        self.parent = parent;
        self
    }

    pub fn many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }

    pub fn instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    pub fn invariant(mut self, invariant: bool) -> Self {
        self.invariant = invariant;
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn is_many(&self) -> bool {
        self.many
    }

    pub fn is_instant(&self) -> bool {
        self.instant
    }

    pub fn is_invariant(&self) -> bool {
        self.invariant
    }

    pub fn parent(&self) -> Option<&Arc<DependencyResolution>> {
        self.parent.as_ref()
    }

    /// 最近一次认领该请求的处理器
    pub fn handler(&self) -> Option<HandlerId> {
        self.claim.lock().as_ref().map(|claim| claim.handler)
    }

    /// 最近一次认领该请求的实现名称
    pub fn claimed_type(&self) -> Option<Arc<str>> {
        self.claim.lock().as_ref().map(|claim| claim.type_name.clone())
    }

    /// 认领请求；若该处理器已在本节点或祖先链上解析，则拒绝（循环）
    ///
    /// 成功的认领覆盖之前的认领，`resolve_all` 中后一个处理器不会被前一个阻挡。
    pub fn claim(&self, handler: HandlerId, type_name: impl Into<Arc<str>>) -> bool {
        if self.is_resolving_dependency(handler) {
            return false;
        }
        *self.claim.lock() = Some(Claim {
            handler,
            type_name: type_name.into(),
        });
        true
    }

    /// 处理器放弃请求时撤销自己的认领
    pub(crate) fn release_claim(&self, handler: HandlerId) {
        let mut claim = self.claim.lock();
        if claim.as_ref().is_some_and(|claim| claim.handler == handler) {
            *claim = None;
        }
    }

    pub fn is_resolving_dependency(&self, handler: HandlerId) -> bool {
        self.chain().any(|node| node.handler() == Some(handler))
    }

    /// 从本节点到根节点
    pub fn chain(&self) -> impl Iterator<Item = &DependencyResolution> {
        std::iter::successors(Some(self), |node| node.parent.as_deref())
    }

    /// 形如 `(Engine) <= (Car <- Car)` 的依赖链
    pub fn formatted_dependency_chain(&self) -> String {
        self.chain()
            .map(DependencyResolution::format_node)
            .collect::<Vec<_>>()
            .join(" <= ")
    }

    fn format_node(&self) -> String {
        let key = if self.invariant {
            format!("`{}`", self.key)
        } else {
            self.key.to_string()
        };
        match self.claimed_type() {
            Some(type_name) => format!("({key} <- {type_name})"),
            None => format!("({key})"),
        }
    }
}

impl fmt::Debug for DependencyResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyResolution")
            .field("key", &self.key)
            .field("many", &self.many)
            .field("instant", &self.instant)
            .field("invariant", &self.invariant)
            .field("chain", &self.formatted_dependency_chain())
            .finish()
    }
}
