//! 上下文：解析的入口与上下文生命周期的作用域
//!
//! 上下文组成一棵树。结束一个上下文会先结束它的所有子上下文，
//! 然后通知注册的回调（上下文生命周期借此释放实例）。

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::composer::{
    resolve_every, resolve_first, Composer, ComposerRef, ContainerView, Handler, Resolved,
    ResolvedAll,
};
use crate::errors::{Error, Result};
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::key::Key;
use crate::resolution::DependencyResolution;

/// 上下文状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// 可以使用
    Active,
    /// 正在结束
    Ending,
    /// 已结束，不能继续使用
    Ended,
}

type EndedCallback = Box<dyn FnOnce(&Context) + Send>;

struct Lifecycle {
    state: ContextState,
    ended_at: Option<Instant>,
    callbacks: Vec<EndedCallback>,
}

struct ContextInner {
    id: Uuid,
    name: String,
    parent: Option<Context>,
    created_at: Instant,
    lifecycle: Mutex<Lifecycle>,
    children: Mutex<Vec<Weak<ContextInner>>>,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
}

/// 解析上下文
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub fn new() -> Self {
        Self::create("root".to_string(), None)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::create(name.into(), None)
    }

    fn create(name: String, parent: Option<Context>) -> Self {
        let context = Self {
            inner: Arc::new(ContextInner {
                id: Uuid::new_v4(),
                name,
                parent,
                created_at: Instant::now(),
                lifecycle: Mutex::new(Lifecycle {
                    state: ContextState::Active,
                    ended_at: None,
                    callbacks: Vec::new(),
                }),
                children: Mutex::new(Vec::new()),
                handlers: RwLock::new(Vec::new()),
            }),
        };
        debug!(context = %context.id(), name = %context.name(), "Context created");
        context
    }

    /// 创建子上下文，子上下文可以看到父上下文的处理器
    pub fn new_child(&self) -> Context {
        self.new_child_named(format!("{}/child", self.inner.name))
    }

    pub fn new_child_named(&self, name: impl Into<String>) -> Context {
        let child = Self::create(name.into(), Some(self.clone()));
        let mut children = self.inner.children.lock();
        children.retain(|child| child.strong_count() > 0);
        children.push(Arc::downgrade(&child.inner));
        child
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    pub fn state(&self) -> ContextState {
        self.inner.lifecycle.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == ContextState::Active
    }

    /// 存活子上下文数量
    pub fn child_count(&self) -> usize {
        self.inner
            .children
            .lock()
            .iter()
            .filter(|child| child.strong_count() > 0)
            .count()
    }

    /// 从创建到结束（或到现在）的时长
    pub fn duration(&self) -> Duration {
        match self.inner.lifecycle.lock().ended_at {
            Some(ended_at) => ended_at - self.inner.created_at,
            None => self.inner.created_at.elapsed(),
        }
    }

    pub fn add_handler(&self, handler: Arc<dyn Handler>) -> &Self {
        self.inner.handlers.write().push(handler);
        self
    }

    /// 上下文结束时调用；已结束的上下文立即调用
    pub fn on_ended<F>(&self, callback: F)
    where
        F: FnOnce(&Context) + Send + 'static,
    {
        let mut lifecycle = self.inner.lifecycle.lock();
        if lifecycle.state == ContextState::Active {
            lifecycle.callbacks.push(Box::new(callback));
            return;
        }
        drop(lifecycle);
        callback(self);
    }

    /// 结束上下文：先结束子上下文，再执行回调
    pub fn end(&self) {
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            if lifecycle.state != ContextState::Active {
                return;
            }
            lifecycle.state = ContextState::Ending;
        }

        let children: Vec<Context> = self
            .inner
            .children
            .lock()
            .drain(..)
            .filter_map(|child| child.upgrade())
            .map(|inner| Context { inner })
            .collect();
        for child in children {
            child.end();
        }

        let callbacks = std::mem::take(&mut self.inner.lifecycle.lock().callbacks);
        let notified = callbacks.len();
        for callback in callbacks {
            callback(self);
        }

        {
            let mut lifecycle = self.inner.lifecycle.lock();
            lifecycle.state = ContextState::Ended;
            lifecycle.ended_at = Some(Instant::now());
        }

        debug!(
            context = %self.id(),
            name = %self.name(),
            callbacks = notified,
            duration_ms = self.duration().as_millis() as u64,
            "Context ended"
        );
    }

    pub fn composer(&self) -> ComposerRef {
        Arc::new(self.clone())
    }

    /// 类型化解析门面
    pub fn view(&self) -> ContainerView {
        ContainerView::new(self.composer())
    }

    /// 本上下文的处理器在前，祖先的处理器在后
    fn handler_chain(&self) -> Vec<Arc<dyn Handler>> {
        let mut handlers = Vec::new();
        let mut current = Some(self);
        while let Some(context) = current {
            handlers.extend(context.inner.handlers.read().iter().cloned());
            current = context.parent();
        }
        handlers
    }

    fn is_context_request(request: &DependencyResolution) -> bool {
        request.key() == &Key::of::<Context>()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("state", &self.state())
            .field("parent", &self.parent().map(Context::id))
            .finish()
    }
}

impl Composer for Context {
    fn resolve(&self, request: Arc<DependencyResolution>) -> Eventual<Resolved> {
        if Self::is_context_request(&request) {
            return Eventual::ok(self.is_active().then(|| Instance::new(self.clone())));
        }
        resolve_first(self.handler_chain(), request, self.composer())
    }

    fn resolve_all(&self, request: Arc<DependencyResolution>) -> Eventual<ResolvedAll> {
        if Self::is_context_request(&request) {
            let this = self.is_active().then(|| Instance::new(self.clone()));
            return Eventual::ok(this.into_iter().collect());
        }
        resolve_every(self.handler_chain(), request, self.composer())
    }
}

/// 上下文生命周期实例的上下文绑定
///
/// 设置为相同上下文无效果，设置为 `None` 解除绑定并触发释放，
/// 设置为其他上下文报错。
pub struct ContextBinding {
    context: Mutex<Option<Context>>,
    on_detach: Box<dyn Fn() + Send + Sync>,
}

impl ContextBinding {
    pub(crate) fn new<F>(context: Context, on_detach: F) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::new(Self {
            context: Mutex::new(Some(context)),
            on_detach: Box::new(on_detach),
        })
    }

    pub fn context(&self) -> Option<Context> {
        self.context.lock().clone()
    }

    pub fn set_context(&self, context: Option<&Context>) -> Result<()> {
        let mut current = self.context.lock();
        match (current.as_ref(), context) {
            (Some(bound), Some(requested)) if bound == requested => Ok(()),
            (_, Some(_)) => Err(Error::ContextReassigned),
            (None, None) => Ok(()),
            (Some(_), None) => {
                *current = None;
                drop(current);
                (self.on_detach)();
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ContextBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBinding")
            .field("context", &self.context().map(|c| c.id()))
            .finish()
    }
}
