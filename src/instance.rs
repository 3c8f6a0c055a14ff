//! 类型擦除的组件实例及其能力

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::context::{Context, ContextBinding};
use crate::errors::Result;
use crate::eventual::Eventual;
use crate::interception::{Interceptor, InterceptorSelector};
use crate::lifestyle::tracking::TrackedDisposal;
use crate::model::ComponentModel;

/// 可释放
pub trait Disposable: Send + Sync {
    fn dispose(&self);
}

/// 创建后需要初始化，初始化可以是异步的
pub trait Initializable: Send + Sync {
    fn initialize(&self) -> Eventual<Result<()>>;
}

/// 能够派生子实例（用于 Child 修饰的依赖）
pub trait Parenting: Send + Sync {
    fn new_child(&self) -> Result<Instance>;
}

/// 希望在创建后得到自身组件模型的实例
pub trait ComponentModelAware: Send + Sync {
    fn set_component_model(&self, model: Arc<ComponentModel>);
}

/// 实例标识，同一个底层值的所有克隆共享同一个标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

#[derive(Clone, Default)]
struct Capabilities {
    disposable: Option<Arc<dyn Disposable>>,
    initializable: Option<Arc<dyn Initializable>>,
    parenting: Option<Arc<dyn Parenting>>,
    model_aware: Option<Arc<dyn ComponentModelAware>>,
    interceptor: Option<Arc<dyn Interceptor>>,
    selector: Option<Arc<dyn InterceptorSelector>>,
    tracker: Option<Arc<TrackedDisposal>>,
    binding: Option<Arc<ContextBinding>>,
}

/// 组件实例
///
/// 克隆是廉价的，所有克隆指向同一个值。
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    capabilities: Capabilities,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
            capabilities: Capabilities::default(),
        }
    }

    pub fn builder<T: Any + Send + Sync>(value: T) -> InstanceBuilder<T> {
        InstanceBuilder {
            value: Arc::new(value),
            capabilities: Capabilities::default(),
        }
    }

    pub fn id(&self) -> InstanceId {
        InstanceId(Arc::as_ptr(&self.value) as *const () as usize)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        self.id() == other.id()
    }

    pub fn is_disposable(&self) -> bool {
        self.capabilities.disposable.is_some()
    }

    /// 释放实例
    ///
    /// 受生命周期管理的实例会先征询其生命周期；返回 `false` 表示实例不可释放。
    pub fn dispose(&self) -> bool {
        match &self.capabilities.disposable {
            Some(disposable) => {
                disposable.dispose();
                true
            }
            None => false,
        }
    }

    /// 当前绑定的上下文（仅上下文生命周期的实例）
    pub fn context(&self) -> Option<Context> {
        self.capabilities
            .binding
            .as_ref()
            .and_then(|binding| binding.context())
    }

    /// 设置上下文：相同则忽略，`None` 解除绑定并释放，其他值报错
    pub fn set_context(&self, context: Option<&Context>) -> Result<()> {
        match &self.capabilities.binding {
            Some(binding) => binding.set_context(context),
            None => Ok(()),
        }
    }

    pub fn is_context_bound(&self) -> bool {
        self.capabilities.binding.is_some()
    }

    pub(crate) fn initializer(&self) -> Option<&Arc<dyn Initializable>> {
        self.capabilities.initializable.as_ref()
    }

    pub(crate) fn parenting(&self) -> Option<&Arc<dyn Parenting>> {
        self.capabilities.parenting.as_ref()
    }

    pub(crate) fn model_aware(&self) -> Option<&Arc<dyn ComponentModelAware>> {
        self.capabilities.model_aware.as_ref()
    }

    pub fn interceptor(&self) -> Option<&Arc<dyn Interceptor>> {
        self.capabilities.interceptor.as_ref()
    }

    pub fn interceptor_selector(&self) -> Option<&Arc<dyn InterceptorSelector>> {
        self.capabilities.selector.as_ref()
    }

    pub(crate) fn disposer(&self) -> Option<Arc<dyn Disposable>> {
        self.capabilities.disposable.clone()
    }

    /// 用生命周期的释放包装替换原有的释放能力
    pub(crate) fn with_tracker(&self, tracker: Arc<TrackedDisposal>) -> Instance {
        let mut instance = self.clone();
        instance.capabilities.disposable = Some(tracker.clone());
        instance.capabilities.tracker = Some(tracker);
        instance
    }

    pub(crate) fn with_binding(&self, binding: Arc<ContextBinding>) -> Instance {
        let mut instance = self.clone();
        instance.capabilities.binding = Some(binding);
        instance
    }

    /// 生命周期内部的真正释放，绕过释放征询
    pub(crate) fn release(&self) {
        match (&self.capabilities.tracker, &self.capabilities.disposable) {
            (Some(tracker), _) => tracker.release(),
            (None, Some(disposable)) => disposable.dispose(),
            (None, None) => {}
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name)
            .field("id", &self.id())
            .field("disposable", &self.is_disposable())
            .field("context_bound", &self.is_context_bound())
            .finish()
    }
}

/// 声明实例能力
pub struct InstanceBuilder<T> {
    value: Arc<T>,
    capabilities: Capabilities,
}

impl<T: Any + Send + Sync> InstanceBuilder<T> {
    pub fn disposable(mut self) -> Self
    where
        T: Disposable,
    {
        self.capabilities.disposable = Some(self.value.clone());
        self
    }

    pub fn initializable(mut self) -> Self
    where
        T: Initializable,
    {
        self.capabilities.initializable = Some(self.value.clone());
        self
    }

    pub fn parenting(mut self) -> Self
    where
        T: Parenting,
    {
        self.capabilities.parenting = Some(self.value.clone());
        self
    }

    pub fn model_aware(mut self) -> Self
    where
        T: ComponentModelAware,
    {
        self.capabilities.model_aware = Some(self.value.clone());
        self
    }

    pub fn interceptor(mut self) -> Self
    where
        T: Interceptor,
    {
        self.capabilities.interceptor = Some(self.value.clone());
        self
    }

    pub fn interceptor_selector(mut self) -> Self
    where
        T: InterceptorSelector,
    {
        self.capabilities.selector = Some(self.value.clone());
        self
    }

    pub fn build(self) -> Instance {
        Instance {
            value: self.value,
            type_name: type_name::<T>(),
            capabilities: self.capabilities,
        }
    }
}
