use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::dependency::RawDependency;
use crate::errors::Result;
use crate::instance::Instance;
use crate::key::Key;
use crate::policy::ComponentPolicy;
use crate::resolution::{Arguments, Dependencies};

/// 可由容器构造的类型
///
/// 构造参数按 `dependencies()` 声明的顺序出现在 [`Arguments`] 中。
pub trait Injectable: Any + Send + Sync + Sized {
    /// 声明的构造参数
    fn dependencies() -> Vec<RawDependency> {
        Vec::new()
    }

    /// 该类型实现的协议
    fn protocols() -> Vec<Key> {
        Vec::new()
    }

    /// 类型自带的组件策略
    fn policies() -> Vec<Arc<dyn ComponentPolicy>> {
        Vec::new()
    }

    fn construct(args: &Arguments<'_>) -> Result<Self>;

    /// 包装为实例，需要声明能力的类型可覆盖
    fn into_instance(self) -> Instance {
        Instance::new(self)
    }
}

type Constructor = Arc<dyn Fn(&Dependencies) -> Result<Instance> + Send + Sync>;

/// 类型擦除的实现描述
#[derive(Clone)]
pub struct Implementation {
    key: Key,
    parameters: Vec<RawDependency>,
    protocols: Vec<Key>,
    policies: Vec<Arc<dyn ComponentPolicy>>,
    constructor: Constructor,
}

impl Implementation {
    pub fn of<T: Injectable>() -> Self {
        Self {
            key: Key::of::<T>(),
            parameters: T::dependencies(),
            protocols: T::protocols(),
            policies: T::policies(),
            constructor: Arc::new(|dependencies: &Dependencies| {
                T::construct(&dependencies.parameters()).map(T::into_instance)
            }),
        }
    }

    /// 以任意构造函数描述类型 `T`
    pub fn new<T, F>(constructor: F) -> Self
    where
        T: Any + ?Sized,
        F: Fn(&Dependencies) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            key: Key::of::<T>(),
            parameters: Vec::new(),
            protocols: Vec::new(),
            policies: Vec::new(),
            constructor: Arc::new(constructor),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<RawDependency>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_protocols(mut self, protocols: Vec<Key>) -> Self {
        self.protocols = protocols;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn ComponentPolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn name(&self) -> String {
        self.key.to_string()
    }

    pub fn parameters(&self) -> &[RawDependency] {
        &self.parameters
    }

    pub fn protocols(&self) -> &[Key] {
        &self.protocols
    }

    pub fn policies(&self) -> &[Arc<dyn ComponentPolicy>] {
        &self.policies
    }

    pub fn construct(&self, dependencies: &Dependencies) -> Result<Instance> {
        (self.constructor)(dependencies)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("key", &self.key)
            .field("parameters", &self.parameters.len())
            .field("protocols", &self.protocols)
            .finish()
    }
}
