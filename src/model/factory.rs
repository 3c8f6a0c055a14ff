use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::composer::ComposerRef;
use crate::errors::Result;
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::resolution::Dependencies;

use super::Implementation;

type FactoryFn = dyn Fn(&Dependencies, &ComposerRef) -> Eventual<Result<Instance>> + Send + Sync;

/// 组件工厂：由已解析的依赖构造原始实例
#[derive(Clone)]
pub struct Factory(Arc<FactoryFn>);

impl Factory {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Dependencies, &ComposerRef) -> Eventual<Result<Instance>> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// 同步工厂
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<Instance> + Send + Sync + 'static,
    {
        Self::new(move |dependencies, _| Eventual::Ready(f(dependencies)))
    }

    /// 异步工厂
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Dependencies, ComposerRef) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Instance>> + Send + 'static,
    {
        Self::new(move |dependencies, composer| {
            Eventual::pending(f(dependencies.clone(), composer.clone()))
        })
    }

    /// 调用实现类型的构造函数
    pub fn constructor(implementation: Implementation) -> Self {
        Self::from_fn(move |dependencies| implementation.construct(dependencies))
    }

    pub fn create(
        &self,
        dependencies: &Dependencies,
        composer: &ComposerRef,
    ) -> Eventual<Result<Instance>> {
        (self.0)(dependencies, composer)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Factory")
    }
}
