//! 组合器与处理器
//!
//! 组合器是解析的入口（通常是一个上下文），处理器（容器、组件提供者）
//! 按顺序尝试满足请求。

use std::any::{type_name, Any};
use std::future::IntoFuture;
use std::sync::Arc;

use futures_util::future::{try_join_all, FutureExt};

use crate::errors::{Error, ResolutionError, Result};
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::key::Key;
use crate::resolution::DependencyResolution;

/// 单个解析的结果：`None` 表示未处理
pub type Resolved = Result<Option<Instance>>;

/// 解析全部提供者的结果
pub type ResolvedAll = Result<Vec<Instance>>;

pub trait Composer: Send + Sync {
    fn resolve(&self, request: Arc<DependencyResolution>) -> Eventual<Resolved>;

    fn resolve_all(&self, request: Arc<DependencyResolution>) -> Eventual<ResolvedAll>;
}

pub type ComposerRef = Arc<dyn Composer>;

/// 处理器在组合器的协调下尝试满足请求
pub trait Handler: Send + Sync {
    fn resolve(&self, request: &Arc<DependencyResolution>, composer: &ComposerRef) -> Eventual<Resolved>;

    fn resolve_all(
        &self,
        request: &Arc<DependencyResolution>,
        composer: &ComposerRef,
    ) -> Eventual<ResolvedAll>;
}

/// 依次询问处理器，第一个给出结果（或错误）的胜出
pub(crate) fn resolve_first(
    handlers: Vec<Arc<dyn Handler>>,
    request: Arc<DependencyResolution>,
    composer: ComposerRef,
) -> Eventual<Resolved> {
    let mut remaining = handlers.into_iter();
    while let Some(handler) = remaining.next() {
        match handler.resolve(&request, &composer) {
            Eventual::Ready(Ok(None)) => continue,
            Eventual::Ready(result) => return Eventual::Ready(result),
            Eventual::Pending(future) => {
                let rest: Vec<_> = remaining.collect();
                return Eventual::pending(async move {
                    match future.await {
                        Ok(None) => resolve_first(rest, request, composer).await,
                        outcome => outcome,
                    }
                });
            }
        }
    }
    Eventual::ok(None)
}

/// 收集所有处理器的结果，按处理器顺序拼接
pub(crate) fn resolve_every(
    handlers: Vec<Arc<dyn Handler>>,
    request: Arc<DependencyResolution>,
    composer: ComposerRef,
) -> Eventual<ResolvedAll> {
    let outcomes: Vec<Eventual<ResolvedAll>> = handlers
        .iter()
        .map(|handler| handler.resolve_all(&request, &composer))
        .collect();

    if outcomes.iter().all(Eventual::is_ready) {
        let mut instances = Vec::new();
        for outcome in outcomes {
            match outcome {
                Eventual::Ready(Ok(resolved)) => instances.extend(resolved),
                Eventual::Ready(Err(error)) => return Eventual::err(error),
                Eventual::Pending(_) => {}
            }
        }
        return Eventual::ok(instances);
    }

    let futures: Vec<_> = outcomes.into_iter().map(|outcome| outcome.into_future()).collect();
    Eventual::pending(try_join_all(futures).map(|results| {
        results.map(|groups| groups.into_iter().flatten().collect())
    }))
}

/// 组合器之上的类型化门面
#[derive(Clone)]
pub struct ContainerView {
    composer: ComposerRef,
}

impl ContainerView {
    pub fn new(composer: ComposerRef) -> Self {
        Self { composer }
    }

    pub fn composer(&self) -> &ComposerRef {
        &self.composer
    }

    pub fn resolve(&self, key: impl Into<Key>) -> Eventual<Resolved> {
        self.resolve_request(DependencyResolution::new(key))
    }

    pub fn resolve_request(&self, request: DependencyResolution) -> Eventual<Resolved> {
        self.composer.resolve(Arc::new(request))
    }

    pub fn resolve_all(&self, key: impl Into<Key>) -> Eventual<ResolvedAll> {
        self.composer
            .resolve_all(Arc::new(DependencyResolution::new(key).many(true)))
    }

    /// 即时解析：任何依赖挂起都视为失败
    pub fn resolve_now(&self, key: impl Into<Key>) -> Resolved {
        let request = Arc::new(DependencyResolution::new(key).instant(true));
        match self.composer.resolve(request.clone()) {
            Eventual::Ready(result) => result,
            Eventual::Pending(_) => Err(ResolutionError::asynchronous(request).into()),
        }
    }

    /// 解析并向下转型
    pub async fn resolve_as<T: Any + Send + Sync>(&self, key: impl Into<Key>) -> Result<Option<Arc<T>>> {
        match self.resolve(key).await? {
            Some(instance) => instance
                .downcast::<T>()
                .map(Some)
                .ok_or(Error::TypeMismatch {
                    expected: type_name::<T>(),
                    actual: instance.type_name(),
                }),
            None => Ok(None),
        }
    }

    /// 以类型本身为键解析
    pub async fn get<T: Any + Send + Sync>(&self) -> Result<Option<Arc<T>>> {
        self.resolve_as::<T>(Key::of::<T>()).await
    }
}

impl Composer for ContainerView {
    fn resolve(&self, request: Arc<DependencyResolution>) -> Eventual<Resolved> {
        self.composer.resolve(request)
    }

    fn resolve_all(&self, request: Arc<DependencyResolution>) -> Eventual<ResolvedAll> {
        self.composer.resolve_all(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Fixed {
        key: Key,
        value: Instance,
        delayed: bool,
        calls: Mutex<usize>,
    }

    impl Fixed {
        fn new(key: &str, value: Instance, delayed: bool) -> Arc<Self> {
            Arc::new(Self {
                key: Key::named(key),
                value,
                delayed,
                calls: Mutex::new(0),
            })
        }
    }

    impl Handler for Fixed {
        fn resolve(&self, request: &Arc<DependencyResolution>, _: &ComposerRef) -> Eventual<Resolved> {
            *self.calls.lock() += 1;
            let value = (request.key() == &self.key).then(|| self.value.clone());
            if self.delayed {
                Eventual::pending(async move { Ok(value) })
            } else {
                Eventual::ok(value)
            }
        }

        fn resolve_all(&self, request: &Arc<DependencyResolution>, composer: &ComposerRef) -> Eventual<ResolvedAll> {
            self.resolve(request, composer)
                .map_ok(|value| value.into_iter().collect())
        }
    }

    struct Chain(Vec<Arc<dyn Handler>>);

    impl Composer for Chain {
        fn resolve(&self, request: Arc<DependencyResolution>) -> Eventual<Resolved> {
            resolve_first(self.0.clone(), request, Arc::new(Chain(self.0.clone())))
        }

        fn resolve_all(&self, request: Arc<DependencyResolution>) -> Eventual<ResolvedAll> {
            resolve_every(self.0.clone(), request, Arc::new(Chain(self.0.clone())))
        }
    }

    #[tokio::test]
    async fn falls_through_unhandled_pending_results() {
        let first = Fixed::new("other", Instance::new(1u8), true);
        let second = Fixed::new("engine", Instance::new(2u8), false);
        let handlers: Vec<Arc<dyn Handler>> = vec![first.clone(), second.clone()];
        let view = ContainerView::new(Arc::new(Chain(handlers)));

        let engine = view.resolve_as::<u8>("engine").await.expect("resolved");
        assert_eq!(engine.as_deref(), Some(&2));
        assert_eq!(*first.calls.lock(), 1);
        assert_eq!(*second.calls.lock(), 1);
    }

    #[test]
    fn first_handled_result_wins() {
        let first = Fixed::new("engine", Instance::new(1u8), false);
        let second = Fixed::new("engine", Instance::new(2u8), false);
        let handlers: Vec<Arc<dyn Handler>> = vec![first, second.clone()];
        let view = ContainerView::new(Arc::new(Chain(handlers)));

        let engine = view.resolve_now("engine").expect("resolved").expect("handled");
        assert_eq!(engine.downcast_ref::<u8>(), Some(&1));
        assert_eq!(*second.calls.lock(), 0);
    }

    #[tokio::test]
    async fn resolve_all_concatenates_in_order() {
        let handlers: Vec<Arc<dyn Handler>> = vec![
            Fixed::new("wheel", Instance::new(1u8), true),
            Fixed::new("wheel", Instance::new(2u8), false),
            Fixed::new("door", Instance::new(3u8), false),
        ];
        let view = ContainerView::new(Arc::new(Chain(handlers)));

        let wheels = view.resolve_all("wheel").await.expect("resolved");
        let values: Vec<u8> = wheels.iter().filter_map(|w| w.downcast_ref::<u8>().copied()).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn resolve_now_rejects_asynchronous_results() {
        let handlers: Vec<Arc<dyn Handler>> = vec![Fixed::new("engine", Instance::new(1u8), true)];
        let view = ContainerView::new(Arc::new(Chain(handlers)));
        assert!(matches!(view.resolve_now("engine"), Err(Error::Resolution(_))));
    }
}
