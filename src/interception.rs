//! 拦截：带拦截器的组件由代理工厂创建
//!
//! 代理持有目标实例（如有）与解析得到的拦截器。调用方通过
//! [`Proxy::invoke`] 发起调用，拦截器按选择器筛选后的顺序包裹最终处理函数。

use std::fmt;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::eventual::Eventual;
use crate::instance::{Disposable, Instance};
use crate::key::Key;
use crate::model::{Facet, Factory, Implementation};
use crate::resolution::{Dependencies, Slot};

/// 一次方法调用
#[derive(Debug)]
pub struct Invocation<'a> {
    pub method: &'a str,
    pub args: Vec<Instance>,
    target: Option<&'a Instance>,
}

impl<'a> Invocation<'a> {
    pub fn target(&self) -> Option<&'a Instance> {
        self.target
    }
}

type Terminal<'a> = &'a (dyn Fn(&mut Invocation<'_>) -> Result<Option<Instance>> + Send + Sync);

/// 拦截链中剩余的部分
pub struct Next<'a> {
    chain: &'a [Arc<dyn Interceptor>],
    terminal: Terminal<'a>,
}

impl<'a> Next<'a> {
    pub fn proceed(self, invocation: &mut Invocation<'_>) -> Result<Option<Instance>> {
        match self.chain.split_first() {
            Some((interceptor, rest)) => interceptor.intercept(
                invocation,
                Next {
                    chain: rest,
                    terminal: self.terminal,
                },
            ),
            None => (self.terminal)(invocation),
        }
    }
}

pub trait Interceptor: Send + Sync {
    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Option<Instance>>;
}

/// 为某个方法挑选拦截器
pub trait InterceptorSelector: Send + Sync {
    fn select(&self, method: &str, interceptors: Vec<Arc<dyn Interceptor>>) -> Vec<Arc<dyn Interceptor>>;
}

/// 代理对象
pub struct Proxy {
    target: Option<Instance>,
    protocol: Option<Key>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    selectors: Vec<Arc<dyn InterceptorSelector>>,
}

impl Proxy {
    pub fn target(&self) -> Option<&Instance> {
        self.target.as_ref()
    }

    pub fn protocol(&self) -> Option<&Key> {
        self.protocol.as_ref()
    }

    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    /// 经过拦截器调用 `method`，`terminal` 执行真正的调用
    pub fn invoke<F>(&self, method: &str, args: Vec<Instance>, terminal: F) -> Result<Option<Instance>>
    where
        F: Fn(&mut Invocation<'_>) -> Result<Option<Instance>> + Send + Sync,
    {
        let interceptors = self
            .selectors
            .iter()
            .fold(self.interceptors.clone(), |selected, selector| {
                selector.select(method, selected)
            });
        let mut invocation = Invocation {
            method,
            args,
            target: self.target.as_ref(),
        };
        Next {
            chain: &interceptors,
            terminal: &terminal,
        }
        .proceed(&mut invocation)
    }
}

impl Disposable for Proxy {
    fn dispose(&self) {
        if let Some(target) = &self.target {
            target.dispose();
        }
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("target", &self.target)
            .field("protocol", &self.protocol)
            .field("interceptors", &self.interceptors.len())
            .field("selectors", &self.selectors.len())
            .finish()
    }
}

/// 构造代理工厂
pub trait ProxyBuilder: Send + Sync {
    fn build_factory(&self, implementation: Option<&Implementation>, protocol: Option<&Key>) -> Factory;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProxyBuilder;

impl DefaultProxyBuilder {
    fn collect<T: ?Sized>(
        dependencies: &Dependencies,
        facet: Facet,
        capability: impl Fn(&Instance) -> Option<&Arc<T>>,
        expected: &'static str,
    ) -> Result<Vec<Arc<T>>> {
        let mut collected = Vec::new();
        for slot in dependencies.facet(&facet) {
            let instances: &[Instance] = match slot {
                Slot::Instance(instance) => std::slice::from_ref(instance),
                Slot::Many(instances) => instances,
                _ => &[],
            };
            for instance in instances {
                let item = capability(instance).ok_or(Error::TypeMismatch {
                    expected,
                    actual: instance.type_name(),
                })?;
                collected.push(item.clone());
            }
        }
        Ok(collected)
    }
}

impl ProxyBuilder for DefaultProxyBuilder {
    fn build_factory(&self, implementation: Option<&Implementation>, protocol: Option<&Key>) -> Factory {
        let implementation = implementation.cloned();
        let protocol = protocol.cloned();
        Factory::new(move |dependencies, _| {
            let proxy = (|| -> Result<Proxy> {
                let target = implementation
                    .as_ref()
                    .map(|implementation| implementation.construct(dependencies))
                    .transpose()?;
                Ok(Proxy {
                    target,
                    protocol: protocol.clone(),
                    interceptors: Self::collect(
                        dependencies,
                        Facet::Interceptors,
                        Instance::interceptor,
                        "Interceptor",
                    )?,
                    selectors: Self::collect(
                        dependencies,
                        Facet::InterceptorSelectors,
                        Instance::interceptor_selector,
                        "InterceptorSelector",
                    )?,
                })
            })();
            Eventual::Ready(proxy.map(|proxy| Instance::builder(proxy).disposable().build()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor for Recorder {
        fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Option<Instance>> {
            self.log.lock().push(format!("{}:{}", self.name, invocation.method));
            next.proceed(invocation)
        }
    }

    struct SkipOnStop;

    impl InterceptorSelector for SkipOnStop {
        fn select(&self, method: &str, interceptors: Vec<Arc<dyn Interceptor>>) -> Vec<Arc<dyn Interceptor>> {
            if method == "stop" {
                Vec::new()
            } else {
                interceptors
            }
        }
    }

    #[test]
    fn proxy_runs_interceptors_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer = Instance::builder(Recorder { name: "outer", log: log.clone() }).interceptor().build();
        let inner = Instance::builder(Recorder { name: "inner", log: log.clone() }).interceptor().build();
        let selector = Instance::builder(SkipOnStop).interceptor_selector().build();

        let mut dependencies = Dependencies::default();
        dependencies.insert(Facet::Interceptors, vec![Slot::Instance(outer), Slot::Instance(inner)]);
        dependencies.insert(Facet::InterceptorSelectors, vec![Slot::Instance(selector)]);

        let factory = DefaultProxyBuilder.build_factory(None, Some(&Key::named("engine")));
        let composer: crate::composer::ComposerRef = Arc::new(crate::context::Context::new());
        let proxy = match factory.create(&dependencies, &composer) {
            Eventual::Ready(result) => result.expect("proxy"),
            Eventual::Pending(_) => panic!("proxy factory is synchronous"),
        };
        let proxy = proxy.downcast::<Proxy>().expect("proxy instance");
        assert_eq!(proxy.protocol(), Some(&Key::named("engine")));

        let result = proxy
            .invoke("start", Vec::new(), |invocation| {
                Ok(Some(Instance::new(format!("{} done", invocation.method))))
            })
            .expect("invoked");
        assert_eq!(result.and_then(|r| r.downcast::<String>()).as_deref().map(String::as_str), Some("start done"));
        assert_eq!(*log.lock(), vec!["outer:start".to_string(), "inner:start".to_string()]);

        proxy.invoke("stop", Vec::new(), |_| Ok(None)).expect("invoked");
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn non_interceptors_are_rejected() {
        let mut dependencies = Dependencies::default();
        dependencies.insert(Facet::Interceptors, vec![Slot::Instance(Instance::new(1u8))]);

        let factory = DefaultProxyBuilder.build_factory(None, None);
        let composer: crate::composer::ComposerRef = Arc::new(crate::context::Context::new());
        assert!(matches!(
            factory.create(&dependencies, &composer),
            Eventual::Ready(Err(Error::TypeMismatch { .. }))
        ));
    }
}
