//! 容器的端到端行为：构造注入、缺失依赖、策略顺序、上下文释放

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ioc_kernel::dependency::{every, lazy, literal, optional, promise};
use ioc_kernel::{
    Arguments, ComponentModel, ComponentPolicy, ComposerRef, Contextual, Dependencies, Disposable,
    Error, Eventual, Factory, Injectable, Instance, IocContainer, Key, RawDependency, Result,
    Transient,
};
use parking_lot::Mutex;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone)]
struct Engine {
    horsepower: u32,
    displacement: f64,
}

impl Injectable for Engine {
    fn dependencies() -> Vec<RawDependency> {
        vec![literal(917u32), literal(6.3f64)]
    }

    fn construct(args: &Arguments<'_>) -> Result<Self> {
        Ok(Engine {
            horsepower: args.value::<u32>(0)?,
            displacement: args.value::<f64>(1)?,
        })
    }
}

struct Car {
    engine: Arc<Engine>,
}

impl Injectable for Car {
    fn dependencies() -> Vec<RawDependency> {
        vec![Key::of::<Engine>().into()]
    }

    fn construct(args: &Arguments<'_>) -> Result<Self> {
        Ok(Car {
            engine: args.get::<Engine>(0)?,
        })
    }
}

#[tokio::test]
async fn test_literal_constructor_arguments() {
    let container = IocContainer::new();
    container.register::<Engine>().unwrap();

    let engine = container.view().get::<Engine>().await.unwrap().unwrap();
    assert_eq!(engine.horsepower, 917);
    assert!((engine.displacement - 6.3).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_nested_component_is_injected() {
    let container = IocContainer::new();
    container.register::<Engine>().unwrap();
    container.register::<Car>().unwrap();

    let view = container.view();
    let car = view.get::<Car>().await.unwrap().unwrap();
    let engine = view.get::<Engine>().await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&car.engine, &engine));
}

#[tokio::test]
async fn test_missing_dependency_names_failing_key() {
    let container = IocContainer::new();
    container.register::<Car>().unwrap();

    let outcome = container.view().resolve(Key::of::<Car>());
    assert!(outcome.is_pending());

    let error = outcome.await.unwrap_err();
    let resolution = error.as_resolution().expect("resolution error");
    assert_eq!(resolution.key(), &Key::of::<Engine>());
    let parent = resolution.dependency().parent().expect("parent request");
    assert_eq!(parent.claimed_type().as_deref(), Some("Car"));
    assert_eq!(container.stats().failures, 1);
}

#[test]
fn test_missing_dependency_fails_synchronously_when_instant() {
    let container = IocContainer::new();
    container.register::<Car>().unwrap();

    let error = container.view().resolve_now(Key::of::<Car>()).unwrap_err();
    assert!(matches!(error, Error::Resolution(_)));
}

struct Record {
    name: &'static str,
    delay: Option<Duration>,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl ComponentPolicy for Record {
    fn component_created(
        &self,
        _: &Instance,
        _: &Arc<ComponentModel>,
        _: &Dependencies,
        _: &ComposerRef,
    ) -> Eventual<Result<()>> {
        let name = self.name;
        let log = self.log.clone();
        match self.delay {
            Some(delay) => Eventual::pending(async move {
                sleep(delay).await;
                log.lock().push(name);
                Ok(())
            }),
            None => {
                log.lock().push(name);
                Eventual::ok(())
            }
        }
    }
}

#[tokio::test]
async fn test_policies_run_in_order_despite_delays() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let container = IocContainer::new();
    container.add_policies([Arc::new(Record {
        name: "P1",
        delay: Some(Duration::from_millis(20)),
        log: log.clone(),
    }) as Arc<dyn ComponentPolicy>]);
    container
        .add_component(ComponentModel::of::<Engine>().with_policy(Arc::new(Record {
            name: "P2",
            delay: None,
            log: log.clone(),
        })))
        .unwrap();

    let engine = container.view().get::<Engine>().await.unwrap();
    assert!(engine.is_some());
    assert_eq!(*log.lock(), vec!["P1", "P2"]);
}

#[tokio::test]
async fn test_policies_run_once_for_concurrent_singleton() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let container = IocContainer::new();
    container
        .add_component(ComponentModel::of::<Engine>().with_policy(Arc::new(Record {
            name: "created",
            delay: Some(Duration::from_millis(10)),
            log: log.clone(),
        })))
        .unwrap();

    let view = container.view();
    let (first, second) = tokio::join!(view.get::<Engine>(), view.get::<Engine>());
    let (first, second) = (first.unwrap().unwrap(), second.unwrap().unwrap());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*log.lock(), vec!["created"]);
}

struct Session {
    disposed: Arc<AtomicUsize>,
}

impl Disposable for Session {
    fn dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

fn session_model(disposed: &Arc<AtomicUsize>) -> ComponentModel {
    session_model_in(disposed, Contextual::new())
}

fn session_model_in(disposed: &Arc<AtomicUsize>, lifestyle: Arc<Contextual>) -> ComponentModel {
    let disposed = disposed.clone();
    ComponentModel::new()
        .with_key("session")
        .with_lifestyle(lifestyle)
        .with_factory(Factory::from_fn(move |_| {
            Ok(Instance::builder(Session {
                disposed: disposed.clone(),
            })
            .disposable()
            .build())
        }))
}

#[test]
fn test_contextual_instance_disposed_once_when_context_ends() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let lifestyle = Contextual::new();
    let container = IocContainer::new();
    container
        .add_component(session_model_in(&disposed, lifestyle.clone()))
        .unwrap();

    let context = container.context();
    let view = context.view();
    let first = view.resolve_now("session").unwrap().unwrap();
    let again = view.resolve_now("session").unwrap().unwrap();
    assert!(first.ptr_eq(&again));
    assert_eq!(first.context(), Some(context.clone()));
    assert!(lifestyle.instance(&context).is_some_and(|cached| cached.ptr_eq(&first)));

    context.end();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert!(first.context().is_none());
    assert!(lifestyle.instance(&context).is_none());
    assert_eq!(lifestyle.len(), 0);

    context.end();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_contextual_instance_external_dispose_before_end() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let container = IocContainer::new();
    container.add_component(session_model(&disposed)).unwrap();

    let context = container.context();
    let view = context.view();
    let first = view.resolve_now("session").unwrap().unwrap();
    assert!(first.dispose());
    assert_eq!(disposed.load(Ordering::SeqCst), 1);

    let replacement = view.resolve_now("session").unwrap().unwrap();
    assert!(!first.ptr_eq(&replacement));

    context.end();
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_context_ended_during_creation_releases_instance() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let lifestyle = Contextual::new();
    let counter = disposed.clone();
    let container = IocContainer::new();
    container
        .add_component(
            ComponentModel::new()
                .with_key("session")
                .with_lifestyle(lifestyle.clone())
                .with_factory(Factory::from_async(move |_, _| {
                    let disposed = counter.clone();
                    async move {
                        sleep(Duration::from_millis(10)).await;
                        Ok(Instance::builder(Session { disposed }).disposable().build())
                    }
                })),
        )
        .unwrap();

    let context = container.context();
    let pending = context.view().resolve("session");
    assert!(pending.is_pending());
    context.end();

    let session = pending.await.unwrap().unwrap();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert!(session.context().is_none());
    assert!(lifestyle.instance(&context).is_none());
    assert_eq!(lifestyle.len(), 0);
}

#[test]
fn test_failed_contextual_creation_leaves_no_cache_entry() {
    let lifestyle = Contextual::new();
    let container = IocContainer::new();
    container
        .add_component(
            ComponentModel::new()
                .with_key("session")
                .with_lifestyle(lifestyle.clone())
                .with_factory(Factory::from_fn(|_| Err(Error::creation("no connection")))),
        )
        .unwrap();

    for _ in 0..5 {
        let context = container.context();
        assert!(context.view().resolve_now("session").is_err());
        context.end();
    }
    assert_eq!(lifestyle.len(), 0);
    assert_eq!(container.stats().failures, 5);
}

#[test]
fn test_child_context_gets_own_contextual_instance() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let container = IocContainer::new();
    container.add_component(session_model(&disposed)).unwrap();

    let parent = container.context();
    let child = parent.new_child();
    let outer = parent.view().resolve_now("session").unwrap().unwrap();
    let inner = child.view().resolve_now("session").unwrap().unwrap();
    assert!(!outer.ptr_eq(&inner));

    child.end();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    parent.end();
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_bound_instance_rejects_other_context() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let container = IocContainer::new();
    container.add_component(session_model(&disposed)).unwrap();

    let context = container.context();
    let session = context.view().resolve_now("session").unwrap().unwrap();
    assert!(session.set_context(Some(&context)).is_ok());
    assert!(matches!(
        session.set_context(Some(&container.context())),
        Err(Error::ContextReassigned)
    ));

    session.set_context(None).unwrap();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

struct Garage {
    wheels: Vec<Arc<u8>>,
    spare: Option<Arc<String>>,
}

impl Injectable for Garage {
    fn dependencies() -> Vec<RawDependency> {
        vec![every("wheel"), optional("spare")]
    }

    fn construct(args: &Arguments<'_>) -> Result<Self> {
        Ok(Garage {
            wheels: args.many::<u8>(0)?,
            spare: args.optional::<String>(1)?,
        })
    }
}

fn wheel(size: u8) -> ComponentModel {
    ComponentModel::new()
        .with_key("wheel")
        .with_factory(Factory::from_async(move |_, _| async move {
            sleep(Duration::from_millis(u64::from(size))).await;
            Ok(Instance::new(size))
        }))
}

#[tokio::test]
async fn test_every_collects_all_providers_in_order() {
    let container = IocContainer::new();
    container.add_component(wheel(15)).unwrap();
    container.add_component(wheel(3)).unwrap();
    container.register::<Garage>().unwrap();

    let garage = container.view().get::<Garage>().await.unwrap().unwrap();
    let sizes: Vec<u8> = garage.wheels.iter().map(|w| **w).collect();
    assert_eq!(sizes, vec![15, 3]);
    assert!(garage.spare.is_none());
}

#[test]
fn test_pending_dependency_fails_instant_resolution() {
    let container = IocContainer::new();
    container.add_component(wheel(1)).unwrap();
    container.register::<Garage>().unwrap();

    let error = container.view().resolve_now(Key::of::<Garage>()).unwrap_err();
    assert!(matches!(error, Error::Resolution(_)));
}

struct Dashboard {
    engine: ioc_kernel::resolution::Lazy,
    clock: ioc_kernel::resolution::Deferred,
}

impl Injectable for Dashboard {
    fn dependencies() -> Vec<RawDependency> {
        vec![lazy(Key::of::<Engine>()), promise("clock")]
    }

    fn construct(args: &Arguments<'_>) -> Result<Self> {
        Ok(Dashboard {
            engine: args.lazy(0)?.clone(),
            clock: args.promise(1)?.clone(),
        })
    }
}

#[test]
fn test_lazy_and_promise_dependencies_defer_resolution() {
    let container = IocContainer::new();
    container
        .add_component(
            ComponentModel::new()
                .with_key("clock")
                .with_lifestyle(Arc::new(Transient::new()))
                .with_factory(Factory::from_async(|_, _| async { Ok(Instance::new(12u8)) })),
        )
        .unwrap();
    container.register::<Dashboard>().unwrap();

    let dashboard = container
        .view()
        .resolve_now(Key::of::<Dashboard>())
        .unwrap()
        .and_then(|instance| instance.downcast::<Dashboard>())
        .unwrap();
    assert!(!dashboard.engine.is_resolved());

    container.register::<Engine>().unwrap();
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    runtime.block_on(async {
        let engine = dashboard.engine.get_as::<Engine>().await.unwrap().unwrap();
        assert_eq!(engine.horsepower, 917);
        let clock = dashboard.clock.get_as::<u8>().await.unwrap().unwrap();
        assert_eq!(*clock, 12);
    });
}

#[test]
fn test_invalid_model_reports_fields() {
    let container = IocContainer::new();
    let error = container
        .add_component(ComponentModel::new().depends_on([literal(1u8)]))
        .unwrap_err();
    let Error::InvalidModel(model_error) = error else {
        panic!("expected invalid model");
    };
    assert!(model_error.results().field("key").is_some());
    assert!(!model_error.results().is_valid());
}
