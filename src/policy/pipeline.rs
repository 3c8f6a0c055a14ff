use std::sync::Arc;

use super::{ComponentPolicy, PolicyChain};
use crate::composer::ComposerRef;
use crate::errors::Result;
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::model::ComponentModel;
use crate::resolution::Dependencies;

/// 依次应用策略；策略插入的新策略也会被应用
pub(crate) fn apply_policies(
    model: &mut ComponentModel,
    policies: &mut Vec<Arc<dyn ComponentPolicy>>,
) -> Result<()> {
    let mut index = 0;
    while index < policies.len() {
        let policy = policies[index].clone();
        let mut chain = PolicyChain::new(policies, index + 1);
        policy.apply_policy(model, &mut chain)?;
        index += 1;
    }
    Ok(())
}

/// 依次通知策略，遇到异步通知时挂起，完成后继续剩余策略
pub(crate) fn run_component_created(
    component: Instance,
    model: Arc<ComponentModel>,
    dependencies: Arc<Dependencies>,
    composer: ComposerRef,
    policies: Arc<[Arc<dyn ComponentPolicy>]>,
) -> Eventual<Result<Instance>> {
    notify_from(0, component, model, dependencies, composer, policies)
}

fn notify_from(
    start: usize,
    component: Instance,
    model: Arc<ComponentModel>,
    dependencies: Arc<Dependencies>,
    composer: ComposerRef,
    policies: Arc<[Arc<dyn ComponentPolicy>]>,
) -> Eventual<Result<Instance>> {
    for index in start..policies.len() {
        match policies[index].component_created(&component, &model, &dependencies, &composer) {
            Eventual::Ready(Ok(())) => continue,
            Eventual::Ready(Err(error)) => return Eventual::err(error),
            Eventual::Pending(future) => {
                return Eventual::pending(async move {
                    future.await?;
                    notify_from(index + 1, component, model, dependencies, composer, policies).await
                });
            }
        }
    }
    Eventual::ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        delay: Option<Duration>,
    }

    impl ComponentPolicy for Record {
        fn component_created(
            &self,
            _: &Instance,
            _: &Arc<ComponentModel>,
            _: &Dependencies,
            _: &ComposerRef,
        ) -> Eventual<Result<()>> {
            let log = self.log.clone();
            let name = self.name;
            match self.delay {
                None => {
                    log.lock().push(name);
                    Eventual::ok(())
                }
                Some(delay) => Eventual::pending(async move {
                    tokio::time::sleep(delay).await;
                    log.lock().push(name);
                    Ok(())
                }),
            }
        }
    }

    struct Splicer(Arc<dyn ComponentPolicy>);

    impl ComponentPolicy for Splicer {
        fn apply_policy(&self, _: &mut ComponentModel, chain: &mut PolicyChain<'_>) -> Result<()> {
            chain.splice([self.0.clone()]);
            Ok(())
        }
    }

    fn record(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>, delay: Option<Duration>) -> Arc<dyn ComponentPolicy> {
        Arc::new(Record {
            name,
            log: log.clone(),
            delay,
        })
    }

    #[tokio::test]
    async fn notifications_run_in_order_across_suspensions() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let policies: Arc<[Arc<dyn ComponentPolicy>]> = Arc::from(vec![
            record("first", &log, Some(Duration::from_millis(10))),
            record("second", &log, None),
            record("third", &log, Some(Duration::from_millis(1))),
        ]);

        let outcome = run_component_created(
            Instance::new(1u8),
            Arc::new(ComponentModel::new()),
            Arc::new(Dependencies::default()),
            Arc::new(Context::new()),
            policies,
        );
        assert!(outcome.is_pending());
        outcome.await.expect("created");
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn spliced_policies_are_applied_next() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = record("spliced", &log, None);
        let mut policies: Vec<Arc<dyn ComponentPolicy>> = vec![
            Arc::new(Splicer(inner)) as Arc<dyn ComponentPolicy>,
            record("last", &log, None),
        ];
        let mut model = ComponentModel::new();
        apply_policies(&mut model, &mut policies).expect("applied");
        assert_eq!(policies.len(), 3);

        let outcome = run_component_created(
            Instance::new(1u8),
            Arc::new(model),
            Arc::new(Dependencies::default()),
            Arc::new(Context::new()),
            Arc::from(policies),
        );
        assert!(outcome.is_ready());
        assert_eq!(*log.lock(), vec!["spliced", "last"]);
    }
}
