use std::sync::Arc;

use super::ComponentPolicy;
use crate::composer::ComposerRef;
use crate::errors::Result;
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::model::ComponentModel;
use crate::resolution::Dependencies;

/// 把组件模型交给声明了 `ComponentModelAware` 的实例
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentModelAwarePolicy;

impl ComponentPolicy for ComponentModelAwarePolicy {
    fn component_created(
        &self,
        component: &Instance,
        model: &Arc<ComponentModel>,
        _dependencies: &Dependencies,
        _composer: &ComposerRef,
    ) -> Eventual<Result<()>> {
        if let Some(aware) = component.model_aware() {
            aware.set_component_model(model.clone());
        }
        Eventual::ok(())
    }
}
