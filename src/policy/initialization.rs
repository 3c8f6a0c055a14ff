use std::sync::Arc;

use super::ComponentPolicy;
use crate::composer::ComposerRef;
use crate::errors::Result;
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::model::ComponentModel;
use crate::resolution::Dependencies;

/// 调用实例的初始化，总是最后一个策略
#[derive(Debug, Default, Clone, Copy)]
pub struct InitializationPolicy;

impl ComponentPolicy for InitializationPolicy {
    fn component_created(
        &self,
        component: &Instance,
        _model: &Arc<ComponentModel>,
        _dependencies: &Dependencies,
        _composer: &ComposerRef,
    ) -> Eventual<Result<()>> {
        match component.initializer() {
            Some(initializer) => initializer.initialize(),
            None => Eventual::ok(()),
        }
    }
}
