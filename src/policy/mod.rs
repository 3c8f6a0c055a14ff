//! 组件策略
//!
//! 策略在注册时依次修改组件模型，在实例创建后依次收到通知。
//! 通知可以是异步的，后一个策略等前一个完成后才执行。

mod constructor;
mod initialization;
mod metadata;
mod model_aware;
mod pipeline;

use std::sync::Arc;

use crate::composer::ComposerRef;
use crate::errors::Result;
use crate::eventual::Eventual;
use crate::instance::Instance;
use crate::model::ComponentModel;
use crate::resolution::Dependencies;

pub use constructor::ConstructorPolicy;
pub use initialization::InitializationPolicy;
pub use metadata::PolicyMetadataPolicy;
pub use model_aware::ComponentModelAwarePolicy;

pub(crate) use pipeline::{apply_policies, run_component_created};

pub trait ComponentPolicy: Send + Sync {
    /// 注册时修改模型
    fn apply_policy(&self, _model: &mut ComponentModel, _chain: &mut PolicyChain<'_>) -> Result<()> {
        Ok(())
    }

    /// 实例创建并提交后调用
    fn component_created(
        &self,
        _component: &Instance,
        _model: &Arc<ComponentModel>,
        _dependencies: &Dependencies,
        _composer: &ComposerRef,
    ) -> Eventual<Result<()>> {
        Eventual::ok(())
    }
}

/// 正在应用的策略列表，策略可以在自身之后插入新策略
pub struct PolicyChain<'a> {
    policies: &'a mut Vec<Arc<dyn ComponentPolicy>>,
    position: usize,
}

impl<'a> PolicyChain<'a> {
    pub(crate) fn new(policies: &'a mut Vec<Arc<dyn ComponentPolicy>>, position: usize) -> Self {
        Self { policies, position }
    }

    /// 插入到当前策略之后，保持给定顺序
    pub fn splice<I>(&mut self, policies: I)
    where
        I: IntoIterator<Item = Arc<dyn ComponentPolicy>>,
    {
        for policy in policies {
            self.policies.insert(self.position, policy);
            self.position += 1;
        }
    }

    /// 追加到末尾
    pub fn push(&mut self, policy: Arc<dyn ComponentPolicy>) {
        self.policies.push(policy);
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
