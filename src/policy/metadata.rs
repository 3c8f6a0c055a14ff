use super::{ComponentPolicy, PolicyChain};
use crate::errors::Result;
use crate::model::ComponentModel;

/// 把实现类型自带的策略插入到自身之后
#[derive(Debug, Default, Clone, Copy)]
pub struct PolicyMetadataPolicy;

impl ComponentPolicy for PolicyMetadataPolicy {
    fn apply_policy(&self, model: &mut ComponentModel, chain: &mut PolicyChain<'_>) -> Result<()> {
        if let Some(implementation) = model.implementation() {
            chain.splice(implementation.policies().iter().cloned());
        }
        Ok(())
    }
}
