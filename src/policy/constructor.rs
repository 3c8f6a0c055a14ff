use std::sync::Arc;

use tracing::trace;

use super::{ComponentPolicy, PolicyChain};
use crate::dependency::DependencyModel;
use crate::errors::Result;
use crate::metadata::Metadata;
use crate::model::{ComponentModel, Facet};

/// 补全构造参数
///
/// 已有的参数优先；空洞先由实现声明的参数填补，仍有空洞时再用元数据推断。
/// 显式工厂的模型不做推断。
pub struct ConstructorPolicy {
    metadata: Arc<dyn Metadata>,
}

impl ConstructorPolicy {
    pub fn new(metadata: Arc<dyn Metadata>) -> Self {
        Self { metadata }
    }
}

impl ComponentPolicy for ConstructorPolicy {
    fn apply_policy(&self, model: &mut ComponentModel, _chain: &mut PolicyChain<'_>) -> Result<()> {
        if model.explicit_factory().is_some() {
            return Ok(());
        }
        let Some(implementation) = model.implementation().cloned() else {
            return Ok(());
        };

        let declared: Vec<Option<DependencyModel>> = implementation
            .parameters()
            .iter()
            .cloned()
            .map(|parameter| Some(DependencyModel::new(parameter)))
            .collect();
        if !declared.is_empty() {
            model.manage_dependencies(Facet::Parameters, |manager| {
                manager.merge(declared);
            });
        }

        if !model.all_dependencies_defined(&Facet::Parameters) {
            let inferred: Vec<Option<DependencyModel>> = self
                .metadata
                .constructor_parameters(implementation.key())
                .into_iter()
                .map(DependencyModel::coerce)
                .collect();
            if !inferred.is_empty() {
                trace!(component = %implementation.name(), count = inferred.len(), "Inferring constructor parameters");
                model.manage_dependencies(Facet::Parameters, |manager| {
                    manager.merge(inferred);
                });
            }
        }
        Ok(())
    }
}
