use std::sync::Arc;

use parking_lot::RwLock;

use super::stats::InnerStats;
use super::{ContainerInner, IocContainer};
use crate::config::ContainerConfig;
use crate::interception::{DefaultProxyBuilder, ProxyBuilder};
use crate::metadata::{Metadata, MetadataRegistry};
use crate::policy::{ComponentModelAwarePolicy, ComponentPolicy, ConstructorPolicy, PolicyMetadataPolicy};
use crate::validation::{ModelValidator, Validator};

/// 容器构建器
///
/// 未指定的部分使用默认实现：`ModelValidator`、空的 `MetadataRegistry`、
/// `DefaultProxyBuilder`，以及构造参数推断、组件模型感知（按配置）和
/// 策略元数据三条默认策略。
#[derive(Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
    validator: Option<Arc<dyn Validator>>,
    metadata: Option<Arc<dyn Metadata>>,
    proxy_builder: Option<Arc<dyn ProxyBuilder>>,
    default_policies: Option<Vec<Arc<dyn ComponentPolicy>>>,
    policies: Vec<Arc<dyn ComponentPolicy>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn metadata(mut self, metadata: Arc<dyn Metadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn proxy_builder(mut self, proxy_builder: Arc<dyn ProxyBuilder>) -> Self {
        self.proxy_builder = Some(proxy_builder);
        self
    }

    /// 替换默认策略
    pub fn default_policies(mut self, policies: Vec<Arc<dyn ComponentPolicy>>) -> Self {
        self.default_policies = Some(policies);
        self
    }

    /// 追加容器级策略
    pub fn policy(mut self, policy: Arc<dyn ComponentPolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn build(self) -> IocContainer {
        let metadata = self
            .metadata
            .unwrap_or_else(|| Arc::new(MetadataRegistry::new()));
        let default_policies = match self.default_policies {
            Some(policies) => policies,
            None => {
                let mut policies: Vec<Arc<dyn ComponentPolicy>> =
                    vec![Arc::new(ConstructorPolicy::new(metadata.clone()))];
                if self.config.component_model_awareness {
                    policies.push(Arc::new(ComponentModelAwarePolicy));
                }
                policies.push(Arc::new(PolicyMetadataPolicy));
                policies
            }
        };

        IocContainer {
            inner: Arc::new(ContainerInner {
                providers: RwLock::new(Vec::new()),
                policies: RwLock::new(self.policies),
                default_policies,
                validator: self.validator.unwrap_or_else(|| Arc::new(ModelValidator)),
                metadata,
                proxy_builder: self
                    .proxy_builder
                    .unwrap_or_else(|| Arc::new(DefaultProxyBuilder)),
                config: self.config,
                stats: Arc::new(InnerStats::default()),
            }),
        }
    }
}
