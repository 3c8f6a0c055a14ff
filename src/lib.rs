//! 控制反转容器的依赖解析与组件生命周期引擎
//!
//! 组件以 [`ComponentModel`] 描述，注册到 [`IocContainer`] 后由上下文
//! （[`Context`]）驱动解析。整个依赖图都能同步满足时结果立即可用，
//! 只有真正挂起的依赖才会让解析变为异步，见 [`Eventual`]。

pub mod composer;
pub mod config;
pub mod container;
pub mod context;
pub mod dependency;
pub mod errors;
pub mod eventual;
pub mod instance;
pub mod interception;
pub mod key;
pub mod lifestyle;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod policy;
pub mod resolution;
pub mod validation;

pub use composer::{Composer, ComposerRef, ContainerView, Handler, Resolved, ResolvedAll};
pub use config::{ConfigLoader, ContainerConfig, LifestyleKind};
pub use container::{ContainerBuilder, ContainerStats, IocContainer, Registration};
pub use context::{Context, ContextBinding, ContextState};
pub use dependency::{DependencyManager, DependencyModel, DependencyModifier, RawDependency};
pub use errors::{ConfigError, Error, FailureReason, ModelError, ResolutionError, Result};
pub use eventual::Eventual;
pub use instance::{ComponentModelAware, Disposable, Initializable, Instance, InstanceId, Parenting};
pub use key::Key;
pub use lifestyle::{Contextual, Lifestyle, Singleton, Transient};
pub use metadata::{Metadata, MetadataRegistry};
pub use model::{ComponentModel, Facet, Factory, Implementation, Injectable};
pub use policy::{ComponentPolicy, PolicyChain};
pub use resolution::{Arguments, DependencyResolution, Dependencies, Slot};
pub use validation::{ModelValidator, ValidationResults, Validator};
