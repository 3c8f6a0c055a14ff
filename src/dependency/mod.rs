//! 依赖声明：原始依赖、修饰标志、归一化模型与编辑器

mod manager;
mod model;
mod modifier;
mod raw;

pub use manager::DependencyManager;
pub use model::{Dependency, DependencyModel};
pub use modifier::DependencyModifier;
pub use raw::{
    child, container, dynamic, every, invariant, lazy, literal, optional, promise, use_value,
    DynamicFn, RawDependency,
};
