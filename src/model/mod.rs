//! 组件模型：键、实现、生命周期、工厂与依赖负担

mod component;
mod factory;
mod implementation;

use std::collections::BTreeMap;
use std::fmt;

use crate::dependency::DependencyModel;

pub use component::ComponentModel;
pub use factory::Factory;
pub use implementation::{Implementation, Injectable};

/// 依赖分组
///
/// 构造参数总是排在最前面。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    Parameters,
    Interceptors,
    InterceptorSelectors,
    Property(String),
}

impl Facet {
    pub fn property(name: impl Into<String>) -> Self {
        Facet::Property(name.into())
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::Parameters => f.write_str("parameters"),
            Facet::Interceptors => f.write_str("interceptors"),
            Facet::InterceptorSelectors => f.write_str("interceptorSelectors"),
            Facet::Property(name) => write!(f, "property:{name}"),
        }
    }
}

/// 分组到依赖序列的映射
pub type Burden = BTreeMap<Facet, Vec<Option<DependencyModel>>>;
