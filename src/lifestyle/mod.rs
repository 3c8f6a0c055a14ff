//! 生命周期：决定何时创建实例、何时复用、何时释放
//!
//! 生命周期拿到一个创建闭包，闭包在实例构造完成、策略执行之前调用
//! 提交函数。提交时由生命周期决定缓存与否；并发创建中落败的一方直接
//! 得到胜出的实例，不再执行策略。

mod cell;
mod contextual;
mod singleton;
pub(crate) mod tracking;
mod transient;

use std::fmt;

use crate::composer::{ComposerRef, Resolved};
use crate::eventual::Eventual;
use crate::instance::{Instance, InstanceId};

pub use contextual::Contextual;
pub use singleton::Singleton;
pub use transient::Transient;

/// 提交结果
#[derive(Debug, Clone)]
pub enum Committed {
    /// 新实例被接受（可能已被包装）
    Accepted(Instance),
    /// 已有实例胜出，新实例被丢弃
    Existing(Instance),
}

pub type Commit = Box<dyn FnOnce(Instance) -> Committed + Send>;

pub type Creation = Box<dyn FnOnce(Commit) -> Eventual<Resolved> + Send>;

pub trait Lifestyle: Send + Sync {
    /// 解析实例，必要时调用 `creation` 创建
    fn resolve(&self, creation: Creation, composer: &ComposerRef) -> Eventual<Resolved>;

    /// 外部请求释放实例；返回 `true` 表示允许，`disposing` 时由生命周期自行释放
    fn dispose_instance(&self, _id: InstanceId, _disposing: bool) -> bool {
        true
    }

    /// 释放所有缓存的实例
    fn dispose(&self) {}

    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
