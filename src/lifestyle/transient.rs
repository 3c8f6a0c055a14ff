use super::{Committed, Creation, Lifestyle};
use crate::composer::{ComposerRef, Resolved};
use crate::eventual::Eventual;

/// 每次解析都创建新实例，不跟踪释放
#[derive(Debug, Default, Clone, Copy)]
pub struct Transient;

impl Transient {
    pub fn new() -> Self {
        Transient
    }
}

impl Lifestyle for Transient {
    fn resolve(&self, creation: Creation, _composer: &ComposerRef) -> Eventual<Resolved> {
        creation(Box::new(Committed::Accepted))
    }

    fn name(&self) -> &'static str {
        "transient"
    }
}
