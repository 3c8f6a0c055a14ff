//! 依赖解析：请求链、解析结果与负担解析算法

mod burden;
mod request;
mod slot;

pub use burden::{resolve_burden, ResolutionContext};
pub use request::{DependencyResolution, HandlerId};
pub use slot::{Arguments, Deferred, Dependencies, Lazy, Slot};
