//! 解析键

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

/// 标识一个可解析的依赖
///
/// 类型键既可以是具体类型，也可以是协议（`dyn Trait`）。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Type { id: TypeId, name: &'static str },
    Named(Arc<str>),
    /// 解析为当前的组合器
    Composer,
    /// 解析为组合器之上的容器视图
    Container,
}

impl Key {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Key::Named(name.into())
    }

    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Key::Type { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Key::Type { .. })
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::named(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::named(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Type { name, .. } => f.write_str(&short_name(name)),
            Key::Named(name) => f.write_str(name),
            Key::Composer => f.write_str("$composer"),
            Key::Container => f.write_str("$container"),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Type { name, .. } => write!(f, "Key::Type({name})"),
            Key::Named(name) => write!(f, "Key::Named({name:?})"),
            Key::Composer => f.write_str("Key::Composer"),
            Key::Container => f.write_str("Key::Container"),
        }
    }
}

/// Strips module paths from every segment of a type name.
///
/// `alloc::vec::Vec<my_app::Engine>` becomes `Vec<Engine>`.
pub(crate) fn short_name(full: &str) -> String {
    let mut output = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            output.push_str(&segment);
            segment.clear();
            output.push(c);
        }
    }
    output.push_str(&segment);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Engine {}
    struct V12;

    #[test]
    fn type_keys_compare_by_type() {
        assert_eq!(Key::of::<V12>(), Key::of::<V12>());
        assert_ne!(Key::of::<V12>(), Key::of::<dyn Engine>());
        assert_ne!(Key::of::<V12>(), Key::named("V12"));
    }

    #[test]
    fn display_strips_module_paths() {
        assert_eq!(Key::of::<V12>().to_string(), "V12");
        assert_eq!(Key::of::<dyn Engine>().to_string(), "dyn Engine");
        assert_eq!(Key::of::<Vec<V12>>().to_string(), "Vec<V12>");
        assert_eq!(Key::from("engine").to_string(), "engine");
    }
}
