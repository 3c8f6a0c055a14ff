use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// 依赖修饰标志集合
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DependencyModifier(u16);

impl DependencyModifier {
    pub const NONE: Self = Self(0);
    /// 依赖是字面值，不做解析
    pub const USE: Self = Self(1 << 0);
    /// 延迟到首次访问才解析
    pub const LAZY: Self = Self(1 << 1);
    /// 解析所有提供者
    pub const EVERY: Self = Self(1 << 2);
    /// 调用函数得到值
    pub const DYNAMIC: Self = Self(1 << 3);
    /// 允许缺失
    pub const OPTIONAL: Self = Self(1 << 4);
    /// 以 promise 形式交付
    pub const PROMISE: Self = Self(1 << 5);
    /// 精确键匹配
    pub const INVARIANT: Self = Self(1 << 6);
    /// 通过容器视图解析
    pub const CONTAINER: Self = Self(1 << 7);
    /// 交付值的子实例
    pub const CHILD: Self = Self(1 << 8);

    const NAMES: [(Self, &'static str); 9] = [
        (Self::USE, "USE"),
        (Self::LAZY, "LAZY"),
        (Self::EVERY, "EVERY"),
        (Self::DYNAMIC, "DYNAMIC"),
        (Self::OPTIONAL, "OPTIONAL"),
        (Self::PROMISE, "PROMISE"),
        (Self::INVARIANT, "INVARIANT"),
        (Self::CONTAINER, "CONTAINER"),
        (Self::CHILD, "CHILD"),
    ];

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 包含 `other` 的全部标志
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// 至少包含 `other` 的一个标志
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for DependencyModifier {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DependencyModifier {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DependencyModifier {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for DependencyModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let flags = DependencyModifier::LAZY | DependencyModifier::OPTIONAL;
        assert!(flags.contains(DependencyModifier::LAZY));
        assert!(!flags.contains(DependencyModifier::LAZY | DependencyModifier::EVERY));
        assert!(flags.intersects(DependencyModifier::LAZY | DependencyModifier::EVERY));
        assert_eq!(flags.without(DependencyModifier::LAZY), DependencyModifier::OPTIONAL);
        assert_eq!(format!("{flags:?}"), "LAZY | OPTIONAL");
    }
}
