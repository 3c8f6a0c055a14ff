use std::sync::atomic::{AtomicUsize, Ordering};

/// 内部容器统计信息（原子计数器）
#[derive(Debug, Default)]
pub(crate) struct InnerStats {
    pub(crate) registrations: AtomicUsize,
    pub(crate) resolutions: AtomicUsize,
    pub(crate) creations: AtomicUsize,
    pub(crate) declined: AtomicUsize,
    pub(crate) failures: AtomicUsize,
}

impl InnerStats {
    pub(crate) fn record(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ContainerStats {
        ContainerStats {
            registrations: self.registrations.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            creations: self.creations.load(Ordering::Relaxed),
            declined: self.declined.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 当前注册的组件数
    pub registrations: usize,
    /// 被组件提供者认领的请求数
    pub resolutions: usize,
    /// 实际创建并提交的实例数
    pub creations: usize,
    /// 因循环依赖而放弃的请求数
    pub declined: usize,
    /// 以错误结束的请求数
    pub failures: usize,
}

impl ContainerStats {
    /// 复用已有实例的比例
    pub fn hit_rate(&self) -> f64 {
        if self.resolutions == 0 {
            0.0
        } else {
            let reused = self.resolutions.saturating_sub(self.creations + self.failures);
            reused as f64 / self.resolutions as f64
        }
    }

    pub fn performance_summary(&self) -> String {
        format!(
            "组件: {}, 解析: {}, 创建: {}, 复用率: {:.1}%, 循环放弃: {}, 失败: {}",
            self.registrations,
            self.resolutions,
            self.creations,
            self.hit_rate() * 100.0,
            self.declined,
            self.failures
        )
    }
}
