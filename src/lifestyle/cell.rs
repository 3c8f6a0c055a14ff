//! 缓存单个实例的状态机，单例与上下文生命周期共用

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::trace;

use super::{Commit, Committed, Creation};
use crate::composer::Resolved;
use crate::eventual::Eventual;
use crate::instance::{Instance, InstanceId};

type InFlight = Shared<BoxFuture<'static, Resolved>>;

pub(crate) type Track = Arc<dyn Fn(Instance) -> Instance + Send + Sync>;

#[derive(Default)]
enum CellState {
    #[default]
    Empty,
    /// 正在创建；异步创建时保存可共享的等待句柄
    Creating(Option<InFlight>),
    Cached(Instance),
}

#[derive(Default)]
pub(crate) struct InstanceCell {
    state: Mutex<CellState>,
}

impl InstanceCell {
    /// 命中缓存直接返回，创建中则等待同一个结果，否则执行创建
    pub(crate) fn resolve(self: &Arc<Self>, creation: Creation, track: Track) -> Eventual<Resolved> {
        {
            let mut state = self.state.lock();
            match &*state {
                CellState::Cached(instance) => return Eventual::ok(Some(instance.clone())),
                CellState::Creating(Some(in_flight)) => {
                    trace!("Awaiting in-flight creation");
                    return Eventual::pending(in_flight.clone());
                }
                CellState::Creating(None) => {}
                CellState::Empty => *state = CellState::Creating(None),
            }
        }

        let cell = self.clone();
        let commit: Commit = Box::new(move |instance| cell.commit(instance, &track));

        match creation(commit) {
            Eventual::Ready(result) => {
                self.settle();
                Eventual::Ready(result)
            }
            Eventual::Pending(future) => {
                let cell = self.clone();
                let in_flight = async move {
                    let result = future.await;
                    cell.settle();
                    result
                }
                .boxed()
                .shared();

                if let CellState::Creating(slot) = &mut *self.state.lock() {
                    if slot.is_none() {
                        *slot = Some(in_flight.clone());
                    }
                }
                Eventual::pending(in_flight)
            }
        }
    }

    /// 先提交者胜出
    /// 包装在锁外进行，包装过程可能回调到生命周期
    fn commit(&self, instance: Instance, track: &Track) -> Committed {
        if let Some(existing) = self.cached() {
            trace!("Creation lost the race, using cached instance");
            return Committed::Existing(existing);
        }
        let tracked = track(instance);
        let mut state = self.state.lock();
        if let CellState::Cached(existing) = &*state {
            return Committed::Existing(existing.clone());
        }
        *state = CellState::Cached(tracked.clone());
        Committed::Accepted(tracked)
    }

    /// 创建结束但没有提交（失败或未处理）时回到空状态
    fn settle(&self) {
        let mut state = self.state.lock();
        if matches!(*state, CellState::Creating(_)) {
            *state = CellState::Empty;
        }
    }

    pub(crate) fn cached(&self) -> Option<Instance> {
        match &*self.state.lock() {
            CellState::Cached(instance) => Some(instance.clone()),
            _ => None,
        }
    }

    pub(crate) fn holds(&self, id: InstanceId) -> bool {
        matches!(&*self.state.lock(), CellState::Cached(instance) if instance.id() == id)
    }

    /// 取出缓存的实例
    pub(crate) fn take(&self) -> Option<Instance> {
        let mut state = self.state.lock();
        if let CellState::Cached(_) = &*state {
            if let CellState::Cached(instance) = std::mem::take(&mut *state) {
                return Some(instance);
            }
        }
        None
    }

    /// 仅当缓存的是指定实例时取出
    pub(crate) fn take_if(&self, id: InstanceId) -> Option<Instance> {
        let mut state = self.state.lock();
        match &*state {
            CellState::Cached(instance) if instance.id() == id => {
                let instance = instance.clone();
                *state = CellState::Empty;
                Some(instance)
            }
            _ => None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(*self.state.lock(), CellState::Empty)
    }
}
