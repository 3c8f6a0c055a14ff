//! Values that are available now or later.
//!
//! Resolution stays synchronous until something in the graph actually
//! suspends, so every step hands back an [`Eventual`] instead of a future.

use std::fmt;
use std::future::{Future, IntoFuture};

use futures_util::future::{self, BoxFuture, FutureExt};

pub enum Eventual<T> {
    Ready(T),
    Pending(BoxFuture<'static, T>),
}

impl<T: Send + 'static> Eventual<T> {
    pub fn ready(value: T) -> Self {
        Eventual::Ready(value)
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Eventual::Pending(future.boxed())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Eventual::Ready(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Eventual::Pending(_))
    }

    /// Takes the value if it is already available.
    pub fn now(self) -> Result<T, Self> {
        match self {
            Eventual::Ready(value) => Ok(value),
            pending => Err(pending),
        }
    }

    pub fn map<U, F>(self, f: F) -> Eventual<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Eventual::Ready(value) => Eventual::Ready(f(value)),
            Eventual::Pending(future) => Eventual::pending(future.map(f)),
        }
    }

    /// Chains a continuation that may itself suspend.
    pub fn then<U, F>(self, f: F) -> Eventual<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Eventual<U> + Send + 'static,
    {
        match self {
            Eventual::Ready(value) => f(value),
            Eventual::Pending(future) => Eventual::pending(async move { f(future.await).await }),
        }
    }
}

impl<T, E> Eventual<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn ok(value: T) -> Self {
        Eventual::Ready(Ok(value))
    }

    pub fn err(error: E) -> Self {
        Eventual::Ready(Err(error))
    }

    pub fn and_then<U, F>(self, f: F) -> Eventual<Result<U, E>>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Eventual<Result<U, E>> + Send + 'static,
    {
        self.then(|result| match result {
            Ok(value) => f(value),
            Err(error) => Eventual::Ready(Err(error)),
        })
    }

    pub fn map_ok<U, F>(self, f: F) -> Eventual<Result<U, E>>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.map(|result| result.map(f))
    }
}

impl<T: Send + 'static> IntoFuture for Eventual<T> {
    type Output = T;
    type IntoFuture = BoxFuture<'static, T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Eventual::Ready(value) => future::ready(value).boxed(),
            Eventual::Pending(future) => future,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Eventual<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eventual::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Eventual::Pending(_) => f.write_str("Pending"),
        }
    }
}
