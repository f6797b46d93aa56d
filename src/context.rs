//! Logical execution contexts and their teardown callbacks

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type TeardownFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Teardown = Box<dyn FnOnce() -> TeardownFuture + Send>;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    static CURRENT: ExecutionContext;
}

/// Identity of one logical execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

struct ContextInner {
    id: ContextId,
    // `None` once the teardown callbacks have been taken
    teardown: Mutex<Option<Vec<Teardown>>>,
}

/// One unit of concurrent work, such as a single incoming request.
///
/// Callbacks registered with [`defer`](Self::defer) run exactly once, in
/// reverse registration order, when the context ends: either through
/// [`finish`](Self::finish), or when the last clone is dropped (for example
/// while unwinding), in which case they are spawned onto the current runtime.
///
/// # Examples
///
/// ```
/// use coropool::ExecutionContext;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let id = ExecutionContext::scope(async {
///     ExecutionContext::current().map(|ctx| ctx.id())
/// })
/// .await;
/// assert!(id.is_some());
/// assert!(ExecutionContext::current().is_none());
/// # }
/// ```
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id: ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)),
                teardown: Mutex::new(Some(Vec::new())),
            }),
        }
    }

    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// The context the current task runs in, if any
    pub fn current() -> Option<Self> {
        CURRENT.try_with(Clone::clone).ok()
    }

    /// Run `fut` inside a fresh context and end the context afterwards
    pub async fn scope<F: Future>(fut: F) -> F::Output {
        Self::new().run(fut).await
    }

    /// Run `fut` with `self` as the current context, then end it
    pub async fn run<F: Future>(self, fut: F) -> F::Output {
        let output = CURRENT.scope(self.clone(), fut).await;
        self.finish().await;
        output
    }

    /// Register a callback for the end of this context.
    ///
    /// Returns `false`, dropping the callback unrun, if the context already
    /// ended.
    pub fn defer<F, Fut>(&self, callback: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        match self.inner.teardown.lock().as_mut() {
            Some(callbacks) => {
                callbacks.push(Box::new(move || -> TeardownFuture { Box::pin(callback()) }));
                true
            }
            None => false,
        }
    }

    /// End the context, running its teardown callbacks
    pub async fn finish(&self) {
        let callbacks = self.inner.teardown.lock().take();
        for callback in callbacks.into_iter().flatten().rev() {
            callback().await;
        }
    }

    /// Whether [`finish`](Self::finish) has already run
    pub fn is_finished(&self) -> bool {
        self.inner.teardown.lock().is_none()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.inner.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        let Some(callbacks) = self.teardown.get_mut().take() else {
            return;
        };
        if callbacks.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    for callback in callbacks.into_iter().rev() {
                        callback().await;
                    }
                });
            }
            Err(_) => {
                tracing::warn!(
                    context = %self.id,
                    pending = callbacks.len(),
                    "Execution context dropped outside a runtime, teardown skipped"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_teardown_runs_once_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let ctx = ExecutionContext::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            ctx.defer(move || async move {
                order.lock().push(i);
            });
        }

        ctx.finish().await;
        ctx.finish().await;

        assert_eq!(*order.lock(), vec![2, 1, 0]);
        assert!(ctx.is_finished());
    }

    #[tokio::test]
    async fn test_defer_after_finish_is_refused() {
        let hits = Arc::new(AtomicUsize::new(0));
        let ctx = ExecutionContext::new();
        ctx.finish().await;

        let late = Arc::clone(&hits);
        assert!(!ctx.defer(move || async move {
            late.fetch_add(1, Ordering::SeqCst);
        }));

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scope_sets_current_context() {
        let outer = ExecutionContext::scope(async {
            let a = ExecutionContext::current().unwrap().id();
            let b = ExecutionContext::current().unwrap().id();
            assert_eq!(a, b);
            a
        })
        .await;

        let other =
            ExecutionContext::scope(async { ExecutionContext::current().unwrap().id() }).await;
        assert_ne!(outer, other);
    }

    #[tokio::test]
    async fn test_dropped_context_spawns_teardown() {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let ctx = ExecutionContext::new();
            let hits = Arc::clone(&hits);
            ctx.defer(move || async move {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_fires_when_scope_panics() {
        let hits = Arc::new(AtomicUsize::new(0));
        let task_hits = Arc::clone(&hits);
        let result: Result<(), _> = tokio::spawn(async move {
            ExecutionContext::scope(async move {
                let ctx = ExecutionContext::current().unwrap();
                ctx.defer(move || async move {
                    task_hits.fetch_add(1, Ordering::SeqCst);
                });
                drop(ctx);
                panic!("request failed");
            })
            .await
        })
        .await;
        assert!(result.is_err());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
