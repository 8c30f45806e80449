//! Construct-on-first-access handles for expensive resources.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::Result;

type InitFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Defers building a heavyweight value (an embedding client, an embedded
/// corpus) until the first [`get`](LazyResource::get), then reuses it.
///
/// The initializer runs at most once successfully. A failed initialization is
/// returned to the caller and the next `get` tries again.
pub struct LazyResource<T> {
    name: String,
    cell: OnceCell<T>,
    init: InitFn<T>,
    attempts: AtomicU64,
}

impl<T> LazyResource<T> {
    pub fn new<F, Fut>(name: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            name: name.into(),
            cell: OnceCell::new(),
            init: Box::new(move || Box::pin(init())),
            attempts: AtomicU64::new(0),
        }
    }

    /// A handle that is already initialized; the initializer never runs.
    pub fn ready(name: impl Into<String>, value: T) -> Self
    where
        T: Send + 'static,
    {
        let name = name.into();
        let missing = name.clone();
        Self {
            name,
            cell: OnceCell::new_with(Some(value)),
            init: Box::new(move || {
                let missing = missing.clone();
                Box::pin(async move {
                    Err(crate::Error::runtime(format!(
                        "resource '{}' has no initializer",
                        missing
                    )))
                })
            }),
            attempts: AtomicU64::new(0),
        }
    }

    pub async fn get(&self) -> Result<&T> {
        self.cell
            .get_or_try_init(|| async {
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                let started = Instant::now();
                match (self.init)().await {
                    Ok(v) => {
                        info!(
                            resource = %self.name,
                            attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "lazy resource initialized"
                        );
                        Ok(v)
                    }
                    Err(e) => {
                        warn!(resource = %self.name, attempt, error = %e, "lazy resource init failed");
                        Err(e)
                    }
                }
            })
            .await
    }

    /// The value, if some earlier `get` already built it.
    pub fn get_if_ready(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// How many times the initializer has been invoked (failures included).
    pub fn init_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for LazyResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyResource")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .field("attempts", &self.init_attempts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_initializer_runs_once() {
        let built = Arc::new(AtomicU64::new(0));
        let counter = built.clone();
        let handle = LazyResource::new("model", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1.0f32, 2.0])
            }
        });

        assert!(!handle.is_initialized());
        assert!(handle.get_if_ready().is_none());
        for _ in 0..5 {
            assert_eq!(handle.get().await.unwrap(), &vec![1.0, 2.0]);
        }
        assert!(handle.is_initialized());
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(handle.init_attempts(), 1);
    }

    #[tokio::test]
    async fn test_failed_init_is_retried() {
        let calls = Arc::new(AtomicU64::new(0));
        let c = calls.clone();
        let handle = LazyResource::new("flaky", move || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Error::runtime("cold start"))
                } else {
                    Ok("warm")
                }
            }
        });

        assert!(handle.get().await.is_err());
        assert!(!handle.is_initialized());
        assert_eq!(*handle.get().await.unwrap(), "warm");
        assert_eq!(*handle.get().await.unwrap(), "warm");
        assert_eq!(handle.init_attempts(), 2);
    }

    #[tokio::test]
    async fn test_ready_handle_skips_init() {
        let handle = LazyResource::ready("preloaded", 42u32);
        assert!(handle.is_initialized());
        assert_eq!(*handle.get().await.unwrap(), 42);
        assert_eq!(handle.init_attempts(), 0);
    }
}
