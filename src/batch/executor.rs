use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct BatchResult<T, E> {
    pub successes: Vec<(usize, T)>,
    pub failures: Vec<(usize, E)>,
    pub execution_time: Duration,
    /// Items attempted; less than the input length when the loop stopped early.
    pub total_processed: usize,
}

impl<T, E> BatchResult<T, E> {
    pub fn new() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
            execution_time: Duration::ZERO,
            total_processed: 0,
        }
    }
    pub fn add_success(&mut self, i: usize, r: T) {
        self.successes.push((i, r));
    }
    pub fn add_failure(&mut self, i: usize, e: E) {
        self.failures.push((i, e));
    }
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            self.successes.len() as f64 / self.total_processed as f64
        }
    }
}

impl<T, E> Default for BatchResult<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub message: String,
    pub index: usize,
}

impl BatchError {
    pub fn new(msg: impl Into<String>, idx: usize) -> Self {
        Self {
            message: msg.into(),
            index: idx,
        }
    }
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Batch error at {}: {}", self.index, self.message)
    }
}

impl std::error::Error for BatchError {}

#[derive(Debug, Clone)]
pub struct BatchExecutorConfig {
    pub continue_on_error: bool,
}

impl Default for BatchExecutorConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
        }
    }
}

impl BatchExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_continue_on_error(mut self, c: bool) -> Self {
        self.continue_on_error = c;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchExecutor {
    config: BatchExecutorConfig,
}

impl BatchExecutor {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_config(config: BatchExecutorConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &BatchExecutorConfig {
        &self.config
    }

    /// Await `executor_fn` for each item in input order.
    pub async fn execute_sequential<T, R, E, F, Fut>(
        &self,
        items: Vec<T>,
        mut executor_fn: F,
    ) -> BatchResult<R, BatchError>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: std::fmt::Display,
    {
        let start = Instant::now();
        let total = items.len();
        let mut result = BatchResult::new();
        for (i, item) in items.into_iter().enumerate() {
            result.total_processed += 1;
            match executor_fn(item).await {
                Ok(r) => result.add_success(i, r),
                Err(e) => {
                    warn!(index = i, error = %e, "batch item failed");
                    result.add_failure(i, BatchError::new(e.to_string(), i));
                    if !self.config.continue_on_error {
                        break;
                    }
                }
            }
        }
        result.execution_time = start.elapsed();
        debug!(
            total,
            processed = result.total_processed,
            failed = result.failure_count(),
            elapsed_ms = result.execution_time.as_millis() as u64,
            "batch finished"
        );
        result
    }
}
