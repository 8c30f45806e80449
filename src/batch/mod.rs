//! Batch execution.
//!
//! Runs one async operation per input item, strictly one after another, and
//! records per-index successes and failures. A failed item does not stop the
//! loop unless [`BatchExecutorConfig::continue_on_error`] is turned off.
//!
//! ```
//! use supplychain_assistant::batch::BatchExecutor;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let executor = BatchExecutor::new();
//! let result = executor
//!     .execute_sequential(vec![1, 2, 3], |n| async move {
//!         if n == 2 { Err("two is unlucky") } else { Ok(n * 10) }
//!     })
//!     .await;
//! assert_eq!(result.successes, vec![(0, 10), (2, 30)]);
//! assert_eq!(result.failure_count(), 1);
//! # });
//! ```

mod executor;

pub use executor::{BatchError, BatchExecutor, BatchExecutorConfig, BatchResult};
