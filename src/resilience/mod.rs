//! Retry around external calls.
//!
//! Failures of the hosted model are caught, reported, and retried a fixed
//! number of times with a fixed pause. There is no backoff curve and no
//! circuit breaker; non-retryable errors (bad requests, schema violations)
//! surface immediately.

mod retry;

pub use retry::RetryPolicy;
