pub mod backoff;

pub use backoff::{with_retry, RetryPolicy, Transient};
