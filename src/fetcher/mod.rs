pub mod backoff;
pub mod client;
pub mod errors;
pub mod pipeline;
pub mod rate_limit;
pub mod types;

pub use backoff::RetryPolicy;
pub use client::Fetcher;
pub use errors::FetchError;
pub use rate_limit::RateLimiter;
pub use types::{Charset, DocumentBytes, PageResponse};
