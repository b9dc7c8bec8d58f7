//! Policy layer (rate limiting, input inspection).

pub mod inspect;
pub mod limiter;

pub use inspect::find_suspicious;
pub use limiter::{RateLimiter, RouteClass};
