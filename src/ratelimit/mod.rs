//! Rate limiting logic and state management.

mod entry;
mod limiter;
mod sweeper;

pub use entry::WindowEntry;
pub use limiter::RateLimiter;
