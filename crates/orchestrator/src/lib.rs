//! Orchestrator - job management and task distribution

mod orchestrator;
mod pipeline;
mod progress;
mod rate_limiter;

pub use orchestrator::{cancel_channel, Orchestrator};
pub use pipeline::TargetPipeline;
pub use progress::ProgressTracker;
pub use rate_limiter::RateLimiter;
