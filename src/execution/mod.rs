//! # Execution
//!
//! Everything between the transport and the handlers: classification, routing,
//! the per-pool worker pools and the reviewer-side bus fan-out.
//!
//! ```text
//! UpdateSource ──▶ WorkerPool ──▶ Router (applicant pool)
//!                       └──────▶ BusPublisher ──▶ EventBus ──▶ Router (reviewer pool)
//!                                                          └──▶ ChannelQueue
//! ```

pub mod classifier;
pub mod reviewer_ingress;
pub mod router;
pub mod worker_pool;

pub use classifier::classify;
pub use reviewer_ingress::{subscribe_router, topic_for, BusPublisher};
pub use router::{
    DispatchOutcome, Router, RouterBuilder, RouterError, UpdateProcessor,
    BEGIN_REGISTRATION_PROMPT, INTERNAL_ERROR_REPLY,
};
pub use worker_pool::{WorkerPool, WorkerPoolConfig, WorkerPoolStats};
