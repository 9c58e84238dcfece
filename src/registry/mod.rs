//! # Handler Registry Infrastructure
//!
//! Handler plugin traits and the per-pool registry the router is built from.
//!
//! ```text
//! HandlerRegistry (mutable, explicit registration)
//!     └── freeze() → RouteTable (immutable, owned by a Router)
//! ```

pub mod handler_registry;
pub mod traits;

// Re-export main types for easy access
pub use handler_registry::{HandlerRegistry, RegistryError, RouteTable};
pub use traits::{CallbackHandler, CommandHandler, MessageHandler};
