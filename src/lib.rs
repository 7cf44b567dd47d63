//! Before/after method hooks for Rust types.
//!
//! This crate bundles [`wirehook_core`] (registry, dispatcher, adapter and the
//! `#[hookable]` macro) with optional subscriber setup from
//! `wirehook_tracing` (feature `tracing-setup`, on by default).
//!
//! ```
//! use std::sync::Arc;
//! use wirehook::prelude::*;
//!
//! struct PrioDemo;
//!
//! #[hookable]
//! impl PrioDemo {
//!     fn ___greet(&self) -> String {
//!         "hello world".to_owned()
//!     }
//! }
//!
//! let hooks = Arc::new(HookRegistry::new());
//! let prio = hooks.adapt(PrioDemo).unwrap();
//! hooks.register_after_with_priority("PrioDemo::greet", 10, |event: &mut HookEvent<'_>| {
//!     event.set_return("first");
//! });
//! hooks.register_after_with_priority("PrioDemo::greet", 20, |event: &mut HookEvent<'_>| {
//!     event.set_return("second");
//! });
//! assert_eq!(prio.greet().unwrap(), "second");
//! ```

pub use wirehook_core;
pub use wirehook_core::*;

#[cfg(feature = "tracing-setup")]
pub use wirehook_tracing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use wirehook_core::prelude::*;

    #[cfg(feature = "tracing-setup")]
    pub use wirehook_tracing::{TracingConfig, TracingFormat};
}
