//! Hook dispatch for marked methods.
//!
//! Methods whose names start with `___` become hookable: adapting a subject
//! exposes each of them under the stripped name, and every call runs the
//! before-hooks, the original method and the after-hooks registered for the
//! selector `"TypeName::method"`.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use wirehook_core::prelude::*;
//!
//! struct HelloWorld;
//!
//! #[hookable]
//! impl HelloWorld {
//!     fn ___greet(
//!         &self,
//!         #[default("hello")] salut: String,
//!         #[default("world")] what: String,
//!     ) -> String {
//!         format!("{salut} {what}")
//!     }
//! }
//!
//! let hooks = Arc::new(HookRegistry::new());
//! let hello = hooks.adapt(HelloWorld).unwrap();
//!
//! hooks.register_before("HelloWorld::greet", |event: &mut HookEvent<'_>| {
//!     event.set_arg(1, "before hook")
//! });
//!
//! assert_eq!(hello.greet(None, None).unwrap(), "hello before hook");
//! ```
//!
//! # Architecture
//!
//! - [`HookRegistry`] - hooks per selector and phase, kept in priority order
//! - [`HookEvent`] - mutable per-call context shared by the hooks of one call
//! - [`Dispatcher`] - runs the hook chain around an original method
//! - [`CallShape`] - type checks that undo hook writes of the wrong type
//! - [`Hookable`] / [`Wired`] - adapted subjects and their method tables
//! - [`hookable`] - attribute generating [`Hookable`] and the typed methods

// Self-reference so `#[hookable]` output can use `wirehook_core::` paths inside this crate.
extern crate self as wirehook_core;

pub mod adapter;
pub mod args;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod registry;
pub mod selector;
pub mod shape;

pub use adapter::{HOOKABLE_PREFIX, Hookable, HookableMethod, InvokeError, Param, Wired};
pub use args::Arguments;
pub use dispatch::Dispatcher;
pub use error::{
    ArgumentError, BoxError, CallError, ConfigError, HookError, HookExecutionError, HookFault,
    MethodError,
};
pub use event::{EventSnapshot, HookEvent};
pub use registry::{
    DEFAULT_PRIORITY, HookId, HookOutcome, HookRegistration, HookRegistry, Phase, RegistryConfig,
};
pub use selector::{ParseSelectorError, Selector, resolve_type_name, validate_type_name};
pub use shape::{CallShape, FnShape};

// Generated code and the `args!` macro reach serde_json through this path.
pub use serde_json;

pub use hook_macros::hookable;

/// Everything needed to declare hookable types and register hooks.
pub mod prelude {
    pub use crate::{
        Arguments, CallError, HookError, HookEvent, HookRegistry, Hookable, Phase,
        RegistryConfig, Wired, args, hookable,
    };
}
