//! Error types for adaptation, hook execution and adapted calls.

use core::convert::Infallible;

use thiserror::Error;

use crate::registry::{HookId, Phase};

/// Boxed error used where the concrete type is erased.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors raised synchronously when a subject cannot be adapted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The type name derived from the subject is generic or anonymous, so
    /// unrelated types could end up sharing selectors.
    #[error("type name `{type_name}` is generic or anonymous; adapt it with an explicit name")]
    GenericTypeName {
        /// The full derived type name.
        type_name: &'static str,
    },

    /// An explicitly supplied type name cannot be used in a selector.
    #[error("invalid type name `{name}`: {reason}")]
    InvalidTypeName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
}

/// Errors from reading or writing a positional argument.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// The index lies outside the arity fixed at the call site.
    #[error("argument index {index} is out of range for {arity} argument(s)")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of arguments of the call.
        arity: usize,
    },

    /// The stored value does not deserialize into the requested type.
    #[error("argument {index} could not be decoded: {source}")]
    Decode {
        /// Index of the offending argument.
        index: usize,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A typed value could not be converted into an argument value.
    #[error("value could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failure reported by a hook callback.
///
/// Hook failures never reach the caller of the adapted method; the dispatcher
/// logs them and moves on to the next hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// Free-form failure message.
    #[error("{0}")]
    Message(String),

    /// Reading or writing an argument failed.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Serializing or deserializing a value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other error raised by the hook.
    #[error(transparent)]
    Other(BoxError),
}

impl HookError {
    /// Creates a [`Message`](Self::Message) error.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps an arbitrary error as [`Other`](Self::Other).
    pub fn other(err: impl core::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(err))
    }
}

/// How a hook callback failed.
#[derive(Debug, Error)]
pub enum HookFault {
    /// The callback returned an error.
    #[error(transparent)]
    Failed(HookError),

    /// The callback panicked; holds the panic message when one was available.
    #[error("hook panicked: {0}")]
    Panicked(String),

    /// The callback wrote an argument the method cannot accept; its writes
    /// were undone.
    #[error("hook wrote an unusable argument: {0}")]
    RejectedArgument(ArgumentError),

    /// The callback wrote a return value of the wrong type; its writes were
    /// undone.
    #[error("hook wrote an unusable return value: {0}")]
    RejectedReturn(serde_json::Error),
}

/// A hook callback failed during dispatch.
///
/// Built by the dispatcher for logging only; it is never returned from an
/// adapted call.
#[derive(Debug, Error)]
#[error("{phase} hook {hook} on `{selector}` failed: {fault}")]
pub struct HookExecutionError {
    /// Phase the failing hook was registered for.
    pub phase: Phase,
    /// Selector being dispatched.
    pub selector: String,
    /// Identity of the failing registration.
    pub hook: HookId,
    /// What went wrong.
    pub fault: HookFault,
}

/// Type-erased error of an original method, as seen by dynamic calls.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct MethodError(BoxError);

impl MethodError {
    /// Wraps a method error.
    pub fn new(err: impl core::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    /// Returns the wrapped error if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: core::error::Error + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Unwraps the boxed error.
    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

/// Errors returned from a call on an adapted subject.
///
/// `E` is the error type of the original method. Its errors are carried
/// untouched in [`Method`](Self::Method); methods that cannot fail use the
/// default [`Infallible`].
#[derive(Debug, Error)]
pub enum CallError<E = Infallible> {
    /// No hookable method with this name exists on the subject.
    #[error("`{selector}` is not a hookable method")]
    UnknownMethod {
        /// Selector that was looked up.
        selector: String,
    },

    /// The number of supplied arguments does not match the declared arity.
    #[error("`{selector}` takes {expected} argument(s) but {actual} were supplied")]
    Arity {
        /// Selector of the called method.
        selector: String,
        /// Declared number of parameters.
        expected: usize,
        /// Number of arguments supplied, or required ones missing.
        actual: usize,
    },

    /// An argument could not be converted to or from the parameter type.
    #[error("bad argument for `{selector}`: {source}")]
    Argument {
        /// Selector of the called method.
        selector: String,
        /// Underlying argument error.
        #[source]
        source: ArgumentError,
    },

    /// The final return value does not deserialize into the method's return type.
    #[error("return value of `{selector}` could not be decoded: {source}")]
    Return {
        /// Selector of the called method.
        selector: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The original method itself failed.
    #[error(transparent)]
    Method(E),
}

impl<E> CallError<E> {
    /// Returns the original method's error, if this is one.
    pub fn into_method_error(self) -> Option<E> {
        match self {
            Self::Method(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the original method failed.
    #[must_use]
    pub fn is_method_error(&self) -> bool {
        matches!(self, Self::Method(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq, Eq)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn config_error_names_the_type() {
        let err = ConfigError::GenericTypeName {
            type_name: "app::Boxed<u32>",
        };
        assert!(err.to_string().contains("app::Boxed<u32>"));
    }

    #[test]
    fn method_error_is_transparent() {
        let err: CallError<DiskFull> = CallError::Method(DiskFull);
        assert_eq!(err.to_string(), "disk full");
        assert!(err.is_method_error());
        assert_eq!(err.into_method_error(), Some(DiskFull));
    }

    #[test]
    fn execution_error_display_includes_context() {
        let err = HookExecutionError {
            phase: Phase::Before,
            selector: "HelloWorld::greet".to_owned(),
            hook: HookId::from_raw(3),
            fault: HookFault::Failed(HookError::msg("boom")),
        };
        assert_eq!(
            err.to_string(),
            "before hook #3 on `HelloWorld::greet` failed: boom"
        );
    }
}
