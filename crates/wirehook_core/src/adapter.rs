//! Adapting subjects so their hookable methods run through the dispatcher.
//!
//! A type opts in by implementing [`Hookable`], normally through the
//! [`#[hookable]`](crate::hookable) attribute, which lists the methods whose
//! names start with the reserved `___` prefix. [`Wired`] wraps a shared
//! subject and routes those methods through a [`Dispatcher`]; everything
//! else stays reachable through `Deref` without touching the registry.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wirehook_core::{HookEvent, HookRegistry, hookable};
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
//! assert_eq!(hello.greet(None, None).unwrap(), "hello world");
//!
//! hooks.register_after("HelloWorld::greet", |event: &mut HookEvent<'_>| {
//!     event.set_return("hi universe");
//! });
//! assert_eq!(hello.greet(Some("hi".into()), None).unwrap(), "hi universe");
//! ```

use core::fmt;
use core::ops::Deref;
use std::borrow::Cow;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::args::Arguments;
use crate::dispatch::Dispatcher;
use crate::error::{ArgumentError, CallError, ConfigError, MethodError};
use crate::registry::HookRegistry;
use crate::selector::{Selector, resolve_type_name, validate_type_name};
use crate::shape::CallShape;

/// Prefix marking a method as hookable.
pub const HOOKABLE_PREFIX: &str = "___";

// ─────────────────────────────────────────────────────────────────────────────
// HookableMethod
// ─────────────────────────────────────────────────────────────────────────────

/// Failure of a type-erased method invoker.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Arguments could not be decoded or the result could not be encoded.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The original method returned an error.
    #[error(transparent)]
    Method(MethodError),
}

impl InvokeError {
    /// Wraps an error returned by the original method.
    pub fn method(err: impl core::error::Error + Send + Sync + 'static) -> Self {
        Self::Method(MethodError::new(err))
    }
}

type Invoker<T> = dyn Fn(&T, &Arguments) -> Result<Value, InvokeError> + Send + Sync;

/// A declared parameter of a hookable method.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    default: Option<Value>,
}

impl Param {
    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value used when a dynamic call omits this parameter.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Entry describing one hookable method of `T`.
pub struct HookableMethod<T> {
    name: String,
    params: Vec<Param>,
    invoker: Arc<Invoker<T>>,
    shape: Option<Arc<dyn CallShape>>,
}

impl<T> HookableMethod<T> {
    /// Creates an entry for the public method `name`.
    ///
    /// `invoker` calls the original method with positional arguments.
    pub fn new<F>(name: impl Into<String>, invoker: F) -> Self
    where
        F: Fn(&T, &Arguments) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            invoker: Arc::new(invoker),
            shape: None,
        }
    }

    /// Declares the next parameter as required.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Declares the next parameter with a default value.
    #[must_use]
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    /// Type checks applied to values hooks write for this method.
    ///
    /// Without a shape, a hook writing a value of the wrong type makes the
    /// call fail with [`CallError::Argument`] or [`CallError::Return`].
    #[must_use]
    pub fn with_shape(mut self, shape: impl CallShape + 'static) -> Self {
        self.shape = Some(Arc::new(shape));
        self
    }

    /// The declared type checks, if any.
    #[must_use]
    pub fn shape(&self) -> Option<&dyn CallShape> {
        self.shape.as_deref()
    }

    /// Public (prefix-stripped) method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters in call order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Calls the original method directly, without hooks.
    ///
    /// # Errors
    ///
    /// Returns the invoker's error.
    pub fn invoke(&self, subject: &T, args: &Arguments) -> Result<Value, InvokeError> {
        (self.invoker)(subject, args)
    }
}

impl<T> Clone for HookableMethod<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            params: self.params.clone(),
            invoker: Arc::clone(&self.invoker),
            shape: self.shape.clone(),
        }
    }
}

impl<T> fmt::Debug for HookableMethod<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookableMethod")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("shaped", &self.shape.is_some())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hookable
// ─────────────────────────────────────────────────────────────────────────────

/// Types whose marked methods can be routed through hooks.
///
/// Usually implemented by [`#[hookable]`](crate::hookable). A manual
/// implementation lists the methods explicitly:
///
/// ```
/// use wirehook_core::{Arguments, Hookable, HookableMethod, InvokeError};
///
/// struct Doubler;
///
/// impl Hookable for Doubler {
///     fn hookable_methods() -> Vec<HookableMethod<Self>> {
///         vec![
///             HookableMethod::new("double", |_: &Doubler, args: &Arguments| {
///                 let n: i64 = args.get_as(0)?;
///                 Ok::<_, InvokeError>((n * 2).into())
///             })
///             .param("n"),
///         ]
///     }
/// }
/// ```
pub trait Hookable: Send + Sync + 'static {
    /// Explicit type name used in selectors.
    ///
    /// When `None`, the name is derived from [`core::any::type_name`], which
    /// fails for generic and anonymous types.
    const TYPE_NAME: Option<&'static str> = None;

    /// Returns the hookable methods of this type.
    fn hookable_methods() -> Vec<HookableMethod<Self>>
    where
        Self: Sized;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wired
// ─────────────────────────────────────────────────────────────────────────────

struct MethodEntry<T> {
    selector: Selector,
    method: HookableMethod<T>,
}

/// A subject whose hookable methods run through the hook dispatcher.
///
/// Created with [`Wired::adapt`] or [`HookRegistry::adapt`]. The wrapper
/// shares the subject through an [`Arc`]; the original handle stays usable
/// and calling methods on it directly bypasses all hooks.
pub struct Wired<T: Hookable> {
    subject: Arc<T>,
    type_name: Arc<str>,
    dispatcher: Dispatcher,
    methods: Arc<IndexMap<String, MethodEntry<T>>>,
}

impl<T: Hookable> Wired<T> {
    /// Adapts `subject`, naming it by [`Hookable::TYPE_NAME`] or its derived type name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if no explicit name is declared and the derived
    /// one is generic or anonymous.
    pub fn adapt(registry: &Arc<HookRegistry>, subject: Arc<T>) -> Result<Self, ConfigError> {
        let type_name = match T::TYPE_NAME {
            Some(name) => {
                validate_type_name(name)?;
                name
            }
            None => resolve_type_name::<T>()?,
        };
        Ok(Self::build(registry, subject, type_name))
    }

    /// Adapts `subject` under an explicit type name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTypeName`] if `type_name` cannot be used
    /// in selectors.
    pub fn adapt_named(
        registry: &Arc<HookRegistry>,
        subject: Arc<T>,
        type_name: &str,
    ) -> Result<Self, ConfigError> {
        validate_type_name(type_name)?;
        Ok(Self::build(registry, subject, type_name))
    }

    fn build(registry: &Arc<HookRegistry>, subject: Arc<T>, type_name: &str) -> Self {
        let methods: IndexMap<String, MethodEntry<T>> = T::hookable_methods()
            .into_iter()
            .map(|method| {
                let entry = MethodEntry {
                    selector: Selector::new(type_name, method.name()),
                    method,
                };
                (entry.method.name().to_owned(), entry)
            })
            .collect();

        tracing::debug!(
            type_name,
            methods = methods.len(),
            "Adapted hookable subject"
        );

        Self {
            subject,
            type_name: Arc::from(type_name),
            dispatcher: Dispatcher::new(Arc::clone(registry)),
            methods: Arc::new(methods),
        }
    }

    /// Type name used in this wrapper's selectors.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The shared subject.
    #[must_use]
    pub fn subject(&self) -> &Arc<T> {
        &self.subject
    }

    /// The registry hooks are read from.
    #[must_use]
    pub fn registry(&self) -> &Arc<HookRegistry> {
        self.dispatcher.registry()
    }

    /// Public names of the hookable methods, in declaration order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Returns `true` if `method` is hookable on this subject.
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Returns the declaration of a hookable method.
    #[must_use]
    pub fn method(&self, method: &str) -> Option<&HookableMethod<T>> {
        self.methods.get(method).map(|entry| &entry.method)
    }

    /// Selector of a hookable method, or `None` if it is not hookable.
    #[must_use]
    pub fn selector(&self, method: &str) -> Option<&Selector> {
        self.methods.get(method).map(|entry| &entry.selector)
    }

    /// Selector key for `method`, whether or not it is hookable.
    #[must_use]
    pub fn selector_key(&self, method: &str) -> Cow<'_, str> {
        match self.methods.get(method) {
            Some(entry) => Cow::Borrowed(entry.selector.as_str()),
            None => Cow::Owned(Selector::new(&self.type_name, method).to_string()),
        }
    }

    /// Returns `true` if both wrappers share the same subject.
    #[must_use]
    pub fn same_subject(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.subject, &other.subject)
    }

    /// Calls a hookable method with positional arguments.
    ///
    /// Omitted trailing parameters take their declared defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::UnknownMethod`], [`CallError::Arity`] or, for
    /// methods with a shape, [`CallError::Argument`] before any hook runs.
    /// Returns [`CallError::Method`] with the original error.
    pub fn call(
        &self,
        method: &str,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Value, CallError<MethodError>> {
        let entry = self
            .methods
            .get(method)
            .ok_or_else(|| CallError::UnknownMethod {
                selector: self.selector_key(method).into_owned(),
            })?;

        let mut values: Vec<Value> = args.into_iter().collect();
        let supplied = values.len();
        let params = entry.method.params();
        let arity_error = || CallError::Arity {
            selector: entry.selector.to_string(),
            expected: params.len(),
            actual: supplied,
        };

        if supplied > params.len() {
            return Err(arity_error());
        }
        for param in &params[supplied..] {
            let default = param.default().ok_or_else(arity_error)?;
            values.push(default.clone());
        }

        let args = Arguments::from(values);
        let shape = entry.method.shape();
        if let Some(shape) = shape
            && let Err(source) = shape.check_args(&args)
        {
            return Err(CallError::Argument {
                selector: entry.selector.to_string(),
                source,
            });
        }

        self.dispatcher.dispatch_checked(
            entry.selector.as_str(),
            &*self.subject,
            args,
            shape,
            |subject, args| {
                entry.method.invoke(subject, args).map_err(|err| match err {
                    InvokeError::Argument(source) => CallError::Argument {
                        selector: entry.selector.to_string(),
                        source,
                    },
                    InvokeError::Method(err) => CallError::Method(err),
                })
            },
        )
    }

    /// Dispatches `method` with an already built argument list.
    ///
    /// This is the entry point of the typed methods generated by
    /// `#[hookable]`. `original` receives the subject and the arguments as
    /// rewritten by before-hooks; its error is returned unchanged. Hook
    /// writes are checked against the method's shape when it declares one.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `original`.
    pub fn dispatch<E, F>(&self, method: &str, args: Arguments, original: F) -> Result<Value, E>
    where
        F: FnOnce(&T, &Arguments) -> Result<Value, E>,
    {
        let selector = self.selector_key(method);
        let shape = self
            .methods
            .get(method)
            .and_then(|entry| entry.method.shape());
        self.dispatcher
            .dispatch_checked(&selector, &*self.subject, args, shape, original)
    }

    /// Builds a [`CallError::Argument`] for `method`.
    #[must_use]
    pub fn argument_error<E>(&self, method: &str, source: ArgumentError) -> CallError<E> {
        CallError::Argument {
            selector: self.selector_key(method).into_owned(),
            source,
        }
    }

    /// Builds a [`CallError::Return`] for `method`.
    #[must_use]
    pub fn return_error<E>(&self, method: &str, source: serde_json::Error) -> CallError<E> {
        CallError::Return {
            selector: self.selector_key(method).into_owned(),
            source,
        }
    }
}

impl<T: Hookable> Clone for Wired<T> {
    fn clone(&self) -> Self {
        Self {
            subject: Arc::clone(&self.subject),
            type_name: Arc::clone(&self.type_name),
            dispatcher: self.dispatcher.clone(),
            methods: Arc::clone(&self.methods),
        }
    }
}

impl<T: Hookable> Deref for Wired<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.subject
    }
}

impl<T: Hookable> fmt::Debug for Wired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wired")
            .field("type_name", &self.type_name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl HookRegistry {
    /// Adapts `subject` against this registry. See [`Wired::adapt`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the subject's type name cannot be used.
    pub fn adapt<T: Hookable>(self: &Arc<Self>, subject: T) -> Result<Wired<T>, ConfigError> {
        Wired::adapt(self, Arc::new(subject))
    }

    /// Adapts a subject that is already shared. See [`Wired::adapt`].
    ///
    /// Adapting the same `Arc` twice yields wrappers over the same subject
    /// that dispatch identically.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the subject's type name cannot be used.
    pub fn adapt_shared<T: Hookable>(
        self: &Arc<Self>,
        subject: Arc<T>,
    ) -> Result<Wired<T>, ConfigError> {
        Wired::adapt(self, subject)
    }

    /// Adapts `subject` under an explicit type name. See [`Wired::adapt_named`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTypeName`] if `type_name` cannot be used.
    pub fn adapt_named<T: Hookable>(
        self: &Arc<Self>,
        subject: T,
        type_name: &str,
    ) -> Result<Wired<T>, ConfigError> {
        Wired::adapt_named(self, Arc::new(subject), type_name)
    }
}
