//! Type checks for values hooks write into an event.
//!
//! A hook only sees JSON values, so nothing stops it from writing a string
//! where the method takes an integer. When a method declares a [`CallShape`],
//! the dispatcher checks the event after every hook and undoes the writes of
//! a hook whose result no longer fits.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::args::Arguments;
use crate::error::ArgumentError;

/// Checks that hook-written values still fit a method's signature.
pub trait CallShape: Send + Sync {
    /// Checks that every argument decodes into its parameter type.
    ///
    /// # Errors
    ///
    /// Returns the first argument that does not fit.
    fn check_args(&self, args: &Arguments) -> Result<(), ArgumentError>;

    /// Checks that `value` decodes into the method's return type.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if it does not.
    fn check_return(&self, value: &Value) -> Result<(), serde_json::Error>;
}

/// [`CallShape`] built from a pair of check functions.
///
/// ```
/// use wirehook_core::shape::{CallShape, FnShape, decodes};
/// use wirehook_core::{ArgumentError, Arguments, args};
///
/// let shape = FnShape::new(
///     |args: &Arguments| -> Result<(), ArgumentError> {
///         let _: i64 = args.get_as(0)?;
///         Ok(())
///     },
///     decodes::<i64>,
/// );
///
/// assert!(shape.check_args(&args![1]).is_ok());
/// assert!(shape.check_args(&args!["one"]).is_err());
/// assert!(shape.check_return(&"two".into()).is_err());
/// ```
pub struct FnShape<A, R> {
    check_args: A,
    check_return: R,
}

impl<A, R> FnShape<A, R>
where
    A: Fn(&Arguments) -> Result<(), ArgumentError> + Send + Sync,
    R: Fn(&Value) -> Result<(), serde_json::Error> + Send + Sync,
{
    /// Creates a shape from an argument check and a return check.
    pub fn new(check_args: A, check_return: R) -> Self {
        Self {
            check_args,
            check_return,
        }
    }
}

impl<A, R> CallShape for FnShape<A, R>
where
    A: Fn(&Arguments) -> Result<(), ArgumentError> + Send + Sync,
    R: Fn(&Value) -> Result<(), serde_json::Error> + Send + Sync,
{
    fn check_args(&self, args: &Arguments) -> Result<(), ArgumentError> {
        (self.check_args)(args)
    }

    fn check_return(&self, value: &Value) -> Result<(), serde_json::Error> {
        (self.check_return)(value)
    }
}

/// Returns `Ok` if `value` deserializes into `T`.
///
/// # Errors
///
/// Returns the deserialization error otherwise.
pub fn decodes<T: DeserializeOwned>(value: &Value) -> Result<(), serde_json::Error> {
    T::deserialize(value).map(drop)
}
