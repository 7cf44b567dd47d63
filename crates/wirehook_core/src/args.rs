//! Fixed-arity argument container passed to hooks and original methods.

use core::ops::Index;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ArgumentError;

/// Ordered positional arguments of one adapted call.
///
/// The arity is fixed when the call is made: values can be read as a whole or
/// per index and overwritten in place, but never added or removed. The same
/// container is handed to the original method after the before-phase, so hook
/// rewrites are what the method observes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arguments {
    values: Box<[Value]>,
}

impl Arguments {
    /// Creates an argument list from already converted values.
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Creates an empty argument list.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a call without arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All arguments in call order.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    /// All arguments as a mutable slice; values can be overwritten but the
    /// length cannot change.
    pub fn as_mut_slice(&mut self) -> &mut [Value] {
        &mut self.values
    }

    /// Iterates over the arguments in call order.
    pub fn iter(&self) -> core::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Returns the argument at `index`, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns a mutable reference to the argument at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.values.get_mut(index)
    }

    /// Overwrites the argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::OutOfRange`] if `index` is not below the arity.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<(), ArgumentError> {
        let arity = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(ArgumentError::OutOfRange { index, arity })?;
        *slot = value.into();
        Ok(())
    }

    /// Serializes `value` and stores it at `index`.
    ///
    /// # Errors
    ///
    /// Fails if the index is out of range or `value` cannot be serialized.
    pub fn set_as<T: Serialize>(&mut self, index: usize, value: &T) -> Result<(), ArgumentError> {
        let value = serde_json::to_value(value).map_err(ArgumentError::Encode)?;
        self.set(index, value)
    }

    /// Deserializes the argument at `index` into `T`.
    ///
    /// # Errors
    ///
    /// Fails if the index is out of range or the value has the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgumentError> {
        let value = self.values.get(index).ok_or(ArgumentError::OutOfRange {
            index,
            arity: self.values.len(),
        })?;
        T::deserialize(value).map_err(|source| ArgumentError::Decode { index, source })
    }

    /// Consumes the container and returns the values.
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.values.into_vec()
    }
}

impl Index<usize> for Arguments {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Value;
    type IntoIter = core::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl IntoIterator for Arguments {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_vec().into_iter()
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self {
            values: values.into_boxed_slice(),
        }
    }
}

impl<const N: usize> From<[Value; N]> for Arguments {
    fn from(values: [Value; N]) -> Self {
        Self::new(values)
    }
}

/// Builds an [`Arguments`] list from expressions convertible with `serde_json::json!`.
///
/// ```
/// use wirehook_core::args;
///
/// let args = args!["hi", 3, true];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::empty()
    };
    ($($value:tt),+ $(,)?) => {
        $crate::Arguments::new([$($crate::serde_json::json!($value)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_overwrites_in_place() {
        let mut args = Arguments::new([json!("hello"), json!("world")]);
        args.set(0, "hallo").unwrap();
        assert_eq!(args.as_slice(), &[json!("hallo"), json!("world")]);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn set_past_end_does_not_resize() {
        let mut args = Arguments::new([json!(1)]);
        let err = args.set(1, 2).unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::OutOfRange { index: 1, arity: 1 }
        ));
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn get_as_decodes_typed_values() {
        let args = Arguments::new([json!("hi"), json!(42)]);
        let first: String = args.get_as(0).unwrap();
        let second: u32 = args.get_as(1).unwrap();
        assert_eq!(first, "hi");
        assert_eq!(second, 42);
    }

    #[test]
    fn get_as_reports_decode_index() {
        let args = Arguments::new([json!("not a number")]);
        let err = args.get_as::<u32>(0).unwrap_err();
        assert!(matches!(err, ArgumentError::Decode { index: 0, .. }));
    }

    #[test]
    fn set_as_serializes_structs() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        let mut args = Arguments::new([Value::Null]);
        args.set_as(0, &Point { x: 1, y: 2 }).unwrap();
        assert_eq!(args[0], json!({"x": 1, "y": 2}));
    }

    #[test]
    fn args_macro_builds_values() {
        let args = crate::args!["a", 1, null];
        assert_eq!(args.as_slice(), &[json!("a"), json!(1), Value::Null]);
        assert!(crate::args![].is_empty());
    }

    #[test]
    fn mutable_slice_keeps_arity() {
        let mut args = Arguments::new([json!(1), json!(2)]);
        for value in args.as_mut_slice() {
            *value = json!("x");
        }
        assert_eq!(args.len(), 2);
        assert_eq!(args.as_slice(), &[json!("x"), json!("x")]);
    }

    #[test]
    fn whole_sequence_iteration_preserves_order() {
        let args = Arguments::from(vec![json!(1), json!(2), json!(3)]);
        let collected: Vec<_> = args.iter().cloned().collect();
        assert_eq!(collected, vec![json!(1), json!(2), json!(3)]);
    }
}
