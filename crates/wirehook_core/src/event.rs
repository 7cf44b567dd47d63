//! Per-call context handed to every hook of one invocation.

use core::any::Any;
use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::args::Arguments;
use crate::error::ArgumentError;

/// Mutable context of one adapted call.
///
/// Before-hooks may rewrite arguments, set the return value and request
/// replacement of the original method. After-hooks see the arguments the
/// method actually received and may overwrite the return value.
pub struct HookEvent<'a> {
    selector: &'a str,
    subject: &'a (dyn Any + Send + Sync),
    args: Arguments,
    return_value: Value,
    replace: bool,
}

impl<'a> HookEvent<'a> {
    /// Creates an event with an empty (`null`) return slot.
    pub fn new(selector: &'a str, subject: &'a (dyn Any + Send + Sync), args: Arguments) -> Self {
        Self {
            selector,
            subject,
            args,
            return_value: Value::Null,
            replace: false,
        }
    }

    /// Selector of the call, `"TypeName::method"`.
    #[must_use]
    pub fn selector(&self) -> &'a str {
        self.selector
    }

    /// Returns the call's subject if it is a `T`.
    #[must_use]
    pub fn subject<T: Any>(&self) -> Option<&'a T> {
        let subject: &'a (dyn Any + Send + Sync) = self.subject;
        subject.downcast_ref::<T>()
    }

    /// All arguments of the call.
    #[must_use]
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// Mutable access to the argument values.
    ///
    /// Values can be overwritten in place; the arity fixed at the call site
    /// cannot change.
    pub fn args_mut(&mut self) -> &mut [Value] {
        self.args.as_mut_slice()
    }

    /// Returns the argument at `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Deserializes the argument at `index`.
    ///
    /// # Errors
    ///
    /// Fails if the index is out of range or the value has the wrong shape.
    pub fn arg_as<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgumentError> {
        self.args.get_as(index)
    }

    /// Overwrites the argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::OutOfRange`] if `index` is not below the arity.
    pub fn set_arg(&mut self, index: usize, value: impl Into<Value>) -> Result<(), ArgumentError> {
        self.args.set(index, value)
    }

    /// Current return value; `null` until the original method ran or a hook set one.
    #[must_use]
    pub fn return_value(&self) -> &Value {
        &self.return_value
    }

    /// Deserializes the current return value.
    ///
    /// # Errors
    ///
    /// Fails if the value does not have the shape of `T`.
    pub fn return_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.return_value)
    }

    /// Overwrites the return value.
    pub fn set_return(&mut self, value: impl Into<Value>) {
        self.return_value = value.into();
    }

    /// Whether a before-hook asked to replace the original method.
    #[must_use]
    pub fn is_replaced(&self) -> bool {
        self.replace
    }

    /// Sets the replace flag.
    ///
    /// Only meaningful during the before-phase: once set, the remaining
    /// before-hooks, the original method and all after-hooks are skipped and
    /// the current return value becomes the result.
    pub fn set_replace(&mut self, replace: bool) {
        self.replace = replace;
    }

    /// Sets the return value and requests replacement in one step.
    pub fn replace_with(&mut self, value: impl Into<Value>) {
        self.set_return(value);
        self.replace = true;
    }

    /// Serializable copy of the event's observable state, used in fault logs.
    #[must_use]
    pub fn snapshot(&self) -> EventSnapshot {
        EventSnapshot {
            selector: self.selector.to_owned(),
            args: self.args.clone(),
            return_value: self.return_value.clone(),
            replace: self.replace,
        }
    }

    pub(crate) fn save(&self) -> SavedState {
        SavedState {
            args: self.args.clone(),
            return_value: self.return_value.clone(),
            replace: self.replace,
        }
    }

    pub(crate) fn restore(&mut self, state: SavedState) {
        self.args = state.args;
        self.return_value = state.return_value;
        self.replace = state.replace;
    }

    pub(crate) fn store_return(&mut self, value: Value) {
        self.return_value = value;
    }

    pub(crate) fn into_return(self) -> Value {
        self.return_value
    }
}

impl fmt::Debug for HookEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEvent")
            .field("selector", &self.selector)
            .field("args", &self.args)
            .field("return_value", &self.return_value)
            .field("replace", &self.replace)
            .finish_non_exhaustive()
    }
}

/// Mutable part of an event, kept so a rejected hook write can be undone.
pub(crate) struct SavedState {
    args: Arguments,
    return_value: Value,
    replace: bool,
}

/// Owned copy of a [`HookEvent`] without its subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSnapshot {
    /// Selector of the call.
    pub selector: String,
    /// Arguments at the time of the snapshot.
    pub args: Arguments,
    /// Return value at the time of the snapshot.
    #[serde(rename = "return")]
    pub return_value: Value,
    /// Replace flag at the time of the snapshot.
    pub replace: bool,
}

impl fmt::Display for EventSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Greeter {
        greeting: &'static str,
    }

    #[test]
    fn new_event_starts_empty() {
        let subject = Greeter { greeting: "hello" };
        let event = HookEvent::new("Greeter::greet", &subject, Arguments::empty());

        assert_eq!(event.selector(), "Greeter::greet");
        assert_eq!(event.return_value(), &Value::Null);
        assert!(!event.is_replaced());
        assert!(event.args().is_empty());
    }

    #[test]
    fn subject_downcasts_to_concrete_type() {
        let subject = Greeter { greeting: "hello" };
        let event = HookEvent::new("Greeter::greet", &subject, Arguments::empty());

        let greeter = event.subject::<Greeter>().expect("subject is a Greeter");
        assert_eq!(greeter.greeting, "hello");
        assert!(event.subject::<String>().is_none());
    }

    #[test]
    fn replace_with_sets_both_fields() {
        let subject = ();
        let mut event = HookEvent::new("Unit::call", &subject, Arguments::empty());
        event.replace_with("cached");

        assert!(event.is_replaced());
        assert_eq!(event.return_as::<String>().unwrap(), "cached");
    }

    #[test]
    fn argument_rewrites_are_visible() {
        let subject = ();
        let mut event = HookEvent::new(
            "Unit::call",
            &subject,
            Arguments::new([json!("hello"), json!("world")]),
        );
        event.set_arg(1, "welt").unwrap();

        assert_eq!(event.arg(1), Some(&json!("welt")));
        assert_eq!(event.arg_as::<String>(0).unwrap(), "hello");
        assert!(event.set_arg(2, "extra").is_err());
    }

    #[test]
    fn args_mut_cannot_resize() {
        let subject = ();
        let mut event = HookEvent::new(
            "Unit::call",
            &subject,
            Arguments::new([json!("a"), json!("b")]),
        );
        let values = event.args_mut();
        values[0] = json!("z");
        assert_eq!(values.len(), 2);

        assert_eq!(event.args().as_slice(), &[json!("z"), json!("b")]);
    }

    #[test]
    fn restore_undoes_writes() {
        let subject = ();
        let mut event = HookEvent::new("Unit::call", &subject, Arguments::new([json!(1)]));
        let saved = event.save();
        event.set_arg(0, "bad").unwrap();
        event.replace_with(json!(null));

        event.restore(saved);
        assert_eq!(event.arg(0), Some(&json!(1)));
        assert!(!event.is_replaced());
        assert_eq!(event.return_value(), &Value::Null);
    }

    #[test]
    fn snapshot_renders_as_json() {
        let subject = ();
        let mut event = HookEvent::new("Unit::call", &subject, Arguments::new([json!(1)]));
        event.set_return("done");

        let snapshot = event.snapshot();
        assert_eq!(
            snapshot.to_string(),
            r#"{"selector":"Unit::call","args":[1],"return":"done","replace":false}"#
        );
    }
}
