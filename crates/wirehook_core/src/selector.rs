//! Selector keys and type-name resolution.
//!
//! A selector identifies the hookable-method family of one type:
//! `"<TypeName>::<method>"`. Type names come from an explicit name or from
//! [`core::any::type_name`]; derived names that are generic or anonymous are
//! rejected so unrelated instantiations never share hooks.

use core::fmt;
use core::str::FromStr;

use crate::error::ConfigError;

/// Separator between the type name and the method name.
pub const SEPARATOR: &str = "::";

/// Key of a hookable method, `"TypeName::method"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector {
    key: String,
    /// Byte offset of the separator within `key`.
    split: usize,
}

impl Selector {
    /// Builds the selector for `method` on `type_name`.
    #[must_use]
    pub fn new(type_name: &str, method: &str) -> Self {
        Self {
            key: format!("{type_name}{SEPARATOR}{method}"),
            split: type_name.len(),
        }
    }

    /// Parses `"TypeName::method"`, splitting at the last separator.
    ///
    /// Returns `None` when the separator is missing or either side is empty.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let (type_name, method) = key.rsplit_once(SEPARATOR)?;
        if type_name.is_empty() || method.is_empty() {
            return None;
        }
        Some(Self::new(type_name, method))
    }

    /// The type-name half.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.key[..self.split]
    }

    /// The method-name half.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.key[self.split + SEPARATOR.len()..]
    }

    /// The full key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for Selector {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// Error returned when parsing a string that is not a selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a `TypeName::method` selector")]
pub struct ParseSelectorError(String);

impl FromStr for Selector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseSelectorError(s.to_owned()))
    }
}

/// Derives the selector type name of `T`.
///
/// Uses the last path segment of [`core::any::type_name`], so
/// `app::models::Cart` becomes `Cart`.
///
/// # Errors
///
/// Returns [`ConfigError::GenericTypeName`] for generic instantiations,
/// closures, references, tuples, arrays, slices, pointers and trait objects.
pub fn resolve_type_name<T: ?Sized>() -> Result<&'static str, ConfigError> {
    let full = core::any::type_name::<T>();
    derive_type_name(full).ok_or(ConfigError::GenericTypeName { type_name: full })
}

/// Checks that an explicitly supplied type name is usable in selectors.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTypeName`] if the name is empty, contains the
/// `::` separator, whitespace or generic brackets.
pub fn validate_type_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains(SEPARATOR) {
        "name contains the `::` separator"
    } else if name.chars().any(char::is_whitespace) {
        "name contains whitespace"
    } else if name.contains(['<', '>']) {
        "name contains generic arguments"
    } else {
        return Ok(());
    };

    Err(ConfigError::InvalidTypeName {
        name: name.to_owned(),
        reason,
    })
}

fn derive_type_name(full: &'static str) -> Option<&'static str> {
    // Anything but a plain path: generics, closures, tuples, refs, dyn, ...
    if full.contains(['<', '>', '(', ')', '[', ']', '{', '}', '&', '*', ' ']) {
        return None;
    }
    let name = full.rsplit(SEPARATOR).next()?;
    if name.is_empty() || !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HelloWorld;
    struct Boxed<T>(T);

    #[test]
    fn new_joins_type_and_method() {
        let selector = Selector::new("HelloWorld", "greet");
        assert_eq!(selector.as_str(), "HelloWorld::greet");
        assert_eq!(selector.type_name(), "HelloWorld");
        assert_eq!(selector.method(), "greet");
    }

    #[test]
    fn parse_splits_at_last_separator() {
        let selector: Selector = "HelloWorld::greet".parse().unwrap();
        assert_eq!(selector, Selector::new("HelloWorld", "greet"));

        assert!(Selector::parse("greet").is_none());
        assert!(Selector::parse("::greet").is_none());
        assert!(Selector::parse("HelloWorld::").is_none());
        assert!("nope".parse::<Selector>().is_err());
    }

    #[test]
    fn resolves_plain_type_names() {
        assert_eq!(resolve_type_name::<HelloWorld>().unwrap(), "HelloWorld");
        assert_eq!(resolve_type_name::<String>().unwrap(), "String");
    }

    #[test]
    fn rejects_generic_and_anonymous_types() {
        assert!(matches!(
            resolve_type_name::<Boxed<u32>>(),
            Err(ConfigError::GenericTypeName { .. })
        ));
        assert!(resolve_type_name::<(u8, u8)>().is_err());
        assert!(resolve_type_name::<&str>().is_err());
        assert!(resolve_type_name::<[u8]>().is_err());
        assert!(resolve_type_name::<dyn core::any::Any>().is_err());

        let closure = || ();
        fn name_of<T>(_: &T) -> Result<&'static str, ConfigError> {
            resolve_type_name::<T>()
        }
        assert!(name_of(&closure).is_err());
    }

    #[test]
    fn validates_explicit_names() {
        assert!(validate_type_name("HelloWorld").is_ok());
        assert!(validate_type_name("").is_err());
        assert!(validate_type_name("a::B").is_err());
        assert!(validate_type_name("Hello World").is_err());
        assert!(validate_type_name("Boxed<u32>").is_err());
    }
}
