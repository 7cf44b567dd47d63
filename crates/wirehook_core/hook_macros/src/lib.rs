//! Procedural macros for wirehook.
//!
//! Provides `#[hookable]`, which turns the `___`-prefixed methods of an impl
//! block into hookable methods of the adapted wrapper.

mod common;
mod hookable;

use proc_macro::TokenStream;

/// Makes the `___`-prefixed methods of an inherent impl block hookable.
///
/// Generates:
///
/// - a `Hookable` impl listing every marked method under its stripped name,
///   so `Wired::call("greet", ..)` can reach `___greet`,
/// - a public extension trait (`<Type>Hooks` by default) implemented for
///   `Wired<Type>`, with one typed method per marked method.
///
/// Marked methods must take `&self` and cannot be async, unsafe, extern or
/// generic. Parameter and return types must implement `Serialize` and
/// `DeserializeOwned`. A method returning `Result<T, E>` surfaces `E` as
/// `CallError::Method`.
///
/// # Arguments
///
/// - `name = "..."` - type name used in selectors instead of the derived one
/// - `hooks_trait = "..."` - name of the generated extension trait
///
/// # Parameter Attributes
///
/// - `#[default(value)]` - makes the parameter optional; the typed method takes
///   an `Option` and dynamic calls may omit it
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wirehook_core::{HookRegistry, hookable};
///
/// struct Cart {
///     items: Vec<u64>,
/// }
///
/// #[hookable(name = "Cart")]
/// impl Cart {
///     /// Sum of all item prices.
///     fn ___total(&self, #[default(0)] discount: u64) -> u64 {
///         self.items.iter().sum::<u64>().saturating_sub(discount)
///     }
/// }
///
/// let hooks = Arc::new(HookRegistry::new());
/// let cart = hooks.adapt(Cart { items: vec![3, 4] }).unwrap();
/// assert_eq!(cart.total(None).unwrap(), 7);
/// assert_eq!(cart.total(Some(2)).unwrap(), 5);
/// ```
#[proc_macro_attribute]
pub fn hookable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemImpl);
    hookable::generate_hookable(attr.into(), &input).into()
}
