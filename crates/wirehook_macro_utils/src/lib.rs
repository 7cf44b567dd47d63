//! Shared utilities for wirehook procedural macro crates.
//!
//! Generated code has to name `wirehook_core` by a path that resolves in the
//! consuming crate. Consumers may depend on `wirehook_core` directly (possibly
//! renamed) or only on the `wirehook` umbrella crate, which re-exports it.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Name of the umbrella crate that re-exports every workspace crate.
const UMBRELLA: &str = "wirehook";

/// A wirehook crate that macro-generated code may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WirehookCrate {
    /// `wirehook_core`
    Core,
}

impl WirehookCrate {
    /// Returns the `Cargo.toml` package name for this crate.
    fn package_name(self) -> &'static str {
        match self {
            Self::Core => "wirehook_core",
        }
    }
}

/// Returns a [`TokenStream`] path for the given wirehook crate.
///
/// Resolution order:
/// 1. Direct dependency (possibly renamed in `Cargo.toml`), or the crate itself.
/// 2. Indirect access through the umbrella crate (`wirehook::wirehook_core`).
/// 3. The literal package name, so the compiler reports the missing dependency.
pub fn resolve_crate_path(krate: WirehookCrate) -> TokenStream {
    let package = krate.package_name();
    let fallback = format_ident!("{}", package);

    match crate_name(package) {
        Ok(FoundCrate::Itself) => quote!(#fallback),
        Ok(FoundCrate::Name(found)) => {
            let renamed = format_ident!("{}", found);
            quote!(#renamed)
        }
        Err(_) => match crate_name(UMBRELLA) {
            Ok(FoundCrate::Name(found)) => {
                let umbrella = format_ident!("{}", found);
                quote!(#umbrella::#fallback)
            }
            _ => quote!(#fallback),
        },
    }
}
