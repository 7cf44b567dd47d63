//! Shared utilities for hookable code generation.

use proc_macro2::TokenStream;
use syn::{
    Attribute, FnArg, GenericArgument, Ident, Pat, PatType, PathArguments, ReturnType, Signature,
    Type,
};

/// Prefix that marks a method as hookable.
pub(crate) const HOOKABLE_PREFIX: &str = "___";

/// Public names that would be shadowed by methods of `Wired` itself.
const RESERVED_NAMES: &[&str] = &[
    "argument_error",
    "call",
    "clone",
    "dispatch",
    "has_method",
    "method",
    "method_names",
    "registry",
    "return_error",
    "same_subject",
    "selector",
    "selector_key",
    "subject",
    "type_name",
];

/// Returns the public name of a hookable method, or `None` if the method is
/// not marked.
pub(crate) fn public_name(ident: &Ident) -> Option<String> {
    ident
        .to_string()
        .strip_prefix(HOOKABLE_PREFIX)
        .map(str::to_owned)
}

/// Validates that a marked method can be dispatched through hooks.
///
/// Rejects async, unsafe, extern and generic methods, names that clash with
/// methods of the adapted wrapper, and anything not taking `&self`.
pub(crate) fn validate_hookable_signature(sig: &Signature) -> Option<TokenStream> {
    if let Some(asyncness) = &sig.asyncness {
        return Some(
            syn::Error::new_spanned(asyncness, "hookable methods cannot be async")
                .to_compile_error(),
        );
    }

    if let Some(unsafety) = &sig.unsafety {
        return Some(
            syn::Error::new_spanned(unsafety, "hookable methods cannot be unsafe")
                .to_compile_error(),
        );
    }

    if let Some(abi) = &sig.abi {
        return Some(
            syn::Error::new_spanned(abi, "hookable methods cannot be extern").to_compile_error(),
        );
    }

    if !sig.generics.params.is_empty() {
        return Some(
            syn::Error::new_spanned(&sig.generics, "hookable methods cannot be generic")
                .to_compile_error(),
        );
    }

    if public_name(&sig.ident).is_some_and(|name| name.is_empty()) {
        return Some(
            syn::Error::new_spanned(
                &sig.ident,
                "hookable method name is empty after the `___` prefix",
            )
            .to_compile_error(),
        );
    }

    if let Some(name) = public_name(&sig.ident)
        && RESERVED_NAMES.contains(&name.as_str())
    {
        return Some(
            syn::Error::new_spanned(
                &sig.ident,
                format!(
                    "hookable method name `{name}` is reserved by the adapted wrapper; \
                     choose another name"
                ),
            )
            .to_compile_error(),
        );
    }

    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver)) => {
            if receiver.reference.is_none() {
                return Some(
                    syn::Error::new_spanned(
                        receiver,
                        "hookable methods must take `&self`, not `self` by value; \
                         adapted subjects are shared through an Arc",
                    )
                    .to_compile_error(),
                );
            }
            if receiver.mutability.is_some() {
                return Some(
                    syn::Error::new_spanned(
                        receiver,
                        "hookable methods must take `&self`, not `&mut self`; \
                         adapted subjects are shared through an Arc",
                    )
                    .to_compile_error(),
                );
            }
            None
        }
        _ => Some(
            syn::Error::new_spanned(
                sig.fn_token,
                "hookable methods must take `&self` as the first parameter",
            )
            .to_compile_error(),
        ),
    }
}

/// Parsed information about a single method parameter.
#[derive(Debug, Clone)]
pub(crate) struct ParamInfo {
    /// Parameter name.
    pub ident: Ident,
    /// Parameter type.
    pub ty: Type,
    /// Default value expression from `#[default(expr)]`.
    pub default_expr: Option<TokenStream>,
}

/// Parses a typed method parameter into a [`ParamInfo`].
pub(crate) fn parse_param(pat_type: &PatType) -> Result<ParamInfo, TokenStream> {
    let Pat::Ident(pat_ident) = &*pat_type.pat else {
        return Err(syn::Error::new_spanned(
            &pat_type.pat,
            "hookable method parameters must be plain identifiers",
        )
        .to_compile_error());
    };

    let default_expr = extract_default_expr(&pat_type.attrs)
        .transpose()
        .map_err(syn::Error::into_compile_error)?;

    Ok(ParamInfo {
        ident: pat_ident.ident.clone(),
        ty: (*pat_type.ty).clone(),
        default_expr,
    })
}

/// Extracts the default value from `#[default(expr)]`.
fn extract_default_expr(attrs: &[Attribute]) -> Option<syn::Result<TokenStream>> {
    attrs
        .iter()
        .find(|attr| attr.path().is_ident("default"))
        .map(|attr| attr.parse_args::<TokenStream>())
}

/// Returns the `#[doc]` attributes of an item.
pub(crate) fn doc_attrs(attrs: &[Attribute]) -> Vec<&Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .collect()
}

/// Splits a return type into its success and error types.
///
/// `Result<T, E>` yields `(T, Some(E))`, any other type `(T, None)`, and a
/// missing return type `(), None`.
pub(crate) fn split_return_type(output: &ReturnType) -> Result<(Type, Option<Type>), TokenStream> {
    let ReturnType::Type(_, ty) = output else {
        return Ok((syn::parse_quote!(()), None));
    };

    if let Type::Path(type_path) = ty.as_ref()
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Result"
    {
        let PathArguments::AngleBracketed(args) = &segment.arguments else {
            return Ok(((**ty).clone(), None));
        };
        let types: Vec<&Type> = args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect();
        return match types.as_slice() {
            [ok, err] => Ok(((*ok).clone(), Some((*err).clone()))),
            _ => Err(syn::Error::new_spanned(
                ty,
                "hookable methods returning `Result` must name both the success and error types",
            )
            .to_compile_error()),
        };
    }

    Ok(((**ty).clone(), None))
}

/// Returns the last path segment of a type, e.g. `Cart` for `shop::Cart<T>`.
pub(crate) fn type_ident(ty: &Type) -> Option<&Ident> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return Some(&segment.ident);
    }
    None
}

/// Checks an explicit type name the same way adaptation does at runtime.
pub(crate) fn invalid_type_name_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name is empty")
    } else if name.contains("::") {
        Some("name contains the `::` separator")
    } else if name.chars().any(char::is_whitespace) {
        Some("name contains whitespace")
    } else if name.contains(['<', '>']) {
        Some("name contains generic arguments")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn public_name_strips_prefix() {
        let marked: Ident = parse_quote!(___greet);
        let plain: Ident = parse_quote!(greet);
        assert_eq!(public_name(&marked).as_deref(), Some("greet"));
        assert_eq!(public_name(&plain), None);
    }

    #[test]
    fn rejects_unsupported_signatures() {
        let cases: Vec<Signature> = vec![
            parse_quote!(async fn ___a(&self)),
            parse_quote!(unsafe fn ___b(&self)),
            parse_quote!(extern "C" fn ___c(&self)),
            parse_quote!(fn ___d<T>(&self, value: T)),
            parse_quote!(fn ___e(&mut self)),
            parse_quote!(fn ___f(self)),
            parse_quote!(fn ___g(value: u32)),
            parse_quote!(fn ___(&self)),
            parse_quote!(fn ___call(&self)),
            parse_quote!(fn ___dispatch(&self, value: u32)),
            parse_quote!(fn ___clone(&self) -> u32),
        ];
        for sig in &cases {
            assert!(validate_hookable_signature(sig).is_some(), "{}", sig.ident);
        }

        let ok: Signature = parse_quote!(fn ___greet(&self, salut: String) -> String);
        assert!(validate_hookable_signature(&ok).is_none());
    }

    #[test]
    fn parses_defaults() {
        fn typed(arg: FnArg) -> PatType {
            match arg {
                FnArg::Typed(pat_type) => pat_type,
                FnArg::Receiver(_) => panic!("expected a typed argument"),
            }
        }

        let param = parse_param(&typed(parse_quote!(#[default("hello")] salut: String))).unwrap();
        assert_eq!(param.ident, "salut");
        assert_eq!(param.default_expr.unwrap().to_string(), "\"hello\"");

        let destructured = typed(parse_quote!((a, b): (u8, u8)));
        assert!(parse_param(&destructured).is_err());
    }

    #[test]
    fn splits_result_return_types() {
        let (ok, err) = split_return_type(&parse_quote!(-> Result<String, MyError>)).unwrap();
        assert_eq!(ok, parse_quote!(String));
        assert_eq!(err, Some(parse_quote!(MyError)));

        let (ok, err) = split_return_type(&parse_quote!(-> u64)).unwrap();
        assert_eq!(ok, parse_quote!(u64));
        assert!(err.is_none());

        let (ok, err) = split_return_type(&ReturnType::Default).unwrap();
        assert_eq!(ok, parse_quote!(()));
        assert!(err.is_none());

        assert!(split_return_type(&parse_quote!(-> io::Result<u8>)).is_err());
    }

    #[test]
    fn validates_explicit_type_names() {
        assert!(invalid_type_name_reason("HelloWorld").is_none());
        assert!(invalid_type_name_reason("").is_some());
        assert!(invalid_type_name_reason("a::B").is_some());
        assert!(invalid_type_name_reason("Boxed<T>").is_some());
    }
}
