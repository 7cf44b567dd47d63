//! Code generation for `#[hookable]` on impl blocks.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::{FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Type};
use wirehook_macro_utils::{WirehookCrate, resolve_crate_path};

use crate::common::{
    ParamInfo, doc_attrs, invalid_type_name_reason, parse_param, public_name, split_return_type,
    type_ident, validate_hookable_signature,
};

/// Arguments of `#[hookable(...)]`.
#[derive(Default)]
struct HookableArgs {
    /// Explicit selector type name.
    name: Option<LitStr>,
    /// Name of the generated extension trait.
    hooks_trait: Option<Ident>,
}

impl HookableArgs {
    fn parse(attr: TokenStream) -> syn::Result<Self> {
        let mut args = Self::default();
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("name") {
                let name: LitStr = meta.value()?.parse()?;
                if let Some(reason) = invalid_type_name_reason(&name.value()) {
                    return Err(syn::Error::new_spanned(
                        &name,
                        format!("invalid hookable type name: {reason}"),
                    ));
                }
                args.name = Some(name);
                Ok(())
            } else if meta.path.is_ident("hooks_trait") {
                let name: LitStr = meta.value()?.parse()?;
                args.hooks_trait = Some(name.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported hookable argument; expected `name` or `hooks_trait`"))
            }
        });
        parser.parse2(attr)?;
        Ok(args)
    }
}

/// A method marked with the `___` prefix.
struct MarkedMethod<'a> {
    method: &'a ImplItemFn,
    public_name: String,
    params: Vec<ParamInfo>,
    ok_ty: Type,
    err_ty: Option<Type>,
}

/// Generates the `Hookable` impl and the typed extension trait for an impl block.
pub(crate) fn generate_hookable(attr: TokenStream, input: &ItemImpl) -> TokenStream {
    let args = match HookableArgs::parse(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error(),
    };

    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new_spanned(
            path,
            "#[hookable] must be applied to an inherent impl block",
        )
        .to_compile_error();
    }

    let self_ty = &input.self_ty;
    let Some(self_ident) = type_ident(self_ty) else {
        return syn::Error::new_spanned(self_ty, "#[hookable] impl target must be a path type")
            .to_compile_error();
    };

    let mut marked = Vec::new();
    for item in &input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let Some(public_name) = public_name(&method.sig.ident) else {
            continue;
        };
        if let Some(err) = validate_hookable_signature(&method.sig) {
            return err;
        }

        let mut params = Vec::new();
        for arg in &method.sig.inputs {
            if let FnArg::Typed(pat_type) = arg {
                match parse_param(pat_type) {
                    Ok(param) => params.push(param),
                    Err(err) => return err,
                }
            }
        }
        let (ok_ty, err_ty) = match split_return_type(&method.sig.output) {
            Ok(split) => split,
            Err(err) => return err,
        };

        marked.push(MarkedMethod {
            method,
            public_name,
            params,
            ok_ty,
            err_ty,
        });
    }

    let core = resolve_crate_path(WirehookCrate::Core);
    let cleaned = strip_default_attrs(input);
    let hookable_impl = generate_hookable_impl(input, &args, &marked, &core);
    let hooks_trait = if marked.is_empty() {
        quote! {}
    } else {
        let trait_ident = args
            .hooks_trait
            .clone()
            .unwrap_or_else(|| format_ident!("{}Hooks", self_ident));
        generate_hooks_trait(input, &trait_ident, &marked, &core)
    };

    quote! {
        #cleaned
        #hookable_impl
        #hooks_trait
    }
}

/// Re-emits the impl block without `#[default]` parameter attributes.
fn strip_default_attrs(input: &ItemImpl) -> ItemImpl {
    let mut cleaned = input.clone();
    for item in &mut cleaned.items {
        if let ImplItem::Fn(method) = item
            && public_name(&method.sig.ident).is_some()
        {
            for arg in &mut method.sig.inputs {
                if let FnArg::Typed(pat_type) = arg {
                    pat_type
                        .attrs
                        .retain(|attr| !attr.path().is_ident("default"));
                }
            }
        }
    }
    cleaned
}

fn generate_hookable_impl(
    input: &ItemImpl,
    args: &HookableArgs,
    marked: &[MarkedMethod<'_>],
    core: &TokenStream,
) -> TokenStream {
    let self_ty = &input.self_ty;
    let (impl_generics, _ty_generics, where_clause) = input.generics.split_for_impl();
    let existing_predicates: Vec<_> = where_clause
        .map(|wc| wc.predicates.iter().collect())
        .unwrap_or_default();

    let type_name = args.name.as_ref().map(|name| {
        quote! {
            const TYPE_NAME: ::core::option::Option<&'static str> = ::core::option::Option::Some(#name);
        }
    });

    let entries: Vec<_> = marked
        .iter()
        .map(|marked| {
            let method_ident = &marked.method.sig.ident;
            let public_name = &marked.public_name;
            let decode: Vec<_> = marked
                .params
                .iter()
                .enumerate()
                .map(|(index, param)| {
                    let ident = &param.ident;
                    let ty = &param.ty;
                    quote! { let #ident: #ty = __args.get_as(#index)?; }
                })
                .collect();
            let checks: Vec<_> = marked
                .params
                .iter()
                .enumerate()
                .map(|(index, param)| {
                    let ty = &param.ty;
                    quote! { let _: #ty = __args.get_as(#index)?; }
                })
                .collect();
            let ok_ty = &marked.ok_ty;
            let call_args: Vec<_> = marked.params.iter().map(|param| &param.ident).collect();
            let call = if marked.err_ty.is_some() {
                quote! {
                    __subject.#method_ident(#(#call_args),*).map_err(#core::InvokeError::method)?
                }
            } else {
                quote! { __subject.#method_ident(#(#call_args),*) }
            };
            let declared: Vec<_> = marked
                .params
                .iter()
                .map(|param| {
                    let name = param.ident.to_string();
                    match &param.default_expr {
                        Some(default) => quote! {
                            .param_with_default(#name, #core::serde_json::json!(#default))
                        },
                        None => quote! { .param(#name) },
                    }
                })
                .collect();

            quote! {
                #core::HookableMethod::new(
                    #public_name,
                    |__subject: &Self, __args: &#core::Arguments| {
                        #(#decode)*
                        let __output = #call;
                        #core::serde_json::to_value(&__output)
                            .map_err(|__err| #core::InvokeError::Argument(#core::ArgumentError::Encode(__err)))
                    },
                )
                #(#declared)*
                .with_shape(#core::FnShape::new(
                    |__args: &#core::Arguments|
                        -> ::core::result::Result<(), #core::ArgumentError>
                    {
                        #(#checks)*
                        ::core::result::Result::Ok(())
                    },
                    #core::shape::decodes::<#ok_ty>,
                ))
            }
        })
        .collect();

    quote! {
        impl #impl_generics #core::Hookable for #self_ty
        where
            #self_ty: Send + Sync + 'static,
            #(#existing_predicates),*
        {
            #type_name

            fn hookable_methods() -> ::std::vec::Vec<#core::HookableMethod<Self>> {
                ::std::vec![
                    #(#entries),*
                ]
            }
        }
    }
}

fn generate_hooks_trait(
    input: &ItemImpl,
    trait_ident: &Ident,
    marked: &[MarkedMethod<'_>],
    core: &TokenStream,
) -> TokenStream {
    let self_ty = &input.self_ty;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let existing_predicates: Vec<_> = where_clause
        .map(|wc| wc.predicates.iter().collect())
        .unwrap_or_default();

    let trait_doc = format!(
        "Hooked methods of `{}`, available on its adapted wrapper.",
        quote!(#self_ty)
    );

    let signatures: Vec<_> = marked
        .iter()
        .map(|marked| {
            let mut docs: Vec<TokenStream> = doc_attrs(&marked.method.attrs)
                .into_iter()
                .map(|attr| quote! { #attr })
                .collect();
            if docs.is_empty() {
                let fallback = format!("Hooked `{}`.", marked.public_name);
                docs.push(quote! { #[doc = #fallback] });
            }
            let public_ident = format_ident!("{}", marked.public_name);
            let params: Vec<_> = marked
                .params
                .iter()
                .map(|param| {
                    let ident = &param.ident;
                    let ty = &param.ty;
                    if param.default_expr.is_some() {
                        quote! { #ident: ::core::option::Option<#ty> }
                    } else {
                        quote! { #ident: #ty }
                    }
                })
                .collect();
            let ok_ty = &marked.ok_ty;
            let err_ty = error_type(marked);

            quote! {
                #(#docs)*
                fn #public_ident(&self, #(#params),*)
                    -> ::core::result::Result<#ok_ty, #core::CallError<#err_ty>>
            }
        })
        .collect();

    let bodies: Vec<_> = marked
        .iter()
        .zip(&signatures)
        .map(|(marked, signature)| {
            let body = generate_typed_body(self_ty, marked, core);
            quote! {
                #signature {
                    #body
                }
            }
        })
        .collect();

    quote! {
        #[doc = #trait_doc]
        pub trait #trait_ident #impl_generics #where_clause {
            #(#signatures;)*
        }

        impl #impl_generics #trait_ident #ty_generics for #core::Wired<#self_ty>
        where
            #self_ty: #core::Hookable,
            #(#existing_predicates),*
        {
            #(#bodies)*
        }
    }
}

/// Body of a typed method: encode arguments, dispatch, decode the result.
fn generate_typed_body(
    self_ty: &Type,
    marked: &MarkedMethod<'_>,
    core: &TokenStream,
) -> TokenStream {
    let method_ident = &marked.method.sig.ident;
    let public_name = &marked.public_name;
    let ok_ty = &marked.ok_ty;
    let err_ty = error_type(marked);

    let encode_error = quote! {
        |__err| #core::Wired::argument_error::<#err_ty>(
            self,
            #public_name,
            #core::ArgumentError::Encode(__err),
        )
    };

    let encoded: Vec<_> = marked
        .params
        .iter()
        .map(|param| {
            let ident = &param.ident;
            match &param.default_expr {
                Some(default) => quote! {
                    match #ident {
                        ::core::option::Option::Some(__value) => #core::serde_json::to_value(&__value)
                            .map_err(#encode_error)?,
                        ::core::option::Option::None => #core::serde_json::json!(#default),
                    }
                },
                None => quote! {
                    #core::serde_json::to_value(&#ident).map_err(#encode_error)?
                },
            }
        })
        .collect();

    let decoded: Vec<_> = marked
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let ident = &param.ident;
            let ty = &param.ty;
            quote! {
                let #ident: #ty = __args.get_as(#index).map_err(|__err| {
                    #core::Wired::argument_error::<#err_ty>(self, #public_name, __err)
                })?;
            }
        })
        .collect();

    let call_args: Vec<_> = marked.params.iter().map(|param| &param.ident).collect();
    let call = if marked.err_ty.is_some() {
        quote! { __subject.#method_ident(#(#call_args),*).map_err(#core::CallError::Method)? }
    } else {
        quote! { __subject.#method_ident(#(#call_args),*) }
    };

    quote! {
        let __args = #core::Arguments::new([#(#encoded),*]);
        let __value = #core::Wired::dispatch(
            self,
            #public_name,
            __args,
            |__subject: &#self_ty, __args: &#core::Arguments|
                -> ::core::result::Result<#core::serde_json::Value, #core::CallError<#err_ty>>
            {
                #(#decoded)*
                let __output = #call;
                #core::serde_json::to_value(&__output).map_err(#encode_error)
            },
        )?;
        #core::serde_json::from_value::<#ok_ty>(__value)
            .map_err(|__err| #core::Wired::return_error::<#err_ty>(self, #public_name, __err))
    }
}

fn error_type(marked: &MarkedMethod<'_>) -> TokenStream {
    match &marked.err_ty {
        Some(err_ty) => quote! { #err_ty },
        None => quote! { ::core::convert::Infallible },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(attr: TokenStream, input: ItemImpl) -> String {
        generate_hookable(attr, &input).to_string()
    }

    #[test]
    fn generates_impl_and_trait() {
        let output = expand(
            quote! {},
            parse_quote! {
                impl HelloWorld {
                    fn ___greet(&self, #[default("hello")] salut: String) -> String {
                        salut
                    }
                    fn plain(&self) {}
                }
            },
        );

        assert!(output.contains("Hookable for HelloWorld"));
        assert!(output.contains("pub trait HelloWorldHooks"));
        assert!(output.contains("fn greet"));
        assert!(output.contains("param_with_default"));
        assert!(!output.contains("# [default"));
        assert!(!output.contains("TYPE_NAME"));
    }

    #[test]
    fn explicit_names_are_forwarded() {
        let output = expand(
            quote! { name = "Greeter", hooks_trait = "GreeterApi" },
            parse_quote! {
                impl HelloWorld {
                    fn ___greet(&self) -> String { String::new() }
                }
            },
        );

        assert!(output.contains("TYPE_NAME"));
        assert!(output.contains("\"Greeter\""));
        assert!(output.contains("pub trait GreeterApi"));
    }

    #[test]
    fn invalid_arguments_become_compile_errors() {
        let input: ItemImpl = parse_quote! { impl HelloWorld {} };

        let output = expand(quote! { name = "a::b" }, input.clone());
        assert!(output.contains("compile_error"));

        let output = expand(quote! { colour = "blue" }, input);
        assert!(output.contains("compile_error"));
    }

    #[test]
    fn methods_carry_a_type_check() {
        let output = expand(
            quote! {},
            parse_quote! {
                impl HelloWorld {
                    fn ___count(&self, times: u32) -> u64 { u64::from(times) }
                }
            },
        );

        let compact = output.replace(' ', "");
        assert!(compact.contains(".with_shape("));
        assert!(compact.contains("let_:u32=__args.get_as(0usize)?;"));
        assert!(compact.contains("decodes::<u64>"));
    }

    #[test]
    fn undocumented_methods_get_a_fallback_doc() {
        let output = expand(
            quote! {},
            parse_quote! {
                impl HelloWorld {
                    fn ___greet(&self) -> String { String::new() }
                    /// Says goodbye.
                    fn ___leave(&self) -> String { String::new() }
                }
            },
        );

        assert!(output.contains("Hooked `greet`."));
        assert!(output.contains("Says goodbye."));
        assert!(!output.contains("Hooked `leave`."));
    }

    #[test]
    fn trait_impls_are_rejected() {
        let output = expand(
            quote! {},
            parse_quote! {
                impl Clone for HelloWorld {
                    fn clone(&self) -> Self { HelloWorld }
                }
            },
        );
        assert!(output.contains("compile_error"));
    }

    #[test]
    fn no_marked_methods_skips_the_trait() {
        let output = expand(
            quote! {},
            parse_quote! {
                impl HelloWorld {
                    fn plain(&self) {}
                }
            },
        );
        assert!(output.contains("Hookable for HelloWorld"));
        assert!(!output.contains("trait HelloWorldHooks"));
    }
}
