//! `#[derive(Context)]`.

use std::collections::HashMap;

use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use syn::{parse_macro_input, DeriveInput};

use crate::named_fields;

pub fn derive_context_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = named_fields(input, "Context")?;

    // Two fields of one type would produce conflicting impls
    let mut seen = HashMap::new();
    for field in fields {
        let key = field.ty.to_token_stream().to_string();
        if let Some(first) = seen.insert(key, &field.ident) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                format!(
                    "field type already provided by `{}`; wrap one of them in a newtype",
                    first.as_ref().map(|i| i.to_string()).unwrap_or_default()
                ),
            ));
        }
    }

    let impls = fields.iter().filter_map(|field| {
        let field_name = field.ident.as_ref()?;
        let field_type = &field.ty;
        Some(quote! {
            impl #impl_generics crate::FromRef<#name #ty_generics> for #field_type #where_clause {
                fn from_ref(ctx: &#name #ty_generics) -> Self {
                    ctx.#field_name.clone()
                }
            }
        })
    });

    Ok(quote! { #(#impls)* })
}
