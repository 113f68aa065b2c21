//! `#[derive(FromContext)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitStr, Type};

use crate::named_fields;

pub fn derive_from_context_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let context = context_type(input)?;
    let fields = named_fields(input, "FromContext")?;

    let inits = fields.iter().filter_map(|field| {
        let field_name = field.ident.as_ref()?;
        let field_type = &field.ty;
        Some(quote! {
            #field_name: <#field_type as crate::FromRef<#context>>::from_ref(ctx)
        })
    });

    Ok(quote! {
        impl #impl_generics crate::FromRef<#context> for #name #ty_generics #where_clause {
            fn from_ref(ctx: &#context) -> Self {
                Self {
                    #(#inits),*
                }
            }
        }
    })
}

/// Reads `#[from_context(context = "...")]`, defaulting to `Context`.
fn context_type(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let mut context: Option<Type> = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("from_context")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("context") {
                let value: LitStr = meta.value()?.parse()?;
                context = Some(value.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `context = \"Type\"`"))
            }
        })?;
    }

    Ok(match context {
        Some(ty) => quote! { #ty },
        None => quote! { Context },
    })
}
