//! Derive macros wiring bz2redmine services to the run context.
//!
//! - `#[derive(Context)]` exposes every field of the context through `FromRef`
//! - `#[derive(FromContext)]` builds a service by resolving each of its fields
//!
//! Generated code names `crate::FromRef`, so the consuming crate re-exports
//! the trait at its root.

use proc_macro::TokenStream;
use syn::punctuated::Punctuated;
use syn::{token::Comma, Data, DeriveInput, Field, Fields};

mod context;
mod from_context;

/// Exposes each field of a context struct through `FromRef`.
///
/// Resolution is by type, so two fields may not share one. Wrap a second
/// handle of the same kind in a newtype instead.
///
/// ```ignore
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub source: SourceDb,
///     pub target: TargetDb,
///     pub config: Arc<Config>,
/// }
///
/// // impl FromRef<Context> for SourceDb { ... }
/// // impl FromRef<Context> for TargetDb { ... }
/// // impl FromRef<Context> for Arc<Config> { ... }
/// ```
#[proc_macro_derive(Context)]
pub fn derive_context(input: TokenStream) -> TokenStream {
    context::derive_context_impl(input)
}

/// Builds a struct from a context by resolving every field through `FromRef`.
///
/// The context type is `Context` as seen from the deriving module; override
/// it with `#[from_context(context = "path::To")]`.
///
/// ```ignore
/// #[derive(FromContext, Clone)]
/// pub struct Resolver {
///     source: SourceDb,
///     target: TargetDb,
/// }
///
/// let resolver = Resolver::from_ref(&ctx);
/// ```
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    from_context::derive_from_context_impl(input)
}

/// Named fields of a plain struct, or a spanned error naming the derive.
pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a Punctuated<Field, Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{} needs a struct with named fields", derive),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{} can only be derived for structs", derive),
        )),
    }
}
