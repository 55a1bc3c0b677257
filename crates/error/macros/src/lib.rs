//! `#[derive(NebulaError)]` — implements `nebula_error::NebulaError::kind`
//! for a `thiserror` enum by reading a `#[nebula(kind = "...")]` attribute
//! on each variant.
//!
//! ```ignore
//! #[derive(Debug, thiserror::Error, nebula_error::NebulaError)]
//! enum MyError {
//!     #[error("not found: {0}")]
//!     #[nebula(kind = "not_found")]
//!     NotFound(String),
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derive `nebula_error::NebulaError` for an enum whose variants each carry
/// a `#[nebula(kind = "...")]` attribute naming one of `ErrorKind`'s
/// snake_case variants.
#[proc_macro_derive(NebulaError, attributes(nebula))]
pub fn derive_nebula_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data) = &input.data else {
        return syn::Error::new_spanned(&input, "NebulaError can only be derived for enums")
            .to_compile_error()
            .into();
    };

    let mut arms = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        let ident = &variant.ident;
        let kind_str = match find_kind_attr(&variant.attrs) {
            Some(k) => k,
            None => {
                return syn::Error::new_spanned(
                    variant,
                    "missing #[nebula(kind = \"...\")] attribute",
                )
                .to_compile_error()
                .into();
            }
        };
        let kind_ident = syn::Ident::new(&to_pascal_case(&kind_str), variant.span_ident());

        let pattern = match &variant.fields {
            Fields::Unit => quote! { Self::#ident },
            Fields::Unnamed(_) => quote! { Self::#ident(..) },
            Fields::Named(_) => quote! { Self::#ident { .. } },
        };
        arms.push(quote! { #pattern => ::nebula_error::ErrorKind::#kind_ident, });
    }

    let expanded = quote! {
        impl ::nebula_error::NebulaError for #name {
            fn kind(&self) -> ::nebula_error::ErrorKind {
                match self {
                    #(#arms)*
                }
            }
        }
    };

    expanded.into()
}

fn find_kind_attr(attrs: &[syn::Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path().is_ident("nebula") {
            continue;
        }
        let mut found = None;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("kind") {
                let value = meta.value()?;
                let lit: syn::LitStr = value.parse()?;
                found = Some(lit.value());
            }
            Ok(())
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

fn to_pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

trait SpanIdent {
    fn span_ident(&self) -> proc_macro2::Span;
}

impl SpanIdent for syn::Variant {
    fn span_ident(&self) -> proc_macro2::Span {
        use syn::spanned::Spanned;
        self.ident.span()
    }
}
