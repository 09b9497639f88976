//! Attribute macros that remove the derive boilerplate from barrage metrics
//! and aggregates.
//!
//! Both attributes expand to the derive set required by the
//! `barrage::Metric` / `barrage::Aggregate` supertraits. `#[metric]` also
//! emits the (empty) `Metric` impl.
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

extern crate proc_macro;

fn with_common_derives(ast: &DeriveInput) -> TokenStream2 {
    quote! {
        #[derive(
            serde::Serialize,
            serde::Deserialize,
            std::cmp::PartialOrd,
            std::cmp::PartialEq,
            std::fmt::Debug,
            std::clone::Clone
        )]
        #ast
    }
}

/// Marks a type as a single measurement produced by one request.
#[proc_macro_attribute]
pub fn metric(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(item as DeriveInput);
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let derived = with_common_derives(&ast);

    let expanded = quote! {
        #derived

        impl #impl_generics ::barrage::Metric for #ident #ty_generics #where_clause {}
    };

    TokenStream::from(expanded)
}

/// Marks a type as an accumulator of metrics.
#[proc_macro_attribute]
pub fn aggregate(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(item as DeriveInput);
    TokenStream::from(with_common_derives(&ast))
}
