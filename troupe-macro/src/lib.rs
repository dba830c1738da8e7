/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Procedural macros for the Troupe actor core.
//!
//! The only macro exported today is [`macro@troupe_message`], which prepares a struct or
//! enum for use as an actor message.

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Returns `true` when the item already carries `#[derive(..., trait_name, ...)]`.
fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Options accepted by `#[troupe_message(...)]`.
#[derive(Default)]
struct MessageOptions {
    /// `#[troupe_message(clone)]` also derives `Clone`.
    clone: bool,
}

impl MessageOptions {
    fn parse(attr: &TokenStream) -> Self {
        let mut options = Self::default();
        for part in attr.to_string().split(',') {
            if part.trim() == "clone" {
                options.clone = true;
            }
        }
        options
    }
}

/// Marks a struct or enum as a Troupe actor message.
///
/// Derives `Debug` when the item does not already derive it (and `Clone` when invoked as
/// `#[troupe_message(clone)]`), then adds a compile-time assertion that the type is
/// `Send + 'static`, which is what an actor mailbox requires.
///
/// ```rust,ignore
/// use troupe::prelude::*;
///
/// #[troupe_message]
/// struct Deposit {
///     amount: u64,
/// }
///
/// #[troupe_message]
/// struct Balance {
///     reply: ReplyTo<u64>,
/// }
/// ```
#[proc_macro_attribute]
pub fn troupe_message(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = MessageOptions::parse(&attr);
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if options.clone && !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    let assert_ident = quote::format_ident!("_AssertTroupeMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
