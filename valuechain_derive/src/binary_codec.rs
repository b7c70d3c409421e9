//! Derive macro for deterministic binary serialization.
//!
//! Generates `Encode` and `Decode` implementations for structs and enums.
//! Fields are serialized in declaration order; enum variants carry a u8
//! discriminant assigned in declaration order. The resulting byte stream is
//! deterministic, which makes it suitable as hashing input.
//!
//! Unions are not supported.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DataEnum, DeriveInput, Fields};

/// Derives `Encode` and `Decode` for a struct or enum.
///
/// # Example
///
/// ```ignore
/// use valuechain_derive::BinaryCodec;
///
/// #[derive(BinaryCodec)]
/// pub struct BlockHeader {
///     pub number: u64,
///     pub timestamp: u64,
/// }
/// ```
pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (encode_body, decode_body) = match &input.data {
        Data::Struct(data_struct) => struct_bodies(&data_struct.fields),
        Data::Enum(data_enum) => enum_bodies(data_enum),
        Data::Union(_) => {
            return syn::Error::new_spanned(&input, "BinaryCodec derive does not support unions")
                .to_compile_error()
                .into();
        }
    };

    let expanded = quote! {
        impl #impl_generics crate::types::encoding::Encode for #name #ty_generics #where_clause {
            fn encode<S: crate::types::encoding::EncodeSink>(&self, out: &mut S) {
                #encode_body
            }
        }

        impl #impl_generics crate::types::encoding::Decode for #name #ty_generics #where_clause {
            fn decode(
                input: &mut &[u8],
            ) -> ::std::result::Result<Self, crate::types::encoding::DecodeError> {
                #decode_body
            }
        }
    };

    TokenStream::from(expanded)
}

/// Builds encode/decode bodies for any struct flavor (named, tuple, unit).
fn struct_bodies(fields: &Fields) -> (proc_macro2::TokenStream, proc_macro2::TokenStream) {
    match fields {
        Fields::Named(fields) => {
            let names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
            let encode = quote! {
                #(crate::types::encoding::Encode::encode(&self.#names, out);)*
            };
            let decode = quote! {
                Ok(Self {
                    #(#names: crate::types::encoding::Decode::decode(input)?,)*
                })
            };
            (encode, decode)
        }
        Fields::Unnamed(fields) => {
            let indices: Vec<_> = (0..fields.unnamed.len()).map(syn::Index::from).collect();
            let decode_fields =
                indices.iter().map(|_| quote! { crate::types::encoding::Decode::decode(input)?, });
            let encode = quote! {
                #(crate::types::encoding::Encode::encode(&self.#indices, out);)*
            };
            let decode = quote! { Ok(Self(#(#decode_fields)*)) };
            (encode, decode)
        }
        Fields::Unit => (quote! {}, quote! { Ok(Self) }),
    }
}

/// Builds encode/decode bodies for enums.
///
/// Wire layout: one discriminant byte followed by the variant's fields in
/// declaration order. Discriminants count up from zero in declaration order,
/// so reordering variants is a breaking format change.
fn enum_bodies(data_enum: &DataEnum) -> (proc_macro2::TokenStream, proc_macro2::TokenStream) {
    let mut encode_arms = Vec::with_capacity(data_enum.variants.len());
    let mut decode_arms = Vec::with_capacity(data_enum.variants.len());

    for (index, variant) in data_enum.variants.iter().enumerate() {
        let tag = index as u8;
        let variant_name = &variant.ident;

        match &variant.fields {
            Fields::Unit => {
                encode_arms.push(quote! {
                    Self::#variant_name => {
                        crate::types::encoding::Encode::encode(&#tag, out);
                    }
                });
                decode_arms.push(quote! { #tag => Ok(Self::#variant_name), });
            }
            Fields::Unnamed(fields) => {
                let bindings: Vec<_> = (0..fields.unnamed.len())
                    .map(|i| quote::format_ident!("f{}", i))
                    .collect();
                let decode_fields = bindings
                    .iter()
                    .map(|_| quote! { crate::types::encoding::Decode::decode(input)?, });
                encode_arms.push(quote! {
                    Self::#variant_name(#(#bindings),*) => {
                        crate::types::encoding::Encode::encode(&#tag, out);
                        #(crate::types::encoding::Encode::encode(#bindings, out);)*
                    }
                });
                decode_arms.push(quote! {
                    #tag => Ok(Self::#variant_name(#(#decode_fields)*)),
                });
            }
            Fields::Named(fields) => {
                let names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                let decode_fields = names.iter().map(|field_name| {
                    quote! { #field_name: crate::types::encoding::Decode::decode(input)?, }
                });
                encode_arms.push(quote! {
                    Self::#variant_name { #(#names),* } => {
                        crate::types::encoding::Encode::encode(&#tag, out);
                        #(crate::types::encoding::Encode::encode(#names, out);)*
                    }
                });
                decode_arms.push(quote! {
                    #tag => Ok(Self::#variant_name { #(#decode_fields)* }),
                });
            }
        }
    }

    let encode = quote! {
        match self {
            #(#encode_arms)*
        }
    };
    let decode = quote! {
        let tag: u8 = crate::types::encoding::Decode::decode(input)?;
        match tag {
            #(#decode_arms)*
            _ => Err(crate::types::encoding::DecodeError::InvalidValue),
        }
    };
    (encode, decode)
}
