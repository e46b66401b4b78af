use proc_macro::TokenStream;
use syn::spanned::Spanned;

#[proc_macro]
pub fn struct_unpack_impl_for_num(item: TokenStream) -> TokenStream {
    let i = syn::parse_macro_input!(item as syn::Ident);
    let output = quote::quote! {
        impl StructUnpack for #i {
            fn unpack<R: Read + Seek>(mut reader: R, big: bool) -> Result<Self> {
                let mut buf = [0u8; std::mem::size_of::<#i>()];
                reader.read_exact(&mut buf)?;
                Ok(if big {
                    #i::from_be_bytes(buf)
                } else {
                    #i::from_le_bytes(buf)
                })
            }
        }

        impl StructPack for #i {
            fn pack<W: Write>(&self, writer: &mut W, big: bool) -> Result<()> {
                let bytes = if big {
                    self.to_be_bytes()
                } else {
                    self.to_le_bytes()
                };
                writer.write_all(&bytes)?;
                Ok(())
            }
        }
    };
    output.into()
}

fn field_names(fields: &syn::Fields) -> Vec<proc_macro2::TokenStream> {
    fields
        .iter()
        .enumerate()
        .map(|(idx, field)| match &field.ident {
            Some(ident) => quote::quote! { #ident },
            None => {
                let idx = syn::Index::from(idx);
                quote::quote! { #idx }
            }
        })
        .collect()
}

/// Macro to derive `StructPack` trait for structs.
///
/// Every field is written in declaration order through its own `StructPack`
/// implementation, so fixed arrays and nested structs are supported.
///
/// make sure to import the necessary imports:
/// ```ignore
/// use crate::error::Result;
/// use crate::utils::struct_pack::*;
/// use std::io::{Read, Seek, Write};
/// ```
#[proc_macro_derive(StructPack)]
pub fn struct_pack_derive(input: TokenStream) -> TokenStream {
    let sut = syn::parse_macro_input!(input as syn::ItemStruct);
    let name = sut.ident;
    let names = field_names(&sut.fields);
    let fields = sut.fields.iter().zip(names).map(|(field, field_name)| {
        let field_type = &field.ty;
        quote::quote! {
            <#field_type as StructPack>::pack(&self.#field_name, writer, big)?;
        }
    });
    let output = quote::quote! {
        impl StructPack for #name {
            fn pack<W: Write>(&self, writer: &mut W, big: bool) -> Result<()> {
                #(#fields)*
                Ok(())
            }
        }
    };
    output.into()
}

/// Macro to derive `StructUnpack` trait for structs.
///
/// Fields are read one after another with the requested byte order; the
/// layout is exactly the declaration order with no padding.
///
/// make sure to import the necessary imports:
/// ```ignore
/// use crate::error::Result;
/// use crate::utils::struct_pack::*;
/// use std::io::{Read, Seek, Write};
/// ```
#[proc_macro_derive(StructUnpack)]
pub fn struct_unpack_derive(input: TokenStream) -> TokenStream {
    let sut = syn::parse_macro_input!(input as syn::ItemStruct);
    let name = sut.ident;
    let mut locals = Vec::new();
    let is_tuple_struct = matches!(sut.fields, syn::Fields::Unnamed(_));
    let smts: Vec<_> = sut
        .fields
        .iter()
        .enumerate()
        .map(|(ind, field)| {
            let local = match &field.ident {
                Some(ident) => quote::quote! { #ident },
                None => {
                    let idx = syn::Ident::new(&format!("index_{}", ind), field.span());
                    quote::quote! { #idx }
                }
            };
            locals.push(local.clone());
            let field_type = &field.ty;
            quote::quote! {
                let #local = <#field_type as StructUnpack>::unpack(&mut reader, big)?;
            }
        })
        .collect();
    let fields = if is_tuple_struct {
        quote::quote! ((#(#locals),*))
    } else {
        quote::quote! { { #(#locals),* } }
    };
    let output = quote::quote! {
        impl StructUnpack for #name {
            fn unpack<R: Read + Seek>(mut reader: R, big: bool) -> Result<Self> {
                #(#smts)*
                Ok(Self #fields)
            }
        }
    };
    output.into()
}
