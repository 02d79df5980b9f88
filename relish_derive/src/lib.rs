//! Derive macro implementing the `relish::Relish` trait.
//!
//! Struct fields are bound to wire field ids with `#[relish(field_id = N)]`
//! and encoded in increasing id order. `Option<T>` fields are optional on
//! the wire, `omit_empty` drops a field whose value equals its type's
//! default, and `#[relish(skip)]` keeps a field out of the wire format
//! entirely. Enum variants carry exactly one payload and map their
//! `field_id` to the Relish variant id.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

#[proc_macro_derive(Relish, attributes(relish))]
pub fn derive_relish(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    match &input.data {
        Data::Struct(data) => expand_struct(name, data),
        Data::Enum(data) => expand_enum(name, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            name,
            "union types cannot derive Relish",
        )),
    }
}

#[derive(Default)]
struct RelishAttr {
    field_id: Option<u8>,
    omit_empty: bool,
    skip: bool,
}

fn parse_attrs(attrs: &[syn::Attribute]) -> syn::Result<RelishAttr> {
    let mut parsed = RelishAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("relish") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("field_id") {
                let lit: syn::LitInt = meta.value()?.parse()?;
                let id: u8 = lit.base10_parse()?;
                if id >= 0x80 {
                    return Err(meta.error("field_id must be in 0..=127"));
                }
                parsed.field_id = Some(id);
                Ok(())
            } else if meta.path.is_ident("omit_empty") {
                parsed.omit_empty = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                parsed.skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `field_id = N`, `omit_empty`, or `skip`"))
            }
        })?;
    }
    Ok(parsed)
}

struct FieldSpec {
    name: syn::Ident,
    ty: syn::Type,
    id: u8,
    omit_empty: bool,
}

fn expand_struct(name: &syn::Ident, data: &syn::DataStruct) -> syn::Result<proc_macro2::TokenStream> {
    let fields = match &data.fields {
        Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Relish structs must have named fields",
            ));
        }
    };

    let mut bound = Vec::new();
    let mut skipped = Vec::new();

    for field in fields {
        let field_name = field.ident.clone().unwrap();
        let attr = parse_attrs(&field.attrs)?;

        if attr.skip {
            if attr.field_id.is_some() || attr.omit_empty {
                return Err(syn::Error::new_spanned(
                    &field_name,
                    "`skip` cannot be combined with other relish attributes",
                ));
            }
            skipped.push(field_name);
            continue;
        }

        let Some(id) = attr.field_id else {
            return Err(syn::Error::new_spanned(
                &field_name,
                format!(
                    "field `{field_name}` needs #[relish(field_id = ...)] or #[relish(skip)]"
                ),
            ));
        };
        bound.push(FieldSpec {
            name: field_name,
            ty: field.ty.clone(),
            id,
            omit_empty: attr.omit_empty,
        });
    }

    bound.sort_by_key(|spec| spec.id);
    for window in bound.windows(2) {
        if window[0].id == window[1].id {
            return Err(syn::Error::new_spanned(
                name,
                format!("duplicate field_id {}", window[0].id),
            ));
        }
    }

    let write_fields = bound.iter().map(|spec| {
        let FieldSpec { name, id, ty, .. } = spec;
        let emit = quote! {
            if let Some(value) = relish::FieldBind::bind(&self.#name) {
                __body.push(#id);
                relish::Relish::write_tlv(value, &mut __body)?;
            }
        };
        if spec.omit_empty {
            quote! {
                if self.#name != <#ty as ::core::default::Default>::default() {
                    #emit
                }
            }
        } else {
            emit
        }
    });

    let read_fields = bound.iter().map(|spec| {
        let FieldSpec { name, ty, id, .. } = spec;
        let slot = format_ident!("__f_{}", name);
        quote! {
            let #slot = __fields.field::<#ty>(#id)?;
        }
    });

    let assemble = bound.iter().map(|spec| {
        let FieldSpec { name, ty, id, .. } = spec;
        let slot = format_ident!("__f_{}", name);
        let missing = if spec.omit_empty {
            quote! { ::core::default::Default::default() }
        } else {
            quote! { <#ty as relish::FieldBind>::on_missing(#id)? }
        };
        quote! {
            #name: match #slot {
                Some(value) => <#ty as relish::FieldBind>::from_wire(value),
                None => #missing,
            }
        }
    });

    let assemble_skipped = skipped.iter().map(|name| {
        quote! { #name: ::core::default::Default::default() }
    });

    let merge_fields = bound.iter().map(|spec| {
        let FieldSpec { name, ty, id, .. } = spec;
        quote! {
            if let Some(value) = __fields.field::<#ty>(#id)? {
                self.#name = <#ty as relish::FieldBind>::from_wire(value);
            }
        }
    });

    Ok(quote! {
        impl relish::Relish for #name {
            const TYPE_ID: relish::TypeId = relish::TypeId::Struct;

            fn write_body(&self, out: &mut ::std::vec::Vec<u8>) -> relish::Result<()> {
                #[allow(unused_mut)]
                let mut __body = relish::Scratch::acquire();
                #(#write_fields)*
                relish::write_len(out, __body.len())?;
                out.extend_from_slice(&__body);
                Ok(())
            }

            fn read_body(input: &mut relish::Input<'_>) -> relish::Result<Self> {
                #[allow(unused_mut)]
                let mut __fields = relish::StructReader::new(input);
                #(#read_fields)*
                __fields.finish()?;
                Ok(Self {
                    #(#assemble,)*
                    #(#assemble_skipped,)*
                })
            }

            fn read_body_into(&mut self, input: &mut relish::Input<'_>) -> relish::Result<()> {
                #[allow(unused_mut)]
                let mut __fields = relish::StructReader::new(input);
                #(#merge_fields)*
                __fields.finish()
            }
        }
    })
}

fn expand_enum(name: &syn::Ident, data: &syn::DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let mut variants = Vec::new();

    for variant in &data.variants {
        let variant_name = &variant.ident;
        let attr = parse_attrs(&variant.attrs)?;

        if attr.omit_empty || attr.skip {
            return Err(syn::Error::new_spanned(
                variant_name,
                "enum variants only accept #[relish(field_id = ...)]",
            ));
        }
        let Some(id) = attr.field_id else {
            return Err(syn::Error::new_spanned(
                variant_name,
                format!("variant `{variant_name}` needs #[relish(field_id = ...)]"),
            ));
        };

        match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                variants.push((variant_name.clone(), id));
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    variant_name,
                    "each variant must carry exactly one unnamed payload",
                ));
            }
        }
    }

    variants.sort_by_key(|(_, id)| *id);
    for window in variants.windows(2) {
        if window[0].1 == window[1].1 {
            return Err(syn::Error::new_spanned(
                name,
                format!("duplicate field_id {}", window[0].1),
            ));
        }
    }

    let write_arms = variants.iter().map(|(variant, id)| {
        quote! {
            Self::#variant(value) => {
                __body.push(#id);
                relish::Relish::write_tlv(value, &mut __body)?;
            }
        }
    });

    let read_arms = variants.iter().map(|(variant, id)| {
        quote! {
            #id => Self::#variant(input.read_value()?),
        }
    });

    Ok(quote! {
        impl relish::Relish for #name {
            const TYPE_ID: relish::TypeId = relish::TypeId::Enum;

            fn write_body(&self, out: &mut ::std::vec::Vec<u8>) -> relish::Result<()> {
                let mut __body = relish::Scratch::acquire();
                match self {
                    #(#write_arms)*
                }
                relish::write_len(out, __body.len())?;
                out.extend_from_slice(&__body);
                Ok(())
            }

            fn read_body(input: &mut relish::Input<'_>) -> relish::Result<Self> {
                let __off = input.offset();
                let __variant_id = input.byte()?;
                if __variant_id & 0x80 != 0 {
                    return Err(relish::Error::at(
                        relish::ErrorKind::InvalidFieldId(__variant_id),
                        __off,
                    ));
                }
                let __value = match __variant_id {
                    #(#read_arms)*
                    _ => {
                        return Err(relish::Error::at(
                            relish::ErrorKind::UnknownVariant(__variant_id),
                            __off,
                        ));
                    }
                };
                if !input.is_empty() {
                    return Err(relish::Error::at(
                        relish::ErrorKind::EnumLengthMismatch(input.remaining()),
                        input.offset(),
                    ));
                }
                Ok(__value)
            }
        }
    })
}
