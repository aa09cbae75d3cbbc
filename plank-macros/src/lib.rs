mod decode_field;
mod decode_model;

use decode_field::decode_field;
use decode_model::decode_model;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `Model` (and an empty `Callbacks` unless `#[plank(callbacks)]` is given).
///
/// Public fields are mapped as visible fields, the other ones as hidden fields: they are populated
/// when loading but never read when writing, except as primary key.
///
/// Struct attributes: `table = "name"`, `accessors = path` (a function receiving the derived
/// accessors and returning them extended with methods and setters), `callbacks`.
/// Field attributes: `column = "name"`, `skip`, `hidden`, `visible`.
#[proc_macro_derive(Model, attributes(plank))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    if !item.generics.params.is_empty() {
        panic!("Model cannot be derived on the generic type `{}`", item.ident);
    }
    let name = &item.ident;
    let metadata = decode_model(&item);
    let table = &metadata.table;
    let registrations = item
        .fields
        .iter()
        .map(decode_field)
        .filter(|f| !f.skip)
        .map(|f| {
            let ident = &f.ident;
            let ty = &f.ty;
            let column = &f.column;
            let register = if f.hidden {
                quote!(hidden)
            } else {
                quote!(field)
            };
            quote! {
                .#register(
                    #column,
                    |model: &#name| ::plank::AsValue::as_value(
                        ::std::clone::Clone::clone(&model.#ident)
                    ),
                    |model: &mut #name, value: ::plank::Value| -> ::plank::Result<()> {
                        model.#ident = <#ty as ::plank::AsValue>::try_from_value(value)?;
                        Ok(())
                    },
                )
            }
        });
    let extend = metadata
        .accessors
        .as_ref()
        .map(|path| quote!(let accessors = #path(accessors);));
    let callbacks = (!metadata.callbacks).then(|| quote!(impl ::plank::Callbacks for #name {}));
    quote! {
        impl ::plank::Model for #name {
            fn table_name() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#table)
            }
            fn accessors() -> &'static ::plank::Accessors<Self> {
                static ACCESSORS: ::std::sync::LazyLock<::plank::Accessors<#name>> =
                    ::std::sync::LazyLock::new(|| {
                        let accessors = ::plank::Accessors::<#name>::new()
                            #(#registrations)*;
                        #extend
                        accessors
                    });
                &ACCESSORS
            }
        }
        #callbacks
    }
    .into()
}
