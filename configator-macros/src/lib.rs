//! Procedural macros for configator schemas.
//!
//! `#[derive(Schema)]` turns a struct with named fields into a schema
//! descriptor at compile time and generates the code that rebuilds the struct
//! from hydrated values. Nested structs that also derive `Schema` become vault
//! sections.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Path, Token, parse_macro_input};

/// Derives `Schema` and `SchemaField` for a struct with named fields.
///
/// Field attributes:
/// - `#[schema(default)]` falls back to `Default::default()` when the vault
///   has no matching field.
/// - `#[schema(default = expr)]` falls back to `expr`. String literals are
///   converted to `String`.
/// - `#[schema(rename = "name")]` matches the vault field or section `name`
///   instead of the Rust identifier.
///
/// Container attribute `#[schema(crate = "path")]` points the generated code
/// at the primitives crate when `::configator::primitives` is not available.
#[proc_macro_derive(Schema, attributes(schema))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

enum DefaultSpec {
    Required,
    Trait,
    Expr(Expr),
}

struct FieldOptions {
    rename: Option<String>,
    default: DefaultSpec,
}

fn container_path(input: &DeriveInput) -> syn::Result<Path> {
    let mut krate: Path = syn::parse_quote!(::configator::primitives);
    for attr in &input.attrs {
        if !attr.path().is_ident("schema") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                krate = lit.parse()?;
                Ok(())
            } else {
                Err(meta.error("unsupported schema container attribute"))
            }
        })?;
    }
    Ok(krate)
}

fn field_options(field: &syn::Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions {
        rename: None,
        default: DefaultSpec::Required,
    };
    for attr in &field.attrs {
        if !attr.path().is_ident("schema") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                options.rename = Some(lit.value());
            } else if meta.path.is_ident("default") {
                if meta.input.peek(Token![=]) {
                    options.default = DefaultSpec::Expr(meta.value()?.parse()?);
                } else {
                    options.default = DefaultSpec::Trait;
                }
            } else {
                return Err(meta.error("unsupported schema field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Schema can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Schema requires a struct with named fields",
        ));
    };

    let krate = container_path(input)?;
    let ident = &input.ident;
    let schema_name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut descriptors = Vec::new();
    let mut assignments = Vec::new();
    for field in &named.named {
        let options = field_options(field)?;
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let name = options
            .rename
            .unwrap_or_else(|| field_ident.to_string().trim_start_matches("r#").to_owned());

        let default = match options.default {
            DefaultSpec::Required => quote! {},
            DefaultSpec::Trait => quote! {
                .with_default(<#ty as #krate::PrimitiveField>::into_value(
                    <#ty as ::core::default::Default>::default(),
                ))
            },
            DefaultSpec::Expr(expr) => {
                let expr = match expr {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(lit), ..
                    }) => quote! { ::std::string::String::from(#lit) },
                    other => quote! { #other },
                };
                quote! {
                    .with_default(<#ty as #krate::PrimitiveField>::into_value({
                        let value: #ty = #expr;
                        value
                    }))
                }
            }
        };

        descriptors.push(quote! {
            .field(
                #krate::FieldDescriptor::new(#name, <#ty as #krate::SchemaField>::kind())
                    #default
            )
        });
        assignments.push(quote! {
            #field_ident: values.take::<#ty>(#schema_name, #name)?
        });
    }

    Ok(quote! {
        impl #impl_generics #krate::Schema for #ident #ty_generics #where_clause {
            fn descriptor() -> #krate::SchemaDescriptor {
                #krate::SchemaDescriptor::new(#schema_name)
                    #(#descriptors)*
            }

            #[allow(unused_mut)]
            fn from_values(mut values: #krate::ValueMap) -> #krate::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#assignments,)*
                })
            }
        }

        impl #impl_generics #krate::SchemaField for #ident #ty_generics #where_clause {
            fn kind() -> #krate::FieldKind {
                #krate::FieldKind::Section(::std::boxed::Box::new(
                    <Self as #krate::Schema>::descriptor(),
                ))
            }

            fn from_value(field: &str, value: #krate::Value) -> #krate::Result<Self> {
                match value {
                    #krate::Value::Section(values) => <Self as #krate::Schema>::from_values(values),
                    other => ::core::result::Result::Err(#krate::Error::TypeMismatch {
                        field: ::std::borrow::ToOwned::to_owned(field),
                        expected: "section",
                        found: other.kind_name(),
                    }),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_enums() {
        let input: DeriveInput = syn::parse_quote! {
            enum Mode { Fast, Slow }
        };
        let err = expand(&input).expect_err("enums are not schemas");
        assert!(err.to_string().contains("only be derived for structs"));
    }

    #[test]
    fn rejects_tuple_structs() {
        let input: DeriveInput = syn::parse_quote! {
            struct Pair(String, String);
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn rejects_unknown_field_attribute() {
        let input: DeriveInput = syn::parse_quote! {
            struct Config {
                #[schema(flatten)]
                inner: String,
            }
        };
        let err = expand(&input).expect_err("unknown attribute");
        assert!(err.to_string().contains("unsupported schema field attribute"));
    }

    #[test]
    fn renames_and_defaults_expand() {
        let input: DeriveInput = syn::parse_quote! {
            #[schema(crate = "configator_primitives")]
            struct Config {
                #[schema(rename = "NO_SECTION", default = "fallback")]
                no_section: String,
                #[schema(default)]
                retries: u32,
            }
        };
        let output = expand(&input).expect("expands").to_string();
        assert!(output.contains("\"NO_SECTION\""));
        assert!(output.contains("configator_primitives"));
        assert!(output.contains("Default"));
    }
}
