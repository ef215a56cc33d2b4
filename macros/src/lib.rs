//! Derive macros for the dashboard state engine
//!
//! # Available Macros
//!
//! - `#[derive(Resource)]` - Implements `dashboard_state_api::Resource` for a
//!   payload struct
//!
//! # Example
//!
//! ```ignore
//! use dashboard_state_api::{Resource, ResourceName};
//!
//! #[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
//! #[resource(kind = "project")]
//! struct Project {
//!     name: ResourceName,
//!     display_name: String,
//!     #[resource(parent)]
//!     organization: ResourceName,
//! }
//!
//! assert_eq!(Project::KIND, ResourceKind::Project);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

/// Kinds accepted by `#[resource(kind = "...")]` and their enum variants.
const KINDS: &[(&str, &str)] = &[
    ("organization", "Organization"),
    ("project", "Project"),
    ("site", "Site"),
];

/// Derive macro for resource payloads
///
/// Implements `Resource` with:
/// - `KIND` - from the struct attribute `#[resource(kind = "...")]`
/// - `name()` - the field marked `#[resource(name)]`, or the field called `name`
/// - `parent()` - the field marked `#[resource(parent)]`, if any; the field is a
///   `ResourceName` or `Option<ResourceName>` and an unset name counts as no
///   parent
///
/// # Errors
///
/// Produces a compile error if:
/// - Applied to anything but a struct with named fields
/// - The kind attribute is missing or names an unknown kind
/// - No name field can be found
/// - More than one field is marked `name` or `parent`
///
/// # Example
///
/// ```ignore
/// #[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
/// #[resource(kind = "site")]
/// struct Site {
///     #[resource(name)]
///     id: ResourceName,
///     #[resource(parent)]
///     project: Option<ResourceName>,
/// }
/// ```
#[proc_macro_derive(Resource, attributes(resource))]
pub fn derive_resource(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_resource(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_resource(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Resource)] can only be used on structs",
        ));
    };
    let Fields::Named(fields) = &data_struct.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Resource)] requires named fields",
        ));
    };

    let kind = kind_variant(input)?;

    let mut name_field = None;
    let mut parent_field = None;
    for field in &fields.named {
        for role in field_roles(&field.attrs)? {
            let slot = match role {
                Role::Name => &mut name_field,
                Role::Parent => &mut parent_field,
            };
            if slot.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("only one field may be marked #[resource({})]", role.as_str()),
                ));
            }
            *slot = Some(field);
        }
    }

    let name_field = match name_field {
        Some(field) => field_ident(field)?,
        None => fields
            .named
            .iter()
            .filter_map(|field| field.ident.as_ref())
            .find(|ident| *ident == "name")
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    input,
                    "no `name` field; mark the name field with #[resource(name)]",
                )
            })?,
    };

    let parent_impl = match parent_field {
        Some(field) => {
            let parent = field_ident(field)?;
            quote! {
                fn parent(&self) -> ::core::option::Option<&::dashboard_state_api::ResourceName> {
                    ::core::option::Option::<&::dashboard_state_api::ResourceName>::from(&self.#parent)
                        .filter(|name| !name.is_unset())
                }
            }
        },
        None => quote! {},
    };

    Ok(quote! {
        impl #impl_generics ::dashboard_state_api::Resource for #name #ty_generics #where_clause {
            const KIND: ::dashboard_state_api::ResourceKind = ::dashboard_state_api::ResourceKind::#kind;

            fn name(&self) -> &::dashboard_state_api::ResourceName {
                &self.#name_field
            }

            #parent_impl
        }
    })
}

#[derive(Clone, Copy)]
enum Role {
    Name,
    Parent,
}

impl Role {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Parent => "parent",
        }
    }
}

/// Resolve `#[resource(kind = "...")]` on the struct to a `ResourceKind` variant.
fn kind_variant(input: &DeriveInput) -> syn::Result<Ident> {
    let mut kind: Option<LitStr> = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("resource")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("kind") {
                kind = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `kind = \"...\"`"))
            }
        })?;
    }

    let Some(kind) = kind else {
        return Err(syn::Error::new_spanned(
            input,
            "missing #[resource(kind = \"...\")] attribute",
        ));
    };

    let value = kind.value();
    KINDS
        .iter()
        .find(|(attr, _)| *attr == value)
        .map(|(_, variant)| Ident::new(variant, Span::call_site()))
        .ok_or_else(|| {
            let known: Vec<&str> = KINDS.iter().map(|(attr, _)| *attr).collect();
            syn::Error::new_spanned(
                &kind,
                format!("unknown resource kind `{value}`, expected one of: {}", known.join(", ")),
            )
        })
}

/// Roles declared by `#[resource(name)]` / `#[resource(parent)]` on a field.
fn field_roles(attrs: &[Attribute]) -> syn::Result<Vec<Role>> {
    let mut roles = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("resource")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                roles.push(Role::Name);
                Ok(())
            } else if meta.path.is_ident("parent") {
                roles.push(Role::Parent);
                Ok(())
            } else {
                Err(meta.error("expected `name` or `parent`"))
            }
        })?;
    }

    Ok(roles)
}

fn field_ident(field: &Field) -> syn::Result<&Ident> {
    field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))
}
