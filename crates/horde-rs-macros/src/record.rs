//! `#[derive(Record)]` implementation.
//!
//! Generates `horde_rs_db::schema::Record::meta()` backed by a `LazyLock`
//! static, and `horde_rs_db::from_value::FromMaterialized` reading each
//! field through `MaterializedRecord::get_as`.

use darling::{FromDeriveInput, FromField, FromMeta};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::DeriveInput;

/// Struct-level attributes parsed from `#[record(...)]`.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(record), supports(struct_named))]
pub struct RecordOpts {
    pub ident: syn::Ident,
    pub data: darling::ast::Data<(), FieldOpts>,

    /// The table name; defaults to the struct name.
    #[darling(default)]
    pub table: Option<String>,

    /// Relationships owned by this record.
    #[darling(multiple, rename = "relation")]
    pub relations: Vec<RelationOpts>,
}

/// One `relation(...)` entry.
#[derive(Debug, FromMeta)]
pub struct RelationOpts {
    pub name: String,
    pub to: syn::Path,
    pub parent_key: String,
    pub child_key: String,
    #[darling(default)]
    pub kind: Option<syn::LitStr>,
}

/// Per-field attributes parsed from `#[field(...)]`.
#[derive(Debug, FromField)]
#[darling(attributes(field))]
pub struct FieldOpts {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,

    /// Field name override.
    #[darling(default)]
    pub name: Option<String>,

    /// Storage column override.
    #[darling(default)]
    pub column: Option<String>,
}

/// Maps a `kind = "..."` literal to a `RelationKind` variant name.
fn relation_kind(lit: Option<&syn::LitStr>) -> darling::Result<syn::Ident> {
    let Some(lit) = lit else {
        return Ok(format_ident!("HasMany"));
    };
    let variant = match lit.value().as_str() {
        "has_one" | "HasOne" | "00" => "HasOne",
        "has_many" | "HasMany" | "01" => "HasMany",
        "belongs_to_many" | "BelongsToMany" | "02" => "BelongsToMany",
        "belongs_to_one" | "BelongsToOne" | "03" => "BelongsToOne",
        other => {
            return Err(darling::Error::custom(format!(
                "unknown relation kind '{other}'; expected has_one, has_many, \
                 belongs_to_many, or belongs_to_one"
            ))
            .with_span(lit))
        }
    };
    Ok(format_ident!("{}", variant))
}

/// Generates the `Record` and `FromMaterialized` implementations.
pub fn derive_record_impl(input: &DeriveInput) -> TokenStream {
    let opts = match RecordOpts::from_derive_input(input) {
        Ok(o) => o,
        Err(e) => return e.write_errors(),
    };

    let struct_name = &opts.ident;
    let type_name = struct_name.to_string();
    let table = opts.table.clone().unwrap_or_else(|| type_name.clone());

    let Some(fields) = opts.data.as_ref().take_struct() else {
        return darling::Error::unsupported_shape("enum").write_errors();
    };
    let fields = fields.fields;

    let mut field_defs = Vec::with_capacity(fields.len());
    let mut readers = Vec::with_capacity(fields.len());
    for f in &fields {
        let Some(ident) = f.ident.as_ref() else {
            continue;
        };
        let name = f.name.clone().unwrap_or_else(|| ident.to_string());
        let column = f.column.clone().unwrap_or_else(|| name.clone());
        let ty = &f.ty;
        let declared = quote!(#ty).to_string();
        field_defs.push(quote! {
            horde_rs_db::schema::FieldDef::new(#name, #column, #declared)
        });
        readers.push(quote! {
            #ident: record.get_as::<#ty>(#name)?
        });
    }

    let mut errors = darling::Error::accumulator();
    let relation_tokens: Vec<TokenStream> = opts
        .relations
        .iter()
        .filter_map(|r| {
            let kind = errors.handle(relation_kind(r.kind.as_ref()))?;
            let RelationOpts {
                name,
                to,
                parent_key,
                child_key,
                ..
            } = r;
            Some(quote! {
                horde_rs_db::relationship::Relationship::new(
                    #name,
                    <#to as horde_rs_db::schema::Record>::meta,
                    #parent_key,
                    #child_key,
                    horde_rs_db::relationship::RelationKind::#kind,
                )
            })
        })
        .collect();
    if let Err(e) = errors.finish() {
        return e.write_errors();
    }

    quote! {
        impl horde_rs_db::schema::Record for #struct_name {
            fn meta() -> &'static horde_rs_db::schema::RecordMeta {
                use std::sync::LazyLock;
                static META: LazyLock<horde_rs_db::schema::RecordMeta> = LazyLock::new(|| {
                    horde_rs_db::schema::RecordMeta {
                        type_name: #type_name,
                        table: #table,
                        fields: vec![#(#field_defs),*],
                        relations: vec![#(#relation_tokens),*],
                    }
                });
                &META
            }
        }

        impl horde_rs_db::from_value::FromMaterialized for #struct_name {
            fn from_materialized(
                record: &horde_rs_db::materialize::MaterializedRecord,
            ) -> Result<Self, horde_rs_db::HordeError> {
                Ok(Self {
                    #(#readers),*
                })
            }
        }
    }
}
