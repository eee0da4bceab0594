use syn::{
    Attribute, Error, Fields, Ident, ItemStruct, LitBool, LitStr, Path, Result, Token, Type,
    parenthesized,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

use crate::utils::{IdentExt, short_type_name, slot_inner};

/// Options of a `#[brim(submodel(...))]` or `#[brim(connection(...))]` field.
#[derive(Debug)]
pub(crate) struct SlotField {
    pub ident: Ident,
    pub inner: Type,
    pub type_name: String,
    pub description: String,
    pub full_name: String,
    pub hard: bool,
}

#[derive(Debug)]
pub(crate) enum FieldRole {
    Base,
    Submodel(SlotField),
    Connection(SlotField),
    Plain,
}

#[derive(Debug)]
pub(crate) struct Field {
    pub ident: Ident,
    pub role: FieldRole,
}

/// A struct deriving one of the node macros.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub ident: Ident,
    pub fields: Vec<Field>,
    pub convention: Option<LitStr>,
    pub parents: Vec<Path>,
}

impl Parsed {
    pub fn base(&self) -> Option<&Ident> {
        self.fields
            .iter()
            .find(|f| matches!(f.role, FieldRole::Base))
            .map(|f| &f.ident)
    }

    pub fn submodels(&self) -> impl Iterator<Item = &SlotField> {
        self.fields.iter().filter_map(|f| match &f.role {
            FieldRole::Submodel(slot) => Some(slot),
            _ => None,
        })
    }

    pub fn connections(&self) -> impl Iterator<Item = &SlotField> {
        self.fields.iter().filter_map(|f| match &f.role {
            FieldRole::Connection(slot) => Some(slot),
            _ => None,
        })
    }
}

impl Parse for Parsed {
    /// Parses a struct definition and its `#[brim(...)]` attributes.
    fn parse(input: ParseStream) -> Result<Self> {
        let ItemStruct {
            attrs,
            ident,
            generics,
            fields,
            ..
        } = input.parse()?;

        let Fields::Named(named) = fields else {
            return Err(Error::new_spanned(
                ident,
                "Unsupported struct type. This macro requires a struct with named fields.",
            ));
        };
        if !generics.params.is_empty() {
            return Err(Error::new_spanned(
                generics,
                "Generic types are not supported by this macro.",
            ));
        }

        let mut convention = None;
        let mut parents = Vec::new();
        for attr in attrs.iter().filter(|a| a.path().is_ident("brim")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("convention") {
                    convention = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else if meta.path.is_ident("parent") {
                    let content;
                    parenthesized!(content in meta.input);
                    let types = Punctuated::<Path, Token![,]>::parse_terminated(&content)?;
                    parents.extend(types);
                    Ok(())
                } else {
                    Err(meta.error("Unsupported struct attribute, expected `convention` or `parent`."))
                }
            })?;
        }

        let mut parsed_fields = Vec::new();
        for field in named.named {
            let Some(field_ident) = field.ident.clone() else {
                continue;
            };
            let role = parse_field_role(&field_ident, &field.ty, &field.attrs)?;
            parsed_fields.push(Field {
                ident: field_ident,
                role,
            });
        }

        let bases = parsed_fields
            .iter()
            .filter(|f| matches!(f.role, FieldRole::Base))
            .count();
        if bases != 1 {
            return Err(Error::new_spanned(
                ident,
                "Exactly one field must be marked with `#[brim(base)]`.",
            ));
        }

        Ok(Parsed {
            ident,
            fields: parsed_fields,
            convention,
            parents,
        })
    }
}

fn parse_field_role(ident: &Ident, ty: &Type, attrs: &[Attribute]) -> Result<FieldRole> {
    let mut role = FieldRole::Plain;
    for attr in attrs.iter().filter(|a| a.path().is_ident("brim")) {
        attr.parse_nested_meta(|meta| {
            if !matches!(role, FieldRole::Plain) {
                return Err(meta.error("A field can only have one brim role."));
            }
            if meta.path.is_ident("base") {
                role = FieldRole::Base;
                return Ok(());
            }
            let is_submodel = meta.path.is_ident("submodel");
            if !is_submodel && !meta.path.is_ident("connection") {
                return Err(meta.error(
                    "Unsupported field attribute, expected `base`, `submodel` or `connection`.",
                ));
            }

            let Some(inner) = slot_inner(ty) else {
                return Err(Error::new_spanned(ty, "Slot fields must have the type `Slot<T>`."));
            };
            let mut slot = SlotField {
                ident: ident.clone(),
                inner: inner.clone(),
                type_name: short_type_name(inner).unwrap_or_else(|| "Node".to_string()),
                description: String::new(),
                full_name: ident.to_phrase(),
                hard: true,
            };
            if meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(|option| {
                    if option.path.is_ident("optional") {
                        slot.hard = if option.input.peek(Token![=]) {
                            !option.value()?.parse::<LitBool>()?.value
                        } else {
                            false
                        };
                    } else if option.path.is_ident("description") {
                        slot.description = option.value()?.parse::<LitStr>()?.value();
                    } else if option.path.is_ident("full_name") {
                        slot.full_name = option.value()?.parse::<LitStr>()?.value();
                    } else if option.path.is_ident("type_name") {
                        slot.type_name = option.value()?.parse::<LitStr>()?.value();
                    } else {
                        return Err(option.error(
                            "Unsupported slot option, expected `description`, `full_name`, `type_name` or `optional`.",
                        ));
                    }
                    Ok(())
                })?;
            }
            if slot.description.is_empty() {
                slot.description = format!("{}.", slot.full_name);
            }

            role = if is_submodel {
                FieldRole::Submodel(slot)
            } else {
                FieldRole::Connection(slot)
            };
            Ok(())
        })?;
    }
    Ok(role)
}
