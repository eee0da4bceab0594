use quote::format_ident;
use syn::{GenericArgument, Ident, PathArguments, Type, TypeParamBound};

/// Extension trait for `Ident` to simplify common naming transformations.
pub(crate) trait IdentExt {
    /// Returns a new identifier with the given prefix.
    fn with_prefix(&self, prefix: &str) -> Ident;

    /// Returns the identifier as a sentence-cased phrase, e.g. `rear_wheel`
    /// becomes `Rear wheel`.
    fn to_phrase(&self) -> String;
}

impl IdentExt for Ident {
    fn with_prefix(&self, prefix: &str) -> Ident {
        format_ident!("{}{}", prefix, self.to_string())
    }

    fn to_phrase(&self) -> String {
        let words = self.to_string().replace('_', " ");
        let mut chars = words.trim().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Returns `T` if `ty` is `Slot<T>`.
pub(crate) fn slot_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Slot" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// The last path segment of a type or of the first trait of a trait object,
/// e.g. `Wheel` for `dyn crate::Wheel`.
pub(crate) fn short_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::TraitObject(object) => object.bounds.iter().find_map(|bound| match bound {
            TypeParamBound::Trait(t) => t.path.segments.last().map(|s| s.ident.to_string()),
            _ => None,
        }),
        Type::Paren(inner) => short_type_name(&inner.elem),
        _ => None,
    }
}
