mod generate;
mod parse;
mod utils;

use proc_macro::TokenStream;
use syn::parse_macro_input;

use generate::Kind;

/// Implements the structural traits of a BRiM model.
///
/// When applied to a struct, this macro:
///
/// - Implements `Node` using the field marked `#[brim(base)]`, which must be
///   a `ModelBase`.
/// - Implements `ModelComposite` with `static` requirement tables built from
///   the fields marked `#[brim(submodel)]` and `#[brim(connection)]`.
/// - Generates `new(name)`, which fills slots with `Slot::empty()` and every
///   other field with `Default::default()`, plus a getter, a setter and a
///   `require_*` accessor per slot.
/// - Implements `Registrable`, using the optional struct-level
///   `#[brim(convention = "...")]`.
///
/// The model hooks are provided by a separate `impl Model` block.
///
/// ## Slot options
///
/// `description = "..."`, `full_name = "..."`, `type_name = "..."` and
/// `optional`.
///
/// ## Restrictions
///
/// - The input struct must use named fields and have no generic parameters.
/// - Exactly one field must be marked `#[brim(base)]`.
/// - Slot fields must have the type `Slot<T>`.
///
/// ## Example
///
/// ```ignore
/// #[derive(Debug, Model)]
/// #[brim(convention = "moore")]
/// pub struct Bicycle {
///     #[brim(base)]
///     base: ModelBase,
///     #[brim(submodel(description = "Submodel of the rear wheel."))]
///     rear_wheel: Slot<dyn Wheel>,
///     #[brim(connection(optional))]
///     rear_tire: Slot<dyn Tire>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(brim))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    expand(input, Kind::Model)
}

/// Implements the structural traits of a BRiM connection.
///
/// Works like `#[derive(Model)]`, except that the base field must be a
/// `ConnectionBase` and only `#[brim(submodel)]` slots are allowed. The
/// referenced models are assigned by the parent model.
#[proc_macro_derive(Connection, attributes(brim))]
pub fn derive_connection(input: TokenStream) -> TokenStream {
    expand(input, Kind::Connection)
}

/// Implements the structural traits of a BRiM load group.
///
/// The base field must be a `LoadGroupBase`. The struct-level
/// `#[brim(parent(A, B))]` restricts the accepted parents to the concrete
/// types `A` and `B`; without it any model or connection is accepted.
#[proc_macro_derive(LoadGroup, attributes(brim))]
pub fn derive_load_group(input: TokenStream) -> TokenStream {
    expand(input, Kind::LoadGroup)
}

fn expand(input: TokenStream, kind: Kind) -> TokenStream {
    let parsed = parse_macro_input!(input as parse::Parsed);
    parsed
        .expand(kind)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
