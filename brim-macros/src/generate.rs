use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Error, Ident, Result};

use crate::{
    parse::{FieldRole, Parsed, SlotField},
    utils::IdentExt,
};

/// The node family a derive targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Model,
    Connection,
    LoadGroup,
}

impl Kind {
    fn variant(self) -> Ident {
        match self {
            Kind::Model => quote::format_ident!("Model"),
            Kind::Connection => quote::format_ident!("Connection"),
            Kind::LoadGroup => quote::format_ident!("LoadGroup"),
        }
    }

    fn base_type(self) -> TokenStream {
        match self {
            Kind::Model => quote! { ::brim_core::ModelBase },
            Kind::Connection => quote! { ::brim_core::ConnectionBase },
            Kind::LoadGroup => quote! { ::brim_core::LoadGroupBase },
        }
    }

    fn handle_type(self) -> TokenStream {
        match self {
            Kind::Model => quote! { ::brim_core::ModelHandle },
            Kind::Connection => quote! { ::brim_core::ConnectionHandle },
            Kind::LoadGroup => quote! { ::brim_core::LoadGroupHandle },
        }
    }
}

impl Parsed {
    /// Generates the full token stream for the macro expansion.
    pub fn expand(self, kind: Kind) -> Result<TokenStream> {
        self.validate(kind)?;

        let node_impl = self.generate_node_impl(kind);
        let composite_impl = match kind {
            Kind::Model => self.generate_model_composite(),
            Kind::Connection => self.generate_connection_composite(),
            Kind::LoadGroup => self.generate_load_group_composite(),
        };
        let inherent_impl = self.generate_inherent_impl(kind);
        let registrable_impl = self.generate_registrable_impl(kind);

        Ok(quote! {
            #node_impl
            #composite_impl
            #inherent_impl
            #registrable_impl
        })
    }

    fn validate(&self, kind: Kind) -> Result<()> {
        if kind != Kind::Model {
            if let Some(slot) = self.connections().next() {
                return Err(Error::new_spanned(
                    &slot.ident,
                    "Only models can have connection slots.",
                ));
            }
        }
        if kind == Kind::LoadGroup {
            if let Some(slot) = self.submodels().next() {
                return Err(Error::new_spanned(
                    &slot.ident,
                    "Load groups cannot have submodel slots.",
                ));
            }
        } else if let Some(parent) = self.parents.first() {
            return Err(Error::new_spanned(
                parent,
                "Only load groups can declare a parent.",
            ));
        }
        Ok(())
    }

    fn base_ident(&self) -> &Ident {
        // `Parse` guarantees exactly one base field.
        self.base().unwrap_or(&self.ident)
    }

    /// Generates the `Node` implementation.
    fn generate_node_impl(&self, kind: Kind) -> TokenStream {
        let struct_name = &self.ident;
        let type_name = struct_name.to_string();
        let base = self.base_ident();
        let variant = kind.variant();

        quote! {
            impl ::brim_core::Node for #struct_name {
                fn node(&self) -> &::brim_core::NodeBase {
                    &self.#base.node
                }

                fn node_mut(&mut self) -> &mut ::brim_core::NodeBase {
                    &mut self.#base.node
                }

                fn type_name(&self) -> &'static str {
                    #type_name
                }

                fn kind(&self) -> ::brim_core::NodeKind {
                    ::brim_core::NodeKind::#variant
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_node(&self) -> &dyn ::brim_core::Node {
                    self
                }
            }
        }
    }

    /// Generates the `ModelComposite` implementation.
    fn generate_model_composite(&self) -> TokenStream {
        let struct_name = &self.ident;
        let base = self.base_ident();
        let submodels: Vec<_> = self.submodels().collect();
        let connections: Vec<_> = self.connections().collect();
        let model_table = requirement_table(quote! { ::brim_core::ModelRequirement }, &submodels);
        let connection_table =
            requirement_table(quote! { ::brim_core::ConnectionRequirement }, &connections);
        let submodel_arms = dispatch_arms(&submodels, quote! { model_handle });
        let connection_arms = dispatch_arms(&connections, quote! { connection_handle });

        quote! {
            impl ::brim_core::ModelComposite for #struct_name {
                fn model_base(&self) -> &::brim_core::ModelBase {
                    &self.#base
                }

                fn model_base_mut(&mut self) -> &mut ::brim_core::ModelBase {
                    &mut self.#base
                }

                fn required_models(&self) -> &'static [::brim_core::ModelRequirement] {
                    #model_table
                }

                fn required_connections(&self) -> &'static [::brim_core::ConnectionRequirement] {
                    #connection_table
                }

                fn submodel(&self, attribute: &str) -> Option<::brim_core::ModelHandle> {
                    match attribute {
                        #(#submodel_arms)*
                        _ => None,
                    }
                }

                fn connection(&self, attribute: &str) -> Option<::brim_core::ConnectionHandle> {
                    match attribute {
                        #(#connection_arms)*
                        _ => None,
                    }
                }
            }
        }
    }

    /// Generates the `ConnectionComposite` implementation.
    fn generate_connection_composite(&self) -> TokenStream {
        let struct_name = &self.ident;
        let base = self.base_ident();
        let submodels: Vec<_> = self.submodels().collect();
        let model_table = requirement_table(quote! { ::brim_core::ModelRequirement }, &submodels);
        let submodel_arms = dispatch_arms(&submodels, quote! { model_handle });

        quote! {
            impl ::brim_core::ConnectionComposite for #struct_name {
                fn connection_base(&self) -> &::brim_core::ConnectionBase {
                    &self.#base
                }

                fn connection_base_mut(&mut self) -> &mut ::brim_core::ConnectionBase {
                    &mut self.#base
                }

                fn required_models(&self) -> &'static [::brim_core::ModelRequirement] {
                    #model_table
                }

                fn submodel(&self, attribute: &str) -> Option<::brim_core::ModelHandle> {
                    match attribute {
                        #(#submodel_arms)*
                        _ => None,
                    }
                }
            }
        }
    }

    /// Generates the `LoadGroupComposite` implementation.
    fn generate_load_group_composite(&self) -> TokenStream {
        let struct_name = &self.ident;
        let base = self.base_ident();

        let (required, accepts) = if self.parents.is_empty() {
            ("Model or Connection".to_string(), quote! { true })
        } else {
            let names: Vec<_> = self
                .parents
                .iter()
                .filter_map(|p| p.segments.last().map(|s| s.ident.to_string()))
                .collect();
            let parents = &self.parents;
            (
                names.join(" or "),
                quote! { false #(|| parent.as_any().is::<#parents>())* },
            )
        };

        quote! {
            impl ::brim_core::LoadGroupComposite for #struct_name {
                fn load_group_base(&self) -> &::brim_core::LoadGroupBase {
                    &self.#base
                }

                fn load_group_base_mut(&mut self) -> &mut ::brim_core::LoadGroupBase {
                    &mut self.#base
                }

                fn required_parent(&self) -> &'static str {
                    #required
                }

                fn accepts_parent(&self, parent: &dyn ::brim_core::Node) -> bool {
                    #accepts
                }
            }
        }
    }

    /// Generates the constructor and the typed slot accessors.
    fn generate_inherent_impl(&self, kind: Kind) -> TokenStream {
        let struct_name = &self.ident;
        let base_type = kind.base_type();

        let initializers = self.fields.iter().map(|field| {
            let ident = &field.ident;
            match field.role {
                FieldRole::Base => quote! { #ident: #base_type::new(name)? },
                FieldRole::Submodel(_) | FieldRole::Connection(_) => {
                    quote! { #ident: ::brim_core::Slot::empty() }
                }
                FieldRole::Plain => quote! { #ident: ::std::default::Default::default() },
            }
        });

        let accessors = self
            .submodels()
            .chain(self.connections())
            .map(generate_accessors);

        quote! {
            impl #struct_name {
                /// Creates an instance with empty slots.
                pub fn new(name: &str) -> Result<Self, ::brim_core::BrimError> {
                    Ok(Self {
                        #(#initializers),*
                    })
                }

                #(#accessors)*
            }
        }
    }

    /// Generates the `Registrable` implementation.
    fn generate_registrable_impl(&self, kind: Kind) -> TokenStream {
        let struct_name = &self.ident;
        let variant = kind.variant();
        let handle = kind.handle_type();
        let convention = match &self.convention {
            Some(convention) => quote! { Some(#convention) },
            None => quote! { None },
        };

        quote! {
            impl ::brim_core::Registrable for #struct_name {
                const KIND: ::brim_core::NodeKind = ::brim_core::NodeKind::#variant;
                const CONVENTION: Option<&'static str> = #convention;

                fn create(name: &str) -> Result<Self, ::brim_core::BrimError> {
                    Self::new(name)
                }

                fn into_node(value: ::brim_core::Shared<Self>) -> ::brim_core::AnyNode {
                    ::brim_core::AnyNode::#variant(#handle::new(value))
                }
            }
        }
    }
}

/// A `static` requirement table and a reference to it.
fn requirement_table(requirement: TokenStream, slots: &[&SlotField]) -> TokenStream {
    let count = slots.len();
    let entries = slots.iter().map(|slot| {
        let attribute = slot.ident.to_string();
        let SlotField {
            inner,
            type_name,
            description,
            full_name,
            hard,
            ..
        } = slot;
        quote! {
            #requirement::new(
                #attribute,
                #type_name,
                #description,
                #full_name,
                #hard,
                ::std::any::TypeId::of::<#inner>,
            )
        }
    });

    quote! {
        static REQUIRED: [#requirement; #count] = [#(#entries),*];
        &REQUIRED
    }
}

fn dispatch_arms(slots: &[&SlotField], method: TokenStream) -> Vec<TokenStream> {
    slots
        .iter()
        .map(|slot| {
            let ident = &slot.ident;
            let attribute = ident.to_string();
            quote! { #attribute => self.#ident.#method(), }
        })
        .collect()
}

fn generate_accessors(slot: &SlotField) -> TokenStream {
    let ident = &slot.ident;
    let inner = slot.inner.to_token_stream();
    let setter = ident.with_prefix("set_");
    let require = ident.with_prefix("require_");
    let full_name = &slot.full_name;

    quote! {
        pub fn #ident(&self) -> Option<::brim_core::Shared<#inner>> {
            self.#ident.get()
        }

        pub fn #setter(&mut self, value: ::brim_core::Shared<#inner>) {
            self.#ident.set(value);
        }

        pub fn #require(&self) -> Result<::brim_core::Shared<#inner>, ::brim_core::BrimError> {
            self.#ident.require(::brim_core::Node::name(self), #full_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_str;

    fn expand(input: &str, kind: Kind) -> Result<TokenStream> {
        parse_str::<Parsed>(input)
            .expect("Parsing should succeed")
            .expand(kind)
    }

    /// Formats generated code so a failing comparison shows a readable diff.
    fn pretty(tokens: TokenStream) -> String {
        let file: syn::File = syn::parse2(tokens).expect("Generated code should parse");
        prettyplease::unparse(&file)
    }

    #[test]
    fn generates_correct_code_for_connection() {
        let input = r#"
            #[brim(convention = "moore")]
            pub struct Tire {
                #[brim(base)]
                base: ConnectionBase,
                #[brim(submodel(description = "Ground model."))]
                ground: Slot<dyn Ground>,
                config: TireConfig,
            }
        "#;

        let generated_code = expand(input, Kind::Connection).expect("Expansion should succeed");

        let expected_code = quote! {
            impl ::brim_core::Node for Tire {
                fn node(&self) -> &::brim_core::NodeBase {
                    &self.base.node
                }

                fn node_mut(&mut self) -> &mut ::brim_core::NodeBase {
                    &mut self.base.node
                }

                fn type_name(&self) -> &'static str {
                    "Tire"
                }

                fn kind(&self) -> ::brim_core::NodeKind {
                    ::brim_core::NodeKind::Connection
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_node(&self) -> &dyn ::brim_core::Node {
                    self
                }
            }

            impl ::brim_core::ConnectionComposite for Tire {
                fn connection_base(&self) -> &::brim_core::ConnectionBase {
                    &self.base
                }

                fn connection_base_mut(&mut self) -> &mut ::brim_core::ConnectionBase {
                    &mut self.base
                }

                fn required_models(&self) -> &'static [::brim_core::ModelRequirement] {
                    static REQUIRED: [::brim_core::ModelRequirement; 1usize] = [
                        ::brim_core::ModelRequirement::new(
                            "ground",
                            "Ground",
                            "Ground model.",
                            "Ground",
                            true,
                            ::std::any::TypeId::of::<dyn Ground>,
                        )
                    ];
                    &REQUIRED
                }

                fn submodel(&self, attribute: &str) -> Option<::brim_core::ModelHandle> {
                    match attribute {
                        "ground" => self.ground.model_handle(),
                        _ => None,
                    }
                }
            }

            impl Tire {
                /// Creates an instance with empty slots.
                pub fn new(name: &str) -> Result<Self, ::brim_core::BrimError> {
                    Ok(Self {
                        base: ::brim_core::ConnectionBase::new(name)?,
                        ground: ::brim_core::Slot::empty(),
                        config: ::std::default::Default::default()
                    })
                }

                pub fn ground(&self) -> Option<::brim_core::Shared<dyn Ground>> {
                    self.ground.get()
                }

                pub fn set_ground(&mut self, value: ::brim_core::Shared<dyn Ground>) {
                    self.ground.set(value);
                }

                pub fn require_ground(&self) -> Result<::brim_core::Shared<dyn Ground>, ::brim_core::BrimError> {
                    self.ground.require(::brim_core::Node::name(self), "Ground")
                }
            }

            impl ::brim_core::Registrable for Tire {
                const KIND: ::brim_core::NodeKind = ::brim_core::NodeKind::Connection;
                const CONVENTION: Option<&'static str> = Some("moore");

                fn create(name: &str) -> Result<Self, ::brim_core::BrimError> {
                    Self::new(name)
                }

                fn into_node(value: ::brim_core::Shared<Self>) -> ::brim_core::AnyNode {
                    ::brim_core::AnyNode::Connection(::brim_core::ConnectionHandle::new(value))
                }
            }
        };

        assert_eq!(pretty(generated_code), pretty(expected_code));
    }

    #[test]
    fn model_requirements_use_options() {
        let input = r#"
            struct Bicycle {
                #[brim(base)]
                base: ModelBase,
                #[brim(connection(optional, full_name = "Rear tire"))]
                rear_tire: Slot<dyn Tire>,
            }
        "#;

        let generated_code = expand(input, Kind::Model)
            .expect("Expansion should succeed")
            .to_string();

        let expected_table = quote! {
            static REQUIRED: [::brim_core::ConnectionRequirement; 1usize] = [
                ::brim_core::ConnectionRequirement::new(
                    "rear_tire",
                    "Tire",
                    "Rear tire.",
                    "Rear tire",
                    false,
                    ::std::any::TypeId::of::<dyn Tire>,
                )
            ];
        };
        let empty_table = quote! {
            static REQUIRED: [::brim_core::ModelRequirement; 0usize] = [];
        };
        assert!(generated_code.contains(&expected_table.to_string()));
        assert!(generated_code.contains(&empty_table.to_string()));
        assert!(generated_code.contains(&quote! { const CONVENTION: Option<&'static str> = None; }.to_string()));
    }

    #[test]
    fn load_group_checks_parent_types() {
        let input = "
            #[brim(parent(WhippleBicycle, crate::RollingDisc))]
            struct SteerTorque {
                #[brim(base)]
                base: LoadGroupBase,
            }
        ";

        let generated_code = expand(input, Kind::LoadGroup)
            .expect("Expansion should succeed")
            .to_string();

        let expected = quote! {
            fn required_parent(&self) -> &'static str {
                "WhippleBicycle or RollingDisc"
            }

            fn accepts_parent(&self, parent: &dyn ::brim_core::Node) -> bool {
                false
                    || parent.as_any().is::<WhippleBicycle>()
                    || parent.as_any().is::<crate::RollingDisc>()
            }
        };
        assert!(generated_code.contains(&expected.to_string()));
    }

    #[test]
    fn error_if_tuple_struct() {
        let error_message = parse_str::<Parsed>("struct Wheel(ModelBase);")
            .unwrap_err()
            .to_string();

        assert_eq!(
            error_message,
            "Unsupported struct type. This macro requires a struct with named fields."
        );
    }

    #[test]
    fn error_if_base_is_missing() {
        let error_message = parse_str::<Parsed>("struct Wheel { radius: f64 }")
            .unwrap_err()
            .to_string();

        assert_eq!(
            error_message,
            "Exactly one field must be marked with `#[brim(base)]`."
        );
    }

    #[test]
    fn error_if_slot_type_is_wrong() {
        let input = "
            struct Bicycle {
                #[brim(base)]
                base: ModelBase,
                #[brim(submodel)]
                wheel: Option<Wheel>,
            }
        ";

        let error_message = parse_str::<Parsed>(input).unwrap_err().to_string();
        assert_eq!(error_message, "Slot fields must have the type `Slot<T>`.");
    }

    #[test]
    fn error_if_attribute_is_unknown() {
        let input = "
            struct Bicycle {
                #[brim(base)]
                base: ModelBase,
                #[brim(wheel)]
                wheel: Slot<dyn Wheel>,
            }
        ";

        let error_message = parse_str::<Parsed>(input).unwrap_err().to_string();
        assert_eq!(
            error_message,
            "Unsupported field attribute, expected `base`, `submodel` or `connection`."
        );
    }

    #[test]
    fn error_if_connection_has_connections() {
        let input = "
            struct Seat {
                #[brim(base)]
                base: ConnectionBase,
                #[brim(connection)]
                other: Slot<dyn Tire>,
            }
        ";

        let error_message = expand(input, Kind::Connection).unwrap_err().to_string();
        assert_eq!(error_message, "Only models can have connection slots.");
    }
}
