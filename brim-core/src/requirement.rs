//! Declarative descriptions of the submodels and connections a node needs.

use std::{any::TypeId, fmt};

macro_rules! requirement {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name {
            attribute: &'static str,
            type_name: &'static str,
            description: &'static str,
            full_name: &'static str,
            hard: bool,
            role: fn() -> TypeId,
        }

        impl $name {
            /// Creates a requirement; `role` identifies the accepted type,
            /// usually `TypeId::of::<dyn Role>`.
            pub const fn new(
                attribute: &'static str,
                type_name: &'static str,
                description: &'static str,
                full_name: &'static str,
                hard: bool,
                role: fn() -> TypeId,
            ) -> Self {
                Self {
                    attribute,
                    type_name,
                    description,
                    full_name,
                    hard,
                    role,
                }
            }

            /// Name of the slot holding the object in the parent.
            pub fn attribute(&self) -> &'static str {
                self.attribute
            }

            /// Name of the accepted type.
            pub fn type_name(&self) -> &'static str {
                self.type_name
            }

            pub fn description(&self) -> &'static str {
                self.description
            }

            pub fn full_name(&self) -> &'static str {
                self.full_name
            }

            /// Whether the slot must be filled for the model to be complete.
            pub fn is_hard(&self) -> bool {
                self.hard
            }

            pub fn role(&self) -> TypeId {
                (self.role)()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("attribute", &self.attribute)
                    .field("type_name", &self.type_name)
                    .field("description", &self.description)
                    .field("full_name", &self.full_name)
                    .field("hard", &self.hard)
                    .finish()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.attribute == other.attribute && self.role() == other.role()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.attribute)
            }
        }
    };
}

requirement! {
    /// A submodel slot of a model or connection.
    ModelRequirement
}

requirement! {
    /// A connection slot of a model.
    ConnectionRequirement
}

/// A requirement whose slot is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnspecifiedComponent {
    Model(&'static ModelRequirement),
    Connection(&'static ConnectionRequirement),
}

impl UnspecifiedComponent {
    pub fn attribute(&self) -> &'static str {
        match self {
            UnspecifiedComponent::Model(r) => r.attribute(),
            UnspecifiedComponent::Connection(r) => r.attribute(),
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            UnspecifiedComponent::Model(r) => r.full_name(),
            UnspecifiedComponent::Connection(r) => r.full_name(),
        }
    }

    pub fn is_hard(&self) -> bool {
        match self {
            UnspecifiedComponent::Model(r) => r.is_hard(),
            UnspecifiedComponent::Connection(r) => r.is_hard(),
        }
    }
}
