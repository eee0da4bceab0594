//! Catalog of concrete node types, resolvable by role and convention.

use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt, mem,
};

use tracing::debug;

use crate::{
    AnyNode, BrimError, ConnectionRequirement, ModelRequirement, Node, NodeKind, Shared, shared,
};

/// A node type that can be registered and instantiated by name.
///
/// Implemented by the derive macros.
pub trait Registrable: Node + Sized {
    const KIND: NodeKind;

    /// Modeling convention this type implements, e.g. `"moore"`.
    const CONVENTION: Option<&'static str> = None;

    fn create(name: &str) -> Result<Self, BrimError>;

    fn into_node(value: Shared<Self>) -> AnyNode;
}

/// A requirement that can be resolved against a [`Registry`].
pub trait Requirement {
    const KIND: NodeKind;

    fn role(&self) -> TypeId;
}

impl Requirement for ModelRequirement {
    const KIND: NodeKind = NodeKind::Model;

    fn role(&self) -> TypeId {
        ModelRequirement::role(self)
    }
}

impl Requirement for ConnectionRequirement {
    const KIND: NodeKind = NodeKind::Connection;

    fn role(&self) -> TypeId {
        ConnectionRequirement::role(self)
    }
}

type RoleFactory<R> = Box<dyn Fn(&str) -> Result<Shared<R>, BrimError>>;

struct Role {
    name: &'static str,
    factory: Box<dyn Any>,
}

/// A registered type.
pub struct RegistryEntry {
    type_name: &'static str,
    type_id: TypeId,
    kind: NodeKind,
    convention: Option<&'static str>,
    instantiate: fn(&str) -> Result<AnyNode, BrimError>,
    roles: HashMap<TypeId, Role>,
}

impl RegistryEntry {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn convention(&self) -> Option<&'static str> {
        self.convention
    }

    /// Whether instances can be used where `R` is expected.
    pub fn provides<R: ?Sized + 'static>(&self) -> bool {
        self.roles.contains_key(&TypeId::of::<R>())
    }

    /// Creates an instance named `name`.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn instantiate(&self, name: &str) -> Result<AnyNode, BrimError> {
        (self.instantiate)(name)
    }

    fn factory<R: ?Sized + 'static>(&self) -> Option<&RoleFactory<R>> {
        self.roles
            .get(&TypeId::of::<R>())
            .and_then(|role| role.factory.downcast_ref::<RoleFactory<R>>())
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut roles: Vec<_> = self.roles.values().map(|r| r.name).collect();
        roles.sort_unstable();
        f.debug_struct("RegistryEntry")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("convention", &self.convention)
            .field("roles", &roles)
            .finish()
    }
}

fn instantiate<T: Registrable>(name: &str) -> Result<AnyNode, BrimError> {
    Ok(T::into_node(shared(T::create(name)?)))
}

/// Declares the roles of a freshly registered type.
pub struct RoleBuilder<'a, T> {
    entry: &'a mut RegistryEntry,
    marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Registrable> RoleBuilder<'_, T> {
    /// Registers `T` as an implementation of `R`, typically a role trait
    /// object; `cast` performs the unsizing coercion, usually `|x| x`.
    pub fn provides<R: ?Sized + 'static>(self, cast: fn(Shared<T>) -> Shared<R>) -> Self {
        let factory: RoleFactory<R> = Box::new(move |name| Ok(cast(shared(T::create(name)?))));
        self.entry.roles.insert(
            TypeId::of::<R>(),
            Role {
                name: type_name::<R>(),
                factory: Box::new(factory),
            },
        );
        self
    }
}

/// Registered types, partitioned into models, connections and load groups.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    default_conventions: HashMap<TypeId, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `T` to the partition of its kind. `T` itself is always a
    /// provided role.
    ///
    /// # Errors
    ///
    /// Fails if `T` is already registered.
    pub fn register<T: Registrable>(&mut self) -> Result<RoleBuilder<'_, T>, BrimError> {
        let type_name = type_name::<T>().rsplit("::").next().unwrap_or_default();
        if self.entries.iter().any(|e| e.type_id == TypeId::of::<T>()) {
            return Err(BrimError::AlreadyRegistered(type_name));
        }
        debug!(type_name, kind = %T::KIND, "registered type");
        self.entries.push(RegistryEntry {
            type_name,
            type_id: TypeId::of::<T>(),
            kind: T::KIND,
            convention: T::CONVENTION,
            instantiate: instantiate::<T>,
            roles: HashMap::new(),
        });
        let index = self.entries.len() - 1;
        let builder = RoleBuilder {
            entry: &mut self.entries[index],
            marker: std::marker::PhantomData,
        };
        Ok(builder.provides::<T>(|x| x))
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn get(&self, type_name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.type_name == type_name)
    }

    fn of_kind(&self, kind: NodeKind) -> Vec<&RegistryEntry> {
        self.entries.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn models(&self) -> Vec<&RegistryEntry> {
        self.of_kind(NodeKind::Model)
    }

    pub fn connections(&self) -> Vec<&RegistryEntry> {
        self.of_kind(NodeKind::Connection)
    }

    pub fn load_groups(&self) -> Vec<&RegistryEntry> {
        self.of_kind(NodeKind::LoadGroup)
    }

    /// Types that can fill the slot described by `requirement`.
    pub fn get_from_requirement<Q: Requirement>(&self, requirement: &Q) -> Vec<&RegistryEntry> {
        let role = requirement.role();
        self.entries
            .iter()
            .filter(|e| e.kind == Q::KIND && e.roles.contains_key(&role))
            .collect()
    }

    /// Creates the unique type providing `R` with the given convention.
    ///
    /// # Errors
    ///
    /// Fails if no type or several types match, or if `name` is invalid.
    pub fn from_convention<R: ?Sized + 'static>(
        &self,
        convention: &str,
        name: &str,
    ) -> Result<Shared<R>, BrimError> {
        let candidates: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.convention == Some(convention))
            .filter_map(|e| e.factory::<R>().map(|f| (e.type_name, f)))
            .collect();
        match candidates.as_slice() {
            [(type_name, factory)] => {
                debug!(type_name, convention, name, "creating from convention");
                factory(name)
            }
            [] => Err(BrimError::NoConvention {
                role: type_name::<R>(),
                convention: convention.to_string(),
            }),
            _ => Err(BrimError::MultipleConventions {
                role: type_name::<R>(),
                convention: convention.to_string(),
                candidates: candidates.iter().map(|(n, _)| *n).collect(),
            }),
        }
    }

    pub fn set_default_convention<R: ?Sized + 'static>(&mut self, convention: &str) {
        self.default_conventions
            .insert(TypeId::of::<R>(), convention.to_string());
    }

    pub fn default_convention<R: ?Sized + 'static>(&self) -> Option<&str> {
        self.default_conventions
            .get(&TypeId::of::<R>())
            .map(String::as_str)
    }

    /// Creates `R` with its default convention.
    ///
    /// # Errors
    ///
    /// Fails if no default convention is set or it cannot be resolved.
    pub fn create_default<R: ?Sized + 'static>(&self, name: &str) -> Result<Shared<R>, BrimError> {
        let convention = self
            .default_convention::<R>()
            .ok_or(BrimError::NoDefaultConvention(type_name::<R>()))?;
        self.from_convention::<R>(convention, name)
    }
}

/// Owner of the active registry.
#[derive(Debug, Default)]
pub struct Catalog {
    active: Registry,
}

impl Catalog {
    pub fn new(registry: Registry) -> Self {
        Self { active: registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.active
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.active
    }

    /// Installs `registry`, returning the previously active one.
    pub fn activate(&mut self, registry: Registry) -> Registry {
        mem::replace(&mut self.active, registry)
    }

    /// Installs an empty registry, returning the previously active one.
    pub fn deactivate(&mut self) -> Registry {
        mem::take(&mut self.active)
    }
}
