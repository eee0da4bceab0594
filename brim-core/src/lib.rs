//! Composition layer of BRiM.
//!
//! Models own submodels, connections and load groups. Realizing a model
//! runs five stages over that tree (`define_connections`, `define_objects`,
//! `define_kinematics`, `define_loads`, `define_constraints`), each node
//! contributing to its own system fragment. [`Model::to_system`] merges the
//! fragments into one [`brim_mechanics::System`].
//!
//! Noncontributing forces, used to recover reaction forces, are registered
//! with the [`AuxiliaryDataHandler`] that the root model shares with the
//! whole tree.

extern crate self as brim_core;

mod attachment;
mod auxiliary;
mod connection;
mod error;
mod handle;
mod lifecycle;
mod load_group;
mod merge;
mod model;
mod node;
mod parameters;
mod registry;
mod requirement;
mod slot;
pub mod testing;
pub mod tree;

pub use attachment::{Attachment, Axis, Hub};
pub use auxiliary::{AuxiliaryData, AuxiliaryDataHandler, AuxiliaryLocation};
pub use connection::{Connection, ConnectionBase, ConnectionComposite};
pub use error::BrimError;
pub use handle::{AnyNode, AsConnection, AsLoadGroup, AsModel, ConnectionHandle, LoadGroupHandle, ModelHandle};
pub use load_group::{LoadGroup, LoadGroupBase, LoadGroupComposite, downcast_parent};
pub use merge::merge_systems;
pub use model::{Model, ModelBase, ModelComposite};
pub use node::{Descriptions, Node, NodeBase, NodeKind, Shared, SystemSlot, shared};
pub use parameters::{ParameterSet, ParameterSource};
pub use registry::{Catalog, Registrable, Registry, RegistryEntry, Requirement, RoleBuilder};
pub use requirement::{ConnectionRequirement, ModelRequirement, UnspecifiedComponent};
pub use slot::Slot;

pub use brim_macros::{Connection, LoadGroup, Model};

#[cfg(test)]
mod test_models;
