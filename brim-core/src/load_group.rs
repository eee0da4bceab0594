use brim_mechanics::Values;

use crate::{
    AsLoadGroup, BrimError, Descriptions, Node, NodeBase, ParameterSource, SystemSlot,
    lifecycle::{self, Stage},
    parameters::lookup_symbols,
};

#[derive(Debug, Clone)]
struct ParentInfo {
    name: String,
    type_name: &'static str,
}

/// State common to every load group.
#[derive(Debug)]
pub struct LoadGroupBase {
    pub node: NodeBase,
    parent: Option<ParentInfo>,
}

impl LoadGroupBase {
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn new(name: &str) -> Result<Self, BrimError> {
        Ok(Self {
            node: NodeBase::new(name)?,
            parent: None,
        })
    }
}

/// Structural part of a load group, generated by `#[derive(LoadGroup)]`.
pub trait LoadGroupComposite {
    fn load_group_base(&self) -> &LoadGroupBase;
    fn load_group_base_mut(&mut self) -> &mut LoadGroupBase;

    /// Names of the accepted parent types.
    fn required_parent(&self) -> &'static str;
    fn accepts_parent(&self, parent: &dyn Node) -> bool;
}

/// A node contributing loads and constraints to exactly one parent model or
/// connection, sharing the parent's system.
///
/// Hooks receive the parent so that they can read its objects.
pub trait LoadGroup: Node + LoadGroupComposite + AsLoadGroup {
    fn descriptions(&self) -> Descriptions {
        Descriptions::new()
    }

    fn define_objects_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        Ok(())
    }

    fn define_kinematics_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        Ok(())
    }

    fn define_loads_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        Ok(())
    }

    fn define_constraints_hook(&mut self, _parent: &dyn Node) -> Result<(), BrimError> {
        Ok(())
    }

    fn param_values(&self, source: &dyn ParameterSource) -> Values {
        lookup_symbols(self.node(), source)
    }

    fn parent_name(&self) -> Option<&str> {
        self.load_group_base()
            .parent
            .as_ref()
            .map(|p| p.name.as_str())
    }

    fn parent_type_name(&self) -> Option<&'static str> {
        self.load_group_base().parent.as_ref().map(|p| p.type_name)
    }

    /// Makes `parent` the parent of this group and shares its system.
    ///
    /// # Errors
    ///
    /// Fails if the group already has a parent or `parent` has an
    /// unaccepted type.
    fn attach_to(&mut self, parent: &dyn Node, system: &SystemSlot) -> Result<(), BrimError> {
        if let Some(existing) = self.parent_name() {
            return Err(BrimError::AlreadyParented {
                group: self.name().to_string(),
                parent: existing.to_string(),
            });
        }
        if !self.accepts_parent(parent) {
            return Err(BrimError::InvalidParent {
                group: self.name().to_string(),
                expected: self.required_parent(),
                parent: parent.name().to_string(),
                actual: parent.type_name(),
            });
        }
        let base = self.load_group_base_mut();
        base.parent = Some(ParentInfo {
            name: parent.name().to_string(),
            type_name: parent.type_name(),
        });
        base.node.share_system(system.clone());
        Ok(())
    }

    fn define_objects(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        lifecycle::load_group_stage(self.as_load_group_mut(), parent, Stage::Objects)
    }

    fn define_kinematics(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        lifecycle::load_group_stage(self.as_load_group_mut(), parent, Stage::Kinematics)
    }

    fn define_loads(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        lifecycle::load_group_stage(self.as_load_group_mut(), parent, Stage::Loads)
    }

    fn define_constraints(&mut self, parent: &dyn Node) -> Result<(), BrimError> {
        lifecycle::load_group_stage(self.as_load_group_mut(), parent, Stage::Constraints)
    }
}

/// Downcasts the parent handed to a load group hook.
///
/// # Errors
///
/// Fails if the parent is not a `T`.
pub fn downcast_parent<'a, T: Node>(
    group: &dyn Node,
    parent: &'a dyn Node,
) -> Result<&'a T, BrimError> {
    parent
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| BrimError::InvalidParent {
            group: group.name().to_string(),
            expected: std::any::type_name::<T>(),
            parent: parent.name().to_string(),
            actual: parent.type_name(),
        })
}
