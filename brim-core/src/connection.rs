use brim_mechanics::Values;

use crate::{
    AnyNode, AsConnection, BrimError, Descriptions, LoadGroupHandle, ModelHandle,
    ModelRequirement, Node, NodeBase, ParameterSource, UnspecifiedComponent, lifecycle,
    parameters::lookup_symbols,
};

/// State common to every connection.
#[derive(Debug)]
pub struct ConnectionBase {
    pub node: NodeBase,
    load_groups: Vec<LoadGroupHandle>,
}

impl ConnectionBase {
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn new(name: &str) -> Result<Self, BrimError> {
        Ok(Self {
            node: NodeBase::new(name)?,
            load_groups: Vec::new(),
        })
    }
}

/// Structural part of a connection, generated by `#[derive(Connection)]`.
pub trait ConnectionComposite {
    fn connection_base(&self) -> &ConnectionBase;
    fn connection_base_mut(&mut self) -> &mut ConnectionBase;

    fn required_models(&self) -> &'static [ModelRequirement];

    /// The model referenced by the slot named `attribute`.
    fn submodel(&self, attribute: &str) -> Option<ModelHandle>;
}

/// A node linking existing models through constraints and loads.
///
/// The referenced models are not owned: the parent model fills the slots
/// in its `define_connections_hook` and runs the connection's stages from
/// its own hooks.
pub trait Connection: Node + ConnectionComposite + AsConnection {
    fn descriptions(&self) -> Descriptions {
        Descriptions::new()
    }

    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        Ok(())
    }

    fn define_loads_hook(&mut self) -> Result<(), BrimError> {
        Ok(())
    }

    fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
        Ok(())
    }

    fn param_values(&self, source: &dyn ParameterSource) -> Values {
        lookup_symbols(self.node(), source)
    }

    fn submodels(&self) -> Vec<ModelHandle> {
        self.required_models()
            .iter()
            .filter_map(|r| self.submodel(r.attribute()))
            .collect()
    }

    fn load_groups(&self) -> Vec<LoadGroupHandle> {
        self.connection_base().load_groups.clone()
    }

    /// Load groups only; referenced models belong to the parent model.
    fn children(&self) -> Vec<AnyNode> {
        self.load_groups()
            .into_iter()
            .map(AnyNode::LoadGroup)
            .collect()
    }

    /// # Errors
    ///
    /// Fails if a group already has a parent or does not accept this
    /// connection.
    fn add_load_groups(&mut self, groups: &[LoadGroupHandle]) -> Result<(), BrimError> {
        for group in groups {
            group
                .borrow_mut()
                .attach_to(self.as_node(), self.node().system_slot())?;
        }
        self.connection_base_mut()
            .load_groups
            .extend(groups.iter().cloned());
        Ok(())
    }

    fn get_unspecified_components(&self, optional: bool) -> Vec<UnspecifiedComponent> {
        self.required_models()
            .iter()
            .filter(|r| self.submodel(r.attribute()).is_none())
            .filter(|r| optional || r.is_hard())
            .map(UnspecifiedComponent::Model)
            .collect()
    }

    fn define_objects(&mut self) -> Result<(), BrimError> {
        lifecycle::connection_stage(self.as_connection_mut(), lifecycle::Stage::Objects)
    }

    fn define_kinematics(&mut self) -> Result<(), BrimError> {
        lifecycle::connection_stage(self.as_connection_mut(), lifecycle::Stage::Kinematics)
    }

    fn define_loads(&mut self) -> Result<(), BrimError> {
        lifecycle::connection_stage(self.as_connection_mut(), lifecycle::Stage::Loads)
    }

    fn define_constraints(&mut self) -> Result<(), BrimError> {
        lifecycle::connection_stage(self.as_connection_mut(), lifecycle::Stage::Constraints)
    }
}
