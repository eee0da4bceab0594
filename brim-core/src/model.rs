use std::collections::HashSet;

use brim_mechanics::{Expr, System, Values};

use crate::{
    AnyNode, AsModel, BrimError, ConnectionHandle, ConnectionRequirement, Descriptions,
    LoadGroupHandle, ModelHandle, ModelRequirement, Node, NodeBase, ParameterSource,
    UnspecifiedComponent, lifecycle, merge::merge_systems,
    parameters::lookup_symbols,
};

/// State common to every model.
#[derive(Debug)]
pub struct ModelBase {
    pub node: NodeBase,
    is_root: Option<bool>,
    load_groups: Vec<LoadGroupHandle>,
}

impl ModelBase {
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn new(name: &str) -> Result<Self, BrimError> {
        Ok(Self {
            node: NodeBase::new(name)?,
            is_root: None,
            load_groups: Vec::new(),
        })
    }

    pub(crate) fn set_is_root(&mut self, is_root: bool) {
        self.is_root = Some(is_root);
    }
}

/// Structural part of a model, generated by `#[derive(Model)]`.
pub trait ModelComposite {
    fn model_base(&self) -> &ModelBase;
    fn model_base_mut(&mut self) -> &mut ModelBase;

    fn required_models(&self) -> &'static [ModelRequirement];
    fn required_connections(&self) -> &'static [ConnectionRequirement];

    /// The submodel stored in the slot named `attribute`.
    fn submodel(&self, attribute: &str) -> Option<ModelHandle>;

    /// The connection stored in the slot named `attribute`.
    fn connection(&self, attribute: &str) -> Option<ConnectionHandle>;
}

/// A node owning submodels, connections and load groups.
///
/// Implementors provide the stage hooks; the provided methods run the
/// stages over the whole tree and query it.
pub trait Model: Node + ModelComposite + AsModel {
    /// Descriptions of the symbols introduced by this model.
    fn descriptions(&self) -> Descriptions {
        Descriptions::new()
    }

    /// Binds the submodel slots of connections to models owned by this one.
    fn define_connections_hook(&mut self) -> Result<(), BrimError> {
        Ok(())
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

    /// Parameter values of this model alone.
    fn param_values(&self, source: &dyn ParameterSource) -> Values {
        lookup_symbols(self.node(), source)
    }

    /// `None` until the tree is realized, then `Some(true)` only for the
    /// node on which `define_objects` was first called.
    fn is_root(&self) -> Option<bool> {
        self.model_base().is_root
    }

    fn submodels(&self) -> Vec<ModelHandle> {
        self.required_models()
            .iter()
            .filter_map(|r| self.submodel(r.attribute()))
            .collect()
    }

    fn connections(&self) -> Vec<ConnectionHandle> {
        self.required_connections()
            .iter()
            .filter_map(|r| self.connection(r.attribute()))
            .collect()
    }

    fn load_groups(&self) -> Vec<LoadGroupHandle> {
        self.model_base().load_groups.clone()
    }

    fn children(&self) -> Vec<AnyNode> {
        let submodels = self.submodels().into_iter().map(AnyNode::Model);
        let connections = self.connections().into_iter().map(AnyNode::Connection);
        let groups = self.load_groups().into_iter().map(AnyNode::LoadGroup);
        submodels.chain(connections).chain(groups).collect()
    }

    /// Attaches load groups to this model.
    ///
    /// # Errors
    ///
    /// Fails if a group already has a parent or does not accept this model.
    fn add_load_groups(&mut self, groups: &[LoadGroupHandle]) -> Result<(), BrimError> {
        for group in groups {
            group
                .borrow_mut()
                .attach_to(self.as_node(), self.node().system_slot())?;
        }
        self.model_base_mut()
            .load_groups
            .extend(groups.iter().cloned());
        Ok(())
    }

    /// Requirements whose slots are empty; optional ones only if asked for.
    fn get_unspecified_components(&self, optional: bool) -> Vec<UnspecifiedComponent> {
        let models = self
            .required_models()
            .iter()
            .filter(|r| self.submodel(r.attribute()).is_none())
            .map(UnspecifiedComponent::Model);
        let connections = self
            .required_connections()
            .iter()
            .filter(|r| self.connection(r.attribute()).is_none())
            .map(UnspecifiedComponent::Connection);
        models
            .chain(connections)
            .filter(|c| optional || c.is_hard())
            .collect()
    }

    /// Dotted attribute paths of the empty slots in the whole tree, such as
    /// `rider.torso`, listing this model's own slots first.
    fn get_unspecified_paths(&self, optional: bool) -> Vec<String> {
        let mut paths: Vec<String> = self
            .get_unspecified_components(optional)
            .iter()
            .map(|c| c.attribute().to_string())
            .collect();
        for requirement in self.required_models() {
            if let Some(submodel) = self.submodel(requirement.attribute()) {
                let nested = submodel.borrow().get_unspecified_paths(optional);
                paths.extend(
                    nested
                        .into_iter()
                        .map(|path| format!("{}.{path}", requirement.attribute())),
                );
            }
        }
        paths
    }

    /// Looks up the description of `symbol` in this model, then in its
    /// submodels, connections and load groups.
    fn get_description(&self, symbol: &Expr) -> Option<String> {
        if let Some(description) = self.descriptions().remove(symbol) {
            return Some(description);
        }
        self.children()
            .iter()
            .find_map(|child| find_description(child, symbol))
    }

    /// Every symbol and dynamic symbol used in this tree.
    fn get_all_symbols(&self) -> Vec<Expr> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        collect_atoms(self.node(), &mut seen, &mut all);
        for child in self.children() {
            collect_tree_atoms(&child, &mut seen, &mut all);
        }
        all
    }

    /// Parameter values of the whole tree.
    fn get_param_values(&self, source: &dyn ParameterSource) -> Values {
        let mut values = self.param_values(source);
        for child in self.children() {
            values.extend(tree_param_values(&child, source));
        }
        values
    }

    /// Merges the system fragments of this model, its connections and,
    /// recursively, its submodels into one system.
    ///
    /// # Errors
    ///
    /// Fails if a fragment has not been defined.
    fn to_system(&self) -> Result<System, BrimError> {
        let mut systems = Vec::new();
        collect_systems(self.as_model(), &mut systems)?;
        merge_systems(&systems)
    }

    fn define_connections(&mut self) -> Result<(), BrimError> {
        lifecycle::define_connections(self.as_model_mut())
    }

    fn define_objects(&mut self) -> Result<(), BrimError> {
        lifecycle::define_objects(self.as_model_mut())
    }

    fn define_kinematics(&mut self) -> Result<(), BrimError> {
        lifecycle::define_kinematics(self.as_model_mut())
    }

    fn define_loads(&mut self) -> Result<(), BrimError> {
        lifecycle::define_loads(self.as_model_mut())
    }

    fn define_constraints(&mut self) -> Result<(), BrimError> {
        lifecycle::define_constraints(self.as_model_mut())
    }

    /// Runs the five stages in order.
    fn define_all(&mut self) -> Result<(), BrimError> {
        lifecycle::define_all(self.as_model_mut())
    }
}

fn find_description(node: &AnyNode, symbol: &Expr) -> Option<String> {
    if let Some(description) = node.descriptions().remove(symbol) {
        return Some(description);
    }
    node.children()
        .iter()
        .find_map(|child| find_description(child, symbol))
}

fn collect_atoms(node: &NodeBase, seen: &mut HashSet<Expr>, all: &mut Vec<Expr>) {
    for (_, value) in node.symbols() {
        for atom in value.free_atoms().into_iter().chain(value.dynamic_symbols()) {
            if seen.insert(atom.clone()) {
                all.push(atom);
            }
        }
    }
}

fn collect_tree_atoms(node: &AnyNode, seen: &mut HashSet<Expr>, all: &mut Vec<Expr>) {
    node.with_node(|n| collect_atoms(n.node(), seen, all));
    for child in node.children() {
        collect_tree_atoms(&child, seen, all);
    }
}

fn tree_param_values(node: &AnyNode, source: &dyn ParameterSource) -> Values {
    let mut values = match node {
        AnyNode::Model(h) => h.borrow().param_values(source),
        AnyNode::Connection(h) => h.borrow().param_values(source),
        AnyNode::LoadGroup(h) => h.borrow().param_values(source),
    };
    for child in node.children() {
        values.extend(tree_param_values(&child, source));
    }
    values
}

fn collect_systems(model: &dyn Model, systems: &mut Vec<System>) -> Result<(), BrimError> {
    systems.push(model.node().system()?.clone());
    for connection in model.connections() {
        systems.push(connection.borrow().node().system()?.clone());
    }
    for submodel in model.submodels() {
        collect_systems(&*submodel.borrow(), systems)?;
    }
    Ok(())
}
