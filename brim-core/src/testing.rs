//! Helpers for testing models, connections and load groups in isolation.

use std::any::{Any, TypeId};

use brim_mechanics::{Expr, System};

use crate::{
    AnyNode, BrimError, Connection, ConnectionHandle, ConnectionRequirement, Descriptions,
    Model, ModelBase, ModelComposite, ModelHandle, ModelRequirement, Node, NodeBase, NodeKind,
    handle::owned_symbols,
};

/// Returns the owned symbols, coordinates and speeds without a description.
///
/// Models are realized up to `define_objects` first and checked together
/// with their whole tree. Connections get their referenced models and
/// themselves defined; load groups are checked as they are, so define
/// their parent first.
///
/// # Errors
///
/// Fails if defining the objects fails.
pub fn check_descriptions(node: &AnyNode) -> Result<Vec<Expr>, BrimError> {
    match node {
        AnyNode::Model(model) => {
            model.borrow_mut().define_connections()?;
            model.borrow_mut().define_objects()?;
            let mut symbols = Vec::new();
            collect_owned(node, &mut symbols);
            let model = model.borrow();
            Ok(symbols
                .into_iter()
                .filter(|s| model.get_description(s).is_none())
                .collect())
        }
        AnyNode::Connection(connection) => {
            for submodel in connection.borrow().submodels() {
                submodel.borrow_mut().define_connections()?;
                submodel.borrow_mut().define_objects()?;
            }
            connection.borrow_mut().define_objects()?;
            let connection = connection.borrow();
            Ok(undescribed(connection.as_node(), &connection.descriptions()))
        }
        AnyNode::LoadGroup(group) => {
            let group = group.borrow();
            Ok(undescribed(group.as_node(), &group.descriptions()))
        }
    }
}

fn undescribed(node: &dyn Node, descriptions: &Descriptions) -> Vec<Expr> {
    owned_symbols(node)
        .into_iter()
        .filter(|s| !descriptions.contains_key(s))
        .collect()
}

fn collect_owned(node: &AnyNode, symbols: &mut Vec<Expr>) {
    symbols.extend(node.owned_symbols());
    for child in node.children() {
        collect_owned(&child, symbols);
    }
}

static HARNESS_CONNECTIONS: [ConnectionRequirement; 1] = [ConnectionRequirement::new(
    "conn",
    "Connection",
    "Connection under test.",
    "Connection",
    true,
    TypeId::of::<dyn Connection>,
)];

/// A model owning a single connection and the models it references.
///
/// Set the submodels of the connection before wrapping it. The harness
/// takes its own system frame and fixed point from the connection.
pub struct ConnectionHarness {
    base: ModelBase,
    connection: ConnectionHandle,
}

impl ConnectionHarness {
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn new(name: &str, connection: ConnectionHandle) -> Result<Self, BrimError> {
        Ok(Self {
            base: ModelBase::new(name)?,
            connection,
        })
    }

    pub fn connection_handle(&self) -> &ConnectionHandle {
        &self.connection
    }
}

impl Node for ConnectionHarness {
    fn node(&self) -> &NodeBase {
        &self.base.node
    }

    fn node_mut(&mut self) -> &mut NodeBase {
        &mut self.base.node
    }

    fn type_name(&self) -> &'static str {
        "ConnectionHarness"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Model
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_node(&self) -> &dyn Node {
        self
    }
}

impl ModelComposite for ConnectionHarness {
    fn model_base(&self) -> &ModelBase {
        &self.base
    }

    fn model_base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn required_models(&self) -> &'static [ModelRequirement] {
        self.connection.borrow().required_models()
    }

    fn required_connections(&self) -> &'static [ConnectionRequirement] {
        &HARNESS_CONNECTIONS
    }

    fn submodel(&self, attribute: &str) -> Option<ModelHandle> {
        self.connection.borrow().submodel(attribute)
    }

    fn connection(&self, attribute: &str) -> Option<ConnectionHandle> {
        (attribute == "conn").then(|| self.connection.clone())
    }
}

impl Model for ConnectionHarness {
    fn define_objects_hook(&mut self) -> Result<(), BrimError> {
        let mut connection = self.connection.borrow_mut();
        connection.define_objects()?;
        let system = {
            let inner = connection.node().system()?;
            System::new(inner.frame(), inner.fixed_point())
        };
        self.base.node.set_system(system);
        Ok(())
    }

    fn define_kinematics_hook(&mut self) -> Result<(), BrimError> {
        self.connection.borrow_mut().define_kinematics()
    }

    fn define_loads_hook(&mut self) -> Result<(), BrimError> {
        self.connection.borrow_mut().define_loads()
    }

    fn define_constraints_hook(&mut self) -> Result<(), BrimError> {
        self.connection.borrow_mut().define_constraints()
    }
}
