//! State shared by every model, connection and load group.

use std::{
    any::Any,
    cell::{Ref, RefCell, RefMut},
    collections::HashMap,
    fmt,
    rc::Rc,
};

use brim_mechanics::{Expr, System, dynamicsymbols, expand_names};

use crate::{AuxiliaryDataHandler, BrimError};

/// A value shared between several nodes of a model tree.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value into a [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Human-readable explanations of the symbols used by a node.
pub type Descriptions = HashMap<Expr, String>;

/// Which of the three node families a type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Model,
    Connection,
    LoadGroup,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Model => "model",
            NodeKind::Connection => "connection",
            NodeKind::LoadGroup => "load group",
        };
        f.write_str(name)
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// The local system fragment of a node.
///
/// Load groups hold a clone of their parent's slot, so they observe the
/// system once the parent defines it.
#[derive(Clone, Default)]
pub struct SystemSlot(Rc<RefCell<Option<System>>>);

impl SystemSlot {
    pub fn is_defined(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub fn set(&self, system: System) {
        *self.0.borrow_mut() = Some(system);
    }

    pub fn get(&self) -> Option<Ref<'_, System>> {
        Ref::filter_map(self.0.borrow(), Option::as_ref).ok()
    }

    pub fn get_mut(&self) -> Option<RefMut<'_, System>> {
        RefMut::filter_map(self.0.borrow_mut(), Option::as_mut).ok()
    }

    /// A copy of the system, if defined.
    pub fn snapshot(&self) -> Option<System> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &SystemSlot) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SystemSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SystemSlot")
            .field(&self.is_defined())
            .finish()
    }
}

/// Name, symbols, generalized coordinates and speeds, and system fragment
/// of a node.
#[derive(Debug)]
pub struct NodeBase {
    name: String,
    symbols: Vec<(String, Expr)>,
    pub q: Vec<Expr>,
    pub u: Vec<Expr>,
    pub u_aux: Vec<Expr>,
    system: SystemSlot,
    auxiliary_handler: Option<Shared<AuxiliaryDataHandler>>,
}

impl NodeBase {
    /// # Errors
    ///
    /// Fails if `name` is not a valid identifier.
    pub fn new(name: &str) -> Result<Self, BrimError> {
        if !is_identifier(name) {
            return Err(BrimError::InvalidName(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            symbols: Vec::new(),
            q: Vec::new(),
            u: Vec::new(),
            u_aux: Vec::new(),
            system: SystemSlot::default(),
            auxiliary_handler: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// # Errors
    ///
    /// Fails if no symbol is stored under `key`.
    pub fn symbol(&self, key: &str) -> Result<Expr, BrimError> {
        self.symbols
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| BrimError::UnknownSymbol {
                owner: self.name.clone(),
                symbol: key.to_string(),
            })
    }

    pub fn has_symbol(&self, key: &str) -> bool {
        self.symbols.iter().any(|(k, _)| k == key)
    }

    /// Stores `value` under `key`, replacing an existing entry in place.
    pub fn set_symbol(&mut self, key: &str, value: Expr) {
        match self.symbols.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.symbols.push((key.to_string(), value)),
        }
    }

    pub fn remove_symbol(&mut self, key: &str) {
        self.symbols.retain(|(k, _)| k != key);
    }

    /// Prefixes every name in `names` with the node name, e.g. `"r"`
    /// becomes `"wheel_r"` and `"q1:3"` becomes `["disc_q1", "disc_q2"]`.
    pub fn add_prefix(&self, names: &str) -> Vec<String> {
        expand_names(names)
            .into_iter()
            .map(|n| format!("{}_{n}", self.name))
            .collect()
    }

    /// A constant symbol named `{name}_{suffix}`.
    pub fn prefixed_symbol(&self, suffix: &str) -> Expr {
        Expr::symbol(&format!("{}_{suffix}", self.name))
    }

    /// Dynamic symbols with prefixed names.
    pub fn prefixed_dynamicsymbols(&self, names: &str) -> Vec<Expr> {
        dynamicsymbols(&self.add_prefix(names).join(", "))
    }

    pub fn system_slot(&self) -> &SystemSlot {
        &self.system
    }

    pub(crate) fn share_system(&mut self, slot: SystemSlot) {
        self.system = slot;
    }

    pub fn has_system(&self) -> bool {
        self.system.is_defined()
    }

    pub fn set_system(&self, system: System) {
        self.system.set(system);
    }

    /// # Errors
    ///
    /// Fails if the system has not been defined yet.
    pub fn system(&self) -> Result<Ref<'_, System>, BrimError> {
        self.system
            .get()
            .ok_or_else(|| self.stage_error("define_objects"))
    }

    /// # Errors
    ///
    /// Fails if the system has not been defined yet.
    pub fn system_mut(&self) -> Result<RefMut<'_, System>, BrimError> {
        self.system
            .get_mut()
            .ok_or_else(|| self.stage_error("define_objects"))
    }

    fn stage_error(&self, stage: &'static str) -> BrimError {
        BrimError::StageOrder {
            node: self.name.clone(),
            stage,
        }
    }

    pub fn auxiliary_handler(&self) -> Option<&Shared<AuxiliaryDataHandler>> {
        self.auxiliary_handler.as_ref()
    }

    /// # Errors
    ///
    /// Fails if no handler has been attached.
    pub fn require_auxiliary_handler(&self) -> Result<Shared<AuxiliaryDataHandler>, BrimError> {
        self.auxiliary_handler
            .clone()
            .ok_or_else(|| BrimError::HandlerMissing(self.name.clone()))
    }

    pub(crate) fn set_auxiliary_handler(&mut self, handler: Shared<AuxiliaryDataHandler>) {
        self.auxiliary_handler = Some(handler);
    }
}

/// Common interface of models, connections and load groups.
///
/// Implemented by the derive macros.
pub trait Node: Any {
    fn node(&self) -> &NodeBase;
    fn node_mut(&mut self) -> &mut NodeBase;

    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;
    fn kind(&self) -> NodeKind;

    fn as_any(&self) -> &dyn Any;
    fn as_node(&self) -> &dyn Node;

    fn name(&self) -> &str {
        self.node().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_be_identifiers() {
        assert!(NodeBase::new("rear_wheel").is_ok());
        assert!(NodeBase::new("_x1").is_ok());
        for name in ["", "1abc", "rear wheel", "a-b"] {
            assert_eq!(
                NodeBase::new(name).unwrap_err(),
                BrimError::InvalidName(name.to_string())
            );
        }
    }

    #[test]
    fn prefixes_expand_ranges() {
        let node = NodeBase::new("disc").unwrap();
        assert_eq!(node.add_prefix("q1:3"), vec!["disc_q1", "disc_q2"]);
        assert_eq!(node.prefixed_symbol("r"), Expr::symbol("disc_r"));
        assert_eq!(
            node.prefixed_dynamicsymbols("u1:3"),
            vec![Expr::dynamic("disc_u1"), Expr::dynamic("disc_u2")]
        );
    }

    #[test]
    fn symbols_keep_insertion_order() {
        let mut node = NodeBase::new("wheel").unwrap();
        node.set_symbol("r", Expr::symbol("wheel_r"));
        node.set_symbol("m", Expr::symbol("wheel_m"));
        node.set_symbol("r", Expr::symbol("wheel_radius"));
        let keys: Vec<_> = node.symbols().map(|(k, _)| k).collect();
        assert_eq!(keys, ["r", "m"]);
        assert_eq!(node.symbol("r").unwrap(), Expr::symbol("wheel_radius"));
        assert!(matches!(
            node.symbol("x"),
            Err(BrimError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn system_access_before_definition_fails() {
        let node = NodeBase::new("model").unwrap();
        assert!(!node.has_system());
        assert!(matches!(
            node.system(),
            Err(BrimError::StageOrder { stage: "define_objects", .. })
        ));
    }
}
