//! Type-erased shared handles to nodes.
//!
//! Slots are typed by role (`Slot<dyn Wheel>`), while the lifecycle walks
//! the tree through handles that only know the node family.

use std::{
    cell::{Ref, RefMut},
    fmt,
    rc::Rc,
};

use brim_mechanics::Expr;

use crate::{Connection, Descriptions, LoadGroup, Model, Node, NodeKind, Shared};

/// Upcast to `dyn Model`, implemented for every model and every role trait
/// object extending [`Model`].
pub trait AsModel {
    fn as_model(&self) -> &dyn Model;
    fn as_model_mut(&mut self) -> &mut dyn Model;
}

impl<T: Model> AsModel for T {
    fn as_model(&self) -> &dyn Model {
        self
    }

    fn as_model_mut(&mut self) -> &mut dyn Model {
        self
    }
}

/// Upcast to `dyn Connection`.
pub trait AsConnection {
    fn as_connection(&self) -> &dyn Connection;
    fn as_connection_mut(&mut self) -> &mut dyn Connection;
}

impl<T: Connection> AsConnection for T {
    fn as_connection(&self) -> &dyn Connection {
        self
    }

    fn as_connection_mut(&mut self) -> &mut dyn Connection {
        self
    }
}

/// Upcast to `dyn LoadGroup`.
pub trait AsLoadGroup {
    fn as_load_group(&self) -> &dyn LoadGroup;
    fn as_load_group_mut(&mut self) -> &mut dyn LoadGroup;
}

impl<T: LoadGroup> AsLoadGroup for T {
    fn as_load_group(&self) -> &dyn LoadGroup {
        self
    }

    fn as_load_group_mut(&mut self) -> &mut dyn LoadGroup {
        self
    }
}

struct RoleCell<R: ?Sized>(Shared<R>);

macro_rules! handle {
    ($(#[$meta:meta])* $handle:ident, $cell:ident, $family:ident, $upcast:ident, $get:ident, $get_mut:ident) => {
        trait $cell {
            fn borrow(&self) -> Ref<'_, dyn $family>;
            fn borrow_mut(&self) -> RefMut<'_, dyn $family>;
            fn addr(&self) -> *const ();
        }

        impl<R: ?Sized + $upcast + 'static> $cell for RoleCell<R> {
            fn borrow(&self) -> Ref<'_, dyn $family> {
                Ref::map(self.0.borrow(), |r| r.$get())
            }

            fn borrow_mut(&self) -> RefMut<'_, dyn $family> {
                RefMut::map(self.0.borrow_mut(), |r| r.$get_mut())
            }

            fn addr(&self) -> *const () {
                Rc::as_ptr(&self.0).cast::<()>()
            }
        }

        $(#[$meta])*
        #[derive(Clone)]
        pub struct $handle(Rc<dyn $cell>);

        impl $handle {
            pub fn new<R: ?Sized + $upcast + 'static>(value: Shared<R>) -> Self {
                Self(Rc::new(RoleCell(value)))
            }

            /// # Panics
            ///
            /// Panics if the node is currently mutably borrowed.
            pub fn borrow(&self) -> Ref<'_, dyn $family> {
                self.0.borrow()
            }

            /// # Panics
            ///
            /// Panics if the node is currently borrowed.
            pub fn borrow_mut(&self) -> RefMut<'_, dyn $family> {
                self.0.borrow_mut()
            }

            pub fn name(&self) -> String {
                self.borrow().name().to_string()
            }

            /// Whether both handles point at the same node.
            pub fn ptr_eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.0.addr(), other.0.addr())
            }
        }

        impl PartialEq for $handle {
            fn eq(&self, other: &Self) -> bool {
                self.ptr_eq(other)
            }
        }

        impl fmt::Debug for $handle {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let node = self.borrow();
                write!(f, "{}({})", node.type_name(), node.name())
            }
        }
    };
}

handle!(
    /// Shared handle to any model.
    ModelHandle, ModelCell, Model, AsModel, as_model, as_model_mut
);
handle!(
    /// Shared handle to any connection.
    ConnectionHandle, ConnectionCell, Connection, AsConnection, as_connection, as_connection_mut
);
handle!(
    /// Shared handle to any load group.
    LoadGroupHandle, LoadGroupCell, LoadGroup, AsLoadGroup, as_load_group, as_load_group_mut
);

/// A handle to a node of any family.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyNode {
    Model(ModelHandle),
    Connection(ConnectionHandle),
    LoadGroup(LoadGroupHandle),
}

impl AnyNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            AnyNode::Model(_) => NodeKind::Model,
            AnyNode::Connection(_) => NodeKind::Connection,
            AnyNode::LoadGroup(_) => NodeKind::LoadGroup,
        }
    }

    /// Runs `f` with the node borrowed immutably.
    pub fn with_node<T>(&self, f: impl FnOnce(&dyn Node) -> T) -> T {
        match self {
            AnyNode::Model(h) => f(h.borrow().as_node()),
            AnyNode::Connection(h) => f(h.borrow().as_node()),
            AnyNode::LoadGroup(h) => f(h.borrow().as_node()),
        }
    }

    pub fn name(&self) -> String {
        self.with_node(|n| n.name().to_string())
    }

    pub fn type_name(&self) -> &'static str {
        self.with_node(|n| n.type_name())
    }

    pub fn descriptions(&self) -> Descriptions {
        match self {
            AnyNode::Model(h) => h.borrow().descriptions(),
            AnyNode::Connection(h) => h.borrow().descriptions(),
            AnyNode::LoadGroup(h) => h.borrow().descriptions(),
        }
    }

    /// Submodels, connections and load groups directly below this node.
    pub fn children(&self) -> Vec<AnyNode> {
        match self {
            AnyNode::Model(h) => h.borrow().children(),
            AnyNode::Connection(h) => h.borrow().children(),
            AnyNode::LoadGroup(_) => Vec::new(),
        }
    }

    /// Symbols, coordinates, speeds and auxiliary speeds owned by this node.
    pub fn owned_symbols(&self) -> Vec<Expr> {
        self.with_node(owned_symbols)
    }
}

pub(crate) fn owned_symbols(node: &dyn Node) -> Vec<Expr> {
    let base = node.node();
    base.symbols()
        .map(|(_, v)| v.clone())
        .chain(base.q.iter().cloned())
        .chain(base.u.iter().cloned())
        .chain(base.u_aux.iter().cloned())
        .collect()
}
