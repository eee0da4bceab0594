use std::rc::{Rc, Weak};

/// An edge to another node of a kinematic graph.
///
/// A node owns the nodes it was defined relative to and only observes the
/// nodes that were defined relative to it, so dropping a leaf releases it.
pub(crate) enum Link<T> {
    Strong(Rc<T>),
    Weak(Weak<T>),
}

impl<T> Link<T> {
    pub(crate) fn upgrade(&self) -> Option<Rc<T>> {
        match self {
            Link::Strong(rc) => Some(Rc::clone(rc)),
            Link::Weak(weak) => weak.upgrade(),
        }
    }
}

pub(crate) fn next_id() -> usize {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
