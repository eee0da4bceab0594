use std::{fmt, rc::Rc};

use crate::{AsConnection, AsModel, BrimError, ConnectionHandle, ModelHandle, Shared};

/// A typed, possibly empty reference to a submodel or connection.
///
/// The role type is usually a trait object such as `Slot<dyn Wheel>`, so
/// assigning a value of the wrong type is a compile error.
pub struct Slot<R: ?Sized> {
    value: Option<Shared<R>>,
}

impl<R: ?Sized> Slot<R> {
    pub fn empty() -> Self {
        Self { value: None }
    }

    pub fn get(&self) -> Option<Shared<R>> {
        self.value.clone()
    }

    pub fn set(&mut self, value: Shared<R>) {
        self.value = Some(value);
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// The stored value, or an error naming the requirement.
    ///
    /// # Errors
    ///
    /// Fails if the slot is empty.
    pub fn require(&self, owner: &str, requirement: &'static str) -> Result<Shared<R>, BrimError> {
        self.get().ok_or_else(|| BrimError::Unspecified {
            owner: owner.to_string(),
            requirement,
        })
    }

    /// Whether both slots hold the same object.
    pub fn ptr_eq(&self, other: &Slot<R>) -> bool {
        match (&self.value, &other.value) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<R: ?Sized + AsModel + 'static> Slot<R> {
    pub fn model_handle(&self) -> Option<ModelHandle> {
        self.value.clone().map(ModelHandle::new)
    }
}

impl<R: ?Sized + AsConnection + 'static> Slot<R> {
    pub fn connection_handle(&self) -> Option<ConnectionHandle> {
        self.value.clone().map(ConnectionHandle::new)
    }
}

impl<R: ?Sized> Default for Slot<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: ?Sized> Clone for Slot<R> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl<R: ?Sized> fmt::Debug for Slot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(_) => f.write_str("Slot(set)"),
            None => f.write_str("Slot(empty)"),
        }
    }
}
