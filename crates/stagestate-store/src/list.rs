use std::any::TypeId;

use crate::object::{self, Object};

/// The element capability a list was created with.
///
/// Captured once, from the first insertion, and fixed for the list's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListCapability {
    type_id: TypeId,
    type_name: &'static str,
    /// The capability itself followed by its ancestors.
    chain: Vec<TypeId>,
}

impl ListCapability {
    /// Record capability `T` from an object already known to be viewable as `T`.
    pub(crate) fn of<T: Object>(viewed: &T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            chain: object::type_chain(viewed),
        }
    }

    /// Name of the element capability type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether elements of this capability can be viewed as `target`.
    pub fn is_viewable_as(&self, target: TypeId) -> bool {
        self.chain.contains(&target)
    }

    /// Whether `object` satisfies this capability.
    pub fn admits(&self, object: &dyn Object) -> bool {
        object::conforms(object, self.type_id)
    }
}

/// An append-only, ordered list of owned objects sharing one capability.
pub(crate) struct TypedList {
    capability: ListCapability,
    items: Vec<Box<dyn Object>>,
}

impl TypedList {
    pub(crate) fn new(capability: ListCapability, capacity: usize) -> Self {
        Self {
            capability,
            items: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn capability(&self) -> &ListCapability {
        &self.capability
    }

    /// Append `item`. The caller has already checked conformance.
    pub(crate) fn push(&mut self, item: Box<dyn Object>) {
        self.items.push(item);
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &dyn Object> {
        self.items.iter().map(|item| &**item)
    }
}
