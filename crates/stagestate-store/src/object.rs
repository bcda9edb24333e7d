//! The capability contract for stored values.
//!
//! Rust has no class inheritance, so a capability chain is expressed by
//! embedding: a more specific object holds its ancestor capability as a
//! field and exposes it through [`Object::parent`].
//!
//! ```rust
//! use stagestate_store::Object;
//!
//! struct Connection { id: u64 }
//! impl Object for Connection {}
//!
//! struct TlsConnection { base: Connection, sni: String }
//! impl Object for TlsConnection {
//!     fn parent(&self) -> Option<&dyn Object> {
//!         Some(&self.base)
//!     }
//! }
//! ```
//!
//! A stored `TlsConnection` can then be read as `TlsConnection` or as
//! `Connection`. A stored `Connection` cannot be read as `TlsConnection`.

use std::any::{Any, TypeId};

/// Runtime type identity for any `'static` value.
///
/// Blanket-implemented; never implement it by hand.
pub trait AsAny: Any {
    /// The value as `&dyn Any`, for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// The concrete type's name, for diagnostics.
    fn object_type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn object_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A value that can be stored in a [`TypedStateStore`](crate::TypedStateStore).
///
/// The store takes exclusive ownership and drops the value through
/// `Box<dyn Object>` when the store itself is dropped.
pub trait Object: AsAny + Send {
    /// The ancestor capability this object extends, if any.
    ///
    /// The returned reference must point into `self` and must have a
    /// different concrete type from `self`.
    fn parent(&self) -> Option<&dyn Object> {
        None
    }
}

/// Iterate over `object` followed by each of its ancestors, most specific first.
pub fn ancestry<'a>(object: &'a dyn Object) -> impl Iterator<Item = &'a dyn Object> + 'a {
    std::iter::successors(Some(object), |link: &&'a dyn Object| (*link).parent())
}

/// The `TypeId` of every link in the capability chain of `object`.
pub fn type_chain(object: &dyn Object) -> Vec<TypeId> {
    ancestry(object).map(|link| link.as_any().type_id()).collect()
}

/// View `object` through capability `T`.
///
/// Succeeds iff `T` is the concrete type of `object` or one of its ancestors.
pub fn view<T: Object>(object: &dyn Object) -> Option<&T> {
    ancestry(object).find_map(|link| link.as_any().downcast_ref::<T>())
}

/// Whether `object` can be viewed through the capability identified by `target`.
pub fn conforms(object: &dyn Object, target: TypeId) -> bool {
    ancestry(object).any(|link| link.as_any().type_id() == target)
}
