use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::error::{StateError, StateResult};
use crate::list::{ListCapability, TypedList};
use crate::object::{self, Object};

/// Heterogeneous typed state owned by a single lifecycle (one request, one
/// connection, ...).
///
/// Two disjoint namespaces, both keyed by string:
/// - the **singleton** namespace holds at most one object per key, fixed
///   after the first insertion;
/// - the **list** namespace holds an append-only, ordered sequence per key,
///   whose element capability is fixed by the first insertion.
///
/// Entries are never updated or removed. Every object is dropped exactly
/// once, when the store is dropped.
///
/// Mutation takes `&mut self`, so the borrow checker rules out appending
/// while a visitor is walking a list. The store is `Send` but not `Sync`:
/// share it across threads only behind a lock.
pub struct TypedStateStore {
    data: HashMap<String, Box<dyn Object>>,
    lists: HashMap<String, TypedList>,
    list_item_capacity: usize,
}

impl TypedStateStore {
    /// Create an empty store with the default [`StoreConfig`].
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    /// Create an empty store sized according to `config`.
    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            data: HashMap::with_capacity(config.singleton_capacity),
            lists: HashMap::with_capacity(config.list_capacity),
            list_item_capacity: config.list_item_capacity,
        }
    }

    // -----------------------------------------------------------------------
    // Singleton namespace
    // -----------------------------------------------------------------------

    /// Store `object` as the singleton for `key`, taking ownership of it.
    ///
    /// Fails with [`StateError::DuplicateName`] if `key` already holds a
    /// singleton, whatever its type. The existing entry is left untouched
    /// and `object` is dropped.
    pub fn set_data(&mut self, key: impl Into<String>, object: impl Object) -> StateResult<()> {
        match self.data.entry(key.into()) {
            Entry::Occupied(entry) => Err(rejected(StateError::DuplicateName {
                key: entry.key().clone(),
            })),
            Entry::Vacant(entry) => {
                debug!(
                    key = %entry.key(),
                    type_name = object.object_type_name(),
                    "singleton stored"
                );
                entry.insert(Box::new(object));
                Ok(())
            }
        }
    }

    /// Borrow the singleton at `key`, viewed as capability `T`.
    ///
    /// Fails with [`StateError::UnknownName`] if there is no singleton at
    /// `key`, or [`StateError::TypeMismatch`] if the stored object is neither
    /// a `T` nor a descendant of `T`.
    pub fn get_data<T: Object>(&self, key: &str) -> StateResult<&T> {
        let Some(stored) = self.data.get(key) else {
            return Err(rejected(StateError::UnknownName { key: key.into() }));
        };
        let stored: &dyn Object = &**stored;
        object::view::<T>(stored).ok_or_else(|| {
            rejected(StateError::TypeMismatch {
                key: key.into(),
                requested: std::any::type_name::<T>(),
                stored: stored.object_type_name(),
            })
        })
    }

    /// Borrow the singleton at `key` as `T`, or `None` if it is absent or
    /// not viewable as `T`.
    pub fn find_data<T: Object>(&self, key: &str) -> Option<&T> {
        self.data
            .get(key)
            .and_then(|stored| object::view::<T>(&**stored))
    }

    /// Whether `key` holds a singleton viewable as `T`.
    pub fn has_data<T: Object>(&self, key: &str) -> bool {
        self.find_data::<T>(key).is_some()
    }

    /// Whether `key` holds a singleton of any type.
    pub fn has_data_with_name(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    // -----------------------------------------------------------------------
    // List namespace
    // -----------------------------------------------------------------------

    /// Append `object` to the list at `key`, viewed as capability `T`.
    ///
    /// The first insertion for a key creates the list and fixes `T` as its
    /// element capability. Later insertions must be viewable as that
    /// capability; otherwise this fails with
    /// [`StateError::ListTypeConformance`] and the list is unchanged.
    pub fn add_to_list<T: Object>(
        &mut self,
        key: impl Into<String>,
        object: impl Object,
    ) -> StateResult<()> {
        let key = key.into();
        let Some(viewed) = object::view::<T>(&object) else {
            return Err(rejected(StateError::ListTypeConformance {
                key,
                expected: std::any::type_name::<T>(),
                actual: object.object_type_name(),
            }));
        };

        match self.lists.entry(key) {
            Entry::Occupied(mut entry) => {
                let capability = entry.get().capability();
                if !capability.admits(&object) {
                    return Err(rejected(StateError::ListTypeConformance {
                        key: entry.key().clone(),
                        expected: capability.type_name(),
                        actual: object.object_type_name(),
                    }));
                }
                let list = entry.get_mut();
                list.push(Box::new(object));
                trace!(len = list.len(), "list item appended");
            }
            Entry::Vacant(entry) => {
                let capability = ListCapability::of(viewed);
                debug!(
                    key = %entry.key(),
                    element_type = capability.type_name(),
                    "list created"
                );
                let mut list = TypedList::new(capability, self.list_item_capacity);
                list.push(Box::new(object));
                entry.insert(list);
            }
        }
        Ok(())
    }

    /// Offer each element of the list at `key` to `visitor`, in insertion
    /// order, viewed as capability `T`.
    ///
    /// Iteration stops as soon as `visitor` returns `false`. A key with no
    /// list is treated as an empty list. Fails with
    /// [`StateError::TypeMismatch`] on the first element that is not viewable
    /// as `T`; elements before it have already been visited.
    pub fn for_each_list_item<T: Object>(
        &self,
        key: &str,
        mut visitor: impl FnMut(&T) -> bool,
    ) -> StateResult<()> {
        let Some(list) = self.lists.get(key) else {
            return Ok(());
        };
        for item in list.iter() {
            let Some(viewed) = object::view::<T>(item) else {
                return Err(rejected(StateError::TypeMismatch {
                    key: key.into(),
                    requested: std::any::type_name::<T>(),
                    stored: item.object_type_name(),
                }));
            };
            if !visitor(viewed) {
                break;
            }
        }
        Ok(())
    }

    /// Whether `key` holds a list whose element capability is viewable as `T`.
    pub fn has_list<T: Object>(&self, key: &str) -> bool {
        self.lists
            .get(key)
            .is_some_and(|list| list.capability().is_viewable_as(TypeId::of::<T>()))
    }

    /// Number of elements in the list at `key` (0 if there is no list).
    pub fn list_len(&self, key: &str) -> usize {
        self.lists.get(key).map_or(0, TypedList::len)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Number of singleton entries.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Number of list entries (keys, not elements).
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Returns `true` if both namespaces are empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.lists.is_empty()
    }

    /// Sorted keys of the singleton namespace.
    pub fn data_names(&self) -> Vec<&str> {
        sorted_keys(self.data.keys())
    }

    /// Sorted keys of the list namespace.
    pub fn list_names(&self) -> Vec<&str> {
        sorted_keys(self.lists.keys())
    }

    fn list_item_total(&self) -> usize {
        self.lists.values().map(TypedList::len).sum()
    }
}

impl Default for TypedStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TypedStateStore {
    fn drop(&mut self) {
        if !self.is_empty() {
            debug!(
                singletons = self.data.len(),
                list_items = self.list_item_total(),
                "releasing typed state"
            );
        }
    }
}

impl std::fmt::Debug for TypedStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedStateStore")
            .field("data", &self.data_names())
            .field("lists", &self.list_names())
            .field("list_items", &self.list_item_total())
            .finish()
    }
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut names: Vec<&str> = keys.map(String::as_str).collect();
    names.sort_unstable();
    names
}

fn rejected(err: StateError) -> StateError {
    debug!(kind = %err.kind(), key = err.key(), "typed state operation rejected: {err}");
    err
}
