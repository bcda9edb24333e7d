use serde::{Deserialize, Serialize};

/// Sizing hints for a [`TypedStateStore`](crate::TypedStateStore).
///
/// Hints only pre-allocate; they never limit how much the store can hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Initial capacity of the singleton namespace.
    pub singleton_capacity: usize,
    /// Initial capacity of the list namespace (number of list keys).
    pub list_capacity: usize,
    /// Initial capacity of each newly created list.
    pub list_item_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            singleton_capacity: 8,
            list_capacity: 4,
            list_item_capacity: 2,
        }
    }
}

impl StoreConfig {
    /// A configuration that allocates nothing up front.
    pub fn unallocated() -> Self {
        Self {
            singleton_capacity: 0,
            list_capacity: 0,
            list_item_capacity: 0,
        }
    }
}
