//! Per-lifecycle heterogeneous typed state for pipeline stages.
//!
//! Independently developed stages of a processing pipeline (filters,
//! middleware, handlers) often need to hand each other metadata without
//! sharing a schema. [`TypedStateStore`] lets them attach arbitrary typed
//! objects under string keys and read them back through any ancestor
//! capability of the stored type.
//!
//! # Namespaces
//!
//! - **Singletons** -- one object per key, fixed after the first insertion
//!   ([`TypedStateStore::set_data`], [`TypedStateStore::get_data`]).
//! - **Lists** -- an append-only, ordered sequence per key whose element
//!   capability is fixed by the first insertion
//!   ([`TypedStateStore::add_to_list`], [`TypedStateStore::for_each_list_item`]).
//!
//! The same key may name a singleton and a list at the same time.
//!
//! # Quick Start
//!
//! ```rust
//! use stagestate_store::{Object, StateErrorKind, TypedStateStore};
//!
//! struct Peer { addr: String }
//! impl Object for Peer {}
//!
//! struct TlsPeer { base: Peer, sni: String }
//! impl Object for TlsPeer {
//!     fn parent(&self) -> Option<&dyn Object> {
//!         Some(&self.base)
//!     }
//! }
//!
//! let mut store = TypedStateStore::new();
//! store
//!     .set_data("peer", TlsPeer { base: Peer { addr: "10.0.0.1:443".into() }, sni: "example.org".into() })
//!     .unwrap();
//!
//! // A stage that only knows about `Peer` can still read it.
//! assert_eq!(store.get_data::<Peer>("peer").unwrap().addr, "10.0.0.1:443");
//! assert_eq!(store.get_data::<TlsPeer>("peer").unwrap().sni, "example.org");
//!
//! let err = store.set_data("peer", Peer { addr: "other".into() }).unwrap_err();
//! assert_eq!(err.kind(), StateErrorKind::DuplicateName);
//! ```
//!
//! # Design Rules
//!
//! 1. Entries are never updated or removed once established.
//! 2. The store exclusively owns every object and drops each exactly once.
//! 3. A view succeeds iff the requested type is the stored type or one of
//!    its ancestors; narrowing always fails.
//! 4. Probes (`has_*`) never fail; accessors report every contract
//!    violation as a [`StateError`].

pub mod config;
pub mod error;
pub mod list;
pub mod object;
pub mod store;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use error::{StateError, StateErrorKind, StateResult};
pub use list::ListCapability;
pub use object::{AsAny, Object};
pub use store::TypedStateStore;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    #[derive(Debug)]
    struct A {
        drops: Arc<AtomicUsize>,
    }
    impl Object for A {}
    impl Drop for A {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug)]
    struct B {
        base: A,
        value: u32,
    }
    impl Object for B {
        fn parent(&self) -> Option<&dyn Object> {
            Some(&self.base)
        }
    }

    #[derive(Debug)]
    struct C {
        base: B,
    }
    impl Object for C {
        fn parent(&self) -> Option<&dyn Object> {
            Some(&self.base)
        }
    }

    #[derive(Debug)]
    struct Item {
        name: &'static str,
        drops: Arc<AtomicUsize>,
    }
    impl Object for Item {}
    impl Drop for Item {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    // -----------------------------------------------------------------------
    // 1. Full lifecycle: singleton, list, short-circuit, teardown
    // -----------------------------------------------------------------------
    #[test]
    fn request_lifecycle() {
        init_tracing();
        let drops = Arc::new(AtomicUsize::new(0));
        let mut store = TypedStateStore::new();

        store
            .set_data(
                "peer",
                B {
                    base: A {
                        drops: Arc::clone(&drops),
                    },
                    value: 17,
                },
            )
            .unwrap();
        assert!(store.has_data::<A>("peer"));
        assert!(!store.has_data::<C>("peer"));
        assert_eq!(store.get_data::<B>("peer").unwrap().value, 17);

        for name in ["item1", "item2"] {
            store
                .add_to_list::<Item>(
                    "trace",
                    Item {
                        name,
                        drops: Arc::clone(&drops),
                    },
                )
                .unwrap();
        }

        let mut visited = Vec::new();
        store
            .for_each_list_item::<Item>("trace", |item| {
                visited.push(item.name);
                item.name != "item1"
            })
            .unwrap();
        assert_eq!(visited, vec!["item1"]);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(store);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
    }

    // -----------------------------------------------------------------------
    // 2. Stages that only know a base capability
    // -----------------------------------------------------------------------
    #[test]
    fn stages_share_state_through_base_capability() {
        init_tracing();
        let drops = Arc::new(AtomicUsize::new(0));

        // The producing stage knows the most specific type.
        let produce = |store: &mut TypedStateStore| -> StateResult<()> {
            store.set_data(
                "conn",
                C {
                    base: B {
                        base: A {
                            drops: Arc::clone(&drops),
                        },
                        value: 3,
                    },
                },
            )?;
            store.add_to_list::<A>(
                "hops",
                A {
                    drops: Arc::clone(&drops),
                },
            )?;
            store.add_to_list::<A>(
                "hops",
                B {
                    base: A {
                        drops: Arc::clone(&drops),
                    },
                    value: 4,
                },
            )
        };

        // The consuming stage only knows `B` and `A`.
        let consume = |store: &TypedStateStore| -> StateResult<(u32, usize)> {
            let value = store.get_data::<B>("conn")?.value;
            let mut hops = 0;
            store.for_each_list_item::<A>("hops", |_| {
                hops += 1;
                true
            })?;
            Ok((value, hops))
        };

        let mut store = TypedStateStore::new();
        produce(&mut store).unwrap();
        assert_eq!(consume(&store).unwrap(), (3, 2));
        assert!(store.has_list::<A>("hops"));
        assert!(!store.has_list::<B>("hops"));

        drop(store);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
    }

    // -----------------------------------------------------------------------
    // 3. Errors propagate with `?` and keep their cause
    // -----------------------------------------------------------------------
    #[test]
    fn errors_propagate_through_stage_results() {
        let lookup = |store: &TypedStateStore| -> StateResult<u32> {
            Ok(store.get_data::<B>("missing")?.value)
        };
        let store = TypedStateStore::new();
        let err = lookup(&store).unwrap_err();
        assert_eq!(err.kind(), StateErrorKind::UnknownName);
        assert_eq!(err.key(), "missing");
    }

    // -----------------------------------------------------------------------
    // 4. Handing the store to another thread behind a lock
    // -----------------------------------------------------------------------
    #[test]
    fn store_moves_across_threads_behind_mutex() {
        let drops = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(Mutex::new(TypedStateStore::new()));

        let worker = {
            let store = Arc::clone(&store);
            let drops = Arc::clone(&drops);
            std::thread::spawn(move || {
                let mut store = store.lock().expect("store lock");
                store
                    .add_to_list::<Item>("trace", Item { name: "worker", drops })
                    .unwrap();
            })
        };
        worker.join().expect("worker should not panic");

        {
            let store = store.lock().expect("store lock");
            assert_eq!(store.list_len("trace"), 1);
        }

        drop(store);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
