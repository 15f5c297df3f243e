#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Object recycling for expensive host objects, with per-prototype free lists.
//!
//! This crate amortizes the cost of repeatedly creating and destroying objects that are
//! expensive to construct (scene objects, effects, projectiles and similar) by keeping
//! instances that are no longer in use in a free list and handing them out again on demand.
//!
//! # Key Features
//!
//! - **One pool per prototype**: [`PoolRegistry`] maps each prototype to exactly one [`Pool`].
//! - **Pre-warming**: pools can be filled with ready-to-use instances up front, e.g. during a
//!   loading screen, so that the first lends do not pay the construction cost.
//! - **Growth on demand**: lending from an empty pool never fails, a new instance is created.
//! - **One-time binding**: every instance remembers the pool it belongs to for its entire
//!   lifetime and returns there via [`Poolable::release()`].
//! - **Lifecycle hooks**: the host is notified when an instance goes to sleep (enters the free
//!   list) or wakes up (is lent out).
//! - **Deterministic cleanup**: free lists are destroyed by an explicit teardown or when the
//!   last handle to a pool is dropped, never by a finalizer.
//!
//! # Host integration
//!
//! The crate does not know how to create, destroy or organize objects. These capabilities are
//! supplied by an implementation of the [`Host`] trait, which also defines what a prototype
//! and an object are.
//!
//! # Misuse
//!
//! Binding an instance twice, releasing an instance that was never bound, returning an
//! instance to a pool it does not belong to and returning the same instance twice are all
//! programming errors and panic. Asking a registry about a prototype or instance it does not
//! know about is a normal condition reported via [`Error`].
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use warm_pool::{Host, PoolRegistry};
//!
//! #[derive(Debug, Default)]
//! struct Spawner {
//!     created: Cell<usize>,
//! }
//!
//! impl Host for Spawner {
//!     type Prototype = &'static str;
//!     type Object = String;
//!     type Container = ();
//!
//!     fn instantiate(&self, prototype: &&'static str) -> String {
//!         self.created.set(self.created.get().wrapping_add(1));
//!         format!("{prototype} #{}", self.created.get())
//!     }
//!
//!     fn destroy(&self, _object: String) {}
//! }
//!
//! let host = Rc::new(Spawner::default());
//! let mut registry = PoolRegistry::new(Rc::clone(&host));
//!
//! // Pre-warm the pool with two bullets.
//! let bullets = registry.register_prototype("bullet", 2);
//! assert_eq!(bullets.len(), 2);
//! assert_eq!(host.created.get(), 2);
//!
//! // Lending reuses the pre-warmed instances.
//! let bullet = registry.lend(&"bullet").unwrap();
//! assert_eq!(bullets.len(), 1);
//! assert_eq!(host.created.get(), 2);
//!
//! // The instance knows its way home.
//! bullet.release();
//! assert_eq!(bullets.len(), 2);
//!
//! // Prototypes must be registered before use.
//! assert!(registry.lend(&"rocket").is_err());
//! ```

mod builder;
mod drop_policy;
mod error;
mod free_list;
mod host;
mod id;
mod pool;
mod poolable;
mod registry;
mod registry_builder;

pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use host::*;
pub use id::*;
pub use pool::Pool;
pub(crate) use pool::PoolInner;
pub use poolable::*;
pub use registry::PoolRegistry;
pub use registry_builder::*;
