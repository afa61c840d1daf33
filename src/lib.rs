//! # handler-collection
//!
//! Typed, priority-ordered collections of interchangeable handler
//! objects.
//!
//! This crate is the building block a chain-of-responsibility dispatcher
//! or plugin registry keeps its handlers in: it holds a set of handler
//! instances, optionally constrains their type, keeps them deduplicated
//! by reference identity and presents them in descending priority order.
//!
//! ## Architecture
//!
//! - [`Handler`] - the contract stored objects satisfy; [`Prioritized`]
//!   is the optional capability a handler implements to influence
//!   ordering
//! - [`constraint`] - named contracts and handler types, registered at
//!   link time and resolved when a collection is constructed
//! - [`HandlerCollection`] - mutable variant, mutates in place
//! - [`ImmutableHandlerCollection`] - copy-on-write variant; every
//!   mutation returns a new, independent instance
//! - [`HandlerList`] - read-only contract implemented by both variants
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use handler_collection::{Handler, HandlerCollection, Prioritized};
//!
//! struct Fallback;
//! impl Handler for Fallback {}
//!
//! struct Exact;
//! impl Handler for Exact {
//!     fn as_prioritized(&self) -> Option<&dyn Prioritized> {
//!         Some(self)
//!     }
//! }
//! impl Prioritized for Exact {
//!     fn priority(&self) -> i32 {
//!         10
//!     }
//! }
//!
//! let mut handlers = HandlerCollection::default();
//! handlers.add(Arc::new(Fallback)).unwrap();
//! handlers.add(Arc::new(Exact)).unwrap();
//!
//! // Highest priority first; handlers without the capability sort at 0.
//! assert!(handlers.to_vec()[0].is::<Exact>());
//! assert_eq!(handlers.len(), 2);
//! ```

pub mod collection;
pub mod constraint;
pub mod error;
pub mod handler;

pub use collection::{HandlerCollection, HandlerList, ImmutableHandlerCollection};
pub use constraint::{Constraint, ContractDef, ContractReg, HandlerTypeDef, HandlerTypeReg};
pub use error::{CollectionError, Result};
pub use handler::{Handler, Prioritized};

// Used by the registration macros.
#[doc(hidden)]
pub use inventory;
