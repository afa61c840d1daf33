//! Handler collections - priority-ordered, deduplicated, optionally
//! type-constrained.
//!
//! Provides:
//! - [`HandlerCollection`] - mutable variant, mutates its storage in place
//! - [`ImmutableHandlerCollection`] - copy-on-write variant, every
//!   mutation returns a new instance
//! - [`HandlerList`] - read-only contract implemented by both
//!
//! Both variants share one validation and ordering engine: elements are
//! checked against the collection's constraint when inserted,
//! deduplicated by reference identity, and kept in descending priority
//! order with a stable sort.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use handler_collection::{Handler, HandlerCollection, HandlerList};
//!
//! struct Text;
//! impl Handler for Text {}
//!
//! struct Binary;
//! impl Handler for Binary {}
//!
//! fn first_binary(handlers: &impl HandlerList) -> Option<Arc<dyn Handler>> {
//!     handlers.find(|h| h.is::<Binary>())
//! }
//!
//! let initial: Vec<Arc<dyn Handler>> = vec![Arc::new(Text), Arc::new(Binary)];
//! let handlers = HandlerCollection::new(initial, None).unwrap();
//! assert!(first_binary(&handlers).is_some());
//! ```

mod immutable;
mod mutable;
mod seq;

pub use immutable::ImmutableHandlerCollection;
pub use mutable::HandlerCollection;

use std::sync::Arc;

use crate::handler::Handler;

/// Read-only contract shared by both collection variants.
///
/// Lets consuming code - a dispatcher walking handlers in priority
/// order, say - work against either variant. Mutation is not part of the
/// contract because the variants disagree on its shape:
/// [`HandlerCollection`] mutates in place, while
/// [`ImmutableHandlerCollection`] returns new instances.
pub trait HandlerList {
    /// True if this collection would accept the given handler instance.
    fn accepts(&self, handler: &dyn Handler) -> bool;

    /// True if instances of the named handler type would be accepted.
    ///
    /// Unknown type names are reported as not accepted rather than
    /// erroring.
    fn accepts_type(&self, name: &str) -> bool;

    /// Number of handlers in the collection.
    fn len(&self) -> usize;

    /// True if the collection holds no handlers.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the reference-equal handler is present.
    fn contains(&self, handler: &dyn Handler) -> bool;

    /// Handlers satisfying the predicate, in priority order.
    fn filter<F: Fn(&dyn Handler) -> bool>(&self, test: F) -> Vec<Arc<dyn Handler>>;

    /// First handler satisfying the predicate, in priority order.
    fn find<F: Fn(&dyn Handler) -> bool>(&self, test: F) -> Option<Arc<dyn Handler>>;

    /// Name of the active constraint, if any.
    fn constraint(&self) -> Option<&'static str>;

    /// Snapshot of the handlers in priority order.
    fn to_vec(&self) -> Vec<Arc<dyn Handler>>;
}
