//! Mutable handler collection - mutates its own storage in place.

use std::fmt;
use std::slice;
use std::sync::Arc;

use tracing::debug;

use super::seq::HandlerSeq;
use super::HandlerList;
use crate::constraint;
use crate::error::Result;
use crate::handler::Handler;

/// Priority-ordered, deduplicated, optionally type-constrained sequence
/// of handlers, mutable in place.
///
/// Handlers are held as `Arc<dyn Handler>`; the collection owns its
/// storage but not the handler objects, and uniqueness is by reference
/// identity rather than structural equality. Every structural mutation
/// re-validates its input and restores descending priority order.
///
/// Sharing a single instance across threads requires external
/// synchronization; for lock-free concurrent reads use
/// [`ImmutableHandlerCollection`](super::ImmutableHandlerCollection).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use handler_collection::{Handler, HandlerCollection};
///
/// struct Echo;
/// impl Handler for Echo {}
///
/// let mut handlers = HandlerCollection::default();
/// let echo: Arc<dyn Handler> = Arc::new(Echo);
///
/// handlers.add(echo.clone()).unwrap();
/// handlers.add(echo.clone()).unwrap(); // no-op, already present
/// assert_eq!(handlers.len(), 1);
/// ```
#[derive(Clone)]
pub struct HandlerCollection {
    seq: HandlerSeq,
}

impl HandlerCollection {
    /// Create a collection from initial handlers and an optional
    /// constraint identifier.
    ///
    /// The initial sequence may come from any finite iterable and is
    /// fully materialized here. Elements are validated against the
    /// constraint, deduplicated by reference identity and sorted by
    /// descending priority.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidConstraint`] if `constraint` does not
    /// resolve to a registered contract or handler type;
    /// [`CollectionError::InvalidHandler`] if any element fails it. No
    /// partially populated collection escapes either failure.
    ///
    /// [`CollectionError::InvalidConstraint`]: crate::error::CollectionError::InvalidConstraint
    /// [`CollectionError::InvalidHandler`]: crate::error::CollectionError::InvalidHandler
    pub fn new(
        handlers: impl IntoIterator<Item = Arc<dyn Handler>>,
        constraint: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            seq: HandlerSeq::new(handlers, constraint)?,
        })
    }

    /// True if this collection would accept the given handler instance.
    pub fn accepts(&self, handler: &dyn Handler) -> bool {
        self.seq.constraint().map_or(true, |c| c.allows(handler))
    }

    /// True if instances of the named handler type would be accepted.
    ///
    /// Unknown type names are reported as not accepted rather than
    /// erroring.
    pub fn accepts_type(&self, name: &str) -> bool {
        match self.seq.constraint() {
            Some(c) => c.accepts_type(name),
            None => constraint::find_handler_type(name).is_some(),
        }
    }

    /// True if the collection holds no handlers.
    pub fn is_empty(&self) -> bool {
        self.seq.handlers().is_empty()
    }

    /// Number of handlers in the collection.
    pub fn len(&self) -> usize {
        self.seq.handlers().len()
    }

    /// True if the reference-equal handler is present.
    pub fn contains(&self, handler: &dyn Handler) -> bool {
        self.seq.contains(handler)
    }

    /// Handlers satisfying the predicate, in priority order.
    pub fn filter<F>(&self, test: F) -> Vec<Arc<dyn Handler>>
    where
        F: Fn(&dyn Handler) -> bool,
    {
        self.seq
            .handlers()
            .iter()
            .filter(|h| test(h.as_ref()))
            .cloned()
            .collect()
    }

    /// First handler satisfying the predicate, in priority order.
    pub fn find<F>(&self, test: F) -> Option<Arc<dyn Handler>>
    where
        F: Fn(&dyn Handler) -> bool,
    {
        self.seq
            .handlers()
            .iter()
            .find(|h| test(h.as_ref()))
            .cloned()
    }

    /// Name of the active constraint, if any.
    pub fn constraint(&self) -> Option<&'static str> {
        self.seq.constraint().map(|c| c.name())
    }

    /// Snapshot of the handlers in priority order.
    pub fn to_vec(&self) -> Vec<Arc<dyn Handler>> {
        self.seq.handlers().to_vec()
    }

    /// Iterate the handlers in priority order.
    ///
    /// Each call starts a fresh traversal at the highest-priority
    /// handler.
    pub fn iter(&self) -> slice::Iter<'_, Arc<dyn Handler>> {
        self.seq.handlers().iter()
    }

    /// Replace the entire contents with the given handlers.
    ///
    /// The constraint is retained. All elements are validated and
    /// deduplicated before the previous contents are touched, then the
    /// new sequence is sorted.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidHandler`] if any element fails the
    /// constraint; the previous contents remain in place.
    ///
    /// [`CollectionError::InvalidHandler`]: crate::error::CollectionError::InvalidHandler
    pub fn set(&mut self, handlers: impl IntoIterator<Item = Arc<dyn Handler>>) -> Result<()> {
        self.seq.replace(handlers)?;
        debug!(len = self.len(), "replaced handler collection contents");
        Ok(())
    }

    /// Add a handler.
    ///
    /// Adding a handler that is already present (by reference identity)
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidHandler`] if the handler fails the
    /// constraint; the collection is left unchanged.
    ///
    /// [`CollectionError::InvalidHandler`]: crate::error::CollectionError::InvalidHandler
    pub fn add(&mut self, handler: Arc<dyn Handler>) -> Result<()> {
        if self.seq.insert(handler)? {
            debug!(len = self.len(), "added handler to collection");
        }
        Ok(())
    }

    /// Remove the reference-equal handler, if present.
    ///
    /// Removing an absent handler is a no-op, never an error.
    pub fn remove(&mut self, handler: &dyn Handler) {
        if self.seq.remove(handler) {
            debug!(len = self.len(), "removed handler from collection");
        }
    }

    /// Remove all handlers. The constraint is retained.
    pub fn clear(&mut self) {
        self.seq.clear();
        debug!("cleared handler collection");
    }

    pub(super) fn from_seq(seq: HandlerSeq) -> Self {
        Self { seq }
    }

    pub(super) fn into_seq(self) -> HandlerSeq {
        self.seq
    }
}

impl Default for HandlerCollection {
    /// Empty collection accepting any handler.
    fn default() -> Self {
        Self {
            seq: HandlerSeq::empty(),
        }
    }
}

impl fmt::Debug for HandlerCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCollection")
            .field("len", &self.len())
            .field("constraint", &self.constraint())
            .finish()
    }
}

impl<'a> IntoIterator for &'a HandlerCollection {
    type Item = &'a Arc<dyn Handler>;
    type IntoIter = slice::Iter<'a, Arc<dyn Handler>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl HandlerList for HandlerCollection {
    fn accepts(&self, handler: &dyn Handler) -> bool {
        HandlerCollection::accepts(self, handler)
    }

    fn accepts_type(&self, name: &str) -> bool {
        HandlerCollection::accepts_type(self, name)
    }

    fn len(&self) -> usize {
        HandlerCollection::len(self)
    }

    fn contains(&self, handler: &dyn Handler) -> bool {
        HandlerCollection::contains(self, handler)
    }

    fn filter<F: Fn(&dyn Handler) -> bool>(&self, test: F) -> Vec<Arc<dyn Handler>> {
        HandlerCollection::filter(self, test)
    }

    fn find<F: Fn(&dyn Handler) -> bool>(&self, test: F) -> Option<Arc<dyn Handler>> {
        HandlerCollection::find(self, test)
    }

    fn constraint(&self) -> Option<&'static str> {
        HandlerCollection::constraint(self)
    }

    fn to_vec(&self) -> Vec<Arc<dyn Handler>> {
        HandlerCollection::to_vec(self)
    }
}
