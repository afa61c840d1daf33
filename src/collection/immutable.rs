//! Immutable handler collection - every mutation returns a new instance.

use std::fmt;
use std::slice;
use std::sync::Arc;

use tracing::debug;

use super::seq::HandlerSeq;
use super::{HandlerCollection, HandlerList};
use crate::constraint;
use crate::error::Result;
use crate::handler::Handler;

/// Copy-on-write variant of [`HandlerCollection`].
///
/// Shares the mutable variant's validation and ordering rules, but
/// `set`, `add`, `remove` and `clear` never alter the receiver: each
/// builds and returns a new collection seeded from the computed result
/// and the same constraint. An instance is never mutated once
/// constructed, so snapshots can be read concurrently from any number of
/// threads without synchronization.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use handler_collection::{Handler, ImmutableHandlerCollection};
///
/// struct Echo;
/// impl Handler for Echo {}
///
/// let empty = ImmutableHandlerCollection::new([], None).unwrap();
/// let one = empty.add(Arc::new(Echo)).unwrap();
///
/// assert!(empty.is_empty()); // receiver untouched
/// assert_eq!(one.len(), 1);
/// ```
#[derive(Clone)]
pub struct ImmutableHandlerCollection {
    seq: HandlerSeq,
}

impl ImmutableHandlerCollection {
    /// Create a collection from initial handlers and an optional
    /// constraint identifier.
    ///
    /// Validation and ordering are identical to
    /// [`HandlerCollection::new`].
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidConstraint`] if `constraint` does not
    /// resolve; [`CollectionError::InvalidHandler`] if any element fails
    /// it.
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

    /// New collection holding the given handlers under this collection's
    /// constraint. The receiver is unchanged.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidHandler`] if any element fails the
    /// constraint; no new collection is produced.
    ///
    /// [`CollectionError::InvalidHandler`]: crate::error::CollectionError::InvalidHandler
    pub fn set(&self, handlers: impl IntoIterator<Item = Arc<dyn Handler>>) -> Result<Self> {
        let mut seq = self.seq.derive_empty();
        seq.replace(handlers)?;
        debug!(len = seq.handlers().len(), "derived handler collection");
        Ok(Self { seq })
    }

    /// New collection with the handler added. The receiver is unchanged.
    ///
    /// Adding a handler that is already present still returns a new
    /// instance, with content equal to the receiver's.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidHandler`] if the handler fails the
    /// constraint; no new collection is produced.
    ///
    /// [`CollectionError::InvalidHandler`]: crate::error::CollectionError::InvalidHandler
    pub fn add(&self, handler: Arc<dyn Handler>) -> Result<Self> {
        let mut seq = self.seq.clone();
        if seq.insert(handler)? {
            debug!(len = seq.handlers().len(), "derived handler collection");
        }
        Ok(Self { seq })
    }

    /// New collection without the reference-equal handler. The receiver
    /// is unchanged; removing an absent handler is a no-op, never an
    /// error.
    pub fn remove(&self, handler: &dyn Handler) -> Self {
        let mut seq = self.seq.clone();
        if seq.remove(handler) {
            debug!(len = seq.handlers().len(), "derived handler collection");
        }
        Self { seq }
    }

    /// New empty collection under this collection's constraint. The
    /// receiver is unchanged.
    pub fn clear(&self) -> Self {
        Self {
            seq: self.seq.derive_empty(),
        }
    }
}

impl fmt::Debug for ImmutableHandlerCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmutableHandlerCollection")
            .field("len", &self.len())
            .field("constraint", &self.constraint())
            .finish()
    }
}

impl<'a> IntoIterator for &'a ImmutableHandlerCollection {
    type Item = &'a Arc<dyn Handler>;
    type IntoIter = slice::Iter<'a, Arc<dyn Handler>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Freeze a mutable collection. The already validated and sorted
/// sequence moves across without re-validation.
impl From<HandlerCollection> for ImmutableHandlerCollection {
    fn from(collection: HandlerCollection) -> Self {
        Self {
            seq: collection.into_seq(),
        }
    }
}

/// Thaw an immutable collection into the in-place variant.
impl From<ImmutableHandlerCollection> for HandlerCollection {
    fn from(collection: ImmutableHandlerCollection) -> Self {
        HandlerCollection::from_seq(collection.seq)
    }
}

impl HandlerList for ImmutableHandlerCollection {
    fn accepts(&self, handler: &dyn Handler) -> bool {
        ImmutableHandlerCollection::accepts(self, handler)
    }

    fn accepts_type(&self, name: &str) -> bool {
        ImmutableHandlerCollection::accepts_type(self, name)
    }

    fn len(&self) -> usize {
        ImmutableHandlerCollection::len(self)
    }

    fn contains(&self, handler: &dyn Handler) -> bool {
        ImmutableHandlerCollection::contains(self, handler)
    }

    fn filter<F: Fn(&dyn Handler) -> bool>(&self, test: F) -> Vec<Arc<dyn Handler>> {
        ImmutableHandlerCollection::filter(self, test)
    }

    fn find<F: Fn(&dyn Handler) -> bool>(&self, test: F) -> Option<Arc<dyn Handler>> {
        ImmutableHandlerCollection::find(self, test)
    }

    fn constraint(&self) -> Option<&'static str> {
        ImmutableHandlerCollection::constraint(self)
    }

    fn to_vec(&self) -> Vec<Arc<dyn Handler>> {
        ImmutableHandlerCollection::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract;
    use crate::error::CollectionError;

    struct Alpha;
    impl Handler for Alpha {}

    struct Beta;
    impl Handler for Beta {}

    contract!("immutable::Alpha", |h| h.is::<Alpha>());

    fn alpha() -> Arc<dyn Handler> {
        Arc::new(Alpha)
    }

    fn beta() -> Arc<dyn Handler> {
        Arc::new(Beta)
    }

    fn same(a: &Arc<dyn Handler>, b: &Arc<dyn Handler>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
    }

    #[test]
    fn test_set_leaves_receiver_untouched() {
        let original = ImmutableHandlerCollection::new([alpha()], None).unwrap();
        let replaced = original.set([beta(), beta()]).unwrap();

        assert_eq!(original.len(), 1);
        assert!(original.to_vec()[0].is::<Alpha>());
        assert_eq!(replaced.len(), 2);
        assert!(replaced.to_vec()[0].is::<Beta>());
    }

    #[test]
    fn test_add_leaves_receiver_untouched() {
        let original = ImmutableHandlerCollection::new([alpha()], None).unwrap();
        let grown = original.add(beta()).unwrap();

        assert_eq!(original.len(), 1);
        assert_eq!(grown.len(), 2);
    }

    #[test]
    fn test_add_existing_returns_equal_snapshot() {
        let a = alpha();
        let original = ImmutableHandlerCollection::new([a.clone()], None).unwrap();
        let snapshot = original.add(a.clone()).unwrap();

        assert_eq!(original.len(), 1);
        assert_eq!(snapshot.len(), 1);
        assert!(same(&original.to_vec()[0], &snapshot.to_vec()[0]));
    }

    #[test]
    fn test_remove_and_clear_leave_receiver_untouched() {
        let a = alpha();
        let original =
            ImmutableHandlerCollection::new([a.clone(), beta()], None).unwrap();

        let shrunk = original.remove(a.as_ref());
        assert_eq!(original.len(), 2);
        assert_eq!(shrunk.len(), 1);
        assert!(!shrunk.contains(a.as_ref()));

        let emptied = original.clear();
        assert_eq!(original.len(), 2);
        assert!(emptied.is_empty());
    }

    #[test]
    fn test_remove_absent_returns_equal_snapshot() {
        let original = ImmutableHandlerCollection::new([alpha()], None).unwrap();
        let snapshot = original.remove(beta().as_ref());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_constraint_propagates_to_derived_instances() {
        let original =
            ImmutableHandlerCollection::new([alpha()], Some("immutable::Alpha")).unwrap();

        let derived = original.clear();
        assert_eq!(derived.constraint(), Some("immutable::Alpha"));

        let err = derived.add(beta()).unwrap_err();
        assert_eq!(
            err,
            CollectionError::InvalidHandler {
                constraint: "immutable::Alpha".to_string()
            }
        );

        let chained = derived.add(alpha()).unwrap().set([alpha()]).unwrap();
        assert_eq!(chained.constraint(), Some("immutable::Alpha"));
    }

    #[test]
    fn test_failed_set_produces_no_collection() {
        let original =
            ImmutableHandlerCollection::new([alpha()], Some("immutable::Alpha")).unwrap();
        assert!(original.set([beta()]).is_err());
        assert_eq!(original.len(), 1);
    }

    #[test]
    fn test_conversions_preserve_content_and_constraint() {
        let a = alpha();
        let mutable =
            HandlerCollection::new([a.clone()], Some("immutable::Alpha")).unwrap();

        let frozen = ImmutableHandlerCollection::from(mutable);
        assert_eq!(frozen.len(), 1);
        assert_eq!(frozen.constraint(), Some("immutable::Alpha"));

        let mut thawed = HandlerCollection::from(frozen);
        assert!(thawed.contains(a.as_ref()));
        thawed.remove(a.as_ref());
        assert!(thawed.is_empty());
        assert_eq!(thawed.constraint(), Some("immutable::Alpha"));
    }

    #[test]
    fn test_snapshots_are_shareable_across_threads() {
        let collection =
            Arc::new(ImmutableHandlerCollection::new([alpha(), beta()], None).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let snapshot = Arc::clone(&collection);
                std::thread::spawn(move || snapshot.len())
            })
            .collect();

        for reader in readers {
            assert_eq!(reader.join().unwrap(), 2);
        }
    }
}
