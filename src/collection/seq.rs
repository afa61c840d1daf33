//! Shared storage engine for handler collections.
//!
//! [`HandlerSeq`] owns the validated, deduplicated, priority-sorted
//! sequence both collection variants are built on. Its methods preserve
//! the invariants; the public wrappers decide whether to mutate a
//! sequence in place or copy it first.

use std::cmp::Reverse;
use std::ptr;
use std::sync::Arc;

use tracing::trace;

use crate::constraint::Constraint;
use crate::error::{CollectionError, Result};
use crate::handler::{Handler, Prioritized};

/// Reference identity over handler objects.
///
/// Compares the data addresses of the two trait objects and ignores
/// vtable metadata, so the same object reached through different
/// trait-object instantiations still compares equal.
pub(crate) fn same_handler(a: &dyn Handler, b: &dyn Handler) -> bool {
    ptr::addr_eq(a as *const dyn Handler, b as *const dyn Handler)
}

/// Effective priority of a handler: its declared priority if it carries
/// the capability, 0 otherwise.
pub(crate) fn priority_of(handler: &dyn Handler) -> i32 {
    handler.as_prioritized().map_or(0, Prioritized::priority)
}

/// Validated, deduplicated, priority-ordered handler storage.
#[derive(Clone)]
pub(crate) struct HandlerSeq {
    handlers: Vec<Arc<dyn Handler>>,
    constraint: Option<Constraint>,
}

impl HandlerSeq {
    /// Resolve the constraint, then validate, deduplicate and sort the
    /// initial handlers.
    ///
    /// Constraint resolution fails before any element is looked at, so
    /// the two error cases cannot mix.
    pub(crate) fn new(
        handlers: impl IntoIterator<Item = Arc<dyn Handler>>,
        constraint: Option<&str>,
    ) -> Result<Self> {
        let constraint = constraint.map(Constraint::resolve).transpose()?;
        let mut seq = Self {
            handlers: Vec::new(),
            constraint,
        };
        seq.replace(handlers)?;
        Ok(seq)
    }

    /// Empty sequence with no constraint. Cannot fail.
    pub(crate) fn empty() -> Self {
        Self {
            handlers: Vec::new(),
            constraint: None,
        }
    }

    /// Empty sequence carrying this sequence's constraint.
    pub(crate) fn derive_empty(&self) -> Self {
        Self {
            handlers: Vec::new(),
            constraint: self.constraint,
        }
    }

    pub(crate) fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub(crate) fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    pub(crate) fn contains(&self, handler: &dyn Handler) -> bool {
        self.handlers
            .iter()
            .any(|h| same_handler(h.as_ref(), handler))
    }

    /// Check a candidate against the active constraint.
    pub(crate) fn validate(&self, handler: &dyn Handler) -> Result<()> {
        match &self.constraint {
            Some(c) if !c.allows(handler) => Err(CollectionError::InvalidHandler {
                constraint: c.name().to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Replace the whole sequence.
    ///
    /// The replacement is staged: every element is validated and
    /// deduplicated before the previous content is touched, so a failed
    /// replace leaves the sequence exactly as it was.
    pub(crate) fn replace(
        &mut self,
        handlers: impl IntoIterator<Item = Arc<dyn Handler>>,
    ) -> Result<()> {
        let mut staged: Vec<Arc<dyn Handler>> = Vec::new();
        for handler in handlers {
            self.validate(handler.as_ref())?;
            if !staged.iter().any(|h| same_handler(h.as_ref(), handler.as_ref())) {
                staged.push(handler);
            }
        }
        self.handlers = staged;
        self.update();
        Ok(())
    }

    /// Append a handler unless it is already present.
    ///
    /// Returns true if the sequence changed.
    pub(crate) fn insert(&mut self, handler: Arc<dyn Handler>) -> Result<bool> {
        self.validate(handler.as_ref())?;
        if self.contains(handler.as_ref()) {
            return Ok(false);
        }
        self.handlers.push(handler);
        self.update();
        Ok(true)
    }

    /// Remove the reference-equal element, if present.
    ///
    /// Returns true if the sequence changed. The ordering pass runs
    /// either way; removal cannot reorder the survivors, so it is a
    /// no-op there.
    pub(crate) fn remove(&mut self, handler: &dyn Handler) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| !same_handler(h.as_ref(), handler));
        let changed = self.handlers.len() != before;
        self.update();
        changed
    }

    pub(crate) fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Restore priority order after a structural change.
    ///
    /// Stable descending sort. The priority capability is resolved once
    /// per element, and equal priorities keep their relative order.
    fn update(&mut self) {
        self.handlers
            .sort_by_cached_key(|h| Reverse(priority_of(h.as_ref())));
        trace!(len = self.handlers.len(), "reordered handler sequence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract;

    struct Tagged {
        tag: u32,
        priority: Option<i32>,
    }

    impl Tagged {
        fn plain(tag: u32) -> Arc<dyn Handler> {
            Arc::new(Self {
                tag,
                priority: None,
            })
        }

        fn ranked(tag: u32, priority: i32) -> Arc<dyn Handler> {
            Arc::new(Self {
                tag,
                priority: Some(priority),
            })
        }
    }

    impl Handler for Tagged {
        fn as_prioritized(&self) -> Option<&dyn Prioritized> {
            self.priority.map(|_| self as &dyn Prioritized)
        }
    }

    impl Prioritized for Tagged {
        fn priority(&self) -> i32 {
            self.priority.unwrap_or(0)
        }
    }

    struct Outsider;
    impl Handler for Outsider {}

    contract!("seq::Tagged", |h| h.is::<Tagged>());

    fn tags(seq: &HandlerSeq) -> Vec<u32> {
        seq.handlers()
            .iter()
            .map(|h| h.downcast_ref::<Tagged>().unwrap().tag)
            .collect()
    }

    #[test]
    fn test_sorts_descending_by_priority() {
        let seq = HandlerSeq::new(
            [
                Tagged::ranked(1, -5),
                Tagged::ranked(2, 10),
                Tagged::plain(3),
            ],
            None,
        )
        .unwrap();

        assert_eq!(tags(&seq), vec![2, 3, 1]);
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let seq = HandlerSeq::new(
            [
                Tagged::plain(1),
                Tagged::ranked(2, 5),
                Tagged::ranked(3, 0),
                Tagged::ranked(4, 5),
                Tagged::plain(5),
            ],
            None,
        )
        .unwrap();

        // 5s in insertion order, then the 0s (declared or defaulted) in theirs.
        assert_eq!(tags(&seq), vec![2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_replace_deduplicates_by_identity() {
        let shared = Tagged::plain(1);
        let mut seq = HandlerSeq::empty();
        seq.replace([shared.clone(), Tagged::plain(2), shared.clone()])
            .unwrap();

        assert_eq!(tags(&seq), vec![1, 2]);
    }

    #[test]
    fn test_failed_replace_leaves_sequence_untouched() {
        let mut seq = HandlerSeq::new([Tagged::ranked(1, 1)], Some("seq::Tagged")).unwrap();

        let outsider: Arc<dyn Handler> = Arc::new(Outsider);
        let err = seq.replace([Tagged::plain(2), outsider]).unwrap_err();
        assert_eq!(
            err,
            CollectionError::InvalidHandler {
                constraint: "seq::Tagged".to_string()
            }
        );
        assert_eq!(tags(&seq), vec![1]);
    }

    #[test]
    fn test_insert_duplicate_is_a_no_op() {
        let handler = Tagged::plain(1);
        let mut seq = HandlerSeq::empty();

        assert!(seq.insert(handler.clone()).unwrap());
        assert!(!seq.insert(handler.clone()).unwrap());
        assert_eq!(seq.handlers().len(), 1);
    }

    #[test]
    fn test_remove_reports_whether_sequence_changed() {
        let present = Tagged::plain(1);
        let absent = Tagged::plain(2);
        let mut seq = HandlerSeq::new([present.clone()], None).unwrap();

        assert!(!seq.remove(absent.as_ref()));
        assert!(seq.remove(present.as_ref()));
        assert!(seq.handlers().is_empty());
    }

    #[test]
    fn test_priority_of_defaults_to_zero() {
        let plain = Tagged::plain(1);
        let ranked = Tagged::ranked(2, 42);
        assert_eq!(priority_of(plain.as_ref()), 0);
        assert_eq!(priority_of(ranked.as_ref()), 42);
    }

    #[test]
    fn test_identity_survives_distinct_allocations() {
        // Two separately allocated but structurally equal handlers are
        // distinct; clones of one Arc are the same.
        let a = Tagged::plain(1);
        let b = Tagged::plain(1);
        assert!(!same_handler(a.as_ref(), b.as_ref()));
        assert!(same_handler(a.as_ref(), a.clone().as_ref()));
    }
}
