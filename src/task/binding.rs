use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use crate::element::{Element, SlotKind};
use crate::task::{Occupant, TaskId};

/// Weak association between a task and one slot of an element.
pub struct Binding<K, C> {
    element: Weak<Element<K, C>>,
    kind: SlotKind,
}

impl<K, C> Binding<K, C> {
    pub fn new(element: &Arc<Element<K, C>>, kind: SlotKind) -> Self {
        Self {
            element: Arc::downgrade(element),
            kind,
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// The bound element, unless it has been dropped.
    pub fn element(&self) -> Option<Arc<Element<K, C>>> {
        self.element.upgrade()
    }

    /// Whether the slot currently shows content produced by task `id`.
    pub fn is_bound(&self, id: TaskId) -> bool {
        self.element()
            .is_some_and(|element| element.producer_id(self.kind) == Some(id))
    }

    /// Runs the replacement protocol against the current occupant of the
    /// slot. A dropped element counts as "not bound" and yields `false`.
    pub fn cancel_existing_work(&self, key: Option<&K>) -> bool
    where
        K: PartialEq,
    {
        let Some(element) = self.element() else {
            return false;
        };

        let existing = task_of(&element, self.kind);
        cancel_existing_work(existing.as_deref(), key)
    }
}

impl<K, C> Clone for Binding<K, C> {
    fn clone(&self) -> Self {
        Self {
            element: self.element.clone(),
            kind: self.kind,
        }
    }
}

impl<K, C> Debug for Binding<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("kind", &self.kind)
            .field("alive", &(self.element.strong_count() > 0))
            .finish()
    }
}

/// The live task occupying a slot of `element`, if any.
pub fn task_of<K, C>(element: &Element<K, C>, kind: SlotKind) -> Option<Arc<dyn Occupant<K>>> {
    element.occupant(kind)
}

/// Cancels `existing` unless it is already doing the work identified by
/// `key`.
///
/// Returns `true` if there was no existing task or it has been cancelled, and
/// `false` if a live task with an equal key already owns the slot.
pub fn cancel_existing_work<K>(existing: Option<&dyn Occupant<K>>, key: Option<&K>) -> bool
where
    K: PartialEq,
{
    let Some(existing) = existing else {
        return true;
    };

    if let Some(key) = key
        && existing.key() == Some(key)
        && !existing.is_cancelled()
    {
        tracing::debug!(existing = %existing.id(), "equal work already bound, yielding");
        return false;
    }

    tracing::debug!(existing = %existing.id(), "cancelling existing work");
    existing.cancel();
    true
}
