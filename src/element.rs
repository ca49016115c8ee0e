use std::fmt::{self, Debug};
use std::ops::Deref;
use std::sync::{Arc, Mutex, Weak};

use crate::task::{Occupant, TaskId};
use crate::utils::lock;

/// Which content property of an [`Element`] a task is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// The primary content, e.g. the image of an image view.
    Image,
    /// The background content of any element.
    Background,
}

/// The task which produced a content value. Holds a weak reference only, a
/// slot never keeps its producer alive.
pub struct Producer<K> {
    id: TaskId,
    task: Weak<dyn Occupant<K>>,
}

impl<K> Producer<K> {
    pub(crate) fn new(id: TaskId, task: Weak<dyn Occupant<K>>) -> Self {
        Self { id, task }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The producing task, if it is still alive.
    pub fn task(&self) -> Option<Arc<dyn Occupant<K>>> {
        self.task.upgrade()
    }
}

impl<K> Clone for Producer<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            task: self.task.clone(),
        }
    }
}

impl<K> Debug for Producer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Producer({})", self.id)
    }
}

/// A content value tagged with the task that produced it.
///
/// Derefs to the wrapped value, so anything which reads content can read a
/// `Tagged` without knowing it carries a tag. The tag lets the current
/// occupant of a slot be recovered from the slot itself.
pub struct Tagged<K, C> {
    value: C,
    producer: Option<Producer<K>>,
}

impl<K, C> Tagged<K, C> {
    /// Content set directly by the caller, not produced by any task.
    pub fn untagged(value: C) -> Self {
        Self {
            value,
            producer: None,
        }
    }

    pub(crate) fn new(value: C, producer: Producer<K>) -> Self {
        Self {
            value,
            producer: Some(producer),
        }
    }

    pub fn value(&self) -> &C {
        &self.value
    }

    pub fn into_value(self) -> C {
        self.value
    }

    pub fn producer(&self) -> Option<&Producer<K>> {
        self.producer.as_ref()
    }

    pub fn producer_id(&self) -> Option<TaskId> {
        self.producer.as_ref().map(Producer::id)
    }

    /// The task which produced this value, if any and still alive.
    pub fn task(&self) -> Option<Arc<dyn Occupant<K>>> {
        self.producer.as_ref().and_then(Producer::task)
    }
}

impl<K, C> Deref for Tagged<K, C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<K, C: Clone> Clone for Tagged<K, C> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            producer: self.producer.clone(),
        }
    }
}

impl<K, C: Debug> Debug for Tagged<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tagged")
            .field("value", &self.value)
            .field("producer", &self.producer_id())
            .finish()
    }
}

type Slot<K, C> = Mutex<Option<Tagged<K, C>>>;

/// A UI element with an image slot and a background slot.
///
/// Tasks hold elements weakly; dropping the last `Arc<Element>` turns every
/// task bound to it into a no-op.
pub struct Element<K, C> {
    image: Slot<K, C>,
    background: Slot<K, C>,
}

impl<K, C> Element<K, C> {
    pub fn new() -> Self {
        Self {
            image: Mutex::new(None),
            background: Mutex::new(None),
        }
    }

    fn slot(&self, kind: SlotKind) -> &Slot<K, C> {
        match kind {
            SlotKind::Image => &self.image,
            SlotKind::Background => &self.background,
        }
    }

    /// A copy of the current content of a slot.
    pub fn get(&self, kind: SlotKind) -> Option<Tagged<K, C>>
    where
        C: Clone,
    {
        lock(self.slot(kind)).clone()
    }

    /// The current value of a slot, without its tag.
    pub fn value(&self, kind: SlotKind) -> Option<C>
    where
        C: Clone,
    {
        lock(self.slot(kind)).as_ref().map(|tagged| tagged.value.clone())
    }

    pub fn image(&self) -> Option<C>
    where
        C: Clone,
    {
        self.value(SlotKind::Image)
    }

    pub fn background(&self) -> Option<C>
    where
        C: Clone,
    {
        self.value(SlotKind::Background)
    }

    /// Places untagged content into a slot. Any task bound to the slot loses
    /// its binding.
    pub fn set(&self, kind: SlotKind, value: C) {
        *lock(self.slot(kind)) = Some(Tagged::untagged(value));
    }

    pub fn set_image(&self, value: C) {
        self.set(SlotKind::Image, value)
    }

    pub fn set_background(&self, value: C) {
        self.set(SlotKind::Background, value)
    }

    /// Empties a slot.
    pub fn clear(&self, kind: SlotKind) -> Option<Tagged<K, C>> {
        lock(self.slot(kind)).take()
    }

    /// Id of the task which produced the current content of a slot.
    pub fn producer_id(&self, kind: SlotKind) -> Option<TaskId> {
        lock(self.slot(kind)).as_ref().and_then(Tagged::producer_id)
    }

    /// The live task occupying a slot. The slot lock is released before the
    /// task is returned, so the caller may call into it freely.
    pub fn occupant(&self, kind: SlotKind) -> Option<Arc<dyn Occupant<K>>> {
        let producer = lock(self.slot(kind))
            .as_ref()
            .and_then(|tagged| tagged.producer.clone())?;

        producer.task()
    }

    /// Replaces the content of a slot unconditionally.
    pub(crate) fn put(&self, kind: SlotKind, tagged: Tagged<K, C>) {
        *lock(self.slot(kind)) = Some(tagged);
    }

    /// Replaces the content of a slot only if it is still produced by
    /// `owner`. The check and the write happen under one lock.
    pub(crate) fn put_if_owned(&self, kind: SlotKind, tagged: Tagged<K, C>, owner: TaskId) -> bool {
        let mut slot = lock(self.slot(kind));
        let owned = slot.as_ref().and_then(Tagged::producer_id) == Some(owner);
        if owned {
            *slot = Some(tagged);
        }
        owned
    }
}

impl<K, C> Default for Element<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> Debug for Element<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("image", &self.producer_id(SlotKind::Image))
            .field("background", &self.producer_id(SlotKind::Background))
            .finish()
    }
}
