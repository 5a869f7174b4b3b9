//! Fixed-capacity node storage shared by the tree-building search engines.
//!
//! The arena reserves all of its memory up front and hands out [`NodeId`]
//! handles instead of references, so the trees built on top of it never need
//! per-node allocations or reference-counted links. Elements can only be
//! removed in LIFO order (see [`Arena::free_last`]), which is exactly what a
//! depth-first traversal needs to keep its memory bounded by the depth of the
//! current path.

/// Stable handle to an element of an [`Arena`].
///
/// A handle stays valid until the arena is [reset](Arena::reset) or the
/// element it points to is released with [`Arena::free_last`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the element in the arena storage.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pre-reserved storage with O(1) allocation and stack-discipline removal.
///
/// The arena is not synchronized: concurrent searches must each own their own
/// instance.
#[derive(Debug)]
pub struct Arena<T> {
    elements: Vec<T>,
    capacity: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an arena without any capacity: every allocation is refused
    /// until [`Arena::reset`] is called.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
            capacity: 0,
        }
    }

    /// Creates an arena that can hold exactly `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = Self::new();
        arena.reset(capacity);
        arena
    }

    /// Drops all elements and reserves exactly `capacity` slots. All
    /// previously issued handles are invalidated.
    pub fn reset(&mut self, capacity: usize) {
        self.elements.clear();
        self.elements.reserve_exact(capacity);
        self.capacity = capacity;
    }

    /// Moves `element` into the next free slot.
    ///
    /// Returns `None` if the arena is full. Callers that can not handle a
    /// refusal should check [`Arena::is_full`] beforehand.
    #[must_use]
    pub fn allocate(&mut self, element: T) -> Option<NodeId> {
        if self.is_full() {
            return None;
        }
        let id = NodeId(u32::try_from(self.elements.len()).ok()?);
        self.elements.push(element);
        Some(id)
    }

    /// Removes the most recently allocated element and returns it, restoring
    /// one free slot. Returns `None` if the arena is empty.
    pub fn free_last(&mut self) -> Option<T> {
        self.elements.pop()
    }

    /// Returns `true` if no more elements can be allocated.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.elements.len() >= self.capacity
    }

    /// Number of currently allocated elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if nothing is allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total number of slots reserved by the last [`Arena::reset`].
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of allocations that would still succeed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.elements.len()
    }

    /// Returns the element behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not point to a live element.
    #[must_use]
    pub fn get(&self, id: NodeId) -> &T {
        &self.elements[id.index()]
    }

    /// Returns a mutable reference to the element behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not point to a live element.
    #[must_use]
    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.elements[id.index()]
    }
}
