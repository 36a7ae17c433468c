//! Binary min-heap with stable handles for in-place key updates.
//! Every pushed element gets a slot handle, so a caller can lower an
//! element's key through `get_mut` and re-establish heap order without
//! re-inserting a duplicate.

use std::cmp::Ordering;

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct HeapHandle;
}

#[derive(Clone, Debug)]
struct Slot<T> {
    item: T,
    position: usize,
}

pub struct IndexedMinHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    slots: SlotMap<HeapHandle, Slot<T>>,
    order: Vec<HeapHandle>,
    compare: C,
}

impl<T, C> IndexedMinHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    pub fn new(compare: C) -> Self {
        Self { slots: SlotMap::with_key(), order: Vec::new(), compare }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn push(&mut self, item: T) -> HeapHandle {
        let position = self.order.len();
        let handle = self.slots.insert(Slot { item, position });
        self.order.push(handle);
        self.sift_up(position);
        handle
    }

    pub fn peek_min(&self) -> Option<&T> {
        self.order.first().map(|handle| &self.slots[*handle].item)
    }

    pub fn pop_min(&mut self) -> Option<T> {
        if self.order.is_empty() {
            return None;
        }
        let last = self.order.len() - 1;
        self.swap(0, last);
        let handle = self.order.pop()?;
        let slot = self.slots.remove(handle)?;
        if !self.order.is_empty() {
            self.sift_down(0);
        }
        Some(slot.item)
    }

    pub fn contains(&self, handle: HeapHandle) -> bool {
        self.slots.contains_key(handle)
    }

    pub fn get(&self, handle: HeapHandle) -> Option<&T> {
        self.slots.get(handle).map(|slot| &slot.item)
    }

    /// Mutable access to a queued element. The caller must call
    /// [`IndexedMinHeap::restore_order`] after changing its ordering key.
    pub fn get_mut(&mut self, handle: HeapHandle) -> Option<&mut T> {
        self.slots.get_mut(handle).map(|slot| &mut slot.item)
    }

    /// Re-establishes the heap invariant around an element whose key changed.
    /// Returns `false` for a handle that is no longer queued.
    pub fn restore_order(&mut self, handle: HeapHandle) -> bool {
        let Some(position) = self.slots.get(handle).map(|slot| slot.position) else {
            return false;
        };
        let settled = self.sift_up(position);
        if settled == position {
            self.sift_down(position);
        }
        true
    }

    fn less(&self, a: usize, b: usize) -> bool {
        let left = &self.slots[self.order[a]].item;
        let right = &self.slots[self.order[b]].item;
        (self.compare)(left, right) == Ordering::Less
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.order.swap(a, b);
        let (handle_a, handle_b) = (self.order[a], self.order[b]);
        self.slots[handle_a].position = a;
        self.slots[handle_b].position = b;
    }

    fn sift_up(&mut self, mut position: usize) -> usize {
        while position > 0 {
            let parent = (position - 1) / 2;
            if !self.less(position, parent) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
        position
    }

    fn sift_down(&mut self, mut position: usize) {
        let len = self.order.len();
        loop {
            let left = 2 * position + 1;
            let right = left + 1;
            let mut smallest = position;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == position {
                break;
            }
            self.swap(position, smallest);
            position = smallest;
        }
    }
}
