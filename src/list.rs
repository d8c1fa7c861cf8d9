//! Arena-backed doubly linked list with stable handles.
//!
//! Holds the trie's threaded leaf list. Slots live in a `Vec` and are
//! recycled through a free list, so a `Handle` stays valid across unrelated
//! insertions and removals. Links are `u32` slot indices with `u32::MAX` as
//! the nil sentinel.

const NIL: u32 = u32::MAX;

/// Stable reference to a list slot. Valid until that exact slot is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(u32);

struct Slot<T> {
    item: Option<T>,
    prev: u32,
    next: u32,
}

pub struct OrderedList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    head: u32,
    tail: u32,
    len: usize,
}

impl<T> OrderedList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Option<Handle> {
        (self.head != NIL).then(|| Handle(self.head))
    }

    pub fn last(&self) -> Option<Handle> {
        (self.tail != NIL).then(|| Handle(self.tail))
    }

    pub fn get(&self, h: Handle) -> Option<&T> {
        self.slots.get(h.0 as usize)?.item.as_ref()
    }

    pub fn get_mut(&mut self, h: Handle) -> Option<&mut T> {
        self.slots.get_mut(h.0 as usize)?.item.as_mut()
    }

    /// Handle of the slot before `h`, if any.
    pub fn prev(&self, h: Handle) -> Option<Handle> {
        let slot = self.slots.get(h.0 as usize)?;
        slot.item.as_ref()?;
        (slot.prev != NIL).then(|| Handle(slot.prev))
    }

    /// Handle of the slot after `h`, if any.
    pub fn next(&self, h: Handle) -> Option<Handle> {
        let slot = self.slots.get(h.0 as usize)?;
        slot.item.as_ref()?;
        (slot.next != NIL).then(|| Handle(slot.next))
    }

    fn alloc(&mut self, item: T, prev: u32, next: u32) -> u32 {
        let slot = Slot {
            item: Some(item),
            prev,
            next,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                (self.slots.len() - 1) as u32
            }
        }
    }

    pub fn push_front(&mut self, item: T) -> Handle {
        let idx = self.alloc(item, NIL, self.head);
        if self.head != NIL {
            self.slots[self.head as usize].prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
        self.len += 1;
        Handle(idx)
    }

    pub fn push_back(&mut self, item: T) -> Handle {
        let idx = self.alloc(item, self.tail, NIL);
        if self.tail != NIL {
            self.slots[self.tail as usize].next = idx;
        } else {
            self.head = idx;
        }
        self.tail = idx;
        self.len += 1;
        Handle(idx)
    }

    /// Splice a new item directly after `after`. Returns `None` if `after`
    /// is stale.
    pub fn insert_after(&mut self, after: Handle, item: T) -> Option<Handle> {
        self.get(after)?;
        let next = self.slots[after.0 as usize].next;
        let idx = self.alloc(item, after.0, next);
        self.slots[after.0 as usize].next = idx;
        if next != NIL {
            self.slots[next as usize].prev = idx;
        } else {
            self.tail = idx;
        }
        self.len += 1;
        Some(Handle(idx))
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let h = self.first()?;
        self.remove(h)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let h = self.last()?;
        self.remove(h)
    }

    /// Unlink the slot and recycle it. Returns `None` if `h` is stale.
    pub fn remove(&mut self, h: Handle) -> Option<T> {
        let idx = h.0;
        let item = self.slots.get_mut(idx as usize)?.item.take()?;
        let (prev, next) = {
            let slot = &self.slots[idx as usize];
            (slot.prev, slot.next)
        };
        if prev != NIL {
            self.slots[prev as usize].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.slots[next as usize].prev = prev;
        } else {
            self.tail = prev;
        }
        self.free.push(idx);
        self.len -= 1;
        Some(item)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cur: self.head,
        }
    }
}

impl<T: PartialEq> OrderedList<T> {
    /// Linear scan for the first slot holding an item equal to `item`.
    pub fn find(&self, item: &T) -> Option<Handle> {
        let mut cur = self.head;
        while cur != NIL {
            let slot = &self.slots[cur as usize];
            let live = slot.item.as_ref().expect("linked slot is live");
            if live == item {
                return Some(Handle(cur));
            }
            cur = slot.next;
        }
        None
    }
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    list: &'a OrderedList<T>,
    cur: u32,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cur == NIL {
            return None;
        }
        let slot = &self.list.slots[self.cur as usize];
        self.cur = slot.next;
        Some(slot.item.as_ref().expect("linked slot is live"))
    }
}
