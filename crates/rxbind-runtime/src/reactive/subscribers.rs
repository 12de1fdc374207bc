#![forbid(unsafe_code)]

//! Ordered callback registry shared by [`Observable`](super::Observable)
//! and [`EventBus`](super::EventBus) channels.
//!
//! Dispatch works on a snapshot of the entry list, so callbacks may
//! register or revoke entries (including their own) while a dispatch is in
//! flight. A revoked entry is skipped even if it is still in an older
//! snapshot.

use std::cell::Cell;
use std::rc::Rc;

pub(crate) type Callback<T> = Box<dyn Fn(&T)>;

/// One registration in a [`SubscriberList`].
pub(crate) struct Entry<T> {
    id: u64,
    live: Cell<bool>,
    callback: Callback<T>,
}

impl<T> Entry<T> {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Mark the entry dead. Later `call`s are no-ops.
    pub(crate) fn revoke(&self) {
        self.live.set(false);
    }

    /// Invoke the callback if the entry is still live. Returns whether it ran.
    pub(crate) fn call(&self, value: &T) -> bool {
        if !self.live.get() {
            return false;
        }
        (self.callback)(value);
        true
    }
}

pub(crate) struct SubscriberList<T> {
    next_id: u64,
    entries: Vec<Rc<Entry<T>>>,
}

impl<T> SubscriberList<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Append a callback. Ids are unique per list and never reused.
    pub(crate) fn insert(&mut self, callback: Callback<T>) -> Rc<Entry<T>> {
        let entry = Rc::new(Entry {
            id: self.next_id,
            live: Cell::new(true),
            callback,
        });
        self.next_id += 1;
        self.entries.push(Rc::clone(&entry));
        entry
    }

    /// Revoke and remove the entry with `id`. Returns false if absent.
    pub(crate) fn remove(&mut self, id: u64) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(idx) => {
                self.entries.remove(idx).revoke();
                true
            }
            None => false,
        }
    }

    /// Prune revoked entries and return the live ones in registration order.
    pub(crate) fn snapshot(&mut self) -> Vec<Rc<Entry<T>>> {
        self.entries.retain(|e| e.is_live());
        self.entries.clone()
    }

    /// Registered entries, including revoked ones not yet pruned.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_live()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<(char, i32)>>>, tag: char) -> Callback<i32> {
        let log = Rc::clone(log);
        Box::new(move |v| log.borrow_mut().push((tag, *v)))
    }

    #[test]
    fn ids_are_sequential() {
        let mut list = SubscriberList::<i32>::new();
        let a = list.insert(Box::new(|_| {}));
        let b = list.insert(Box::new(|_| {}));
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut list = SubscriberList::new();
        list.insert(recorder(&log, 'a'));
        list.insert(recorder(&log, 'b'));
        list.insert(recorder(&log, 'c'));

        for entry in list.snapshot() {
            entry.call(&5);
        }
        assert_eq!(*log.borrow(), vec![('a', 5), ('b', 5), ('c', 5)]);
    }

    #[test]
    fn remove_revokes_entry_held_in_snapshot() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut list = SubscriberList::new();
        list.insert(recorder(&log, 'a'));
        let b = list.insert(recorder(&log, 'b'));

        let snapshot = list.snapshot();
        assert!(list.remove(b.id()));
        for entry in &snapshot {
            entry.call(&1);
        }
        assert_eq!(*log.borrow(), vec![('a', 1)]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut list = SubscriberList::<i32>::new();
        list.insert(Box::new(|_| {}));
        assert!(!list.remove(99));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn revoked_entries_pruned_on_snapshot() {
        let mut list = SubscriberList::<i32>::new();
        let a = list.insert(Box::new(|_| {}));
        list.insert(Box::new(|_| {}));
        a.revoke();
        assert_eq!(list.len(), 2);
        assert_eq!(list.live_count(), 1);
        assert_eq!(list.snapshot().len(), 1);
        assert_eq!(list.len(), 1);
    }
}
