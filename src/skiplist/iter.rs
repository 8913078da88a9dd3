use crate::{cmp::Comparator, iterator::DBIterator, utils::arena::Allocator};

use super::{
    node::{Link, Node},
    SkipList,
};

/// Cursor over a [`SkipList`]. Any number of cursors may move independently
/// while another thread inserts.
pub struct SkipListIter<'a, K, C, A> {
    list: &'a SkipList<K, C, A>,
    node: Link<K>,
}

// A cursor only reads through a shared borrow of the list.
unsafe impl<K: Send + Sync, C: Sync, A: Send> Send for SkipListIter<'_, K, C, A> {}
unsafe impl<K: Send + Sync, C: Sync, A: Send> Sync for SkipListIter<'_, K, C, A> {}

impl<'a, K, C: Comparator<K>, A: Allocator> SkipListIter<'a, K, C, A> {
    pub fn new(list: &'a SkipList<K, C, A>) -> Self {
        SkipListIter { list, node: None }
    }
}

impl<'a, K, C: Comparator<K>, A: Allocator> DBIterator for SkipListIter<'a, K, C, A> {
    type Key = K;

    fn valid(&self) -> bool {
        self.node.is_some()
    }

    fn seek_to_first(&mut self) {
        self.node = unsafe { Node::next(self.list.head, 0) };
    }

    fn seek_to_last(&mut self) {
        let last = self.list.find_last();
        self.node = if last == self.list.head {
            None
        } else {
            Some(last)
        };
    }

    fn seek(&mut self, target: &K) {
        self.node = self.list.find_greater_or_equal(target, None);
    }

    fn next(&mut self) {
        debug_assert!(self.valid());
        if let Some(node) = self.node {
            self.node = unsafe { Node::next(node, 0) };
        }
    }

    // No backward links: search for the last node before the current key.
    fn prev(&mut self) {
        debug_assert!(self.valid());
        if let Some(node) = self.node {
            let prev = self.list.find_less_than(unsafe { Node::key(node) });
            self.node = if prev == self.list.head {
                None
            } else {
                Some(prev)
            };
        }
    }

    fn key(&self) -> &K {
        match self.node {
            Some(node) => unsafe { Node::key(node) },
            None => panic!("key() called on an unpositioned skiplist iterator"),
        }
    }
}
