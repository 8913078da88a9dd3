//! Insert-only ordered set backing the memtable.
//!
//! One writer at a time may insert while any number of readers search and
//! iterate without taking a lock. A node becomes visible to readers only once
//! its own links are initialized: links are stored with `Release` when a node
//! is spliced in and loaded with `Acquire` during traversal. Nodes are never
//! moved or freed before the list itself is dropped.

mod iter;
mod node;

use std::{
    cmp::Ordering as CmpOrdering,
    marker::PhantomData,
    mem::{self, MaybeUninit},
    ptr::NonNull,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
};

use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::{
    cmp::Comparator,
    error::{Error, Result},
    options::{Options, MAX_HEIGHT},
    utils::arena::{Allocator, Arena},
};

pub use iter::SkipListIter;
use node::{Link, Node};

/// State only the inserting thread touches.
struct Writer<A> {
    allocator: A,
    rnd: StdRng,
}

impl<A> Writer<A> {
    fn random_height(&mut self, max_height: usize, branching_factor: u32) -> usize {
        // Increase height with probability 1 in branching_factor
        let mut height = 1;
        while height < max_height && self.rnd.next_u32() % branching_factor == 0 {
            height += 1;
        }
        debug_assert!(height > 0 && height <= max_height);
        height
    }
}

pub struct SkipList<K, C, A = Arena> {
    head: NonNull<Node<K>>,
    // tallest level in use; readers may see a stale value
    max_height: AtomicUsize,
    len: AtomicUsize,
    memory_usage: AtomicUsize,
    comparator: C,
    options: Options,
    writer: Mutex<Writer<A>>,
    _keys: PhantomData<K>,
}

unsafe impl<K: Send, C: Send, A: Send> Send for SkipList<K, C, A> {}
unsafe impl<K: Send + Sync, C: Sync, A: Send> Sync for SkipList<K, C, A> {}

impl<K, C: Comparator<K>> SkipList<K, C> {
    pub fn new(comparator: C) -> Self {
        Self::build(comparator, Options::default(), Arena::new())
    }

    pub fn with_options(comparator: C, options: Options) -> Result<Self> {
        Self::with_allocator(comparator, options, Arena::new())
    }
}

impl<K, C: Comparator<K>, A: Allocator> SkipList<K, C, A> {
    pub fn with_allocator(comparator: C, options: Options, allocator: A) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(comparator, options, allocator))
    }

    fn build(comparator: C, options: Options, mut allocator: A) -> Self {
        let head = Node::alloc(&mut allocator, MaybeUninit::uninit(), options.max_height);
        log::debug!(
            "created skiplist ordered by {} with max height {}",
            comparator.name(),
            options.max_height
        );

        SkipList {
            head,
            max_height: AtomicUsize::new(1),
            len: AtomicUsize::new(0),
            memory_usage: AtomicUsize::new(allocator.memory_usage()),
            comparator,
            options,
            writer: Mutex::new(Writer {
                allocator,
                rnd: StdRng::seed_from_u64(options.seed),
            }),
            _keys: PhantomData,
        }
    }

    /// Inserts `key`.
    ///
    /// Nothing equal to `key` may already be in the list. This is checked in
    /// debug builds only; use [`SkipList::try_insert`] when duplicates are
    /// possible.
    pub fn insert(&self, key: K) {
        let mut writer = self.lock_writer();
        let mut prev = [self.head; MAX_HEIGHT];
        let x = self.find_greater_or_equal(&key, Some(&mut prev));

        debug_assert!(
            x.map_or(true, |x| !self.equal(&key, unsafe { Node::key(x) })),
            "duplicate key inserted into skiplist"
        );
        self.splice(&mut writer, key, &prev);
    }

    /// Inserts `key`, or returns `Error::AlreadyExist` and leaves the list
    /// untouched if an equal key is present.
    pub fn try_insert(&self, key: K) -> Result<()> {
        let mut writer = self.lock_writer();
        let mut prev = [self.head; MAX_HEIGHT];
        let x = self.find_greater_or_equal(&key, Some(&mut prev));

        if let Some(x) = x {
            if self.equal(&key, unsafe { Node::key(x) }) {
                return Err(Error::AlreadyExist);
            }
        }
        self.splice(&mut writer, key, &prev);
        Ok(())
    }

    pub fn contains(&self, key: &K) -> bool {
        match self.find_greater_or_equal(key, None) {
            Some(x) => self.equal(key, unsafe { Node::key(x) }),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes held by the backing allocator, as of the last completed insert.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage.load(Ordering::Relaxed)
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// An unpositioned cursor over the list.
    pub fn iter(&self) -> SkipListIter<'_, K, C, A> {
        SkipListIter::new(self)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> Keys<'_, K> {
        Keys {
            node: unsafe { Node::next(self.head, 0) },
            _list: PhantomData,
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, Writer<A>> {
        // a panicking writer never leaves a half-linked node behind
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn splice(&self, writer: &mut Writer<A>, key: K, prev: &[NonNull<Node<K>>; MAX_HEIGHT]) {
        let height =
            writer.random_height(self.options.max_height, self.options.branching_factor);
        let max_height = self.max_height();
        if height > max_height {
            // prev[max_height..height] still point at head
            debug_assert!(prev[max_height..height].iter().all(|p| *p == self.head));
            log::trace!("raising skiplist height from {} to {}", max_height, height);
            // Readers that see the new height before the new links find null
            // at the new levels of head and drop down immediately.
            self.max_height.store(height, Ordering::Relaxed);
        }

        let x = Node::alloc(&mut writer.allocator, MaybeUninit::new(key), height);
        for (level, p) in prev.iter().enumerate().take(height) {
            unsafe {
                // x is unreachable until prev[level] points at it
                Node::no_barrier_set_next(x, level, Node::no_barrier_next(*p, level));
                Node::set_next(*p, level, Some(x));
            }
        }

        self.len.fetch_add(1, Ordering::Release);
        self.memory_usage
            .store(writer.allocator.memory_usage(), Ordering::Relaxed);
    }

    fn max_height(&self) -> usize {
        self.max_height.load(Ordering::Relaxed)
    }

    fn equal(&self, a: &K, b: &K) -> bool {
        self.comparator.compare(a, b) == CmpOrdering::Equal
    }

    fn key_is_after_node(&self, key: &K, n: NonNull<Node<K>>) -> bool {
        self.comparator.compare(unsafe { Node::key(n) }, key) == CmpOrdering::Less
    }

    /// First node whose key is not less than `key`. When `prev` is given it
    /// receives, for every level in use, the last node before that position.
    fn find_greater_or_equal(
        &self,
        key: &K,
        mut prev: Option<&mut [NonNull<Node<K>>; MAX_HEIGHT]>,
    ) -> Link<K> {
        let mut x = self.head;
        let mut level = self.max_height() - 1;
        loop {
            let next = unsafe { Node::next(x, level) };
            match next {
                Some(n) if self.key_is_after_node(key, n) => x = n,
                _ => {
                    if let Some(prev) = prev.as_deref_mut() {
                        prev[level] = x;
                    }
                    if level == 0 {
                        return next;
                    }
                    level -= 1;
                }
            }
        }
    }

    /// Last node whose key is less than `key`, or head if there is none.
    fn find_less_than(&self, key: &K) -> NonNull<Node<K>> {
        let mut x = self.head;
        let mut level = self.max_height() - 1;
        loop {
            debug_assert!(
                x == self.head
                    || self.comparator.compare(unsafe { Node::key(x) }, key) == CmpOrdering::Less
            );
            match unsafe { Node::next(x, level) } {
                Some(n) if self.key_is_after_node(key, n) => x = n,
                _ => {
                    if level == 0 {
                        return x;
                    }
                    level -= 1;
                }
            }
        }
    }

    /// Last node in the list, or head if the list is empty.
    fn find_last(&self) -> NonNull<Node<K>> {
        let mut x = self.head;
        let mut level = self.max_height() - 1;
        loop {
            match unsafe { Node::next(x, level) } {
                Some(n) => x = n,
                None => {
                    if level == 0 {
                        return x;
                    }
                    level -= 1;
                }
            }
        }
    }
}

impl<K, C, A> Drop for SkipList<K, C, A> {
    fn drop(&mut self) {
        if !mem::needs_drop::<K>() {
            return;
        }
        // The allocator releases node memory wholesale afterwards; only the
        // keys need their destructors run.
        let mut node = unsafe { Node::no_barrier_next(self.head, 0) };
        while let Some(n) = node {
            unsafe {
                node = Node::no_barrier_next(n, 0);
                Node::drop_key(n);
            }
        }
    }
}

/// Ascending iterator over the keys present when each step is taken.
pub struct Keys<'a, K> {
    node: Link<K>,
    _list: PhantomData<&'a K>,
}

// Only hands out shared references to keys and reads links atomically.
unsafe impl<K: Send + Sync> Send for Keys<'_, K> {}
unsafe impl<K: Send + Sync> Sync for Keys<'_, K> {}

impl<'a, K> Iterator for Keys<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        unsafe {
            self.node = Node::next(node, 0);
            Some(Node::key(node))
        }
    }
}
