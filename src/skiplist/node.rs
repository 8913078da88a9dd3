use std::{
    mem::{align_of, size_of, MaybeUninit},
    ptr::{self, NonNull},
    sync::atomic::{AtomicPtr, Ordering},
};

use crate::utils::arena::Allocator;

/// Header of a skiplist node. It is followed in the same allocation by
/// `height` forward links, so link storage and key storage share one
/// lifetime and one allocation:
///
/// ```text
/// +-----------+--------+---------+---------+-----+--------------------+
/// | key       | height | next[0] | next[1] | ... | next[height - 1]   |
/// +-----------+--------+---------+---------+-----+--------------------+
/// ```
///
/// All access goes through raw node pointers rather than `&Node` so that the
/// trailing links stay reachable from the allocation's own provenance.
#[repr(C)]
pub(crate) struct Node<K> {
    // uninitialized only in the head sentinel
    key: MaybeUninit<K>,
    height: usize,
}

pub(crate) type Link<K> = Option<NonNull<Node<K>>>;

impl<K> Node<K> {
    // `height` is a usize, so the header size is already a multiple of the
    // link alignment and the tower starts right after it.
    const TOWER_OFFSET: usize = size_of::<Node<K>>();

    fn size_for(height: usize) -> usize {
        Self::TOWER_OFFSET + height * size_of::<AtomicPtr<Node<K>>>()
    }

    /// Carves a node out of `allocator` with every link set to null.
    pub(crate) fn alloc<A: Allocator>(
        allocator: &mut A,
        key: MaybeUninit<K>,
        height: usize,
    ) -> NonNull<Node<K>> {
        debug_assert!(height > 0);
        debug_assert_eq!(Self::TOWER_OFFSET % align_of::<AtomicPtr<Node<K>>>(), 0);

        let node = allocator
            .allocate_aligned_to(Self::size_for(height), align_of::<Node<K>>())
            .cast::<Node<K>>();
        unsafe {
            node.as_ptr().write(Node { key, height });
            let tower = Self::tower(node);
            for level in 0..height {
                tower.add(level).write(AtomicPtr::new(ptr::null_mut()));
            }
        }
        node
    }

    unsafe fn tower(node: NonNull<Node<K>>) -> *mut AtomicPtr<Node<K>> {
        node.as_ptr()
            .cast::<u8>()
            .add(Self::TOWER_OFFSET)
            .cast::<AtomicPtr<Node<K>>>()
    }

    unsafe fn link<'a>(node: NonNull<Node<K>>, level: usize) -> &'a AtomicPtr<Node<K>> {
        debug_assert!(level < Self::height(node));
        &*Self::tower(node).add(level)
    }

    /// The key of a non-head node. The caller picks the lifetime, which must
    /// not outlive the allocator that holds the node.
    pub(crate) unsafe fn key<'a>(node: NonNull<Node<K>>) -> &'a K {
        (*node.as_ptr()).key.assume_init_ref()
    }

    pub(crate) unsafe fn height(node: NonNull<Node<K>>) -> usize {
        (*node.as_ptr()).height
    }

    /// Drops the key in place. The node must not be reachable afterwards.
    pub(crate) unsafe fn drop_key(node: NonNull<Node<K>>) {
        (*node.as_ptr()).key.assume_init_drop()
    }

    /// Reads a link, observing a fully initialized successor if it observes
    /// one at all.
    pub(crate) unsafe fn next(node: NonNull<Node<K>>, level: usize) -> Link<K> {
        NonNull::new(Self::link(node, level).load(Ordering::Acquire))
    }

    /// Publishes `next` to readers. Everything written to `next` before this
    /// call is visible to whoever loads it.
    pub(crate) unsafe fn set_next(node: NonNull<Node<K>>, level: usize, next: Link<K>) {
        Self::link(node, level).store(into_raw(next), Ordering::Release)
    }

    pub(crate) unsafe fn no_barrier_next(node: NonNull<Node<K>>, level: usize) -> Link<K> {
        NonNull::new(Self::link(node, level).load(Ordering::Relaxed))
    }

    pub(crate) unsafe fn no_barrier_set_next(node: NonNull<Node<K>>, level: usize, next: Link<K>) {
        Self::link(node, level).store(into_raw(next), Ordering::Relaxed)
    }
}

fn into_raw<K>(link: Link<K>) -> *mut Node<K> {
    link.map_or(ptr::null_mut(), NonNull::as_ptr)
}
