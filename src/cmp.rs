use std::{cmp::Ordering, sync::Arc};

/// Total order over keys. Every structural decision in the skiplist goes
/// through `compare`, and `Ordering::Equal` is the only notion of "same key".
pub trait Comparator<K: ?Sized> {
    fn compare(&self, left: &K, right: &K) -> Ordering;

    fn name(&self) -> &'static str;
}

#[derive(Clone, Copy, Default, Debug)]
pub struct BitWiseComparator {}

impl<K: AsRef<[u8]> + ?Sized> Comparator<K> for BitWiseComparator {
    fn compare(&self, left: &K, right: &K) -> Ordering {
        left.as_ref().cmp(right.as_ref())
    }

    fn name(&self) -> &'static str {
        "leveldb.BytewiseComparator"
    }
}

/// Orders keys by their `Ord` impl.
#[derive(Clone, Copy, Default, Debug)]
pub struct OrdComparator {}

impl<K: Ord + ?Sized> Comparator<K> for OrdComparator {
    fn compare(&self, left: &K, right: &K) -> Ordering {
        left.cmp(right)
    }

    fn name(&self) -> &'static str {
        "rskiplist.OrdComparator"
    }
}

impl<K: ?Sized, C: Comparator<K> + ?Sized> Comparator<K> for Arc<C> {
    fn compare(&self, left: &K, right: &K) -> Ordering {
        (**self).compare(left, right)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
