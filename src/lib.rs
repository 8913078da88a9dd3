//! The in-memory write buffer of a log-structured storage engine: an
//! insert-only skiplist whose nodes live in a bump-pointer arena.
//!
//! ```
//! use rskiplist::{DBIterator, OrdComparator, SkipList};
//!
//! let list = SkipList::new(OrdComparator {});
//! for key in [5, 1, 9, 3] {
//!     list.insert(key);
//! }
//! assert!(list.contains(&9));
//!
//! let mut iter = list.iter();
//! iter.seek(&4);
//! assert_eq!(*iter.key(), 5);
//! ```

mod cmp;
mod error;
mod iterator;
mod options;
mod skiplist;
mod utils;

pub use cmp::{BitWiseComparator, Comparator, OrdComparator};
pub use error::{Error, Result};
pub use iterator::DBIterator;
pub use options::{Options, BRANCHING_FACTOR, DEFAULT_SEED, MAX_HEIGHT};
pub use skiplist::{Keys, SkipList, SkipListIter};
pub use utils::arena::{Allocator, Arena};
