//! An ordered map implemented with an AVL tree.
//!
//! [`AvlTreeMap`] keeps its entries sorted by key in a height-balanced
//! binary search tree, so insertion, removal and lookup all run in
//! O(log n) time. Keys only need to implement [`Ord`].
//!
//! ```
//! use avl_map::AvlTreeMap;
//!
//! let mut map = AvlTreeMap::new();
//! map.insert("a", 1);
//! map.insert("b", 2);
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get(&"a"), Some(&1));
//! ```
//!
//! The `consistency_check` feature exposes `AvlTreeMap::check_consistency`
//! for use in downstream test harnesses.

mod map;

pub use map::AvlTreeMap;

#[cfg(test)]
mod proptests;
