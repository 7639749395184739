//! An ordered map implemented with an AVL tree.

use std::cmp::{self, Ordering};
use std::mem;
use std::ptr::NonNull;

/// An ordered map implemented with an AVL tree.
///
/// Keys must form a total order. Insertion, removal and lookup run in
/// O(log n) time; the length is tracked and read in O(1).
///
/// ```
/// use avl_map::AvlTreeMap;
/// let mut map = AvlTreeMap::new();
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// map.remove(&1);
/// assert!(map.get(&1).is_none());
/// ```
#[derive(Clone)]
pub struct AvlTreeMap<K: Ord, V> {
    root: Link<K, V>,
    num_nodes: usize,
}

type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    height: usize,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
        }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.root = None;
        self.num_nodes = 0;
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|node| &node.value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.find_mut(key).map(|node| &mut node.value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.find(key).map(|node| (&node.key, &node.value))
    }

    /// Returns true if the map contains the key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    /// Returns true if the key was not present before.
    /// If the key was already present only its value is replaced.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let num_before = self.num_nodes;
        let (root, _) = Self::insert_node(self.root.take(), key, value, true, &mut self.num_nodes);
        self.root = Some(root);
        self.num_nodes > num_before
    }

    /// Returns a mutable reference to the value corresponding to the key.
    /// If the key is not present it is first inserted with `V::default()`.
    /// Note that this is an implicit insert and therefore not suitable as a
    /// membership test; use [`contains_key`](Self::contains_key) for that.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (root, value_ptr) = Self::insert_node(
            self.root.take(),
            key,
            V::default(),
            false,
            &mut self.num_nodes,
        );
        self.root = Some(root);
        // Rotations relink the node boxes but never move the node
        // allocations, so the pointer captured below the recursion is still
        // valid here and no other reference into the tree exists.
        unsafe { &mut *value_ptr.as_ptr() }
    }

    /// Removes a key from the map.
    /// Returns true if the key was previously in the map.
    pub fn remove(&mut self, key: &K) -> bool {
        let num_before = self.num_nodes;
        self.root = Self::remove_node(self.root.take(), key, &mut self.num_nodes);
        debug_assert!(self.get(key).is_none());
        self.num_nodes < num_before
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub fn height(&self) -> usize {
        Self::height_of(&self.root)
    }

    /// Checks key order, stored heights and the AVL condition at every node.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        let mut num_nodes = 0;
        Self::check_node(&self.root, &mut num_nodes);
        assert_eq!(num_nodes, self.num_nodes);
    }

    fn find(&self, key: &K) -> Option<&Node<K, V>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Equal => return Some(node),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }

    fn find_mut(&mut self, key: &K) -> Option<&mut Node<K, V>> {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Equal => return Some(node),
                Ordering::Less => node.left.as_deref_mut(),
                Ordering::Greater => node.right.as_deref_mut(),
            };
        }
        None
    }

    /// Inserts into the subtree and returns its new root together with a
    /// pointer to the value slot for the key. Rebuilds heights and restores
    /// balance on the way back up. With `overwrite` set an existing value
    /// for the key is replaced, otherwise it is left alone.
    fn insert_node(
        link: Link<K, V>,
        key: K,
        value: V,
        overwrite: bool,
        num_nodes: &mut usize,
    ) -> (Box<Node<K, V>>, NonNull<V>) {
        let mut node = match link {
            None => {
                *num_nodes += 1;
                let mut node = Box::new(Node::new(key, value));
                let value_ptr = NonNull::from(&mut node.value);
                return (node, value_ptr);
            }
            Some(node) => node,
        };

        let value_ptr = match key.cmp(&node.key) {
            Ordering::Equal => {
                if overwrite {
                    node.value = value;
                }
                NonNull::from(&mut node.value)
            }
            Ordering::Less => {
                // The side of the left child the key descends to decides
                // between the single and the double rotation. Capture it
                // now, the key moves into the recursive call. A rotation
                // further down would restore the subtree height and leave
                // this node within tolerance, so the captured ordering is
                // valid whenever it is actually used.
                let toward = node.left.as_ref().map(|left| key.cmp(&left.key));
                let (left, value_ptr) =
                    Self::insert_node(node.left.take(), key, value, overwrite, num_nodes);
                node.left = Some(left);
                Self::adjust_height(&mut node);
                if Self::balance_factor(&node) > 1 {
                    node = match toward {
                        Some(Ordering::Less) => Self::rotate_right(node),
                        _ => Self::rotate_left_right(node),
                    };
                }
                value_ptr
            }
            Ordering::Greater => {
                let toward = node.right.as_ref().map(|right| key.cmp(&right.key));
                let (right, value_ptr) =
                    Self::insert_node(node.right.take(), key, value, overwrite, num_nodes);
                node.right = Some(right);
                Self::adjust_height(&mut node);
                if Self::balance_factor(&node) < -1 {
                    node = match toward {
                        Some(Ordering::Greater) => Self::rotate_left(node),
                        _ => Self::rotate_right_left(node),
                    };
                }
                value_ptr
            }
        };
        (node, value_ptr)
    }

    /// Removes the key from the subtree and returns its new root.
    /// Every frame on the search path rebuilds its height and rebalances on
    /// the way back up, whether or not the key was found.
    fn remove_node(link: Link<K, V>, key: &K, num_nodes: &mut usize) -> Link<K, V> {
        let mut node = match link {
            None => return None,
            Some(node) => node,
        };

        match key.cmp(&node.key) {
            Ordering::Less => {
                node.left = Self::remove_node(node.left.take(), key, num_nodes);
            }
            Ordering::Greater => {
                node.right = Self::remove_node(node.right.take(), key, num_nodes);
            }
            Ordering::Equal => match (node.left.take(), node.right.take()) {
                (None, None) => {
                    *num_nodes -= 1;
                    return None;
                }
                (Some(child), None) | (None, Some(child)) => {
                    *num_nodes -= 1;
                    return Some(child);
                }
                (left, right) => {
                    node.left = left;
                    node.right = right;
                    // Two children: exchange key and value with the in-order
                    // successor, then remove the successor's old slot from
                    // the right subtree. The key to remove compares less
                    // than everything else in the right subtree, so the
                    // nested removal descends straight to the swapped-in
                    // node and decrements the count exactly once.
                    let mut succ = node.right.as_mut().unwrap();
                    while succ.left.is_some() {
                        succ = succ.left.as_mut().unwrap();
                    }
                    mem::swap(&mut node.key, &mut succ.key);
                    mem::swap(&mut node.value, &mut succ.value);
                    node.right = Self::remove_node(node.right.take(), key, num_nodes);
                }
            },
        }

        Self::adjust_height(&mut node);
        Some(Self::rebalance(node))
    }

    /// Restores the AVL condition at the subtree root after a removal.
    /// The removed key no longer exists to compare against, so the rotation
    /// is selected from the balance factor of the taller child.
    fn rebalance(node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let balance = Self::balance_factor(&node);
        debug_assert!((-2..=2).contains(&balance));
        if balance > 1 {
            if Self::balance_factor(node.left.as_ref().unwrap()) >= 0 {
                Self::rotate_right(node)
            } else {
                Self::rotate_left_right(node)
            }
        } else if balance < -1 {
            if Self::balance_factor(node.right.as_ref().unwrap()) <= 0 {
                Self::rotate_left(node)
            } else {
                Self::rotate_right_left(node)
            }
        } else {
            node
        }
    }

    fn height_of(link: &Link<K, V>) -> usize {
        match link {
            None => 0,
            Some(node) => node.height,
        }
    }

    fn adjust_height(node: &mut Node<K, V>) {
        node.height = 1 + cmp::max(Self::height_of(&node.left), Self::height_of(&node.right));
    }

    fn balance_factor(node: &Node<K, V>) -> isize {
        Self::height_of(&node.left) as isize - Self::height_of(&node.right) as isize
    }

    /// Rotates the subtree to the left to fix a right-heavy imbalance.
    /// Returns the new subtree root.
    fn rotate_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut pivot = node.right.take().unwrap();
        node.right = pivot.left.take();
        Self::adjust_height(&mut node);
        pivot.left = Some(node);
        Self::adjust_height(&mut pivot);
        pivot
    }

    /// Rotates the subtree to the right to fix a left-heavy imbalance.
    /// Returns the new subtree root.
    fn rotate_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut pivot = node.left.take().unwrap();
        node.left = pivot.right.take();
        Self::adjust_height(&mut node);
        pivot.right = Some(node);
        Self::adjust_height(&mut pivot);
        pivot
    }

    // Fixes a left-right imbalance.
    fn rotate_left_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let left = node.left.take().unwrap();
        node.left = Some(Self::rotate_left(left));
        Self::rotate_right(node)
    }

    // Fixes a right-left imbalance.
    fn rotate_right_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let right = node.right.take().unwrap();
        node.right = Some(Self::rotate_right(right));
        Self::rotate_left(node)
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn check_node(link: &Link<K, V>, num_nodes: &mut usize) {
        if let Some(node) = link {
            // Check key order
            if let Some(left) = &node.left {
                assert!(left.key < node.key);
            }
            if let Some(right) = &node.right {
                assert!(right.key > node.key);
            }

            Self::check_node(&node.left, num_nodes);
            Self::check_node(&node.right, num_nodes);

            // Check stored height
            let left_height = Self::height_of(&node.left);
            let right_height = Self::height_of(&node.right);
            assert_eq!(node.height, 1 + cmp::max(left_height, right_height));

            // Check AVL condition (near balance)
            assert!(left_height <= right_height + 1);
            assert!(right_height <= left_height + 1);

            *num_nodes += 1;
        }
    }
}

impl<K: Ord, V> Default for AvlTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        }
    }
}
