//! Character trie holding several values per key.

use std::collections::HashMap;

#[derive(Debug)]
struct Node<D> {
    children: HashMap<char, Node<D>>,
    values: Vec<D>,
}

impl<D> Default for Node<D> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            values: Vec::new(),
        }
    }
}

/// Character trie whose nodes hold lists of values.
///
/// [`search`](Trie::search) returns the values of every key that is a prefix
/// of the query, so a short stem stays a candidate next to a longer one.
#[derive(Debug)]
pub struct Trie<D> {
    root: Node<D>,
    len: usize,
}

impl<D> Default for Trie<D> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

impl<D> Trie<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `values` to the node for `key`, creating the path as needed.
    pub fn insert(&mut self, key: &str, values: impl IntoIterator<Item = D>) {
        let node = key
            .chars()
            .fold(&mut self.root, |node, c| node.children.entry(c).or_default());
        let before = node.values.len();
        node.values.extend(values);
        self.len += node.values.len() - before;
    }

    /// Collect the values stored along the path spelled by `query`.
    ///
    /// Values come out shortest key first. The walk stops at the first
    /// character with no matching child.
    pub fn search<'a>(&'a self, query: impl IntoIterator<Item = char>) -> Vec<&'a D> {
        let mut found: Vec<&'a D> = self.root.values.iter().collect();
        let mut node = &self.root;
        for c in query {
            match node.children.get(&c) {
                Some(child) => {
                    node = child;
                    found.extend(node.values.iter());
                }
                None => break,
            }
        }
        found
    }

    /// Total number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
