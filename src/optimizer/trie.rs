//! Prefix tree over byte-size sequences, used to skip orderings whose value
//! sequence has already been evaluated.

const NONE: u32 = u32::MAX;

// first-child / next-sibling arena keeps a node at 12 bytes
#[derive(Debug, Clone, Copy)]
struct TrieNode {
    first_child: u32,
    next_sibling: u32,
    value: u8,
    terminal: bool,
}

impl TrieNode {
    fn new(value: u8) -> Self {
        Self {
            first_child: NONE,
            next_sibling: NONE,
            value,
            terminal: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequenceTrie {
    nodes: Vec<TrieNode>,
    len: usize,
}

impl Default for SequenceTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new(0)],
            len: 0,
        }
    }

    /// Number of distinct sequences stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn find_child(&self, parent: usize, value: u8) -> Option<usize> {
        let mut cursor = self.nodes[parent].first_child;
        while cursor != NONE {
            let node = &self.nodes[cursor as usize];
            if node.value == value {
                return Some(cursor as usize);
            }
            cursor = node.next_sibling;
        }
        None
    }

    pub fn contains(&self, sequence: &[u8]) -> bool {
        let mut node = 0;
        for &value in sequence {
            match self.find_child(node, value) {
                Some(child) => node = child,
                None => return false,
            }
        }
        self.nodes[node].terminal
    }

    /// Stores `sequence`, returning `false` if it was already present.
    pub fn insert(&mut self, sequence: &[u8]) -> bool {
        let mut node = 0;
        for &value in sequence {
            node = match self.find_child(node, value) {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    let mut fresh = TrieNode::new(value);
                    fresh.next_sibling = self.nodes[node].first_child;
                    self.nodes.push(fresh);
                    self.nodes[node].first_child = child as u32;
                    child
                }
            };
        }

        if self.nodes[node].terminal {
            false
        } else {
            self.nodes[node].terminal = true;
            self.len += 1;
            true
        }
    }
}
