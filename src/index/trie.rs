//! Binary Hamming trie over fixed-width perceptual hashes.
//!
//! Nodes live in an arena addressed by `NodeId`. Internal nodes branch on one bit
//! (`0` = left, `1` = right, most significant bit first). A leaf is created as soon as an
//! item is alone in its subtree, so leaves usually sit well above depth `B`; when a second
//! item reaches an occupied leaf, the leaf is turned into an internal node and both items
//! are pushed down until their bits diverge.
//!
//! # Search
//!
//! Queries run a depth-first branch-and-bound: the agreeing child keeps the accumulated
//! mismatch cost, the disagreeing child adds one, and a subtree is dropped as soon as its
//! cost exceeds the current bound (the tolerance, tightened to the worst kept result once
//! `n` results are held).

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::backend::{HashIndex, align_query, prepare_items, validate_bit_length};
use super::collector::TopN;
use super::error::IndexResult;
use super::phash::PHash;
use super::types::{CatalogItem, IndexKind, MatchResult};

type NodeId = u32;
type ItemId = u32;

const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
enum TrieNode {
    Internal { children: [Option<NodeId>; 2] },
    /// More than one item only when their hashes are identical.
    Leaf { items: Vec<ItemId> },
}

impl TrieNode {
    const fn empty_internal() -> Self {
        TrieNode::Internal {
            children: [None, None],
        }
    }
}

enum InsertStep {
    Descend(NodeId),
    Attach(usize),
    Split,
    Duplicate,
}

/// Read-only (after build) trie index.
pub struct TrieIndex {
    nodes: Vec<TrieNode>,
    items: Vec<Arc<CatalogItem>>,
    bit_length: usize,
}

impl TrieIndex {
    /// Creates an empty trie for `bit_length`-bit hashes.
    pub fn new(bit_length: usize) -> IndexResult<Self> {
        validate_bit_length(bit_length)?;
        Ok(Self {
            nodes: vec![TrieNode::empty_internal()],
            items: Vec::new(),
            bit_length,
        })
    }

    /// Builds a trie from a catalog. Fails if any hash is wider than `bit_length`.
    pub fn build<T>(items: T, bit_length: usize) -> IndexResult<Self>
    where
        T: IntoIterator<Item = CatalogItem>,
    {
        let items = prepare_items(items, bit_length)?;
        let mut trie = Self::new(bit_length)?;
        trie.items.reserve(items.len());
        for item in items {
            trie.insert(item);
        }

        debug!(
            items = trie.items.len(),
            nodes = trie.nodes.len(),
            bit_length,
            "Trie index built"
        );
        Ok(trie)
    }

    /// `item.hash` must already be `bit_length` bits wide.
    fn insert(&mut self, item: Arc<CatalogItem>) {
        let item_id = self.items.len() as ItemId;
        let owner = Arc::clone(&item);
        self.items.push(item);
        let hash = &owner.hash;

        let mut node = ROOT;
        let mut depth = 0usize;
        loop {
            let step = match &self.nodes[node as usize] {
                TrieNode::Internal { children } => {
                    let bit = hash.bit(depth) as usize;
                    match children[bit] {
                        Some(child) => InsertStep::Descend(child),
                        None => InsertStep::Attach(bit),
                    }
                }
                TrieNode::Leaf { .. } if depth == self.bit_length => InsertStep::Duplicate,
                TrieNode::Leaf { .. } => InsertStep::Split,
            };

            match step {
                InsertStep::Descend(child) => {
                    node = child;
                    depth += 1;
                }
                InsertStep::Attach(bit) => {
                    let leaf = self.push_leaf(vec![item_id]);
                    self.set_child(node, bit, leaf);
                    return;
                }
                InsertStep::Duplicate => {
                    if let TrieNode::Leaf { items } = &mut self.nodes[node as usize] {
                        items.push(item_id);
                    }
                    return;
                }
                InsertStep::Split => {
                    let resident = match &mut self.nodes[node as usize] {
                        TrieNode::Leaf { items } => std::mem::take(items),
                        TrieNode::Internal { .. } => Vec::new(),
                    };
                    let Some(&first) = resident.first() else {
                        self.nodes[node as usize] = TrieNode::Leaf {
                            items: vec![item_id],
                        };
                        return;
                    };

                    // Re-examine this node as internal on the next iteration; the new
                    // item either diverges here or follows the resident one level down.
                    let resident_bit = self.items[first as usize].hash.bit(depth) as usize;
                    self.nodes[node as usize] = TrieNode::empty_internal();
                    let moved = self.push_leaf(resident);
                    self.set_child(node, resident_bit, moved);
                }
            }
        }
    }

    fn push_leaf(&mut self, items: Vec<ItemId>) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(TrieNode::Leaf { items });
        id
    }

    fn set_child(&mut self, parent: NodeId, bit: usize, child: NodeId) {
        if let TrieNode::Internal { children } = &mut self.nodes[parent as usize] {
            children[bit] = Some(child);
        }
    }

    fn search(&self, query: &PHash, collector: &mut TopN) {
        if self.items.is_empty() || collector.is_closed() {
            return;
        }

        let mut stack: Vec<(NodeId, usize, u32)> = Vec::with_capacity(self.bit_length + 1);
        stack.push((ROOT, 0, 0));

        while let Some((node, depth, cost)) = stack.pop() {
            if cost > collector.bound() {
                continue;
            }

            match &self.nodes[node as usize] {
                TrieNode::Leaf { items } => {
                    // The path to a leaf spells its hash prefix, so the full distance is
                    // `cost` plus the mismatches in the bits below the leaf.
                    for &item_id in items {
                        let item = &self.items[item_id as usize];
                        let distance = item.hash.hamming_distance(query);
                        collector.offer(MatchResult::new(distance, Arc::clone(item)));
                    }
                }
                TrieNode::Internal { children } => {
                    let agree = query.bit(depth) as usize;
                    let disagree = agree ^ 1;

                    // Pushed first, popped last: the agreeing side tightens the bound first.
                    if let Some(child) = children[disagree]
                        && cost < collector.bound()
                    {
                        stack.push((child, depth + 1, cost + 1));
                    }
                    if let Some(child) = children[agree] {
                        stack.push((child, depth + 1, cost));
                    }
                }
            }
        }
    }

    /// Number of arena nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Walks the trie depth-first (left before right), yielding every item.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CatalogItem>> + '_ {
        let mut stack = vec![ROOT];
        let mut pending: &[ItemId] = &[];

        std::iter::from_fn(move || {
            loop {
                if let Some((&first, rest)) = pending.split_first() {
                    pending = rest;
                    return Some(&self.items[first as usize]);
                }

                let node = stack.pop()?;
                match &self.nodes[node as usize] {
                    TrieNode::Leaf { items } => pending = items,
                    TrieNode::Internal { children } => {
                        stack.extend(children[1]);
                        stack.extend(children[0]);
                    }
                }
            }
        })
    }

    /// Depth of the deepest leaf.
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match &self.nodes[node as usize] {
                TrieNode::Leaf { .. } => deepest = deepest.max(depth),
                TrieNode::Internal { children } => {
                    stack.extend(children.iter().flatten().map(|&c| (c, depth + 1)));
                }
            }
        }
        deepest
    }
}

impl HashIndex for TrieIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Trie
    }

    fn bit_length(&self) -> usize {
        self.bit_length
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn find(&self, query: &PHash, tolerance: u32) -> IndexResult<Vec<MatchResult>> {
        let query = align_query(query, self.bit_length)?;
        let mut collector = TopN::unbounded(tolerance);
        self.search(&query, &mut collector);
        Ok(collector.into_sorted_vec())
    }

    fn find_top_n(
        &self,
        query: &PHash,
        tolerance: u32,
        n: usize,
    ) -> IndexResult<Vec<MatchResult>> {
        let query = align_query(query, self.bit_length)?;
        let mut collector = TopN::bounded(tolerance, n);
        self.search(&query, &mut collector);
        Ok(collector.into_sorted_vec())
    }
}

impl fmt::Debug for TrieIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieIndex")
            .field("nodes", &self.nodes.len())
            .field("items", &self.items.len())
            .field("bit_length", &self.bit_length)
            .finish()
    }
}
