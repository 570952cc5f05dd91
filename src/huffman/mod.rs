pub mod histogram;
pub mod codebook;
pub mod header;

use std::{collections::BinaryHeap, cmp::Reverse};

use crate::PSEUDO_EOF;

pub use histogram::Histogram;
pub use codebook::{Codebook, Codeword};
pub use header::{read_tree, write_tree, MAX_LEAVES, MAX_TREE_DEPTH};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum HuffNode {
    Leaf {
        symbol: u16,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn leaf(symbol: u16, weight: u64) -> Self {
        HuffNode::Leaf { symbol, weight }
    }

    /// Joins two subtrees; `left` is the one taken first from the queue.
    pub fn merge(left: Self, right: Self) -> Self {
        HuffNode::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[inline(always)]
    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } => *weight,
            HuffNode::Internal { weight, .. } => *weight,
        }
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }

    /// Child reached by following `bit`; `None` at a leaf.
    #[inline(always)]
    pub fn child(&self, bit: bool) -> Option<&HuffNode> {
        match self {
            HuffNode::Leaf { .. } => None,
            HuffNode::Internal { left, right, .. } => Some(if bit { &**right } else { &**left }),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            HuffNode::Leaf { .. } => 1,
            HuffNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Length of the longest root-to-leaf path; a lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            HuffNode::Leaf { .. } => 0,
            HuffNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Queue entry. Equal weights are served in insertion order.
struct HeapNode {
    order: usize,
    node: HuffNode,
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.node.weight().cmp(&other.node.weight())
            .then_with(|| self.order.cmp(&other.order))
    }
}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for HeapNode {}

impl PartialEq for HeapNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

#[derive(Clone, Debug)]
pub struct HuffmanTree {
    pub root: HuffNode,
}

impl HuffmanTree {
    /// Builds the code tree for `histo`: one leaf per occurring byte plus a pseudo-EOF leaf of
    /// weight 1. The two lightest nodes are merged until a single root remains.
    pub fn build(histo: &Histogram) -> Self {
        let mut freq_tree = BinaryHeap::with_capacity(histo.distinct() + 1);
        let mut order = 0;

        let leaves = histo.iter()
            .filter(|&(_, count)| count > 0)
            .map(|(byte, count)| HuffNode::leaf(byte as u16, count))
            .chain(std::iter::once(HuffNode::leaf(PSEUDO_EOF, 1)));

        for node in leaves {
            freq_tree.push(Reverse(HeapNode { order, node }));
            order += 1;
        }

        let mut root = None;

        while let Some(Reverse(left)) = freq_tree.pop() {
            match freq_tree.pop() {
                Some(Reverse(right)) => {
                    freq_tree.push(Reverse(HeapNode { order, node: HuffNode::merge(left.node, right.node) }));
                    order += 1;
                }
                None => root = Some(left.node),
            }
        }

        // The pseudo-EOF leaf is always queued, so the loop always ends with a root.
        HuffmanTree { root: root.unwrap_or_else(|| HuffNode::leaf(PSEUDO_EOF, 1)) }
    }

    pub fn codebook(&self) -> Codebook {
        Codebook::from_tree(&self.root)
    }
}
