//! Adaptive Huffman tree over the D64 alphabet.
//!
//! 629 symbols (256 literal bytes, 1 end-of-stream, 372 length symbols) sit
//! as leaves of a 1257-node binary tree, stored as parallel arrays indexed
//! 1..=1257 (index 0 unused, index 1 is the root). Internal node `i` has
//! children `2*i` and `2*i+1`; leaf `LEAF_BASE + s` holds symbol `s`. Every
//! weight starts at 1. After every symbol, `update` walks the tree from the
//! symbol's leaf to the root, swapping each node past with the sibling of
//! its parent whenever that sibling is lighter, and re-deriving each
//! ancestor's weight as the sum of its two children along the way. If the
//! root's weight reaches 2000 every weight in the tree is halved in place.

use crate::tools::bitio::{BitReader, BitWriter};
use crate::Error;

/// 256 literal bytes + EOS + 372 length symbols.
pub const NUM_SYMBOLS: usize = 629;
const LEAF_BASE: usize = NUM_SYMBOLS;
const NODE_COUNT: usize = 2 * NUM_SYMBOLS - 1;
const ROOT: usize = 1;
const RESCALE_AT: u32 = 2000;

pub struct HuffmanTree {
    weight: Vec<u32>,
    left: Vec<usize>,
    right: Vec<usize>,
    parent: Vec<usize>,
}

impl HuffmanTree {
    pub fn new() -> Self {
        let mut left = vec![0usize; NODE_COUNT + 1];
        let mut right = vec![0usize; NODE_COUNT + 1];
        let mut parent = vec![0usize; NODE_COUNT + 1];
        let weight = vec![1u32; NODE_COUNT + 1];
        for i in 1..LEAF_BASE {
            left[i] = 2 * i;
            right[i] = 2 * i + 1;
        }
        for i in 2..=NODE_COUNT {
            parent[i] = i / 2;
        }
        parent[ROOT] = ROOT;
        Self { weight, left, right, parent }
    }

    /// Walks the tree root to leaf, one bit at a time, returning the symbol
    /// at the leaf reached. Does not update weights; call `update` after.
    pub fn decode_symbol(&self, reader: &mut BitReader) -> Result<usize, Error> {
        let mut node = ROOT;
        while node < LEAF_BASE {
            node = if reader.read_bit()? == 0 { self.left[node] } else { self.right[node] };
        }
        Ok(node - LEAF_BASE)
    }

    /// Walks leaf to root collecting the branch taken at each level, then
    /// emits those bits root-first.
    pub fn encode_symbol(&self, symbol: usize, writer: &mut BitWriter) {
        let mut bits = Vec::new();
        let mut node = LEAF_BASE + symbol;
        while node != ROOT {
            let p = self.parent[node];
            bits.push(if self.left[p] == node { 0u8 } else { 1u8 });
            node = p;
        }
        for bit in bits.into_iter().rev() {
            writer.push_bit(bit);
        }
    }

    /// Depth of `symbol`'s leaf, i.e. the number of bits in its current code.
    pub fn code_length(&self, symbol: usize) -> usize {
        let mut node = LEAF_BASE + symbol;
        let mut len = 0;
        while node != ROOT {
            node = self.parent[node];
            len += 1;
        }
        len
    }

    /// Updates the tree after `symbol` has been coded or decoded.
    pub fn update(&mut self, symbol: usize) {
        let mut k = LEAF_BASE + symbol;
        self.weight[k] += 1;
        while self.parent[k] != ROOT {
            let p = self.parent[k];
            let gp = self.parent[p];
            let sibling = if self.left[gp] == p { self.right[gp] } else { self.left[gp] };
            if self.weight[sibling] < self.weight[k] {
                if self.left[p] == k { self.left[p] = sibling; } else { self.right[p] = sibling; }
                if self.left[gp] == sibling { self.left[gp] = k; } else { self.right[gp] = k; }
                self.parent[k] = gp;
                self.parent[sibling] = p;
            }
            self.weight[p] = self.weight[self.left[p]] + self.weight[self.right[p]];
            k = p;
        }
        self.weight[ROOT] = self.weight[self.left[ROOT]] + self.weight[self.right[ROOT]];
        if self.weight[ROOT] >= RESCALE_AT {
            log::trace!("huffman tree rescale at root weight {}", self.weight[ROOT]);
            for w in self.weight.iter_mut() {
                *w >>= 1;
            }
        }
    }
}

impl Default for HuffmanTree {
    fn default() -> Self {
        Self::new()
    }
}
