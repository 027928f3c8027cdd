use crate::constants::EMPTY_MERKLE_ROOT;
use crate::{sha256_pair, Hash, Transaction};

/// Binary SHA-256 tree over the leaf hashes of an ordered transaction list.
///
/// Parents hash the raw concatenation `left || right`. A level with an odd
/// number of nodes pairs its last node with itself. An empty list has the
/// root [`EMPTY_MERKLE_ROOT`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    leaves: Vec<Hash>,
    root: Hash,
}

impl MerkleTree {
    pub fn new(txs: &[Transaction]) -> Self {
        let leaves: Vec<Hash> = txs.iter().map(Transaction::leaf_hash).collect();
        let root = fold_levels(&leaves);
        Self { leaves, root }
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }
}

pub fn merkle_root(txs: &[Transaction]) -> Hash {
    MerkleTree::new(txs).root()
}

fn fold_levels(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return EMPTY_MERKLE_ROOT;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => sha256_pair(a, b),
                [a] => sha256_pair(a, a),
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    level[0]
}
