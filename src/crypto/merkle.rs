//! Merkle root calculation over transaction ids
//!
//! The reduction is a sliding window rather than a balanced binary tree:
//! every round hashes each adjacent pair `(layer[i-1], layer[i])`, so a layer
//! of `n` ids becomes a layer of `n - 1` digests. Blocks already on a chain
//! commit to roots built this way, so it must not be swapped for a
//! conventional pairwise tree.

use super::hash::{sha256_hex, Hash};

/// Root reported for a block without transactions
pub const EMPTY_MERKLE_ROOT: &str = "";

/// Calculate the merkle root from a list of hex transaction ids
///
/// An empty list yields [`EMPTY_MERKLE_ROOT`]; a single id is its own root.
pub fn calculate_merkle_root<S: AsRef<str>>(ids: &[S]) -> Hash {
    let mut layer: Vec<Hash> = ids.iter().map(|id| id.as_ref().to_string()).collect();

    while layer.len() > 1 {
        layer = reduce_layer(&layer);
    }

    layer.pop().unwrap_or_else(|| EMPTY_MERKLE_ROOT.to_string())
}

/// One reduction round: `n` digests in, `n - 1` digests out
pub fn reduce_layer(layer: &[Hash]) -> Vec<Hash> {
    layer
        .windows(2)
        .map(|pair| {
            let mut data = String::with_capacity(pair[0].len() + pair[1].len());
            data.push_str(&pair[0]);
            data.push_str(&pair[1]);
            sha256_hex(data.as_bytes())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_hash(a: &str, b: &str) -> Hash {
        sha256_hex(format!("{}{}", a, b).as_bytes())
    }

    #[test]
    fn test_empty_merkle_root() {
        let ids: Vec<String> = vec![];
        assert_eq!(calculate_merkle_root(&ids), EMPTY_MERKLE_ROOT);
    }

    #[test]
    fn test_merkle_root_single() {
        let id = sha256_hex(b"tx1");
        assert_eq!(calculate_merkle_root(&[id.clone()]), id);
    }

    #[test]
    fn test_merkle_root_two() {
        let a = sha256_hex(b"tx1");
        let b = sha256_hex(b"tx2");
        assert_eq!(calculate_merkle_root(&[&a, &b]), join_hash(&a, &b));
    }

    #[test]
    fn test_merkle_root_three_slides() {
        let a = sha256_hex(b"a");
        let b = sha256_hex(b"b");
        let c = sha256_hex(b"c");

        let first = reduce_layer(&[a.clone(), b.clone(), c.clone()]);
        assert_eq!(first, vec![join_hash(&a, &b), join_hash(&b, &c)]);

        let expected = join_hash(&join_hash(&a, &b), &join_hash(&b, &c));
        assert_eq!(calculate_merkle_root(&[&a, &b, &c]), expected);
        assert_eq!(calculate_merkle_root(&[&a, &b, &c]), expected);
    }

    #[test]
    fn test_layer_shrinks_by_one() {
        let ids: Vec<Hash> = (0..5).map(|i| sha256_hex(&[i])).collect();
        assert_eq!(reduce_layer(&ids).len(), 4);
        assert_eq!(reduce_layer(&ids[..2]).len(), 1);
        assert!(reduce_layer(&ids[..1]).is_empty());
    }

    #[test]
    fn test_order_matters() {
        let a = sha256_hex(b"a");
        let b = sha256_hex(b"b");
        assert_ne!(calculate_merkle_root(&[&a, &b]), calculate_merkle_root(&[&b, &a]));
    }
}
